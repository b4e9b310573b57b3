//! Content-type resolution for uploaded objects
//!
//! Resolvers are consulted in order; the first one that knows the key wins.
//! A key no resolver knows is uploaded without a content type.

use std::collections::HashMap;

/// Resolves the content type for a published key
pub trait ContentTypeResolver: Send + Sync {
    fn resolve(&self, key: &str) -> Option<String>;
}

/// Explicit per-key content types (the `content-type` settings table)
#[derive(Debug, Clone, Default)]
pub struct OverrideTable {
    entries: HashMap<String, String>,
}

impl OverrideTable {
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ContentTypeResolver for OverrideTable {
    fn resolve(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }
}

/// Guess from the file extension
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionTable;

impl ContentTypeResolver for ExtensionTable {
    fn resolve(&self, key: &str) -> Option<String> {
        let leaf = key.rsplit('/').next().unwrap_or(key);
        let (stem, ext) = leaf.rsplit_once('.')?;
        if stem.is_empty() && !leaf[1..].contains('.') {
            // dotfiles like `.htaccess` have no extension
            return None;
        }
        content_type_from_extension(ext).map(String::from)
    }
}

/// Detect content type from file extension
pub fn content_type_from_extension(ext: &str) -> Option<&'static str> {
    let ct = match ext.to_lowercase().as_str() {
        "html" | "htm" | "shtml" => "text/html",
        "xhtml" => "application/xhtml+xml",
        "xml" => "text/xml",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "css" => "text/css",
        "csv" => "text/csv",
        "js" | "mjs" => "application/javascript",
        "json" => "application/json",
        "map" => "application/json",
        "atom" => "application/atom+xml",
        "rss" => "application/rss+xml",
        "mml" => "text/mathml",
        "htc" => "text/x-component",
        "gif" => "image/gif",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "tif" | "tiff" => "image/tiff",
        "ico" => "image/x-icon",
        "bmp" => "image/x-ms-bmp",
        "svg" | "svgz" => "image/svg+xml",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "eot" => "application/vnd.ms-fontobject",
        "pdf" => "application/pdf",
        "ps" | "eps" | "ai" => "application/postscript",
        "rtf" => "application/rtf",
        "doc" => "application/msword",
        "xls" => "application/vnd.ms-excel",
        "ppt" => "application/vnd.ms-powerpoint",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "tar" => "application/x-tar",
        "xz" => "application/x-xz",
        "bz2" => "application/x-bzip2",
        "7z" => "application/x-7z-compressed",
        "rar" => "application/x-rar-compressed",
        "jar" | "war" | "ear" => "application/java-archive",
        "wasm" => "application/wasm",
        "pem" | "crt" | "der" => "application/x-x509-ca-cert",
        "bin" | "exe" | "dll" | "deb" | "dmg" | "iso" | "img" | "msi" => {
            "application/octet-stream"
        }
        "mid" | "midi" | "kar" => "audio/midi",
        "mp3" => "audio/mpeg",
        "ogg" => "audio/ogg",
        "m4a" => "audio/x-m4a",
        "wav" => "audio/wav",
        "3gp" | "3gpp" => "video/3gpp",
        "ts" => "video/mp2t",
        "mp4" => "video/mp4",
        "mpeg" | "mpg" => "video/mpeg",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "flv" => "video/x-flv",
        "m4v" => "video/x-m4v",
        "wmv" => "video/x-ms-wmv",
        "avi" => "video/x-msvideo",
        _ => return None,
    };
    Some(ct)
}

/// Resolvers tried in priority order
#[derive(Default)]
pub struct ResolverChain {
    resolvers: Vec<Box<dyn ContentTypeResolver>>,
}

impl ResolverChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides first, then extension guessing
    pub fn with_overrides(overrides: OverrideTable) -> Self {
        Self::new().then(overrides).then(ExtensionTable)
    }

    pub fn then(mut self, resolver: impl ContentTypeResolver + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }
}

impl ContentTypeResolver for ResolverChain {
    fn resolve(&self, key: &str) -> Option<String> {
        self.resolvers.iter().find_map(|r| r.resolve(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_guessing() {
        let table = ExtensionTable;
        assert_eq!(table.resolve("index.html").as_deref(), Some("text/html"));
        assert_eq!(table.resolve("a/b/STYLE.CSS").as_deref(), Some("text/css"));
        assert_eq!(table.resolve("feed.atom").as_deref(), Some("application/atom+xml"));
        assert_eq!(table.resolve("archive.tar.gz").as_deref(), Some("application/gzip"));
    }

    #[test]
    fn test_unknown_types_are_absent() {
        let table = ExtensionTable;
        assert_eq!(table.resolve("README"), None);
        assert_eq!(table.resolve("data.unknownext"), None);
        assert_eq!(table.resolve(".htaccess"), None);
        assert_eq!(table.resolve("dir.d/Makefile"), None);
    }

    #[test]
    fn test_override_beats_guess() {
        let mut entries = HashMap::new();
        entries.insert("a.txt".to_string(), "text/x-custom".to_string());
        entries.insert("feed".to_string(), "application/atom+xml".to_string());
        let chain = ResolverChain::with_overrides(OverrideTable::new(entries));

        assert_eq!(chain.resolve("a.txt").as_deref(), Some("text/x-custom"));
        assert_eq!(chain.resolve("feed").as_deref(), Some("application/atom+xml"));
        assert_eq!(chain.resolve("b.txt").as_deref(), Some("text/plain"));
        assert_eq!(chain.resolve("b"), None);
    }

    #[test]
    fn test_empty_chain_resolves_nothing() {
        assert_eq!(ResolverChain::new().resolve("index.html"), None);
    }
}

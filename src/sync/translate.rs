//! Filename translation for published keys
//!
//! The bucket website endpoint serves a single index document name per
//! directory, so every `index.<ext>` page is published as `index.html`.

/// Canonical index document name
pub const INDEX_DOCUMENT: &str = "index.html";

/// Map a `/`-separated relative path to the key it is published under.
///
/// Only a final segment with exactly two dot-separated parts, the first being
/// `index`, is rewritten. `index` and `index.tar.gz` are returned unchanged,
/// while `index.` becomes `index.html`.
pub fn translate(path: &str) -> String {
    let (dir, leaf) = match path.rfind('/') {
        Some(pos) => (&path[..=pos], &path[pos + 1..]),
        None => ("", path),
    };

    if is_translatable_index(leaf) {
        format!("{}{}", dir, INDEX_DOCUMENT)
    } else {
        path.to_string()
    }
}

fn is_translatable_index(leaf: &str) -> bool {
    let mut parts = leaf.split('.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("index"), Some(_), None) => true,
        _ => false,
    }
}

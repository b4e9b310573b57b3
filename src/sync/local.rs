//! Local directory listing keyed by published key

use std::collections::BTreeMap;
use std::path::Path;

use walkdir::WalkDir;

use super::translate::translate;
use crate::error::{DeployError, Result};
use crate::types::LocalFile;

/// Two files that translate to the same published key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCollision {
    pub published_key: String,
    /// Relative path that was kept
    pub kept: String,
    /// Relative path that was dropped
    pub dropped: String,
}

/// Files under a root, keyed by published key
#[derive(Debug, Clone, Default)]
pub struct LocalListing {
    pub files: BTreeMap<String, LocalFile>,
    pub collisions: Vec<KeyCollision>,
}

impl LocalListing {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&LocalFile> {
        self.files.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Insert a file, resolving published-key collisions deterministically.
    ///
    /// A file whose relative path already equals the key beats a translated
    /// one; otherwise the lexically smaller relative path is kept.
    pub fn insert(&mut self, file: LocalFile) {
        let key = file.published_key.clone();
        let Some(existing) = self.files.get(&key) else {
            self.files.insert(key, file);
            return;
        };

        let existing_exact = existing.relative_path == key;
        let new_exact = file.relative_path == key;
        let replace = match (existing_exact, new_exact) {
            (true, _) => false,
            (false, true) => true,
            (false, false) => file.relative_path < existing.relative_path,
        };

        let (kept, dropped) = if replace {
            (file.relative_path.clone(), existing.relative_path.clone())
        } else {
            (existing.relative_path.clone(), file.relative_path.clone())
        };

        tracing::warn!(
            "Published key {} claimed by both {} and {}; keeping {}",
            key,
            kept,
            dropped,
            kept
        );

        self.collisions.push(KeyCollision {
            published_key: key.clone(),
            kept,
            dropped,
        });

        if replace {
            self.files.insert(key, file);
        }
    }
}

/// Recursively list every regular file under `root`.
///
/// Symlinks to files are listed under the link's own path. Symlinked
/// directories are not descended into.
pub fn list_local(root: &Path) -> Result<LocalListing> {
    if !root.is_dir() {
        return Err(DeployError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} is not a directory", root.display()),
        )));
    }

    let mut listing = LocalListing::default();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        let is_file = if entry.path_is_symlink() {
            entry.path().is_file()
        } else {
            entry.file_type().is_file()
        };
        if !is_file {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| DeployError::Storage(format!("Path outside root: {}", e)))?;
        let relative_path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        listing.insert(LocalFile {
            published_key: translate(&relative_path),
            relative_path,
            absolute_path: entry.path().to_path_buf(),
        });
    }

    tracing::debug!("Listed {} local files under {}", listing.len(), root.display());
    Ok(listing)
}

//! Core types for sitedeploy

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A file found under the local build root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalFile {
    /// Path relative to the root, always `/`-separated
    pub relative_path: String,
    /// Key the file is stored under after filename translation
    pub published_key: String,
    /// Absolute path on disk
    #[serde(skip)]
    pub absolute_path: PathBuf,
}

/// An object currently stored in the bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteObject {
    /// Object key
    pub key: String,
    /// Object size in bytes, when the listing reports it
    #[serde(default)]
    pub size: Option<u64>,
    /// Entity tag, when the listing reports it
    #[serde(default)]
    pub etag: Option<String>,
}

impl RemoteObject {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            size: None,
            etag: None,
        }
    }

    /// Directory markers are keys ending in `/`; they are never synced
    pub fn is_directory_marker(&self) -> bool {
        self.key.ends_with('/')
    }
}

/// Content hash (hex-encoded SHA-256)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub String);

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Upload and delete sets computed for one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPlan {
    /// Local files that are missing remotely or whose content differs
    pub to_upload: Vec<LocalFile>,
    /// Remote objects with no local counterpart
    pub to_delete: Vec<RemoteObject>,
    /// Keys present on both sides with identical content
    pub unchanged: Vec<String>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.to_upload.is_empty() && self.to_delete.is_empty()
    }

    pub fn upload_keys(&self) -> Vec<&str> {
        self.to_upload
            .iter()
            .map(|f| f.published_key.as_str())
            .collect()
    }

    pub fn delete_keys(&self) -> Vec<&str> {
        self.to_delete.iter().map(|o| o.key.as_str()).collect()
    }
}

/// A mutation applied to the bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SyncAction {
    Upload {
        key: String,
        content_type: Option<String>,
        bytes: u64,
    },
    Delete {
        key: String,
    },
}

impl SyncAction {
    pub fn key(&self) -> &str {
        match self {
            SyncAction::Upload { key, .. } | SyncAction::Delete { key } => key,
        }
    }
}

/// Outcome of executing a plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Destination bucket
    pub bucket: String,
    /// Actions in the order they were applied
    pub actions: Vec<SyncAction>,
    /// Number of keys left untouched
    pub unchanged: usize,
    /// Total bytes uploaded
    pub bytes_uploaded: u64,
}

impl SyncReport {
    pub fn uploaded(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, SyncAction::Upload { .. }))
            .count()
    }

    pub fn deleted(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, SyncAction::Delete { .. }))
            .count()
    }
}

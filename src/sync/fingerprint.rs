//! Content fingerprints used to compare local and remote copies

use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::types::Fingerprint;

impl Fingerprint {
    /// Hash an in-memory byte buffer
    pub fn of_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Fingerprint(hex::encode(hasher.finalize()))
    }

    /// Read a file fully and hash it
    pub async fn of_file(path: &Path) -> Result<Self> {
        let data = tokio::fs::read(path).await?;
        Ok(Self::of_bytes(&data))
    }
}

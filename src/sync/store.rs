//! Object store capability and the remote listing built from it
//!
//! The reconciler and executor only ever see `dyn ObjectStore`, so the S3
//! client and the in-memory store are interchangeable.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::RemoteObject;

/// Minimal bucket operations needed to sync a directory
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket this store talks to
    fn bucket(&self) -> &str;

    /// Every object in the bucket, directory markers included
    async fn list(&self) -> Result<Vec<RemoteObject>>;

    /// Full body of one object
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Store `body` under `key`, setting the content type when given
    async fn put(&self, key: &str, body: Vec<u8>, content_type: Option<&str>) -> Result<()>;

    /// Remove one object
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Opens an [`ObjectStore`] once the destination bucket is known
#[async_trait]
pub trait BucketConnector: Send + Sync {
    async fn connect(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>>;
}

/// Remote objects keyed by object key
pub type RemoteListing = BTreeMap<String, RemoteObject>;

/// List the bucket, dropping directory markers.
pub async fn list_remote(store: &dyn ObjectStore) -> Result<RemoteListing> {
    let mut listing = RemoteListing::new();
    let mut markers = 0usize;

    for object in store.list().await? {
        if object.is_directory_marker() {
            markers += 1;
            continue;
        }
        listing.insert(object.key.clone(), object);
    }

    tracing::debug!(
        "Listed {} objects in bucket {} ({} directory markers skipped)",
        listing.len(),
        store.bucket(),
        markers
    );
    Ok(listing)
}

//! Directory-to-bucket synchronization
//!
//! Lists a local build directory and a bucket, diffs them by content hash,
//! and applies the resulting uploads and deletes.
//!
//! # Feature Flags
//!
//! The S3 store requires the `cloud` feature. Everything else, including the
//! in-memory store, is always available.

#[cfg(feature = "cloud")]
mod cloud;
pub mod content_type;
mod executor;
mod fingerprint;
pub mod local;
mod memory;
mod plan;
pub mod store;
pub mod translate;

#[cfg(feature = "cloud")]
pub use cloud::{S3Connector, S3Store};
pub use content_type::{
    content_type_from_extension, ContentTypeResolver, ExtensionTable, OverrideTable,
    ResolverChain,
};
pub use executor::execute_plan;
pub use local::{list_local, KeyCollision, LocalListing};
pub use memory::{CallLog, MemoryConnector, MemoryStore, StoredObject};
pub use plan::plan_sync;
pub use store::{list_remote, BucketConnector, ObjectStore, RemoteListing};
pub use translate::{translate, INDEX_DOCUMENT};

use std::path::Path;

use crate::error::Result;
use crate::types::{SyncPlan, SyncReport};

/// List both sides and compute the plan without touching the bucket
pub async fn plan_directory(root: &Path, store: &dyn ObjectStore) -> Result<SyncPlan> {
    let local = list_local(root)?;
    let remote = list_remote(store).await?;
    plan_sync(&local, &remote, store).await
}

/// Plan and apply in one pass
pub async fn sync_directory(
    root: &Path,
    store: &dyn ObjectStore,
    resolver: &dyn ContentTypeResolver,
) -> Result<SyncReport> {
    let plan = plan_directory(root, store).await?;
    execute_plan(&plan, store, resolver).await
}

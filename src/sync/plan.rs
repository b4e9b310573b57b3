//! Reconciliation of a local listing against a bucket listing

use super::local::LocalListing;
use super::store::{ObjectStore, RemoteListing};
use crate::error::Result;
use crate::types::{Fingerprint, SyncPlan};

/// Compute the upload and delete sets.
///
/// Keys present on both sides are compared by fingerprint, reading each
/// remote object exactly once. Any read error aborts the whole plan.
pub async fn plan_sync(
    local: &LocalListing,
    remote: &RemoteListing,
    store: &dyn ObjectStore,
) -> Result<SyncPlan> {
    let mut plan = SyncPlan::default();

    for (key, file) in &local.files {
        if !remote.contains_key(key) {
            plan.to_upload.push(file.clone());
            continue;
        }

        let remote_body = store.get(key).await?;
        let remote_fp = Fingerprint::of_bytes(&remote_body);
        let local_fp = Fingerprint::of_file(&file.absolute_path).await?;

        if local_fp == remote_fp {
            plan.unchanged.push(key.clone());
        } else {
            tracing::debug!("{} changed ({} -> {})", key, remote_fp, local_fp);
            plan.to_upload.push(file.clone());
        }
    }

    plan.to_delete = remote
        .iter()
        .filter(|(key, _)| local.get(key).is_none())
        .map(|(_, object)| object.clone())
        .collect();

    tracing::info!(
        "Planned sync for bucket {}: {} to upload, {} to delete, {} unchanged",
        store.bucket(),
        plan.to_upload.len(),
        plan.to_delete.len(),
        plan.unchanged.len()
    );

    Ok(plan)
}

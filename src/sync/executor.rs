//! Applies a sync plan to a bucket

use super::content_type::ContentTypeResolver;
use super::store::ObjectStore;
use crate::error::Result;
use crate::types::{SyncAction, SyncPlan, SyncReport};

/// Upload then delete, stopping at the first failure.
///
/// Each put/delete is atomic on its own; actions already applied when a
/// later one fails are not rolled back.
pub async fn execute_plan(
    plan: &SyncPlan,
    store: &dyn ObjectStore,
    resolver: &dyn ContentTypeResolver,
) -> Result<SyncReport> {
    let mut report = SyncReport {
        bucket: store.bucket().to_string(),
        unchanged: plan.unchanged.len(),
        ..Default::default()
    };

    for file in &plan.to_upload {
        let body = tokio::fs::read(&file.absolute_path).await?;
        let bytes = body.len() as u64;
        let content_type = resolver.resolve(&file.published_key);

        tracing::info!(
            "Uploading file: {} ({} bytes, content-type {})",
            file.published_key,
            bytes,
            content_type.as_deref().unwrap_or("none")
        );
        store
            .put(&file.published_key, body, content_type.as_deref())
            .await?;

        report.bytes_uploaded += bytes;
        report.actions.push(SyncAction::Upload {
            key: file.published_key.clone(),
            content_type,
            bytes,
        });
    }

    for object in &plan.to_delete {
        tracing::info!("Deleting file: {}", object.key);
        store.delete(&object.key).await?;
        report.actions.push(SyncAction::Delete {
            key: object.key.clone(),
        });
    }

    tracing::info!(
        "Synced bucket {}: {} uploaded ({} bytes), {} deleted, {} unchanged",
        report.bucket,
        report.uploaded(),
        report.bytes_uploaded,
        report.deleted(),
        report.unchanged
    );

    Ok(report)
}

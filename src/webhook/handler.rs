//! Push handler: fetch, build, and sync one repository

use serde::{Deserialize, Serialize};

use super::builder::{run_build, Builder};
use super::credentials::CredentialProvider;
use super::event::TriggerEvent;
use super::source::SourceFetcher;
use crate::config::{HandlerConfig, OUTPUT_DIR};
use crate::error::Result;
use crate::settings::{Settings, SETTINGS_FILE};
use crate::sync::{sync_directory, BucketConnector};
use crate::types::SyncReport;

/// What a trigger event led to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeployOutcome {
    /// Push to a branch other than the default one
    Skipped { reference: String, expected: String },
    Deployed {
        repository: String,
        bucket: String,
        report: SyncReport,
    },
}

/// Deploys a repository on push to its default branch
pub struct PushHandler {
    config: HandlerConfig,
    credentials: Box<dyn CredentialProvider>,
    fetcher: Box<dyn SourceFetcher>,
    builder: Box<dyn Builder>,
    buckets: Box<dyn BucketConnector>,
}

impl PushHandler {
    pub fn new(
        config: HandlerConfig,
        credentials: Box<dyn CredentialProvider>,
        fetcher: Box<dyn SourceFetcher>,
        builder: Box<dyn Builder>,
        buckets: Box<dyn BucketConnector>,
    ) -> Self {
        Self {
            config,
            credentials,
            fetcher,
            builder,
            buckets,
        }
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// Run the whole pipeline for one event.
    ///
    /// Nothing is fetched for non-default branches. Fetch, build and settings
    /// failures all happen before the bucket is contacted.
    pub async fn handle(&self, event: &TriggerEvent) -> Result<DeployOutcome> {
        let payload = &event.payload;
        let expected = payload.default_ref(&self.config.default_branch);
        if payload.reference != expected {
            tracing::info!(
                "Ignoring push to {} for {} (deploying {} only)",
                payload.reference,
                payload.repository.full_name,
                expected
            );
            return Ok(DeployOutcome::Skipped {
                reference: payload.reference.clone(),
                expected,
            });
        }

        let repo = &payload.repository;
        let branch = payload.default_branch(&self.config.default_branch);

        let credentials = self.credentials.resolve().await?;
        let source_root = self
            .fetcher
            .fetch(&repo.full_name, branch, credentials.as_ref())
            .await?;
        let output = run_build(self.builder.as_ref(), &source_root, OUTPUT_DIR).await?;

        let settings = Settings::load(Some(&source_root.join(SETTINGS_FILE)))?;
        let bucket = settings.bucket_or(&repo.name);
        let store = self.buckets.connect(&bucket).await?;

        tracing::info!("Deploying {} to bucket {}", repo.full_name, bucket);
        let report = sync_directory(&output, store.as_ref(), &settings.resolver()).await?;

        Ok(DeployOutcome::Deployed {
            repository: repo.full_name.clone(),
            bucket,
            report,
        })
    }
}

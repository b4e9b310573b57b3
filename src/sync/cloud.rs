//! S3 bucket store

use std::sync::Arc;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;

use super::store::{BucketConnector, ObjectStore};
use crate::error::{DeployError, Result};
use crate::types::RemoteObject;

/// One S3 bucket
#[derive(Clone)]
pub struct S3Store {
    client: S3Client,
    bucket: String,
}

impl S3Store {
    pub fn new(client: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn list(&self) -> Result<Vec<RemoteObject>> {
        let mut objects = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(&self.bucket);
            if let Some(token) = &continuation_token {
                request = request.continuation_token(token);
            }

            let response = request.send().await.map_err(|e| {
                DeployError::Storage(format!("list s3://{}: {}", self.bucket, e))
            })?;

            for object in response.contents() {
                if let Some(key) = object.key() {
                    objects.push(RemoteObject {
                        key: key.to_string(),
                        size: object.size().map(|s| s as u64),
                        etag: object.e_tag().map(String::from),
                    });
                }
            }

            match next_page_token(
                &self.bucket,
                response.is_truncated().unwrap_or(false),
                response.next_continuation_token(),
            )? {
                Some(token) => continuation_token = Some(token),
                None => break,
            }
        }

        Ok(objects)
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                DeployError::Storage(format!("get s3://{}/{}: {}", self.bucket, key, e))
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| {
                DeployError::Storage(format!("read s3://{}/{}: {}", self.bucket, key, e))
            })?
            .into_bytes();

        Ok(data.to_vec())
    }

    async fn put(&self, key: &str, body: Vec<u8>, content_type: Option<&str>) -> Result<()> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body));
        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        request.send().await.map_err(|e| {
            DeployError::Storage(format!("put s3://{}/{}: {}", self.bucket, key, e))
        })?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                DeployError::Storage(format!("delete s3://{}/{}: {}", self.bucket, key, e))
            })?;
        Ok(())
    }
}

/// Token for the next listing page, or `None` when the listing is complete.
///
/// A truncated page without a token is an error; retrying without one would
/// restart from the first page.
fn next_page_token(bucket: &str, truncated: bool, token: Option<&str>) -> Result<Option<String>> {
    match (truncated, token) {
        (false, _) => Ok(None),
        (true, Some(token)) => Ok(Some(token.to_string())),
        (true, None) => Err(DeployError::Storage(format!(
            "list s3://{}: truncated page without a continuation token",
            bucket
        ))),
    }
}

/// Builds [`S3Store`]s from one shared client
#[derive(Clone)]
pub struct S3Connector {
    client: S3Client,
}

impl S3Connector {
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }

    /// Load AWS config from the environment
    pub async fn from_env() -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self::new(S3Client::new(&config))
    }
}

#[async_trait]
impl BucketConnector for S3Connector {
    async fn connect(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>> {
        if bucket.is_empty() {
            return Err(DeployError::Config("bucket name is empty".to_string()));
        }
        Ok(Arc::new(S3Store::new(self.client.clone(), bucket)))
    }
}

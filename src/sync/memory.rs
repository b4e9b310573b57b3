//! In-memory object store

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::store::{BucketConnector, ObjectStore};
use crate::error::{DeployError, Result};
use crate::types::RemoteObject;

/// Stored object body and attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

/// Call counters, used to check how often each key was read
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    pub lists: usize,
    pub gets: HashMap<String, usize>,
    pub puts: Vec<String>,
    pub deletes: Vec<String>,
}

#[derive(Default)]
struct Inner {
    objects: BTreeMap<String, StoredObject>,
    calls: CallLog,
    fail_on: Option<String>,
}

/// Bucket kept in process memory
#[derive(Clone)]
pub struct MemoryStore {
    bucket: String,
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// Seed an object without recording a call
    pub fn insert(&self, key: &str, body: Vec<u8>) {
        self.inner.lock().objects.insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: None,
            },
        );
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.inner.lock().objects.get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner.lock().objects.keys().cloned().collect()
    }

    pub fn calls(&self) -> CallLog {
        self.inner.lock().calls.clone()
    }

    /// Make every operation on `key` fail from now on
    pub fn fail_on(&self, key: &str) {
        self.inner.lock().fail_on = Some(key.to_string());
    }

    fn check_failure(inner: &Inner, key: &str) -> Result<()> {
        if inner.fail_on.as_deref() == Some(key) {
            return Err(DeployError::Storage(format!("injected failure on {}", key)));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn list(&self) -> Result<Vec<RemoteObject>> {
        let mut inner = self.inner.lock();
        inner.calls.lists += 1;
        Ok(inner
            .objects
            .iter()
            .map(|(key, obj)| RemoteObject {
                key: key.clone(),
                size: Some(obj.body.len() as u64),
                etag: None,
            })
            .collect())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let mut inner = self.inner.lock();
        Self::check_failure(&inner, key)?;
        *inner.calls.gets.entry(key.to_string()).or_default() += 1;
        inner
            .objects
            .get(key)
            .map(|obj| obj.body.clone())
            .ok_or_else(|| {
                DeployError::Storage(format!("s3://{}/{} not found", self.bucket, key))
            })
    }

    async fn put(&self, key: &str, body: Vec<u8>, content_type: Option<&str>) -> Result<()> {
        let mut inner = self.inner.lock();
        Self::check_failure(&inner, key)?;
        inner.calls.puts.push(key.to_string());
        inner.objects.insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.map(String::from),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        Self::check_failure(&inner, key)?;
        inner.calls.deletes.push(key.to_string());
        inner.objects.remove(key);
        Ok(())
    }
}

/// Hands out in-memory stores, one per bucket name
#[derive(Clone, Default)]
pub struct MemoryConnector {
    stores: Arc<Mutex<HashMap<String, MemoryStore>>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store for `bucket`, created empty on first use
    pub fn store(&self, bucket: &str) -> MemoryStore {
        self.stores
            .lock()
            .entry(bucket.to_string())
            .or_insert_with(|| MemoryStore::new(bucket))
            .clone()
    }

    pub fn connected_buckets(&self) -> Vec<String> {
        let mut names: Vec<String> = self.stores.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl BucketConnector for MemoryConnector {
    async fn connect(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>> {
        Ok(Arc::new(self.store(bucket)))
    }
}

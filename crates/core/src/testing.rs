//! In-memory ObjectStore used by unit tests

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::digest::bytes_md5;
use crate::error::{Error, Result};
use crate::path::ObjectKey;
use crate::traits::{ListOptions, ListResult, ObjectStore, RemoteObjectMeta};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    content_type: Option<String>,
}

/// A bucket held in a map, with call counters and injectable failures
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, StoredObject>>,
    calls: Mutex<Vec<String>>,
    fail_put: Mutex<HashSet<String>>,
    fail_delete: Mutex<HashSet<String>>,
    fail_list: Mutex<bool>,
    page_size: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split listings into pages of `size` keys
    pub fn with_page_size(size: usize) -> Self {
        Self {
            page_size: Some(size),
            ..Self::default()
        }
    }

    pub fn insert(&self, key: &str, data: &[u8]) {
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                data: data.to_vec(),
                content_type: None,
            },
        );
    }

    pub fn reject_put(&self, key: &str) {
        self.fail_put.lock().unwrap().insert(key.to_string());
    }

    pub fn reject_delete(&self, key: &str) {
        self.fail_delete.lock().unwrap().insert(key.to_string());
    }

    pub fn reject_list(&self) {
        *self.fail_list.lock().unwrap() = true;
    }

    pub fn object(&self, key: &ObjectKey) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(key.as_str())
            .map(|o| o.data.clone())
    }

    pub fn content_type(&self, key: &ObjectKey) -> Option<String> {
        self.objects
            .lock()
            .unwrap()
            .get(key.as_str())
            .and_then(|o| o.content_type.clone())
    }

    pub fn etag(&self, key: &ObjectKey) -> Option<String> {
        self.object(key).map(|data| bytes_md5(&data))
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    /// Every call made, as `"<op> <key or prefix>"`, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, op: &str) -> Vec<String> {
        let prefix = format!("{op} ");
        self.calls()
            .into_iter()
            .filter_map(|c| c.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }

    pub fn put_count(&self) -> usize {
        self.calls_to("put").len()
    }

    fn record(&self, op: &str, target: &str) {
        self.calls.lock().unwrap().push(format!("{op} {target}"));
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn head_object(&self, key: &ObjectKey) -> Result<Option<RemoteObjectMeta>> {
        self.record("head", key.as_str());
        let objects = self.objects.lock().unwrap();
        Ok(objects.get(key.as_str()).map(|o| {
            RemoteObjectMeta::new(key.clone())
                .with_etag(&format!("\"{}\"", bytes_md5(&o.data)))
                .with_size(o.data.len() as i64)
        }))
    }

    async fn get_object(&self, key: &ObjectKey) -> Result<Vec<u8>> {
        self.record("get", key.as_str());
        self.object(key)
            .ok_or_else(|| Error::NotFound(key.to_string()))
    }

    async fn put_object(
        &self,
        key: &ObjectKey,
        source: &Path,
        content_type: Option<String>,
    ) -> Result<RemoteObjectMeta> {
        self.record("put", key.as_str());
        if self.fail_put.lock().unwrap().contains(key.as_str()) {
            return Err(Error::Auth(format!("AccessDenied: {key}")));
        }
        let data = tokio::fs::read(source).await?;
        let meta = RemoteObjectMeta::new(key.clone())
            .with_etag(&bytes_md5(&data))
            .with_size(data.len() as i64);
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), StoredObject { data, content_type });
        Ok(meta)
    }

    async fn delete_object(&self, key: &ObjectKey) -> Result<()> {
        self.record("delete", key.as_str());
        if self.fail_delete.lock().unwrap().contains(key.as_str()) {
            return Err(Error::Network(format!("timeout deleting {key}")));
        }
        self.objects.lock().unwrap().remove(key.as_str());
        Ok(())
    }

    async fn list_objects(&self, options: ListOptions) -> Result<ListResult> {
        let prefix = options.prefix.unwrap_or_default();
        self.record("list", &prefix);
        if *self.fail_list.lock().unwrap() {
            return Err(Error::Network("list failed".into()));
        }

        // The token is the last key of the previous page, like S3's start-after.
        let after = options.continuation_token.unwrap_or_default();
        let matching: Vec<String> = self
            .keys()
            .into_iter()
            .filter(|k| k.starts_with(&prefix) && *k > after)
            .collect();
        let page_size = self.page_size.unwrap_or(usize::MAX).min(matching.len());
        let truncated = page_size < matching.len();
        let page = &matching[..page_size];

        Ok(ListResult {
            items: page
                .iter()
                .map(|k| RemoteObjectMeta::new(k.as_str()))
                .collect(),
            truncated,
            continuation_token: truncated.then(|| page[page.len() - 1].clone()),
        })
    }
}

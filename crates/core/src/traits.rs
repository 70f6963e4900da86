//! ObjectStore trait definition
//!
//! This trait defines the bucket operations the sync and delete logic needs.
//! It keeps the core crate independent of the S3 SDK and can be mocked for testing.

use std::path::Path;

use async_trait::async_trait;

use crate::digest::is_md5_etag;
use crate::error::Result;
use crate::path::ObjectKey;

/// Metadata the store reports for an existing object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObjectMeta {
    /// Object key
    pub key: ObjectKey,

    /// ETag with surrounding quotes removed
    pub etag: Option<String>,

    /// Size in bytes
    pub size: Option<i64>,

    /// Content type
    pub content_type: Option<String>,

    /// Last modified timestamp
    pub last_modified: Option<jiff::Timestamp>,
}

impl RemoteObjectMeta {
    /// Metadata with only a key
    pub fn new(key: impl Into<ObjectKey>) -> Self {
        Self {
            key: key.into(),
            etag: None,
            size: None,
            content_type: None,
            last_modified: None,
        }
    }

    /// Set the ETag, stripping any quotes the transport wrapped it in
    pub fn with_etag(mut self, etag: &str) -> Self {
        self.etag = Some(unquote_etag(etag).to_string());
        self
    }

    pub fn with_size(mut self, size: i64) -> Self {
        self.size = Some(size);
        self
    }

    /// The ETag, if it is a plain single-part MD5 digest
    pub fn md5(&self) -> Option<&str> {
        self.etag.as_deref().filter(|e| is_md5_etag(e))
    }
}

/// Remove surrounding double quotes from an ETag
pub fn unquote_etag(etag: &str) -> &str {
    etag.trim_matches('"')
}

/// Options for list operations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Key prefix to filter by
    pub prefix: Option<String>,

    /// Continuation token for pagination
    pub continuation_token: Option<String>,
}

/// One page of a list operation
#[derive(Debug, Clone, Default)]
pub struct ListResult {
    /// Listed objects
    pub items: Vec<RemoteObjectMeta>,

    /// Whether more items are available
    pub truncated: bool,

    /// Continuation token for the next page
    pub continuation_token: Option<String>,
}

/// Operations against a single bucket
///
/// Implemented by the S3 adapter; mocked in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Probe an object; `Ok(None)` when it does not exist
    async fn head_object(&self, key: &ObjectKey) -> Result<Option<RemoteObjectMeta>>;

    /// Get object content as bytes
    async fn get_object(&self, key: &ObjectKey) -> Result<Vec<u8>>;

    /// Stream a local file to `key`
    async fn put_object(
        &self,
        key: &ObjectKey,
        source: &Path,
        content_type: Option<String>,
    ) -> Result<RemoteObjectMeta>;

    /// Delete an object; deleting a missing key succeeds
    async fn delete_object(&self, key: &ObjectKey) -> Result<()>;

    /// List one page of objects
    async fn list_objects(&self, options: ListOptions) -> Result<ListResult>;
}

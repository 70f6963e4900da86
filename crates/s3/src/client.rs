//! R2 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from r2sync-core.
//! SDK responses are turned into `RemoteObjectMeta` here and nowhere else.

use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::{ByteStream, DateTime};

use r2sync_core::config::ENV_BUCKET_NAME;
use r2sync_core::{
    Error, ListOptions, ListResult, ObjectKey, ObjectStore, RemoteObjectMeta, Result,
    StoreIdentity,
};

/// Region name R2 expects from S3 clients
pub const R2_REGION: &str = "auto";

/// S3 client bound to a single R2 bucket
pub struct R2Client {
    inner: aws_sdk_s3::Client,
    bucket: String,
}

impl R2Client {
    /// Create a client from a validated store identity
    pub async fn new(identity: &StoreIdentity) -> Result<Self> {
        let credentials = aws_credential_types::Credentials::new(
            identity.access_key_id(),
            identity.secret_access_key(),
            None, // session token
            None, // expiry
            "r2sync-static-credentials",
        );

        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(aws_config::Region::new(R2_REGION))
            .endpoint_url(identity.endpoint_url())
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(true)
            .build();

        tracing::debug!(
            "Created client for bucket {} at {} (account {})",
            identity.bucket_name(),
            identity.endpoint_url(),
            identity.account_id()
        );

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: identity.bucket_name().to_string(),
        })
    }

    /// Bucket every operation targets
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

/// Sort an SDK failure into the core error kinds
fn map_sdk_error<E>(err: SdkError<E, HttpResponse>, context: &str) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let code = err.code().map(str::to_string);
    let status = err.raw_response().map(|r| r.status().as_u16());
    let message = format!("{context}: {}", DisplayErrorContext(&err));
    classify_error(code.as_deref(), status, message)
}

/// Error kind for an S3 error code and HTTP status
///
/// Only a missing key is `NotFound`; a missing bucket is a configuration
/// problem and must never pass for an absent object.
fn classify_error(code: Option<&str>, status: Option<u16>, message: String) -> Error {
    match (code, status) {
        (Some("NoSuchBucket"), _) => {
            Error::Config(format!("{message} (check {ENV_BUCKET_NAME})"))
        }
        (Some("NoSuchKey" | "NotFound"), _) | (None, Some(404)) => Error::NotFound(message),
        (Some("AccessDenied" | "InvalidAccessKeyId" | "SignatureDoesNotMatch"), _)
        | (_, Some(401 | 403)) => Error::Auth(message),
        _ => Error::Network(message),
    }
}

fn timestamp(value: Option<&DateTime>) -> Option<jiff::Timestamp> {
    value.and_then(|t| jiff::Timestamp::from_second(t.secs()).ok())
}

#[async_trait]
impl ObjectStore for R2Client {
    async fn head_object(&self, key: &ObjectKey) -> Result<Option<RemoteObjectMeta>> {
        let response = match self
            .inner
            .head_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return match map_sdk_error(e, &format!("head {key}")) {
                    Error::NotFound(_) => Ok(None),
                    other => Err(other),
                };
            }
        };

        let mut meta = RemoteObjectMeta::new(key.clone());
        if let Some(etag) = response.e_tag() {
            meta = meta.with_etag(etag);
        }
        meta.size = response.content_length();
        meta.content_type = response.content_type().map(str::to_string);
        meta.last_modified = timestamp(response.last_modified());

        Ok(Some(meta))
    }

    async fn get_object(&self, key: &ObjectKey) -> Result<Vec<u8>> {
        let response = self
            .inner
            .get_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &format!("get {key}")))?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| Error::Network(e.to_string()))?
            .into_bytes()
            .to_vec();

        Ok(data)
    }

    async fn put_object(
        &self,
        key: &ObjectKey,
        source: &Path,
        content_type: Option<String>,
    ) -> Result<RemoteObjectMeta> {
        let body = ByteStream::from_path(source)
            .await
            .map_err(|e| Error::General(format!("Failed to read {}: {e}", source.display())))?;

        let response = self
            .inner
            .put_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .body(body)
            .set_content_type(content_type)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &format!("put {key}")))?;

        let mut meta = RemoteObjectMeta::new(key.clone());
        if let Some(etag) = response.e_tag() {
            meta = meta.with_etag(etag);
        }
        meta.last_modified = Some(jiff::Timestamp::now());

        Ok(meta)
    }

    async fn delete_object(&self, key: &ObjectKey) -> Result<()> {
        let result = self
            .inner
            .delete_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => match map_sdk_error(e, &format!("delete {key}")) {
                Error::NotFound(_) => Ok(()),
                other => Err(other),
            },
        }
    }

    async fn list_objects(&self, options: ListOptions) -> Result<ListResult> {
        let response = self
            .inner
            .list_objects_v2()
            .bucket(&self.bucket)
            .set_prefix(options.prefix)
            .set_continuation_token(options.continuation_token)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, "list"))?;

        let items = response
            .contents()
            .iter()
            .filter_map(|object| {
                let mut meta = RemoteObjectMeta::new(object.key()?);
                if let Some(etag) = object.e_tag() {
                    meta = meta.with_etag(etag);
                }
                meta.size = object.size();
                meta.last_modified = timestamp(object.last_modified());
                Some(meta)
            })
            .collect();

        Ok(ListResult {
            items,
            truncated: response.is_truncated().unwrap_or(false),
            continuation_token: response.next_continuation_token().map(str::to_string),
        })
    }
}

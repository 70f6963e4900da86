//! Per-file upload reconciliation
//!
//! For one local file the reconciler decides whether the object at its key is
//! missing, stale or current, and writes the file when it is not current.
//! Every failure is captured in the file's [`Outcome`]; nothing here aborts a
//! larger run.

use std::path::{Path, PathBuf};

use crate::digest::file_md5;
use crate::error::Result;
use crate::ignore::IgnoreRules;
use crate::path::ObjectKey;
use crate::traits::{ObjectStore, RemoteObjectMeta};

/// What to do with a file, given its digest and the remote state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Remote digest matches
    Skip,
    /// No remote object
    Create,
    /// Remote object exists with a different, missing or unusable digest
    Update,
}

impl Decision {
    /// Compare a local hex MD5 against the remote object, if any
    ///
    /// A remote ETag that is not a plain MD5 (multipart uploads, missing
    /// header) can't be compared and forces an update.
    pub fn decide(local_md5: &str, remote: Option<&RemoteObjectMeta>) -> Self {
        let Some(remote) = remote else {
            return Decision::Create;
        };
        match remote.md5() {
            Some(remote_md5) if remote_md5.eq_ignore_ascii_case(local_md5) => Decision::Skip,
            _ => Decision::Update,
        }
    }
}

/// Why a file was not written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Basename matched an ignore pattern
    Ignored,
    /// Remote digest equals the local one
    UpToDate,
}

/// Result of reconciling one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Skipped(SkipReason),
    Created,
    Updated,
    Failed(String),
}

impl Outcome {
    /// Short lowercase label for output
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Skipped(SkipReason::Ignored) => "ignored",
            Outcome::Skipped(SkipReason::UpToDate) => "up-to-date",
            Outcome::Created => "created",
            Outcome::Updated => "updated",
            Outcome::Failed(_) => "failed",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

/// Facts about a local file gathered for a single upload attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileRecord {
    pub path: PathBuf,
    /// Hex MD5 of the contents
    pub digest: String,
    pub size: u64,
    /// Best-effort guess from the extension
    pub mime_type: Option<String>,
}

impl LocalFileRecord {
    /// Digest and describe the file at `path`
    pub async fn inspect(path: &Path) -> Result<Self> {
        let size = tokio::fs::metadata(path).await?.len();
        let digest = file_md5(path).await?;
        let mime_type = mime_guess::from_path(path)
            .first()
            .map(|m| m.essence_str().to_string());

        Ok(Self {
            path: path.to_path_buf(),
            digest,
            size,
            mime_type,
        })
    }
}

/// Report for one file of an upload run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    /// None when no key could be derived for the path
    pub key: Option<ObjectKey>,
    pub outcome: Outcome,
    pub size: Option<u64>,
    pub content_type: Option<String>,
}

impl FileReport {
    fn new(path: &Path, key: Option<ObjectKey>, outcome: Outcome) -> Self {
        Self {
            path: path.to_path_buf(),
            key,
            outcome,
            size: None,
            content_type: None,
        }
    }

    /// A report for a file that failed before reaching the store
    pub fn failed(path: &Path, key: Option<ObjectKey>, reason: impl Into<String>) -> Self {
        Self::new(path, key, Outcome::Failed(reason.into()))
    }

    /// A report for a file matched by the ignore rules
    pub fn ignored(path: &Path, key: Option<ObjectKey>) -> Self {
        Self::new(path, key, Outcome::Skipped(SkipReason::Ignored))
    }

    /// The key if known, otherwise the local path
    pub fn display_name(&self) -> String {
        match &self.key {
            Some(key) => key.to_string(),
            None => self.path.display().to_string(),
        }
    }
}

/// Reconciles local files against one bucket
pub struct Reconciler<'a, S: ?Sized> {
    store: &'a S,
    ignore: IgnoreRules,
    dry_run: bool,
}

impl<'a, S> Reconciler<'a, S>
where
    S: ObjectStore + ?Sized,
{
    pub fn new(store: &'a S, ignore: IgnoreRules) -> Self {
        Self {
            store,
            ignore,
            dry_run: false,
        }
    }

    /// Decide and report without writing anything
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Whether the ignore rules exclude `path`
    pub fn is_ignored(&self, path: &Path) -> bool {
        self.ignore.is_ignored(path)
    }

    /// Bring the object at `key` in line with the file at `local_path`
    pub async fn reconcile(&self, local_path: &Path, key: &ObjectKey) -> FileReport {
        if self.is_ignored(local_path) {
            tracing::debug!("Ignoring {}", local_path.display());
            return FileReport::ignored(local_path, Some(key.clone()));
        }

        let record = match LocalFileRecord::inspect(local_path).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Failed to read {}: {e}", local_path.display());
                return FileReport::failed(local_path, Some(key.clone()), e.to_string());
            }
        };

        let mut report = FileReport::new(local_path, Some(key.clone()), Outcome::Created);
        report.size = Some(record.size);
        report.content_type = record.mime_type.clone();

        let remote = match self.store.head_object(key).await {
            Ok(remote) => remote,
            Err(e) => {
                tracing::warn!("Failed to check {key}: {e}");
                report.outcome = Outcome::Failed(e.to_string());
                return report;
            }
        };

        let decision = Decision::decide(&record.digest, remote.as_ref());
        tracing::debug!(
            "{key}: local md5 {}, remote etag {:?} -> {decision:?}",
            record.digest,
            remote.as_ref().and_then(|r| r.etag.as_deref())
        );

        report.outcome = match decision {
            Decision::Skip => Outcome::Skipped(SkipReason::UpToDate),
            Decision::Create | Decision::Update => self.write(&record, key, decision).await,
        };
        report
    }

    async fn write(&self, record: &LocalFileRecord, key: &ObjectKey, decision: Decision) -> Outcome {
        let written = if decision == Decision::Create {
            Outcome::Created
        } else {
            Outcome::Updated
        };

        if self.dry_run {
            return written;
        }

        match self
            .store
            .put_object(key, &record.path, record.mime_type.clone())
            .await
        {
            Ok(_) => {
                tracing::info!(
                    "Uploaded {key} ({} bytes, {})",
                    record.size,
                    record.mime_type.as_deref().unwrap_or("no content type")
                );
                written
            }
            Err(e) => {
                tracing::warn!("Failed to upload {key}: {e}");
                Outcome::Failed(e.to_string())
            }
        }
    }
}

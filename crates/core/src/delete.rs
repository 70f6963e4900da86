//! Object and "folder" deletion
//!
//! A path ending in `/` names a folder: every object under the prefix is
//! deleted, then the `prefix/` marker object. Any other path names one object.

use crate::error::{Error, Result};
use crate::path::ObjectKey;
use crate::traits::{ListOptions, ObjectStore};

/// What a delete path refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    /// A single object key, taken verbatim
    Object(ObjectKey),
    /// All keys starting with `prefix`, plus the `prefix/` marker
    Folder { prefix: String },
}

impl DeleteTarget {
    /// Interpret a user-supplied delete path
    pub fn parse(path: &str) -> Result<Self> {
        if path.is_empty() {
            return Err(Error::InvalidPath("Path cannot be empty".into()));
        }

        match path.strip_suffix('/') {
            Some("") => Err(Error::InvalidPath(
                "Refusing to delete the whole bucket; name a folder such as images/".into(),
            )),
            Some(prefix) => Ok(DeleteTarget::Folder {
                prefix: prefix.to_string(),
            }),
            None => Ok(DeleteTarget::Object(ObjectKey::new(path))),
        }
    }
}

/// Result of deleting one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteReport {
    pub key: ObjectKey,
    pub outcome: DeleteOutcome,
    /// Whether this key is the folder marker
    pub marker: bool,
}

/// Reports of a delete run
#[derive(Debug, Clone, Default)]
pub struct DeleteSummary {
    pub reports: Vec<DeleteReport>,
    /// Set when listing the folder failed part way
    pub listing_error: Option<String>,
}

impl DeleteSummary {
    pub fn deleted(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| r.outcome == DeleteOutcome::Deleted)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.reports.len() - self.deleted()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0 || self.listing_error.is_some()
    }
}

/// Deletes objects from one bucket
pub struct Deleter<'a, S: ?Sized> {
    store: &'a S,
    dry_run: bool,
}

impl<'a, S> Deleter<'a, S>
where
    S: ObjectStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            dry_run: false,
        }
    }

    /// List what would be deleted without deleting
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Delete `path`, calling `on_report` after each key
    pub async fn delete<F>(&self, path: &str, mut on_report: F) -> Result<DeleteSummary>
    where
        F: FnMut(&DeleteReport),
    {
        let mut summary = DeleteSummary::default();

        match DeleteTarget::parse(path)? {
            DeleteTarget::Object(key) => {
                let report = self.delete_key(key, false).await;
                on_report(&report);
                summary.reports.push(report);
            }
            DeleteTarget::Folder { prefix } => {
                let marker = ObjectKey::new(format!("{prefix}/"));
                let mut continuation_token = None;

                loop {
                    let options = ListOptions {
                        prefix: Some(prefix.clone()),
                        continuation_token: continuation_token.take(),
                    };

                    let page = match self.store.list_objects(options).await {
                        Ok(page) => page,
                        Err(e) => {
                            tracing::warn!("Failed to list objects under {prefix}: {e}");
                            summary.listing_error = Some(e.to_string());
                            break;
                        }
                    };

                    for item in page.items {
                        if item.key == marker {
                            continue;
                        }
                        let report = self.delete_key(item.key, false).await;
                        on_report(&report);
                        summary.reports.push(report);
                    }

                    match page.continuation_token {
                        Some(token) if page.truncated => continuation_token = Some(token),
                        _ => break,
                    }
                }

                let report = self.delete_key(marker, true).await;
                on_report(&report);
                summary.reports.push(report);
            }
        }

        Ok(summary)
    }

    async fn delete_key(&self, key: ObjectKey, marker: bool) -> DeleteReport {
        let outcome = if self.dry_run {
            DeleteOutcome::Deleted
        } else {
            match self.store.delete_object(&key).await {
                Ok(()) => {
                    tracing::info!("Deleted {key}");
                    DeleteOutcome::Deleted
                }
                Err(e) => {
                    tracing::warn!("Failed to delete {key}: {e}");
                    DeleteOutcome::Failed(e.to_string())
                }
            }
        };
        DeleteReport {
            key,
            outcome,
            marker,
        }
    }
}

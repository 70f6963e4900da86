//! Directory walking for uploads
//!
//! Enumerates the regular files under a root and reconciles each one.
//! Files are independent: a failure is recorded in that file's report and the
//! walk moves on.

use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt};

use crate::error::{Error, Result};
use crate::path::map_key_from;
use crate::sync::{FileReport, Outcome, Reconciler, SkipReason};
use crate::traits::ObjectStore;

/// Reports of an upload run with per-outcome counts
#[derive(Debug, Clone, Default)]
pub struct SyncSummary {
    pub reports: Vec<FileReport>,
}

impl SyncSummary {
    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn total(&self) -> usize {
        self.reports.len()
    }

    pub fn created(&self) -> usize {
        self.count(|o| *o == Outcome::Created)
    }

    pub fn updated(&self) -> usize {
        self.count(|o| *o == Outcome::Updated)
    }

    pub fn up_to_date(&self) -> usize {
        self.count(|o| *o == Outcome::Skipped(SkipReason::UpToDate))
    }

    pub fn ignored(&self) -> usize {
        self.count(|o| *o == Outcome::Skipped(SkipReason::Ignored))
    }

    pub fn failed(&self) -> usize {
        self.count(Outcome::is_failure)
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    /// Bytes of the files that were (or would be) written
    pub fn bytes_written(&self) -> u64 {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Created | Outcome::Updated))
            .filter_map(|r| r.size)
            .sum()
    }
}

/// Every regular file below `root`, recursively
///
/// Symlinks to files are included; symlinked directories are not entered.
/// Subdirectories that can't be read are logged and skipped.
pub fn collect_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let entries = std::fs::read_dir(root)?;
    visit(entries, &mut files);
    Ok(files)
}

fn visit(entries: std::fs::ReadDir, files: &mut Vec<PathBuf>) {
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable directory entry: {e}");
                continue;
            }
        };
        let path = entry.path();
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);

        if is_dir {
            match std::fs::read_dir(&path) {
                Ok(children) => visit(children, files),
                Err(e) => tracing::warn!("Skipping directory {}: {e}", path.display()),
            }
        } else if path.is_file() {
            files.push(path);
        }
    }
}

/// Upload `root` (a file or a directory tree) with keys relative to `base_path`
///
/// `on_report` is called as each file finishes. With `jobs > 1` files are
/// reconciled concurrently and reports arrive in completion order.
pub async fn walk_and_reconcile<S, F>(
    reconciler: &Reconciler<'_, S>,
    root: &Path,
    base_path: &Path,
    jobs: usize,
    mut on_report: F,
) -> Result<SyncSummary>
where
    S: ObjectStore + ?Sized,
    F: FnMut(&FileReport),
{
    let cwd_buf = std::env::current_dir()?;
    let cwd = cwd_buf.as_path();
    let mut summary = SyncSummary::default();

    if root.is_file() {
        let report = reconcile_one(reconciler, cwd, root.to_path_buf(), base_path).await;
        on_report(&report);
        summary.reports.push(report);
        return Ok(summary);
    }

    if !root.is_dir() {
        return Err(Error::InvalidPath(format!(
            "{} is neither a file nor a directory",
            root.display()
        )));
    }

    let files = collect_files(root)?;
    tracing::debug!("Found {} file(s) under {}", files.len(), root.display());

    let mut reports = stream::iter(files)
        .map(move |path| reconcile_one(reconciler, cwd, path, base_path))
        .buffer_unordered(jobs.max(1));

    while let Some(report) = reports.next().await {
        on_report(&report);
        summary.reports.push(report);
    }

    Ok(summary)
}

async fn reconcile_one<S>(
    reconciler: &Reconciler<'_, S>,
    cwd: &Path,
    path: PathBuf,
    base_path: &Path,
) -> FileReport
where
    S: ObjectStore + ?Sized,
{
    match map_key_from(cwd, &path, base_path) {
        Ok(key) => reconciler.reconcile(&path, &key).await,
        Err(_) if reconciler.is_ignored(&path) => {
            tracing::debug!("Ignoring {}", path.display());
            FileReport::ignored(&path, None)
        }
        Err(e) => {
            tracing::warn!("Cannot map {} to a key: {e}", path.display());
            FileReport::failed(&path, None, e.to_string())
        }
    }
}

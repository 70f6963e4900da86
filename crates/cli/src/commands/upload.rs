//! upload mode - Mirror a local file or directory into the bucket
//!
//! Each file is uploaded only when the bucket has no object at its key or the
//! object's ETag differs from the file's MD5.

use std::path::{Path, PathBuf};

use comfy_table::{presets::UTF8_FULL, Table};
use r2sync_core::{
    walk_and_reconcile, Error, FileReport, IgnoreRules, ObjectStore, Outcome, Reconciler,
    SkipReason, SyncSummary,
};
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, ProgressBar};

/// Inputs for one upload run
#[derive(Debug)]
pub struct UploadArgs {
    /// File or directory to upload
    pub path: PathBuf,
    /// Local base path keys are made relative to
    pub base_path: PathBuf,
    pub ignore: IgnoreRules,
    pub jobs: usize,
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
struct UploadOutput {
    status: &'static str,
    dry_run: bool,
    files: Vec<FileEntry>,
    created: usize,
    updated: usize,
    up_to_date: usize,
    ignored: usize,
    failed: usize,
    total: usize,
    bytes_written: u64,
    bytes_written_human: String,
}

#[derive(Debug, Serialize)]
struct FileEntry {
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<&FileReport> for FileEntry {
    fn from(report: &FileReport) -> Self {
        Self {
            path: report.path.display().to_string(),
            key: report.key.as_ref().map(ToString::to_string),
            outcome: report.outcome.label(),
            size_bytes: report.size,
            content_type: report.content_type.clone(),
            error: match &report.outcome {
                Outcome::Failed(reason) => Some(reason.clone()),
                _ => None,
            },
        }
    }
}

impl UploadOutput {
    fn new(summary: &SyncSummary, dry_run: bool) -> Self {
        let bytes_written = summary.bytes_written();
        Self {
            status: if summary.has_failures() {
                "partial"
            } else {
                "success"
            },
            dry_run,
            files: summary.reports.iter().map(FileEntry::from).collect(),
            created: summary.created(),
            updated: summary.updated(),
            up_to_date: summary.up_to_date(),
            ignored: summary.ignored(),
            failed: summary.failed(),
            total: summary.total(),
            bytes_written,
            bytes_written_human: humansize::format_size(bytes_written, humansize::BINARY),
        }
    }
}

/// A line printed for one finished file
#[derive(Debug, Clone, PartialEq, Eq)]
enum ReportLine {
    Info(String),
    Error(String),
}

fn report_line(report: &FileReport, dry_run: bool) -> ReportLine {
    let name = report.display_name();
    let details = details(report);

    match &report.outcome {
        Outcome::Skipped(SkipReason::Ignored) => {
            ReportLine::Info(format!("Ignoring {}", report.path.display()))
        }
        Outcome::Skipped(SkipReason::UpToDate) => ReportLine::Info(format!(
            "File {name} already exists and is up to date. Skipping."
        )),
        Outcome::Created if dry_run => {
            ReportLine::Info(format!("Would upload new file {name}{details}"))
        }
        Outcome::Created => ReportLine::Info(format!("Uploaded new file {name}{details}")),
        Outcome::Updated if dry_run => {
            ReportLine::Info(format!("Would update changed file {name}{details}"))
        }
        Outcome::Updated => ReportLine::Info(format!("Updated changed file {name}{details}")),
        Outcome::Failed(reason) => ReportLine::Error(format!("Error uploading {name}: {reason}")),
    }
}

fn details(report: &FileReport) -> String {
    let size = report
        .size
        .map(|s| humansize::format_size(s, humansize::BINARY));
    match (size, report.content_type.as_deref()) {
        (Some(size), Some(content_type)) => format!(" ({size}, {content_type})"),
        (Some(size), None) => format!(" ({size})"),
        (None, Some(content_type)) => format!(" ({content_type})"),
        (None, None) => String::new(),
    }
}

fn summary_table(summary: &SyncSummary, dry_run: bool) -> Table {
    let written = if dry_run { "Would write" } else { "Written" };
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Result", "Files"]);
    table.add_row(vec!["Created".to_string(), summary.created().to_string()]);
    table.add_row(vec!["Updated".to_string(), summary.updated().to_string()]);
    table.add_row(vec![
        "Up to date".to_string(),
        summary.up_to_date().to_string(),
    ]);
    table.add_row(vec!["Ignored".to_string(), summary.ignored().to_string()]);
    table.add_row(vec!["Failed".to_string(), summary.failed().to_string()]);
    table.add_row(vec!["Total".to_string(), summary.total().to_string()]);
    table.add_row(vec![
        written.to_string(),
        humansize::format_size(summary.bytes_written(), humansize::BINARY),
    ]);
    table
}

/// Run an upload against `store`
pub async fn execute<S>(store: &S, args: UploadArgs, formatter: &Formatter) -> ExitCode
where
    S: ObjectStore + ?Sized,
{
    let UploadArgs {
        path,
        base_path,
        ignore,
        jobs,
        dry_run,
    } = args;

    if !path.exists() {
        formatter.fatal(&[format!("Invalid path: {}", path.display()).as_str()]);
        return ExitCode::NotFound;
    }

    tracing::debug!(
        "Uploading {} relative to {} with {jobs} job(s)",
        path.display(),
        base_path.display()
    );

    let reconciler = Reconciler::new(store, ignore).dry_run(dry_run);
    let progress = ProgressBar::spinner(formatter.config(), "Uploading");

    let result = walk_and_reconcile(&reconciler, &path, &base_path, jobs, |report| {
        progress.suspend(|| print_report(formatter, report, dry_run));
        progress.inc();
    })
    .await;

    progress.finish_and_clear();

    let summary = match result {
        Ok(summary) => summary,
        Err(e @ Error::InvalidPath(_)) => {
            formatter.fatal(&[format!("Invalid path: {}", path.display()).as_str()]);
            tracing::debug!("{e}");
            return ExitCode::NotFound;
        }
        Err(e) => {
            formatter.error(&format!("Failed to upload {}: {e}", path.display()));
            return ExitCode::from_error(&e);
        }
    };

    finish(formatter, &summary, &path, dry_run)
}

fn print_report(formatter: &Formatter, report: &FileReport, dry_run: bool) {
    match report_line(report, dry_run) {
        ReportLine::Info(line) => formatter.println(&line),
        ReportLine::Error(line) => formatter.error(&line),
    }
}

fn finish(formatter: &Formatter, summary: &SyncSummary, path: &Path, dry_run: bool) -> ExitCode {
    if formatter.is_json() {
        formatter.json(&UploadOutput::new(summary, dry_run));
    } else if path.is_dir() {
        formatter.println(&summary_table(summary, dry_run).to_string());
    }

    if summary.has_failures() {
        ExitCode::GeneralError
    } else {
        ExitCode::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use r2sync_core::ObjectKey;

    fn report(outcome: Outcome) -> FileReport {
        FileReport {
            path: PathBuf::from("site/index.html"),
            key: Some(ObjectKey::new("site/index.html")),
            outcome,
            size: Some(2048),
            content_type: Some("text/html".into()),
        }
    }

    #[test]
    fn test_report_line_up_to_date() {
        let line = report_line(&report(Outcome::Skipped(SkipReason::UpToDate)), false);
        assert_eq!(
            line,
            ReportLine::Info(
                "File site/index.html already exists and is up to date. Skipping.".into()
            )
        );
    }

    #[test]
    fn test_report_line_ignored_uses_local_path() {
        let mut r = report(Outcome::Skipped(SkipReason::Ignored));
        r.path = PathBuf::from("site/.DS_Store");
        let line = report_line(&r, false);
        assert_eq!(line, ReportLine::Info("Ignoring site/.DS_Store".into()));
    }

    #[test]
    fn test_report_line_created_and_dry_run() {
        let created = report(Outcome::Created);
        assert_eq!(
            report_line(&created, false),
            ReportLine::Info("Uploaded new file site/index.html (2 KiB, text/html)".into())
        );
        assert_eq!(
            report_line(&created, true),
            ReportLine::Info("Would upload new file site/index.html (2 KiB, text/html)".into())
        );
    }

    #[test]
    fn test_report_line_updated_without_content_type() {
        let mut r = report(Outcome::Updated);
        r.content_type = None;
        assert_eq!(
            report_line(&r, false),
            ReportLine::Info("Updated changed file site/index.html (2 KiB)".into())
        );
    }

    #[test]
    fn test_report_line_failure_without_key() {
        let r = FileReport::failed(Path::new("/elsewhere/a.txt"), None, "outside base");
        assert_eq!(
            report_line(&r, false),
            ReportLine::Error("Error uploading /elsewhere/a.txt: outside base".into())
        );
    }

    #[test]
    fn test_upload_output_counts() {
        let summary = SyncSummary {
            reports: vec![
                report(Outcome::Created),
                report(Outcome::Skipped(SkipReason::UpToDate)),
                report(Outcome::Failed("denied".into())),
            ],
        };
        let output = UploadOutput::new(&summary, false);
        assert_eq!(output.status, "partial");
        assert_eq!(output.created, 1);
        assert_eq!(output.up_to_date, 1);
        assert_eq!(output.failed, 1);
        assert_eq!(output.total, 3);
        assert_eq!(output.bytes_written, 2048);
        assert_eq!(output.files[2].error.as_deref(), Some("denied"));

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["files"][0]["outcome"], "created");
        assert!(json["files"][0].get("error").is_none());
    }

    #[test]
    fn test_summary_table_rows() {
        let summary = SyncSummary {
            reports: vec![report(Outcome::Updated)],
        };
        let rendered = summary_table(&summary, true).to_string();
        assert!(rendered.contains("Updated"));
        assert!(rendered.contains("Would write"));
        assert!(rendered.contains("2 KiB"));
    }
}

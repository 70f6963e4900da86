//! delete mode - Remove an object, or a folder and everything under it

use r2sync_core::{DeleteOutcome, DeleteReport, DeleteSummary, Deleter, ObjectStore};
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, ProgressBar};

#[derive(Debug, Serialize)]
struct DeleteOutput {
    status: &'static str,
    dry_run: bool,
    deleted: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failed: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    listing_error: Option<String>,
    total: usize,
}

impl DeleteOutput {
    fn new(summary: &DeleteSummary, dry_run: bool) -> Self {
        let (deleted, failed): (Vec<_>, Vec<_>) = summary
            .reports
            .iter()
            .partition(|r| r.outcome == DeleteOutcome::Deleted);
        let deleted: Vec<String> = deleted.iter().map(|r| r.key.to_string()).collect();
        let failed: Vec<String> = failed.iter().map(|r| r.key.to_string()).collect();

        Self {
            status: if summary.has_failures() {
                "partial"
            } else {
                "success"
            },
            dry_run,
            total: deleted.len(),
            deleted,
            failed: if failed.is_empty() { None } else { Some(failed) },
            listing_error: summary.listing_error.clone(),
        }
    }
}

fn report_line(report: &DeleteReport, dry_run: bool) -> Result<String, String> {
    let what = if report.marker {
        "folder marker "
    } else {
        ""
    };
    match &report.outcome {
        DeleteOutcome::Deleted if dry_run => Ok(format!("Would delete {what}{}", report.key)),
        DeleteOutcome::Deleted => Ok(format!("Deleted {what}{}", report.key)),
        DeleteOutcome::Failed(reason) => {
            Err(format!("Failed to delete {what}{}: {reason}", report.key))
        }
    }
}

/// Delete `path` from `store`
///
/// A path ending in `/` removes every object under that folder and then the
/// folder marker itself.
pub async fn execute<S>(store: &S, path: &str, dry_run: bool, formatter: &Formatter) -> ExitCode
where
    S: ObjectStore + ?Sized,
{
    let deleter = Deleter::new(store).dry_run(dry_run);
    let progress = ProgressBar::spinner(formatter.config(), "Deleting");

    let result = deleter
        .delete(path, |report| {
            progress.suspend(|| match report_line(report, dry_run) {
                Ok(line) => formatter.println(&line),
                Err(line) => formatter.error(&line),
            });
            progress.inc();
        })
        .await;

    progress.finish_and_clear();

    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            formatter.fatal(&[format!("Error: {e}").as_str()]);
            return ExitCode::from_error(&e);
        }
    };

    if let Some(reason) = &summary.listing_error {
        formatter.error(&format!("Failed to list objects under {path}: {reason}"));
    }

    if formatter.is_json() {
        formatter.json(&DeleteOutput::new(&summary, dry_run));
    } else if !dry_run && summary.reports.len() > 1 {
        formatter.success(&format!("Removed {} object(s).", summary.deleted()));
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

    fn report(key: &str, outcome: DeleteOutcome, marker: bool) -> DeleteReport {
        DeleteReport {
            key: ObjectKey::new(key),
            outcome,
            marker,
        }
    }

    #[test]
    fn test_report_lines() {
        let deleted = report("images/a.png", DeleteOutcome::Deleted, false);
        assert_eq!(
            report_line(&deleted, false),
            Ok("Deleted images/a.png".to_string())
        );
        assert_eq!(
            report_line(&deleted, true),
            Ok("Would delete images/a.png".to_string())
        );

        let marker = report("images/", DeleteOutcome::Deleted, true);
        assert_eq!(
            report_line(&marker, false),
            Ok("Deleted folder marker images/".to_string())
        );

        let failed = report("images/b.png", DeleteOutcome::Failed("denied".into()), false);
        assert_eq!(
            report_line(&failed, false),
            Err("Failed to delete images/b.png: denied".to_string())
        );
    }

    #[test]
    fn test_delete_output() {
        let summary = DeleteSummary {
            reports: vec![
                report("images/a.png", DeleteOutcome::Deleted, false),
                report("images/b.png", DeleteOutcome::Failed("denied".into()), false),
                report("images/", DeleteOutcome::Deleted, true),
            ],
            listing_error: None,
        };
        let output = DeleteOutput::new(&summary, false);
        assert_eq!(output.status, "partial");
        assert_eq!(output.deleted, vec!["images/a.png", "images/"]);
        assert_eq!(output.failed, Some(vec!["images/b.png".to_string()]));
        assert_eq!(output.total, 2);
    }

    #[test]
    fn test_delete_output_listing_error() {
        let summary = DeleteSummary {
            reports: vec![report("images/", DeleteOutcome::Deleted, true)],
            listing_error: Some("timed out".into()),
        };
        let output = DeleteOutput::new(&summary, false);
        assert_eq!(output.status, "partial");
        assert!(output.failed.is_none());

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["listing_error"], "timed out");
    }
}

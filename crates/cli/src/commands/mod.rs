//! CLI definition and execution
//!
//! r2sync is a single command: the flags select upload or delete mode.

use std::path::PathBuf;

use clap::Parser;
use clap_complete::Shell;
use r2sync_core::{IgnoreRules, SettingsManager, StoreIdentity};
use r2sync_s3::R2Client;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

pub mod completions;
pub mod delete;
pub mod upload;

/// Printed when neither upload nor delete mode is fully specified
pub const USAGE_HINT: &str =
    "Please choose to upload (-u together with -b <base_path>) or delete (-d)";

/// r2sync - mirror local files into a Cloudflare R2 bucket
///
/// Uploads only files whose contents differ from the bucket copy, and
/// deletes single objects or whole folders.
/// Credentials come from the CLOUDFLARE_* environment variables or a .env file.
#[derive(Parser, Debug)]
#[command(name = "r2sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a file or directory to upload, or the object key/folder (ending in /) to delete
    #[arg(required_unless_present = "completions")]
    pub path: Option<String>,

    /// Local base path mirrored into the bucket (required for upload).
    /// With a trailing slash its contents land at the bucket root; without
    /// one, keys start with the base directory's own name.
    #[arg(short = 'b', long = "base_path", visible_alias = "base-path", value_name = "PATH")]
    pub base_path: Option<PathBuf>,

    /// Upload the file or directory
    #[arg(short, long)]
    pub upload: bool,

    /// Delete the object, or every object under a folder path ending in /
    #[arg(short, long)]
    pub delete: bool,

    /// Show what would change without writing or deleting anything
    #[arg(long)]
    pub dry_run: bool,

    /// Extra basename glob to skip when uploading (repeatable)
    #[arg(long = "ignore", value_name = "PATTERN")]
    pub ignore: Vec<String>,

    /// Number of files to upload at once
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Output format: human-readable or JSON
    #[arg(long, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, default_value = "false")]
    pub no_color: bool,

    /// Disable progress display
    #[arg(long, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, default_value = "false")]
    pub debug: bool,

    /// Print a shell completion script and exit
    #[arg(long, value_enum, value_name = "SHELL", exclusive = true)]
    pub completions: Option<Shell>,
}

/// What the flags ask for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Upload { base_path: PathBuf },
    Delete,
    Usage,
}

impl Cli {
    /// Resolve the mode; upload wins when both are given with a base path
    pub fn mode(&self) -> Mode {
        match (&self.base_path, self.upload, self.delete) {
            (Some(base_path), true, _) => Mode::Upload {
                base_path: base_path.clone(),
            },
            (_, _, true) => Mode::Delete,
            _ => Mode::Usage,
        }
    }

    fn output_config(&self) -> OutputConfig {
        OutputConfig {
            json: self.json,
            no_color: self.no_color,
            no_progress: self.no_progress,
            quiet: self.quiet,
        }
    }
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    if let Some(shell) = cli.completions {
        return completions::execute(shell);
    }

    let formatter = Formatter::new(cli.output_config());

    let settings = match SettingsManager::new().and_then(|m| m.load()) {
        Ok(settings) => settings,
        Err(e) => {
            formatter.fatal(&[format!("Error: {e}").as_str()]);
            return ExitCode::from_error(&e);
        }
    };
    let formatter = Formatter::new(cli.output_config().with_defaults(&settings.defaults));

    let identity = match StoreIdentity::from_env() {
        Ok(identity) => identity,
        Err(e) => {
            formatter.fatal(&[
                format!("Error: {e}").as_str(),
                "Please ensure all required environment variables are set.",
            ]);
            return ExitCode::from_error(&e);
        }
    };

    let mode = cli.mode();
    if mode == Mode::Usage {
        formatter.fatal(&[USAGE_HINT]);
        return ExitCode::UsageError;
    }

    let jobs = cli.jobs.unwrap_or(settings.sync.jobs);
    if jobs == 0 {
        formatter.fatal(&["Error: --jobs must be at least 1"]);
        return ExitCode::UsageError;
    }

    let ignore = match IgnoreRules::new(settings.sync.ignore.iter().chain(cli.ignore.iter())) {
        Ok(rules) => rules,
        Err(e) => {
            formatter.fatal(&[format!("Error: {e}").as_str()]);
            return ExitCode::from_error(&e);
        }
    };

    let client = match R2Client::new(&identity).await {
        Ok(client) => client,
        Err(e) => {
            formatter.error(&format!("Failed to create R2 client: {e}"));
            return ExitCode::ClientError;
        }
    };

    // `path` is only absent together with --completions, handled above.
    let path = cli.path.unwrap_or_default();

    match mode {
        Mode::Upload { base_path } => {
            let args = upload::UploadArgs {
                path: PathBuf::from(path),
                base_path,
                ignore,
                jobs,
                dry_run: cli.dry_run,
            };
            upload::execute(&client, args, &formatter).await
        }
        Mode::Delete => delete::execute(&client, &path, cli.dry_run, &formatter).await,
        Mode::Usage => ExitCode::UsageError,
    }
}

//! Offline tests for the r2sync binary
//!
//! Every case here stops before the first request to the store, so no bucket
//! is needed. Each run gets its own working directory and a settings path
//! that doesn't exist, so a developer's `.env` or config file can't leak in.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const CLOUDFLARE_VARS: [&str; 5] = [
    "CLOUDFLARE_ACCOUNT_ID",
    "CLOUDFLARE_ACCESS_KEY_ID",
    "CLOUDFLARE_SECRET_ACCESS_KEY",
    "CLOUDFLARE_BUCKET_NAME",
    "CLOUDFLARE_ENDPOINT",
];

fn command(workdir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_r2sync"));
    cmd.current_dir(workdir)
        .env("R2SYNC_CONFIG", workdir.join("missing-config.toml"))
        .env_remove("RUST_LOG");
    for var in CLOUDFLARE_VARS {
        cmd.env_remove(var);
    }
    cmd
}

fn with_identity(cmd: &mut Command) -> &mut Command {
    cmd.env("CLOUDFLARE_ACCOUNT_ID", "0123456789abcdef")
        .env("CLOUDFLARE_ACCESS_KEY_ID", "test-access-key")
        .env("CLOUDFLARE_SECRET_ACCESS_KEY", "test-secret-key")
        .env("CLOUDFLARE_BUCKET_NAME", "test-bucket")
        .env("CLOUDFLARE_ENDPOINT", "http://127.0.0.1:9")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_missing_configuration() {
    let dir = TempDir::new().unwrap();
    let output = command(dir.path())
        .args(["site", "-u", "-b", "site"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let out = stdout(&output);
    assert!(out.contains("CLOUDFLARE_ACCESS_KEY_ID"), "stdout: {out}");
    assert!(out.contains("Please ensure all required environment variables are set."));
}

#[test]
fn test_configuration_from_dotenv_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(".env"),
        "CLOUDFLARE_ACCOUNT_ID=abc\n\
         CLOUDFLARE_ACCESS_KEY_ID=key\n\
         CLOUDFLARE_SECRET_ACCESS_KEY=secret\n\
         CLOUDFLARE_BUCKET_NAME=bucket\n\
         CLOUDFLARE_ENDPOINT=http://127.0.0.1:9\n",
    )
    .unwrap();

    // Configuration is accepted, so the run reaches the mode check
    let output = command(dir.path()).arg("site").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).contains("Please choose to upload"));
}

#[test]
fn test_usage_hint_without_mode() {
    let dir = TempDir::new().unwrap();
    let output = with_identity(&mut command(dir.path()))
        .arg("site")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).contains("Please choose to upload"));
}

#[test]
fn test_upload_without_base_path_is_usage() {
    let dir = TempDir::new().unwrap();
    let output = with_identity(&mut command(dir.path()))
        .args(["site", "-u"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).contains("Please choose to upload"));
}

#[test]
fn test_upload_invalid_path() {
    let dir = TempDir::new().unwrap();
    let output = with_identity(&mut command(dir.path()))
        .args(["does-not-exist", "-u", "-b", "."])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(5));
    assert!(stdout(&output).contains("Invalid path: does-not-exist"));
}

#[test]
fn test_delete_whole_bucket_refused() {
    let dir = TempDir::new().unwrap();
    let output = with_identity(&mut command(dir.path()))
        .args(["/", "-d"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(5));
    assert!(stdout(&output).contains("whole bucket"));
}

#[test]
fn test_invalid_settings_file() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "schema_version = 99\n").unwrap();

    let output = with_identity(&mut command(dir.path()))
        .env("R2SYNC_CONFIG", &config)
        .args(["site", "-d"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).contains("newer than supported"));
}

#[test]
fn test_zero_jobs_rejected() {
    let dir = TempDir::new().unwrap();
    let output = with_identity(&mut command(dir.path()))
        .args(["site", "-u", "-b", ".", "-j", "0"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_completions() {
    let dir = TempDir::new().unwrap();
    let output = command(dir.path())
        .args(["--completions", "bash"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(stdout(&output).contains("r2sync"));
}

#[test]
fn test_help() {
    let dir = TempDir::new().unwrap();
    let output = command(dir.path()).arg("--help").output().unwrap();

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("--base_path"));
    assert!(out.contains("--dry-run"));
}

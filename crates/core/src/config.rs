//! Configuration management
//!
//! Two sources feed a run:
//! - the store identity, read from `CLOUDFLARE_*` environment variables
//!   (optionally seeded from a `.env` file in the working directory)
//! - an optional settings file in TOML format at `$R2SYNC_CONFIG` or
//!   `~/.config/r2sync/config.toml`, holding ignore patterns and output defaults

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable holding the Cloudflare account ID
pub const ENV_ACCOUNT_ID: &str = "CLOUDFLARE_ACCOUNT_ID";
/// Environment variable holding the R2 access key ID
pub const ENV_ACCESS_KEY_ID: &str = "CLOUDFLARE_ACCESS_KEY_ID";
/// Environment variable holding the R2 secret access key
pub const ENV_SECRET_ACCESS_KEY: &str = "CLOUDFLARE_SECRET_ACCESS_KEY";
/// Environment variable holding the bucket name
pub const ENV_BUCKET_NAME: &str = "CLOUDFLARE_BUCKET_NAME";
/// Environment variable holding the S3 endpoint URL
pub const ENV_ENDPOINT: &str = "CLOUDFLARE_ENDPOINT";

/// Environment variable overriding the settings file location
pub const ENV_SETTINGS_PATH: &str = "R2SYNC_CONFIG";

/// All variables a `StoreIdentity` is built from, in reporting order
pub const REQUIRED_ENV_VARS: [&str; 5] = [
    ENV_ACCOUNT_ID,
    ENV_ACCESS_KEY_ID,
    ENV_SECRET_ACCESS_KEY,
    ENV_BUCKET_NAME,
    ENV_ENDPOINT,
];

/// Current settings schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Basename ignored when no settings file overrides it
pub const DEFAULT_IGNORE: &str = ".DS_Store";

const DEFAULT_OUTPUT: &str = "human";
const DEFAULT_COLOR: &str = "auto";

/// Credentials and bucket coordinates for a single R2 bucket
///
/// Every field is required and non-empty. The value is immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct StoreIdentity {
    account_id: String,
    access_key_id: String,
    secret_access_key: String,
    bucket_name: String,
    endpoint_url: String,
}

impl StoreIdentity {
    /// Build the identity from the process environment
    ///
    /// A `.env` file in the working directory is loaded first; variables
    /// already set in the environment take precedence over it.
    pub fn from_env() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!("Ignoring unreadable .env file: {e}"),
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the identity from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut read = |name: &'static str| -> String {
            match lookup(name).map(|v| v.trim().to_string()) {
                Some(value) if !value.is_empty() => value,
                _ => {
                    missing.push(name);
                    String::new()
                }
            }
        };

        let account_id = read(ENV_ACCOUNT_ID);
        let access_key_id = read(ENV_ACCESS_KEY_ID);
        let secret_access_key = read(ENV_SECRET_ACCESS_KEY);
        let bucket_name = read(ENV_BUCKET_NAME);
        let endpoint_url = read(ENV_ENDPOINT);

        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "Missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        url::Url::parse(&endpoint_url)?;

        Ok(Self {
            account_id,
            access_key_id,
            secret_access_key,
            bucket_name,
            endpoint_url,
        })
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }
}

impl fmt::Debug for StoreIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreIdentity")
            .field("account_id", &self.account_id)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("bucket_name", &self.bucket_name)
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}

/// Settings file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for forward compatibility checks
    pub schema_version: u32,

    /// Output preferences
    #[serde(default)]
    pub defaults: Defaults,

    /// Upload behavior
    #[serde(default)]
    pub sync: SyncSettings,
}

/// Default settings for CLI output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    /// Output format: "human" or "json"
    #[serde(default = "default_output")]
    pub output: String,

    /// Color mode: "auto", "always", or "never"
    #[serde(default = "default_color")]
    pub color: String,

    /// Show progress bars
    #[serde(default = "default_true")]
    pub progress: bool,
}

/// Settings that shape an upload run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Basename glob patterns that are never uploaded
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,

    /// Number of files reconciled at once
    #[serde(default = "default_jobs")]
    pub jobs: usize,
}

fn default_output() -> String {
    DEFAULT_OUTPUT.to_string()
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_true() -> bool {
    true
}

fn default_ignore() -> Vec<String> {
    vec![DEFAULT_IGNORE.to_string()]
}

fn default_jobs() -> usize {
    1
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            progress: true,
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            ignore: default_ignore(),
            jobs: default_jobs(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            defaults: Defaults::default(),
            sync: SyncSettings::default(),
        }
    }
}

/// Locates and loads the settings file
#[derive(Debug)]
pub struct SettingsManager {
    settings_path: PathBuf,
}

impl SettingsManager {
    /// Create a manager for `$R2SYNC_CONFIG` or the default location
    pub fn new() -> Result<Self> {
        if let Some(path) = std::env::var_os(ENV_SETTINGS_PATH) {
            return Ok(Self::with_path(PathBuf::from(path)));
        }
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not determine config directory".into()))?;
        Ok(Self::with_path(config_dir.join("r2sync").join("config.toml")))
    }

    /// Create a manager with a custom path (useful for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            settings_path: path,
        }
    }

    /// Get the settings file path
    pub fn settings_path(&self) -> &PathBuf {
        &self.settings_path
    }

    /// Load settings from disk
    ///
    /// A missing file yields the default settings.
    pub fn load(&self) -> Result<Settings> {
        if !self.settings_path.exists() {
            return Ok(Settings::default());
        }

        let content = std::fs::read_to_string(&self.settings_path)?;
        let settings: Settings = toml::from_str(&content)?;

        if settings.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Settings file version {} is newer than supported version {}. Please upgrade r2sync.",
                settings.schema_version, SCHEMA_VERSION
            )));
        }
        if settings.sync.jobs == 0 {
            return Err(Error::Config("sync.jobs must be at least 1".into()));
        }

        Ok(settings)
    }
}

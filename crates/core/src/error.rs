//! Error types for r2sync-core
//!
//! Fatal conditions (configuration, invalid local paths) are `Error`s.
//! Per-file results of a sync or delete run are reported as outcomes, not errors.

use thiserror::Error;

/// Result type alias for r2sync-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for r2sync-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Required configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid local path or key
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Invalid ignore pattern
    #[error("Invalid ignore pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Authentication or permission failure
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network or transport error
    #[error("Network error: {0}")]
    Network(String),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_)
            | Error::InvalidUrl(_)
            | Error::TomlParse(_)
            | Error::Pattern(_) => 2, // UsageError
            Error::Network(_) => 3,  // ClientError
            Error::Auth(_) => 4,     // AuthError
            Error::InvalidPath(_) | Error::NotFound(_) => 5, // NotFound
            _ => 1,                  // GeneralError
        }
    }

    /// Whether this error came from configuration loading
    pub const fn is_config(&self) -> bool {
        matches!(
            self,
            Error::Config(_) | Error::InvalidUrl(_) | Error::TomlParse(_) | Error::Pattern(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(Error::Config("test".into()).exit_code(), 2);
        assert_eq!(Error::Network("test".into()).exit_code(), 3);
        assert_eq!(Error::Auth("test".into()).exit_code(), 4);
        assert_eq!(Error::InvalidPath("test".into()).exit_code(), 5);
        assert_eq!(Error::NotFound("test".into()).exit_code(), 5);
        assert_eq!(Error::General("test".into()).exit_code(), 1);
    }

    #[test]
    fn test_error_display() {
        let err = Error::Config("missing CLOUDFLARE_BUCKET_NAME".into());
        assert_eq!(
            err.to_string(),
            "Configuration error: missing CLOUDFLARE_BUCKET_NAME"
        );

        let err = Error::InvalidPath("/bad/path".into());
        assert_eq!(err.to_string(), "Invalid path: /bad/path");
    }

    #[test]
    fn test_is_config() {
        assert!(Error::Config("x".into()).is_config());
        assert!(Error::InvalidUrl(url::ParseError::EmptyHost).is_config());
        assert!(!Error::Network("x".into()).is_config());
    }
}

//! Exit code definitions for r2sync
//!
//! Scripts rely on these values; changing one is a breaking change.

/// Exit codes for the r2sync CLI application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Every file or key was handled successfully
    Success = 0,

    /// At least one file or key failed; the rest of the run completed
    GeneralError = 1,

    /// Invalid arguments, missing mode, or missing configuration
    UsageError = 2,

    /// The store client could not be set up
    ClientError = 3,

    /// Authentication or permission failure
    AuthError = 4,

    /// The local path to upload does not exist
    NotFound = 5,
}

impl ExitCode {
    /// Convert exit code to i32 for use with std::process::exit
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Create exit code from i32 value
    ///
    /// Returns None if the value doesn't correspond to a known exit code.
    pub const fn from_i32(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Success),
            1 => Some(Self::GeneralError),
            2 => Some(Self::UsageError),
            3 => Some(Self::ClientError),
            4 => Some(Self::AuthError),
            5 => Some(Self::NotFound),
            _ => None,
        }
    }

    /// Exit code for a fatal core error
    pub fn from_error(err: &r2sync_core::Error) -> Self {
        Self::from_i32(err.exit_code()).unwrap_or(Self::GeneralError)
    }

    /// Get a human-readable description of the exit code
    pub const fn description(self) -> &'static str {
        match self {
            Self::Success => "Operation completed successfully",
            Self::GeneralError => "Some files or keys failed",
            Self::UsageError => "Invalid arguments or configuration",
            Self::ClientError => "Could not set up the store client",
            Self::AuthError => "Authentication or permission failure",
            Self::NotFound => "Local path not found",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.as_i32()
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_i32())
    }
}

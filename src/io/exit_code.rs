//! Exit codes for CLI operations following Unix conventions.
//!
//! # Exit Code Semantics
//!
//! - `0`: Success - operation completed (an empty result is still success)
//! - `1`: General error - unspecified failure
//! - `2`: Blocking error - critical failure that should halt automation
//! - `3-125`: Specific recoverable errors
//! - `126-255`: Reserved by shell

use crate::error::AnalysisError;

/// Standard exit codes for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Operation succeeded (code 0)
    Success = 0,

    /// Unspecified error occurred (code 1)
    GeneralError = 1,

    /// Critical error that should halt automation (code 2)
    BlockingError = 2,

    /// Nothing stored for the request, e.g. a scope never clustered (code 3)
    NotFound = 3,

    /// A parameter was out of range (code 4)
    InvalidInput = 4,

    /// Too few embeddings for the requested clustering (code 5)
    InsufficientData = 5,

    /// Embedding or naming provider failed (code 6)
    ServiceUnavailable = 6,

    /// Snapshot or cluster files unreadable or unwritable (code 7)
    StorageError = 7,

    /// Configuration error (code 8)
    ConfigError = 8,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl ExitCode {
    /// Convert an `AnalysisError` to the appropriate exit code.
    ///
    /// Maps specific error types to semantic exit codes that scripts
    /// can use to determine appropriate recovery actions.
    pub fn from_error(error: &AnalysisError) -> Self {
        match error {
            AnalysisError::Validation { .. } => ExitCode::InvalidInput,
            AnalysisError::InsufficientData { .. } => ExitCode::InsufficientData,
            AnalysisError::ExternalService { .. } => ExitCode::ServiceUnavailable,
            AnalysisError::Storage { .. } => ExitCode::StorageError,
            AnalysisError::Computation { .. } => ExitCode::BlockingError,
        }
    }

    /// Check if this exit code indicates a blocking error.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        matches!(self, ExitCode::BlockingError)
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode::Success)
    }

    /// Get a human-readable description of the exit code.
    pub fn description(&self) -> &str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::GeneralError => "General error",
            ExitCode::BlockingError => "Blocking error - automation should halt",
            ExitCode::NotFound => "Not found",
            ExitCode::InvalidInput => "Invalid input",
            ExitCode::InsufficientData => "Insufficient data",
            ExitCode::ServiceUnavailable => "External service unavailable",
            ExitCode::StorageError => "Storage error",
            ExitCode::ConfigError => "Configuration error",
        }
    }
}

//! Error types for the analysis engine
//!
//! This module provides structured error types using thiserror. Every
//! variant carries enough detail (counts, thresholds, field names) for a
//! caller to act on it without reading logs.

use thiserror::Error;

/// Main error type for clustering, gap detection and search.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Malformed or out-of-range configuration, rejected before any work starts
    #[error("Invalid value for '{field}': {reason}")]
    Validation { field: &'static str, reason: String },

    /// Not enough embeddings to satisfy the requested minimum cluster size
    #[error(
        "Not enough embeddings to cluster: found {actual}, need at least {required} (2 x min cluster size)"
    )]
    InsufficientData { actual: usize, required: usize },

    /// Naming or embedding provider failure
    #[error("External service '{service}' failed: {reason}")]
    ExternalService {
        service: &'static str,
        reason: String,
    },

    /// Unexpected internal failure, e.g. dimension mismatch across the corpus
    #[error("Computation failed: {reason}")]
    Computation { reason: String },

    /// Snapshot or cluster store failure
    #[error("Storage error: {message}\nSuggestion: {suggestion}")]
    Storage { message: String, suggestion: String },
}

impl AnalysisError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub fn computation(reason: impl Into<String>) -> Self {
        Self::Computation {
            reason: reason.into(),
        }
    }

    pub fn storage(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON responses
    /// for programmatic error handling.
    pub fn status_code(&self) -> String {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::InsufficientData { .. } => "INSUFFICIENT_DATA",
            Self::ExternalService { .. } => "EXTERNAL_SERVICE_ERROR",
            Self::Computation { .. } => "COMPUTATION_ERROR",
            Self::Storage { .. } => "STORAGE_ERROR",
        }
        .to_string()
    }

    /// Whether the message is safe to show to the caller verbatim.
    ///
    /// Computation and storage failures may describe internal state and are
    /// reported through [`AnalysisError::public_message`] instead.
    pub fn is_caller_facing(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::InsufficientData { .. } | Self::ExternalService { .. }
        )
    }

    /// Message suitable for an API boundary.
    pub fn public_message(&self) -> String {
        if self.is_caller_facing() {
            self.to_string()
        } else {
            "Internal error while analysing embeddings".to_string()
        }
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::Validation { .. } => vec![
                "Check the value against the documented range in settings.toml",
                "Run 'citelens config' to see the active settings",
            ],
            Self::InsufficientData { .. } => vec![
                "Lower min_cluster_size",
                "Add more articles (or their citation neighbours) to the scope",
            ],
            Self::ExternalService { .. } => vec![
                "The embedding model may still be downloading, try again",
                "Increase embedding.timeout_ms if the model is slow to respond",
            ],
            Self::Storage { .. } => vec![
                "Check that the snapshot file exists and is valid JSON",
                "Check disk space and permissions for the cluster directory",
            ],
            Self::Computation { .. } => vec![],
        }
    }
}

/// Result type alias for analysis operations
pub type AnalysisResult<T> = Result<T, AnalysisError>;

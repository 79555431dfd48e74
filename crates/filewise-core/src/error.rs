// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Filewise recommendation core.

use thiserror::Error;

/// The primary error type used across all Filewise crates.
///
/// Model-level failures never surface as this type past the model registry;
/// they are absorbed into empty candidate lists. What reaches a caller is
/// either a validation problem, a deadline, or a failure of the core's own
/// shared state.
#[derive(Debug, Error)]
pub enum FilewiseError {
    /// Malformed event, query, or vector, rejected before touching shared state.
    #[error("validation error: {0}")]
    Validation(String),

    /// A required entity does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    /// The call deadline (or a collaborator timeout) expired.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// The core's own storage could not serve the request (e.g. a bound was hit).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An external collaborator (embedding provider, backend model) failed.
    #[error("collaborator error: {message}")]
    Collaborator {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors (invalid values, missing sections).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FilewiseError {
    /// Shorthand for a collaborator failure without an underlying source.
    pub fn collaborator(message: impl Into<String>) -> Self {
        FilewiseError::Collaborator {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a storage failure described by a message.
    pub fn storage(message: impl Into<String>) -> Self {
        let message: String = message.into();
        FilewiseError::Storage {
            source: message.into(),
        }
    }

    /// Returns true for errors caused by caller input rather than the core.
    pub fn is_validation(&self) -> bool {
        matches!(self, FilewiseError::Validation(_))
    }

    /// Returns true if this error is a deadline expiry.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FilewiseError::Timeout { .. })
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, FilewiseError>;

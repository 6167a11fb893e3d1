//! Errors produced by the selection engine.

use thiserror::Error;

/// Failure kinds of a selection run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The risk plan cannot be evaluated. Checked before anything else.
    #[error("Invalid {field}: {reason}")]
    InvalidParameters { field: &'static str, reason: String },

    /// One instrument's sizing math has no meaningful answer.
    /// Recovered per instrument; never ends a run on its own.
    #[error("Cannot size {identifier}: {reason}")]
    DegenerateSizing { identifier: String, reason: String },

    /// Nothing survived filtering and sizing.
    #[error("No candidates matched ({evaluated} evaluated, {excluded} excluded)")]
    NoCandidates { evaluated: usize, excluded: usize },
}

impl EngineError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameters {
            field,
            reason: reason.into(),
        }
    }

    pub fn degenerate(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DegenerateSizing {
            identifier: identifier.into(),
            reason: reason.into(),
        }
    }
}

/// A specialized Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

//! Core domain errors.

use thiserror::Error;

/// Core domain errors for BenchRun.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Model key not present in the registry.
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Two catalog entries share the same key.
    #[error("Duplicate model key: {0}")]
    DuplicateModel(String),

    /// Invalid state transition.
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

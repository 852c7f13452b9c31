//! Error types for document normalization.
//!
//! Per-item problems in the raw store (a dangling `$ref`, a missing or
//! ambiguous location provenance, an invalid text payload) are not errors:
//! they are logged and the item is dropped. The variants below are reserved
//! for conditions that abandon a whole run or reject an API call.

use crate::normalize::Stage;
use thiserror::Error;

/// Error type for normalization and document assembly.
#[derive(Error, Debug)]
pub enum NormalizeError {
    /// A derived index points at something that does not exist.
    ///
    /// Earlier stages guarantee that every table, figure and caption
    /// provenance index has an owning entity. Hitting this variant means that
    /// guarantee was broken, so the run is abandoned instead of patched up.
    #[error("internal consistency failure during {stage}: {reason}")]
    Consistency {
        /// Stage that detected the broken invariant
        stage: Stage,
        /// What was missing
        reason: String,
    },

    /// The raw store does not have the expected top-level shape.
    #[error("invalid raw document: {0}")]
    InvalidDocument(String),

    /// An entity handed to `append_text`/`append_table` was rejected.
    #[error("invalid entity: {0}")]
    InvalidEntity(String),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NormalizeError {
    /// Shorthand for a [`NormalizeError::Consistency`] error.
    #[inline]
    #[must_use = "creates an error that should be returned"]
    pub fn consistency(stage: Stage, reason: impl Into<String>) -> Self {
        Self::Consistency {
            stage,
            reason: reason.into(),
        }
    }
}

/// Result type alias for normalization operations
pub type Result<T> = std::result::Result<T, NormalizeError>;

//! Core error types for bookkeeper-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering
//! schema inference, field conversion and tree construction.

use thiserror::Error;

use crate::types::FieldType;

/// Core errors produced by the bookkeeper-core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A model declaration cannot be turned into a table layout.
    #[error("schema error: {reason}")]
    Schema { reason: String },

    /// A field name that the model does not declare.
    #[error("unknown field '{field}' on model {model}")]
    UnknownField { model: String, field: String },

    /// A value of the wrong kind for its field.
    #[error("type mismatch on field '{field}': expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: FieldType,
        found: &'static str,
    },

    /// A tree record whose parent never shows up in the input.
    #[error("orphan reference: record {unique_id} points to missing parent {parent_id}")]
    OrphanReference { unique_id: i64, parent_id: i64 },

    /// A tree record that cannot be placed at all.
    #[error("invalid tree record: {reason}")]
    InvalidTreeRecord { reason: String },
}

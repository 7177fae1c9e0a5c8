//! Storage error types for bookkeeper-storage.
//!
//! [`StorageError`] covers the repository contract violations (records in
//! the wrong lifecycle phase, missing keys), integrity problems found while
//! walking stored data, model/schema errors from the core crate, and raw
//! SQLite failures, which are passed through untouched.

use bookkeeper_core::{CoreError, Pk};
use thiserror::Error;

/// Errors produced by repository operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The record is in the wrong lifecycle phase for the operation:
    /// `add` with an assigned key or `update` without one.
    #[error("invalid state: cannot {operation} record with pk={pk}")]
    InvalidState { operation: &'static str, pk: Pk },

    /// No row with the given key exists.
    #[error("not found: {table} pk={pk}")]
    NotFound { table: String, pk: Pk },

    /// Stored data violates an invariant the caller relies on.
    #[error("integrity error: {reason}")]
    Integrity { reason: String },

    /// Schema inference, field conversion or filter validation failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// SQLite reported an error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

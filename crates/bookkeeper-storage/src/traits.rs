//! The [`Repository`] trait defining the storage contract for models.
//!
//! One repository serves one model type and owns that model's table. The
//! contract is built around the primary-key lifecycle:
//! - a record with `pk == 0` is new and may only be `add`ed;
//! - a record with `pk != 0` is persisted and may be `update`d;
//! - `get`, `get_all` and `delete` address rows by key or by filter.
//!
//! All backends (MemoryRepository, SqliteRepository) implement this trait
//! with identical observable behaviour.

use bookkeeper_core::{Filter, Model, Pk};

use crate::error::StorageError;

/// The storage contract for one model type.
///
/// The trait is synchronous (not async) for simplicity in the current
/// single-threaded design.
pub trait Repository<M: Model> {
    /// Inserts a new record and returns its freshly assigned key.
    ///
    /// The key is also written back into `record`. Returns
    /// [`StorageError::InvalidState`] if `record.pk()` is already assigned;
    /// nothing is stored in that case.
    fn add(&mut self, record: &mut M) -> Result<Pk, StorageError>;

    /// Retrieves a record by key. A missing key is `Ok(None)`.
    fn get(&self, pk: Pk) -> Result<Option<M>, StorageError>;

    /// Retrieves all records in insertion order, optionally narrowed to the
    /// rows where every filter field equals its value.
    ///
    /// `None` and an empty filter both return everything. Filters naming
    /// undeclared fields or carrying mistyped values are rejected.
    #[doc(alias = "scan")]
    fn get_all(&self, filter: Option<&Filter>) -> Result<Vec<M>, StorageError>;

    /// Replaces every non-key field of the stored row with the record's
    /// values.
    ///
    /// Returns [`StorageError::InvalidState`] if `record.pk()` is
    /// unassigned and [`StorageError::NotFound`] if no such row exists.
    fn update(&mut self, record: &M) -> Result<(), StorageError>;

    /// Removes a record permanently.
    ///
    /// Returns [`StorageError::NotFound`] if no such row exists.
    fn delete(&mut self, pk: Pk) -> Result<(), StorageError>;

    /// Discards every row and restarts key assignment at 1.
    fn reset(&mut self) -> Result<(), StorageError>;

    /// Number of stored records.
    fn count(&self) -> Result<usize, StorageError>;
}

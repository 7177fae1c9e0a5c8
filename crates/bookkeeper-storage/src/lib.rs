//! Storage abstraction for bookkeeper models.
//!
//! Provides the [`Repository`] trait defining the storage contract that all
//! backends implement, plus the [`MemoryRepository`] and
//! [`SqliteRepository`] as first-class backends.
//!
//! # Architecture
//!
//! A repository is generic over one [`Model`](bookkeeper_core::Model) type.
//! At construction it infers the model's table layout from the model's
//! field declaration; afterwards it serves key-addressed CRUD and
//! equality-filtered scans. All model tables of one application share a
//! single SQLite file, one table per model type.
//!
//! # Modules
//!
//! - [`error`]: StorageError enum with all failure modes
//! - [`types`]: OpenMode configuration
//! - [`traits`]: Repository trait definition
//! - [`convert`]: record decompose/recompose and SQLite value conversion
//! - [`memory`]: MemoryRepository implementation
//! - [`schema`]: SQL generation and connection setup
//! - [`sqlite`]: SqliteRepository implementation
//! - [`hierarchy`]: category parent/child queries and the category tree

pub mod convert;
pub mod error;
pub mod hierarchy;
pub mod memory;
pub mod schema;
pub mod sqlite;
pub mod traits;
pub mod types;

// Re-export key types for ergonomic use.
pub use error::StorageError;
pub use hierarchy::{
    ancestors_of, category_tree, children_of, delete_category, descendants_of, parent_of,
};
pub use memory::MemoryRepository;
pub use sqlite::SqliteRepository;
pub use traits::Repository;
pub use types::OpenMode;

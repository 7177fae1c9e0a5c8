//! In-memory implementation of [`Repository`].
//!
//! [`MemoryRepository`] is a first-class backend for tests and anywhere
//! persistence isn't needed. Rows are kept decomposed, exactly as the SQLite
//! backend stores them, so reads always return freshly built records and
//! both backends share the same conversion and filter rules.

use std::collections::BTreeMap;
use std::marker::PhantomData;

use tracing::{debug, info, warn};

use bookkeeper_core::{Filter, Model, Pk, Schema, Value};

use crate::convert::{decompose, recompose};
use crate::error::StorageError;
use crate::traits::Repository;

/// In-memory implementation of [`Repository`] for model `M`.
#[derive(Debug, Clone)]
pub struct MemoryRepository<M: Model> {
    schema: Schema,
    /// Rows keyed by pk; ascending key order is insertion order.
    rows: BTreeMap<Pk, Vec<Value>>,
    /// Last key handed out. Never goes down except on reset.
    last_pk: i64,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> MemoryRepository<M> {
    /// Creates an empty repository, inferring `M`'s schema.
    pub fn new() -> Result<Self, StorageError> {
        Ok(MemoryRepository {
            schema: Schema::of::<M>()?,
            rows: BTreeMap::new(),
            last_pk: 0,
            _model: PhantomData,
        })
    }

    /// The inferred table layout.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    fn not_found(&self, pk: Pk) -> StorageError {
        StorageError::NotFound {
            table: self.schema.table().to_string(),
            pk,
        }
    }
}

impl<M: Model> Repository<M> for MemoryRepository<M> {
    fn add(&mut self, record: &mut M) -> Result<Pk, StorageError> {
        let current = record.pk();
        if current.is_assigned() {
            warn!("{}: refusing to add record that already has pk={}", self.schema.table(), current);
            return Err(StorageError::InvalidState {
                operation: "add",
                pk: current,
            });
        }
        let values = decompose(&self.schema, record)?;

        self.last_pk += 1;
        let pk = Pk(self.last_pk);
        self.rows.insert(pk, values);
        record.set_pk(pk);
        debug!("{}: added pk={}", self.schema.table(), pk);
        Ok(pk)
    }

    fn get(&self, pk: Pk) -> Result<Option<M>, StorageError> {
        self.rows
            .get(&pk)
            .map(|values| recompose(&self.schema, pk, values.clone()))
            .transpose()
    }

    fn get_all(&self, filter: Option<&Filter>) -> Result<Vec<M>, StorageError> {
        if let Some(filter) = filter {
            filter.validate(&self.schema)?;
        }
        self.rows
            .iter()
            .filter(|(pk, values)| filter.map_or(true, |f| f.matches_row(&self.schema, **pk, values)))
            .map(|(pk, values)| recompose(&self.schema, *pk, values.clone()))
            .collect()
    }

    fn update(&mut self, record: &M) -> Result<(), StorageError> {
        let pk = record.pk();
        if !pk.is_assigned() {
            warn!("{}: refusing to update record without pk", self.schema.table());
            return Err(StorageError::InvalidState {
                operation: "update",
                pk,
            });
        }
        let values = decompose(&self.schema, record)?;
        match self.rows.get_mut(&pk) {
            Some(slot) => {
                *slot = values;
                debug!("{}: updated pk={}", self.schema.table(), pk);
                Ok(())
            }
            None => Err(self.not_found(pk)),
        }
    }

    fn delete(&mut self, pk: Pk) -> Result<(), StorageError> {
        match self.rows.remove(&pk) {
            Some(_) => {
                debug!("{}: deleted pk={}", self.schema.table(), pk);
                Ok(())
            }
            None => Err(self.not_found(pk)),
        }
    }

    fn reset(&mut self) -> Result<(), StorageError> {
        self.rows.clear();
        self.last_pk = 0;
        info!("{}: table reset", self.schema.table());
        Ok(())
    }

    fn count(&self) -> Result<usize, StorageError> {
        Ok(self.rows.len())
    }
}

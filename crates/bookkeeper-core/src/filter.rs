//! Equality filters for repository scans.
//!
//! A [`Filter`] is a conjunction of `field == value` conditions. An empty
//! filter matches every row. There are no ranges and no disjunctions.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::id::Pk;
use crate::schema::{Schema, PK_FIELD};
use crate::types::Value;

/// Conjunction of equality conditions, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter {
    conditions: IndexMap<String, Value>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the condition `field == value`.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.insert(field.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Conditions in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.conditions.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Checks every condition names a column of `schema` (or `pk`) and
    /// carries a value that column can hold.
    pub fn validate(&self, schema: &Schema) -> Result<(), CoreError> {
        for (field, value) in self.iter() {
            let ty = schema
                .column_type(field)
                .ok_or_else(|| CoreError::UnknownField {
                    model: schema.table().to_string(),
                    field: field.to_string(),
                })?;
            if !ty.accepts(value) {
                return Err(CoreError::TypeMismatch {
                    field: field.to_string(),
                    expected: ty,
                    found: value.kind(),
                });
            }
        }
        Ok(())
    }

    /// Evaluates the filter against one stored row.
    ///
    /// `values` holds the data columns of `schema` in order. Conditions on
    /// unknown fields never match; call [`Filter::validate`] first to turn
    /// them into errors.
    pub fn matches_row(&self, schema: &Schema, pk: Pk, values: &[Value]) -> bool {
        self.iter().all(|(field, expected)| {
            if field == PK_FIELD {
                return *expected == Value::from(pk);
            }
            schema
                .column_names()
                .position(|name| name == field)
                .and_then(|idx| values.get(idx))
                .is_some_and(|actual| actual == expected)
        })
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Filter {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Filter {
            conditions: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

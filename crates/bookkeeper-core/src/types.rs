//! Column types and field values.
//!
//! The store only knows two semantic column types, [`FieldType::Integer`]
//! and [`FieldType::Text`]. A [`Value`] is what travels between a model
//! field and a table cell; `Null` is admitted in either column type and
//! stands for an absent optional value.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::id::Pk;

/// Semantic type of a stored column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Integer,
    Text,
}

impl FieldType {
    /// SQL column type used in the table definition.
    pub fn sql_name(self) -> &'static str {
        match self {
            FieldType::Integer => "INTEGER",
            FieldType::Text => "TEXT",
        }
    }

    /// Returns `true` if `value` may be stored in a column of this type.
    pub fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (_, Value::Null) | (FieldType::Integer, Value::Integer(_)) | (FieldType::Text, Value::Text(_))
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

/// A single field value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Name of the value's kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Integer(_) => "INTEGER",
            Value::Text(_) => "TEXT",
        }
    }

    /// Extracts an integer for `field`, rejecting every other kind.
    pub fn into_integer(self, field: &str) -> Result<i64, CoreError> {
        match self {
            Value::Integer(v) => Ok(v),
            other => Err(CoreError::TypeMismatch {
                field: field.to_string(),
                expected: FieldType::Integer,
                found: other.kind(),
            }),
        }
    }

    /// Extracts an optional integer for `field`; `Null` maps to `None`.
    pub fn into_optional_integer(self, field: &str) -> Result<Option<i64>, CoreError> {
        match self {
            Value::Null => Ok(None),
            other => other.into_integer(field).map(Some),
        }
    }

    /// Extracts text for `field`. `Null` reads back as the empty string,
    /// the zero value of a text field.
    pub fn into_text(self, field: &str) -> Result<String, CoreError> {
        match self {
            Value::Text(v) => Ok(v),
            Value::Null => Ok(String::new()),
            other => Err(CoreError::TypeMismatch {
                field: field.to_string(),
                expected: FieldType::Text,
                found: other.kind(),
            }),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<Pk> for Value {
    fn from(pk: Pk) -> Self {
        Value::Integer(pk.0)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_fits_every_column() {
        assert!(FieldType::Integer.accepts(&Value::Null));
        assert!(FieldType::Text.accepts(&Value::Null));
        assert!(FieldType::Integer.accepts(&Value::Integer(3)));
        assert!(!FieldType::Integer.accepts(&Value::from("3")));
        assert!(!FieldType::Text.accepts(&Value::Integer(3)));
    }

    #[test]
    fn optional_conversions() {
        assert_eq!(Value::from(None::<Pk>), Value::Null);
        assert_eq!(Value::from(Some(Pk(4))), Value::Integer(4));
        assert_eq!(Value::Null.into_optional_integer("parent").unwrap(), None);
        assert_eq!(Value::Null.into_text("name").unwrap(), "");
    }

    #[test]
    fn mismatch_names_the_field() {
        let err = Value::from("abc").into_integer("amount").unwrap_err();
        match err {
            CoreError::TypeMismatch { field, expected, found } => {
                assert_eq!(field, "amount");
                assert_eq!(expected, FieldType::Integer);
                assert_eq!(found, "TEXT");
            }
            other => panic!("expected TypeMismatch, got: {:?}", other),
        }
    }

    #[test]
    fn serde_untagged() {
        assert_eq!(serde_json::to_string(&Value::Integer(5)).unwrap(), "5");
        assert_eq!(serde_json::to_string(&Value::Null).unwrap(), "null");
        let back: Value = serde_json::from_str("\"food\"").unwrap();
        assert_eq!(back, Value::from("food"));
    }
}

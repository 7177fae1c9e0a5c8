//! Decompose/recompose conversions between models and flat storage rows.
//!
//! [`decompose`] reads a record's data columns, in schema order, into a
//! `Vec<Value>`; [`recompose`] starts from `M::default()` and writes each
//! stored value back under the column name at the same position. The
//! SQLite helpers translate between [`Value`] and rusqlite's owned value.

use bookkeeper_core::{CoreError, FieldType, Model, Pk, Schema, Value};
use rusqlite::types::Value as SqlValue;

use crate::error::StorageError;

/// Extracts the data columns of `record` in schema order.
///
/// Fails if the model does not expose a declared field or hands out a value
/// of the wrong kind for its column.
pub fn decompose<M: Model>(schema: &Schema, record: &M) -> Result<Vec<Value>, StorageError> {
    let mut values = Vec::with_capacity(schema.len());
    for (name, ty) in schema.columns() {
        let value = record.field(name).ok_or_else(|| CoreError::UnknownField {
            model: schema.table().to_string(),
            field: name.to_string(),
        })?;
        if !ty.accepts(&value) {
            return Err(CoreError::TypeMismatch {
                field: name.to_string(),
                expected: ty,
                found: value.kind(),
            }
            .into());
        }
        values.push(value);
    }
    Ok(values)
}

/// Rebuilds a record from its key and data columns in schema order.
pub fn recompose<M: Model>(schema: &Schema, pk: Pk, values: Vec<Value>) -> Result<M, StorageError> {
    if values.len() != schema.len() {
        return Err(StorageError::Integrity {
            reason: format!(
                "{} row {} has {} columns, schema declares {}",
                schema.table(),
                pk,
                values.len(),
                schema.len()
            ),
        });
    }
    let mut record = M::default();
    record.set_pk(pk);
    for (name, value) in schema.column_names().zip(values) {
        record.set_field(name, value)?;
    }
    Ok(record)
}

/// Converts a field value into a SQLite parameter.
pub fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(v) => SqlValue::Integer(*v),
        Value::Text(v) => SqlValue::Text(v.clone()),
    }
}

/// Converts a SQLite cell read from column `field` of type `ty`.
pub fn from_sql(field: &str, ty: FieldType, cell: SqlValue) -> Result<Value, StorageError> {
    let value = match cell {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(v) => Value::Integer(v),
        SqlValue::Text(v) => Value::Text(v),
        SqlValue::Real(_) => return Err(mismatch(field, ty, "REAL")),
        SqlValue::Blob(_) => return Err(mismatch(field, ty, "BLOB")),
    };
    if !ty.accepts(&value) {
        return Err(mismatch(field, ty, value.kind()));
    }
    Ok(value)
}

fn mismatch(field: &str, expected: FieldType, found: &'static str) -> StorageError {
    CoreError::TypeMismatch {
        field: field.to_string(),
        expected,
        found,
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookkeeper_core::{Category, Expense};

    #[test]
    fn decompose_follows_declaration_order() {
        let schema = Schema::of::<Expense>().unwrap();
        let expense = Expense::new(1250, Pk(3), "2024-03-01").with_comment("lunch");
        let values = decompose(&schema, &expense).unwrap();
        assert_eq!(
            values,
            vec![
                Value::Integer(1250),
                Value::Integer(3),
                Value::from("2024-03-01"),
                Value::from("lunch"),
            ]
        );
    }

    #[test]
    fn recompose_restores_record() {
        let schema = Schema::of::<Category>().unwrap();
        let original = Category::new("meat", Some(Pk(1)));
        let values = decompose(&schema, &original).unwrap();
        let back: Category = recompose(&schema, Pk(2), values).unwrap();
        assert_eq!(back.pk, Pk(2));
        assert_eq!(back.name, "meat");
        assert_eq!(back.parent, Some(Pk(1)));
    }

    #[test]
    fn recompose_rejects_short_rows() {
        let schema = Schema::of::<Category>().unwrap();
        let err = recompose::<Category>(&schema, Pk(1), vec![Value::from("x")]).unwrap_err();
        assert!(matches!(err, StorageError::Integrity { .. }));
    }

    #[test]
    fn sql_cells_are_type_checked() {
        assert_eq!(
            from_sql("amount", FieldType::Integer, SqlValue::Integer(4)).unwrap(),
            Value::Integer(4)
        );
        assert_eq!(
            from_sql("parent", FieldType::Integer, SqlValue::Null).unwrap(),
            Value::Null
        );
        assert!(from_sql("amount", FieldType::Integer, SqlValue::Text("4".into())).is_err());
        assert!(from_sql("name", FieldType::Text, SqlValue::Real(1.5)).is_err());
        assert_eq!(to_sql(&Value::from("a")), SqlValue::Text("a".into()));
    }
}

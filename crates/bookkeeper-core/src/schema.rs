//! Schema inference: from a model's declared fields to a table layout.
//!
//! A model declares an ordered list of `(field name, declared type name)`
//! pairs. [`Schema::infer`] classifies every declared type into a
//! [`FieldType`], pulls out the mandatory `pk` field and keeps the rest as
//! ordered data columns. The identity column is not part of
//! [`Schema::columns`]; storage always appends it as `pk`.
//!
//! Classification is deliberately coarse. A declared type is an integer
//! column when its lower-cased name contains `integer`, or when one of its
//! alphanumeric tokens is `int` or a Rust integer primitive (so
//! `Option<i64>` is integer). Every other type name falls back to text.

use indexmap::IndexMap;

use crate::error::CoreError;
use crate::model::Model;
use crate::types::FieldType;

/// Name of the identity column every table carries.
pub const PK_FIELD: &str = "pk";

const INTEGER_TOKENS: &[&str] = &[
    "int", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128", "usize",
];

/// Classifies a declared type name into a column type.
pub fn classify(declared: &str) -> FieldType {
    let lowered = declared.to_ascii_lowercase();
    if lowered.contains("integer") {
        return FieldType::Integer;
    }
    let integer_token = lowered
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|token| INTEGER_TOKENS.contains(&token));
    if integer_token {
        FieldType::Integer
    } else {
        FieldType::Text
    }
}

/// Returns `true` for a plain SQL identifier (`[A-Za-z_][A-Za-z0-9_]*`).
///
/// Table and column names are spliced into SQL text, so nothing else is
/// admitted.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Table layout inferred from a model declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    table: String,
    /// Data columns in declaration order, `pk` excluded.
    columns: IndexMap<String, FieldType>,
}

impl Schema {
    /// Infers the layout for `type_name` from its declared fields.
    ///
    /// Returns [`CoreError::Schema`] if the declaration has no `pk` field,
    /// if `pk` is not an integer type, if a name is not a plain identifier,
    /// if a field is declared twice, or if a declared type name is empty.
    pub fn infer(type_name: &str, declaration: &[(&str, &str)]) -> Result<Self, CoreError> {
        if !is_identifier(type_name) {
            return Err(schema_error(format!(
                "model name '{}' is not a valid table name",
                type_name
            )));
        }

        let mut pk_seen = false;
        let mut columns = IndexMap::new();

        for &(name, declared) in declaration {
            if declared.trim().is_empty() {
                return Err(schema_error(format!(
                    "field '{}' of {} has no resolvable type",
                    name, type_name
                )));
            }

            if name == PK_FIELD {
                if pk_seen {
                    return Err(schema_error(format!("{} declares 'pk' twice", type_name)));
                }
                if classify(declared) != FieldType::Integer {
                    return Err(schema_error(format!(
                        "primary key of {} must be an integer, declared as '{}'",
                        type_name, declared
                    )));
                }
                pk_seen = true;
                continue;
            }

            if !is_identifier(name) {
                return Err(schema_error(format!(
                    "field name '{}' of {} is not a valid column name",
                    name, type_name
                )));
            }
            // SQLite column names are case-insensitive.
            let clash = name.eq_ignore_ascii_case(PK_FIELD)
                || columns.keys().any(|k: &String| k.eq_ignore_ascii_case(name));
            if clash {
                return Err(schema_error(format!(
                    "field '{}' of {} is declared twice",
                    name, type_name
                )));
            }

            columns.insert(name.to_string(), classify(declared));
        }

        if !pk_seen {
            return Err(schema_error(format!(
                "{} has no 'pk' field",
                type_name
            )));
        }

        Ok(Schema {
            table: type_name.to_string(),
            columns,
        })
    }

    /// Infers the layout of model `M` from its declaration.
    pub fn of<M: Model>() -> Result<Self, CoreError> {
        Self::infer(M::TYPE_NAME, M::FIELDS)
    }

    /// Table name (the model type name).
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Data columns in declaration order, without `pk`.
    pub fn columns(&self) -> impl Iterator<Item = (&str, FieldType)> + '_ {
        self.columns.iter().map(|(name, ty)| (name.as_str(), *ty))
    }

    /// Data column names in declaration order, without `pk`.
    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.keys().map(String::as_str)
    }

    /// Number of data columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Type of `name`, including the identity column.
    pub fn column_type(&self, name: &str) -> Option<FieldType> {
        if name == PK_FIELD {
            return Some(FieldType::Integer);
        }
        self.columns.get(name).copied()
    }
}

fn schema_error(reason: String) -> CoreError {
    CoreError::Schema { reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_integer_names() {
        assert_eq!(classify("integer"), FieldType::Integer);
        assert_eq!(classify("INTEGER"), FieldType::Integer);
        assert_eq!(classify("int"), FieldType::Integer);
        assert_eq!(classify("i64"), FieldType::Integer);
        assert_eq!(classify("Option<i64>"), FieldType::Integer);
        assert_eq!(classify("BigInteger"), FieldType::Integer);
    }

    #[test]
    fn classify_falls_back_to_text() {
        assert_eq!(classify("str"), FieldType::Text);
        assert_eq!(classify("String"), FieldType::Text);
        assert_eq!(classify("datetime"), FieldType::Text);
        // Substrings of other words do not count.
        assert_eq!(classify("point"), FieldType::Text);
        assert_eq!(classify("f64"), FieldType::Text);
    }

    #[test]
    fn infer_keeps_declaration_order_and_drops_pk() {
        let schema = Schema::infer(
            "Expense",
            &[("amount", "i64"), ("pk", "i64"), ("comment", "String"), ("category", "Pk integer")],
        )
        .unwrap();
        assert_eq!(schema.table(), "Expense");
        let columns: Vec<_> = schema.columns().collect();
        assert_eq!(
            columns,
            vec![
                ("amount", FieldType::Integer),
                ("comment", FieldType::Text),
                ("category", FieldType::Integer),
            ]
        );
        assert_eq!(schema.column_type("pk"), Some(FieldType::Integer));
        assert_eq!(schema.column_type("missing"), None);
    }

    #[test]
    fn pk_only_model_has_no_data_columns() {
        let schema = Schema::infer("Marker", &[("pk", "int")]).unwrap();
        assert!(schema.is_empty());
    }

    #[test]
    fn missing_pk_is_rejected() {
        let err = Schema::infer("NoKey", &[("name", "str")]).unwrap_err();
        assert!(matches!(err, CoreError::Schema { .. }));
    }

    #[test]
    fn text_pk_is_rejected() {
        let err = Schema::infer("BadKey", &[("pk", "str")]).unwrap_err();
        assert!(matches!(err, CoreError::Schema { .. }));
    }

    #[test]
    fn unresolvable_type_is_rejected() {
        let err = Schema::infer("Thing", &[("pk", "int"), ("name", " ")]).unwrap_err();
        assert!(matches!(err, CoreError::Schema { .. }));
    }

    #[test]
    fn invalid_and_duplicate_names_are_rejected() {
        assert!(Schema::infer("drop table", &[("pk", "int")]).is_err());
        assert!(Schema::infer("Thing", &[("pk", "int"), ("a-b", "str")]).is_err());
        assert!(Schema::infer("Thing", &[("pk", "int"), ("name", "str"), ("NAME", "str")]).is_err());
        assert!(Schema::infer("Thing", &[("pk", "int"), ("PK", "int")]).is_err());
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("Category"));
        assert!(is_identifier("_private2"));
        assert!(!is_identifier("2fast"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("name;"));
    }
}

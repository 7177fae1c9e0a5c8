//! Expense records.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::id::Pk;
use crate::model::{unknown_field, Model};
use crate::types::Value;

/// A single expense. `amount` is in minor currency units; dates are kept
/// as the text the user entered (ISO `YYYY-MM-DD` by convention).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub pk: Pk,
    pub amount: i64,
    pub category: Pk,
    pub expense_date: String,
    pub comment: String,
}

impl Expense {
    pub fn new(amount: i64, category: Pk, expense_date: impl Into<String>) -> Self {
        Expense {
            pk: Pk::UNASSIGNED,
            amount,
            category,
            expense_date: expense_date.into(),
            comment: String::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

impl Model for Expense {
    const TYPE_NAME: &'static str = "Expense";
    const FIELDS: &'static [(&'static str, &'static str)] = &[
        ("pk", "integer"),
        ("amount", "i64"),
        ("category", "integer"),
        ("expense_date", "String"),
        ("comment", "String"),
    ];

    fn pk(&self) -> Pk {
        self.pk
    }

    fn set_pk(&mut self, pk: Pk) {
        self.pk = pk;
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "amount" => Some(Value::from(self.amount)),
            "category" => Some(Value::from(self.category)),
            "expense_date" => Some(Value::from(self.expense_date.as_str())),
            "comment" => Some(Value::from(self.comment.as_str())),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<(), CoreError> {
        match name {
            "amount" => self.amount = value.into_integer(name)?,
            "category" => self.category = Pk(value.into_integer(name)?),
            "expense_date" => self.expense_date = value.into_text(name)?,
            "comment" => self.comment = value.into_text(name)?,
            _ => return Err(unknown_field::<Self>(name)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use crate::types::FieldType;

    #[test]
    fn declaration_infers_expected_columns() {
        let schema = Schema::of::<Expense>().unwrap();
        let columns: Vec<_> = schema.columns().collect();
        assert_eq!(
            columns,
            vec![
                ("amount", FieldType::Integer),
                ("category", FieldType::Integer),
                ("expense_date", FieldType::Text),
                ("comment", FieldType::Text),
            ]
        );
    }

    #[test]
    fn amount_rejects_text() {
        let mut e = Expense::default();
        let err = e.set_field("amount", Value::from("12")).unwrap_err();
        assert!(matches!(err, CoreError::TypeMismatch { .. }));
    }
}

//! Expense categories.
//!
//! Categories form a forest through the optional `parent` key. The
//! repository stores them flat; [`Category::to_tree_record`] reshapes a
//! stored category for the tree builder.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::id::Pk;
use crate::model::{unknown_field, Model};
use crate::tree::TreeRecord;
use crate::types::Value;

/// An expense category. `parent` is `None` for top-level categories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub pk: Pk,
    pub name: String,
    pub parent: Option<Pk>,
}

impl Category {
    pub fn new(name: impl Into<String>, parent: Option<Pk>) -> Self {
        Category {
            pk: Pk::UNASSIGNED,
            name: name.into(),
            parent,
        }
    }

    /// Attribute names of the records produced by [`Category::to_tree_record`].
    pub const TREE_ATTRIBUTES: &'static [&'static str] = &["short_name"];

    /// Reshapes the category as `{unique_id: pk, parent_id: parent or 0,
    /// short_name: name}`.
    pub fn to_tree_record(&self) -> TreeRecord {
        TreeRecord::new(
            self.pk.0,
            self.parent.map_or(0, |p| p.0),
            vec![self.name.clone()],
        )
    }
}

impl Model for Category {
    const TYPE_NAME: &'static str = "Category";
    const FIELDS: &'static [(&'static str, &'static str)] = &[
        ("pk", "integer"),
        ("name", "String"),
        ("parent", "Option<i64>"),
    ];

    fn pk(&self) -> Pk {
        self.pk
    }

    fn set_pk(&mut self, pk: Pk) {
        self.pk = pk;
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "name" => Some(Value::from(self.name.as_str())),
            "parent" => Some(Value::from(self.parent)),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<(), CoreError> {
        match name {
            "name" => self.name = value.into_text(name)?,
            "parent" => self.parent = value.into_optional_integer(name)?.map(Pk),
            _ => return Err(unknown_field::<Self>(name)),
        }
        Ok(())
    }
}

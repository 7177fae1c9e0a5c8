//! The row contract every stored model implements.
//!
//! A [`Model`] declares its fields once, in order, as `(name, type name)`
//! pairs. The declaration drives schema inference; the accessor methods let
//! storage move values in and out of a record by field name without any
//! runtime reflection.

use crate::error::CoreError;
use crate::id::Pk;
use crate::types::Value;

/// A plain data shape that a repository can persist.
///
/// `Default` must produce a fresh, unpersisted record (`pk() == Pk(0)`):
/// records read back from storage start from the default and are filled in
/// field by field.
pub trait Model: Default + Clone {
    /// Model type name; doubles as the table name.
    const TYPE_NAME: &'static str;

    /// Ordered field declaration, `pk` included.
    const FIELDS: &'static [(&'static str, &'static str)];

    /// Current primary key.
    fn pk(&self) -> Pk;

    /// Overwrites the primary key.
    fn set_pk(&mut self, pk: Pk);

    /// Reads a declared non-pk field. `None` for names the model does not
    /// declare.
    fn field(&self, name: &str) -> Option<Value>;

    /// Writes a declared non-pk field.
    ///
    /// Returns [`CoreError::UnknownField`] for undeclared names and
    /// [`CoreError::TypeMismatch`] when the value kind does not fit.
    fn set_field(&mut self, name: &str, value: Value) -> Result<(), CoreError>;
}

/// Builds the error a `set_field` implementation returns for a name it does
/// not declare.
pub fn unknown_field<M: Model>(name: &str) -> CoreError {
    CoreError::UnknownField {
        model: M::TYPE_NAME.to_string(),
        field: name.to_string(),
    }
}

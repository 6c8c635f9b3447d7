//! Persistable object contract.
//!
//! # Invariants
//! - `identity()` is stable for the whole lifetime of a tracked object.
//! - `to_columns()` includes the primary-key column.
//! - `from_row()` reads columns by name, so column order in the table is free.

use rusqlite::types::Value;
use rusqlite::Row;

/// A domain value that the object store can track.
///
/// Implementors bind themselves to one table whose primary key is the
/// object identity. The store is generic over this bound and never needs to
/// know the concrete schema.
pub trait Persistable: Sized {
    /// Backing table name. Must be a plain SQL identifier.
    const TABLE: &'static str;

    /// Primary-key column holding the identity.
    const PRIMARY_KEY: &'static str = "id";

    /// Identity value stored in `PRIMARY_KEY`.
    fn identity(&self) -> Value;

    /// All stored columns of this object, primary key included.
    fn to_columns(&self) -> Vec<(&'static str, Value)>;

    /// Rebuilds an object from a full table row.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// Renders an identity for log lines and error messages.
pub fn describe_identity(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Integer(number) => number.to_string(),
        Value::Real(number) => number.to_string(),
        Value::Text(text) => text.clone(),
        Value::Blob(bytes) => format!("blob[{}]", bytes.len()),
    }
}

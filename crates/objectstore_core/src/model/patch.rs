//! Field patch model for partial updates.
//!
//! # Responsibility
//! - Map field names to new, nullable, dynamically typed values.
//!
//! # Invariants
//! - One value per field name; setting a field twice keeps the last value.
//! - Iteration order is the field-name order, independent of insertion.
//! - No schema validation happens here. Unknown fields fail later, inside the
//!   transaction that applies the patch.

use rusqlite::types::Value;
use std::collections::BTreeMap;

/// Named-field-to-value mapping applied atomically to one tracked object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldPatch {
    fields: BTreeMap<String, Value>,
}

impl FieldPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `field` to any value SQLite can store.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Sets `field` to a text value.
    pub fn set_text(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(field, value.into())
    }

    /// Clears `field` to `NULL`.
    pub fn set_null(self, field: impl Into<String>) -> Self {
        self.set(field, Value::Null)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in application order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .map(|(field, value)| (field.as_str(), value))
    }
}

impl From<BTreeMap<String, Value>> for FieldPatch {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Self { fields }
    }
}

impl<K, V> FromIterator<(K, V)> for FieldPatch
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut patch = Self::new();
        for (field, value) in iter {
            patch.insert(field, value);
        }
        patch
    }
}

#[cfg(test)]
mod tests {
    use super::FieldPatch;
    use rusqlite::types::Value;

    #[test]
    fn later_value_for_same_field_wins() {
        let patch = FieldPatch::new()
            .set_text("name", "first")
            .set_text("name", "second");

        assert_eq!(patch.len(), 1);
        assert_eq!(patch.get("name"), Some(&Value::Text("second".to_string())));
    }

    #[test]
    fn iteration_follows_field_name_order() {
        let patch = FieldPatch::new()
            .set("score", 3_i64)
            .set_null("email")
            .set_text("alias", "x");

        assert_eq!(patch.field_names(), vec!["alias", "email", "score"]);
    }

    #[test]
    fn collects_from_pairs_and_keeps_nulls() {
        let patch: FieldPatch = vec![
            ("done", Value::Integer(1)),
            ("note", Value::Null),
        ]
        .into_iter()
        .collect();

        assert_eq!(patch.get("note"), Some(&Value::Null));
        assert!(!patch.is_empty());
    }

    #[test]
    fn optional_values_map_to_null() {
        let patch = FieldPatch::new().set("due_at", None::<i64>);
        assert_eq!(patch.get("due_at"), Some(&Value::Null));
    }
}

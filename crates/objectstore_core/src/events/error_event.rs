//! Error event payload.

use crate::repo::object_repo::StoreError;
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Mutation that produced an error event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mutation {
    Create,
    Update,
    Delete,
}

impl Mutation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl Display for Mutation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failed transaction, handed to every current subscriber.
///
/// `error` is the store failure as raised; the other fields only say where
/// it happened.
#[derive(Debug)]
pub struct ErrorEvent {
    pub operation: Mutation,
    pub table: &'static str,
    /// Identity of the object the mutation targeted.
    pub object_id: String,
    pub error: StoreError,
}

impl ErrorEvent {
    pub fn new(
        operation: Mutation,
        table: &'static str,
        object_id: impl Into<String>,
        error: StoreError,
    ) -> Self {
        Self {
            operation,
            table,
            object_id: object_id.into(),
            error,
        }
    }
}

impl Display for ErrorEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}/{} failed: {}",
            self.operation, self.table, self.object_id, self.error
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorEvent, Mutation};
    use crate::repo::object_repo::StoreError;

    #[test]
    fn display_names_operation_and_target() {
        let event = ErrorEvent::new(
            Mutation::Delete,
            "notes",
            "n-1",
            StoreError::NotFound {
                table: "notes",
                id: "n-1".to_string(),
            },
        );

        assert_eq!(
            event.to_string(),
            "delete notes/n-1 failed: object not found: notes/n-1"
        );
    }
}

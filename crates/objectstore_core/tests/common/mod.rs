#![allow(dead_code)]

use objectstore_core::{
    open_store_in_memory, ErrorEvent, Migration, Mutation, ObjectStoreService, Persistable,
};
use rusqlite::types::Value;
use rusqlite::Row;
use std::sync::{Arc, Mutex};

pub const MIGRATIONS: &[Migration] = &[
    Migration::new(
        1,
        "CREATE TABLE contacts (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            email TEXT,
            age INTEGER NOT NULL CHECK (age >= 0)
        );",
    ),
    Migration::new(
        2,
        "CREATE TABLE tags (
            id INTEGER PRIMARY KEY NOT NULL,
            label TEXT NOT NULL UNIQUE
        );",
    ),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub age: i64,
}

impl Contact {
    pub fn new(id: &str, name: &str, age: i64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            email: None,
            age,
        }
    }
}

impl Persistable for Contact {
    const TABLE: &'static str = "contacts";

    fn identity(&self) -> Value {
        Value::Text(self.id.clone())
    }

    fn to_columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", Value::Text(self.id.clone())),
            ("name", Value::Text(self.name.clone())),
            ("email", self.email.clone().into()),
            ("age", Value::Integer(self.age)),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            email: row.get("email")?,
            age: row.get("age")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: i64,
    pub label: String,
}

impl Persistable for Tag {
    const TABLE: &'static str = "tags";

    fn identity(&self) -> Value {
        Value::Integer(self.id)
    }

    fn to_columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", Value::Integer(self.id)),
            ("label", Value::Text(self.label.clone())),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            label: row.get("label")?,
        })
    }
}

/// What a subscriber saw: operation, table, object id and rendered error.
pub type Seen = (Mutation, &'static str, String, String);

pub fn service() -> ObjectStoreService {
    ObjectStoreService::new(open_store_in_memory(MIGRATIONS).unwrap())
}

/// Subscribes `context` and returns the shared log of delivered events.
pub fn record_errors(service: &ObjectStoreService, context: &str) -> Arc<Mutex<Vec<Seen>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    service
        .errors()
        .subscribe(context, move |event: &ErrorEvent| {
            sink.lock().unwrap().push((
                event.operation,
                event.table,
                event.object_id.clone(),
                event.error.to_string(),
            ));
        });
    seen
}

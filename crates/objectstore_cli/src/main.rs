//! CLI smoke entry point.
//!
//! # Responsibility
//! - Walk the object store façade through one success and one failure per
//!   mutation, printing what the error subscriber receives.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `objectstore_cli [DB_PATH]`. Without a path the store is in memory.
//! Set `OBJECTSTORE_LOG_DIR` to an absolute directory to enable file logs.

use objectstore_core::{
    core_version, default_log_level, init_logging, ContextKey, ErrorEvent, FieldPatch, Migration,
    ObjectStoreService, Persistable, StoreConfig,
};
use rusqlite::types::Value;
use rusqlite::Row;
use std::process::ExitCode;

const NOTES_SCHEMA: &[Migration] = &[Migration::new(
    1,
    "CREATE TABLE IF NOT EXISTS notes (
        id TEXT PRIMARY KEY NOT NULL,
        title TEXT NOT NULL,
        pinned INTEGER NOT NULL DEFAULT 0
    );",
)];

#[derive(Debug, Clone)]
struct Note {
    id: String,
    title: String,
    pinned: bool,
}

impl Persistable for Note {
    const TABLE: &'static str = "notes";

    fn identity(&self) -> Value {
        Value::Text(self.id.clone())
    }

    fn to_columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", Value::Text(self.id.clone())),
            ("title", Value::Text(self.title.clone())),
            ("pinned", self.pinned.into()),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            pinned: row.get("pinned")?,
        })
    }
}

fn main() -> ExitCode {
    println!("objectstore_core version={}", core_version());

    if let Ok(log_dir) = std::env::var("OBJECTSTORE_LOG_DIR") {
        if let Err(err) = init_logging(default_log_level(), &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let config = match std::env::args().nth(1) {
        Some(path) => StoreConfig::file(path),
        None => StoreConfig::in_memory(),
    };
    let service = match ObjectStoreService::open(&config, NOTES_SCHEMA) {
        Ok(service) => service,
        Err(err) => {
            eprintln!("failed to open store: {err}");
            return ExitCode::FAILURE;
        }
    };

    let console = ContextKey::from("console");
    service
        .errors()
        .subscribe(console.clone(), |event: &ErrorEvent| {
            println!("error_event {event}");
        });

    let mut note = Note {
        id: format!("note-{}", std::process::id()),
        title: "first draft".to_string(),
        pinned: false,
    };

    println!("step=create");
    service.create(&note);
    println!("step=create_duplicate");
    service.create(&note);

    println!("step=update");
    service.update(
        &mut note,
        &FieldPatch::new()
            .set_text("title", "final draft")
            .set("pinned", true),
    );
    println!("note title={} pinned={}", note.title, note.pinned);

    println!("step=update_unknown_field");
    service.update(&mut note, &FieldPatch::new().set_text("colour", "red"));

    println!("step=delete");
    service.delete(&note);
    println!("step=delete_again");
    service.delete(&note);

    match service.count::<Note>() {
        Ok(count) => println!("notes remaining={count}"),
        Err(err) => eprintln!("count failed: {err}"),
    }

    service.errors().unsubscribe(&console);
    if let Err(err) = service.close() {
        eprintln!("failed to close store: {err}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

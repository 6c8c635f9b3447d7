//! Schema migration executor for application-supplied migrations.
//!
//! # Responsibility
//! - Validate that registered migrations are in strictly increasing order.
//! - Apply pending migrations atomically.
//!
//! # Invariants
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - A database newer than the latest known migration is never touched.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

/// One schema step owned by the application.
///
/// The store is schema-agnostic: callers define the tables backing their
/// `Persistable` types and hand the ordered list to `open_store`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    pub version: u32,
    pub sql: &'static str,
}

impl Migration {
    pub const fn new(version: u32, sql: &'static str) -> Self {
        Self { version, sql }
    }
}

/// Returns the latest version in `migrations`, or 0 for an empty list.
pub fn latest_version(migrations: &[Migration]) -> u32 {
    migrations.last().map_or(0, |migration| migration.version)
}

/// Reads the schema version currently recorded in the database.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Applies all pending migrations on the provided connection.
pub fn apply_migrations(conn: &mut Connection, migrations: &[Migration]) -> DbResult<()> {
    validate_order(migrations)?;

    let current_version = schema_version(conn)?;
    let latest = latest_version(migrations);

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    let mut applied = 0usize;
    for migration in migrations {
        if migration.version <= current_version {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
        applied += 1;
    }
    tx.commit()?;

    info!(
        "event=schema_migrate module=db status=ok from_version={} to_version={} applied={}",
        current_version, latest, applied
    );
    Ok(())
}

fn validate_order(migrations: &[Migration]) -> DbResult<()> {
    let mut previous = 0u32;
    for migration in migrations {
        if migration.version <= previous {
            return Err(DbError::InvalidMigrationOrder {
                previous,
                next: migration.version,
            });
        }
        previous = migration.version;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{apply_migrations, latest_version, schema_version, Migration};
    use crate::db::DbError;
    use rusqlite::Connection;

    const STEPS: &[Migration] = &[
        Migration::new(1, "CREATE TABLE a (id TEXT PRIMARY KEY NOT NULL);"),
        Migration::new(2, "CREATE TABLE b (id TEXT PRIMARY KEY NOT NULL);"),
    ];

    #[test]
    fn latest_version_of_empty_list_is_zero() {
        assert_eq!(latest_version(&[]), 0);
        assert_eq!(latest_version(STEPS), 2);
    }

    #[test]
    fn pending_steps_are_applied_once() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn, &STEPS[..1]).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 1);

        apply_migrations(&mut conn, STEPS).unwrap();
        apply_migrations(&mut conn, STEPS).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 2);
    }

    #[test]
    fn out_of_order_versions_are_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        let steps = [STEPS[1], STEPS[0]];

        let err = apply_migrations(&mut conn, &steps).unwrap_err();
        assert!(matches!(
            err,
            DbError::InvalidMigrationOrder {
                previous: 2,
                next: 1
            }
        ));
        assert_eq!(schema_version(&conn).unwrap(), 0);
    }

    #[test]
    fn failing_step_leaves_version_untouched() {
        let mut conn = Connection::open_in_memory().unwrap();
        let steps = [STEPS[0], Migration::new(2, "CREATE TABLE broken (;")];

        assert!(apply_migrations(&mut conn, &steps).is_err());
        assert_eq!(schema_version(&conn).unwrap(), 0);
    }
}

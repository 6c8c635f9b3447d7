//! Generic object repository and its error type.
//!
//! # Responsibility
//! - Map `Persistable` objects onto their table with plain SQL.
//! - Report store failures as `StoreError`, the single failure kind exposed
//!   to error subscribers.
//!
//! # Invariants
//! - Callers that mutate must pass a connection borrowed from an open
//!   transaction; this module never opens or commits one itself.
//! - Primary-key columns are never rewritten.

use crate::db::DbError;
use crate::model::persistable::{describe_identity, Persistable};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

pub type StoreResult<T> = Result<T, StoreError>;

/// Transaction failure raised while writing to or reading from the store.
///
/// The underlying cause is kept verbatim; subscribers may inspect it but the
/// service itself treats every variant the same way.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    NotFound {
        table: &'static str,
        id: String,
    },
    InvalidFieldName {
        table: &'static str,
        field: String,
    },
    PrimaryKeyImmutable {
        table: &'static str,
        field: String,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { table, id } => write!(f, "object not found: {table}/{id}"),
            Self::InvalidFieldName { table, field } => {
                write!(f, "invalid field name `{field}` for {table}")
            }
            Self::PrimaryKeyImmutable { table, field } => {
                write!(f, "primary key `{field}` of {table} cannot be updated")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::InvalidFieldName { .. } => None,
            Self::PrimaryKeyImmutable { .. } => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl StoreError {
    /// Returns the SQLite error underneath, when there is one.
    pub fn sqlite(&self) -> Option<&rusqlite::Error> {
        match self {
            Self::Db(DbError::Sqlite(err)) => Some(err),
            _ => None,
        }
    }

    /// True when SQLite rejected the write on a constraint (duplicate key,
    /// `NOT NULL`, `CHECK`, foreign key).
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self.sqlite().and_then(rusqlite::Error::sqlite_error_code),
            Some(rusqlite::ErrorCode::ConstraintViolation)
        )
    }
}

/// Returns whether `name` can be used as a table or column name.
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER_RE.is_match(name)
}

/// SQLite-backed repository for any `Persistable` type.
pub struct SqliteObjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteObjectRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Adds `object` as a new row.
    ///
    /// Duplicate identities fail with the engine's constraint error.
    pub fn insert<T: Persistable>(&self, object: &T) -> StoreResult<()> {
        let columns = object.to_columns();
        let mut names = Vec::with_capacity(columns.len());
        let mut placeholders = Vec::with_capacity(columns.len());
        let mut values = Vec::with_capacity(columns.len());

        for (index, (column, value)) in columns.into_iter().enumerate() {
            names.push(quote_identifier(T::TABLE, column)?);
            placeholders.push(format!("?{}", index + 1));
            values.push(value);
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({});",
            quote_table::<T>()?,
            names.join(", "),
            placeholders.join(", ")
        );
        self.conn.execute(&sql, params_from_iter(values))?;
        Ok(())
    }

    /// Sets one column of the row identified by `id`.
    pub fn set_field<T: Persistable>(
        &self,
        id: &Value,
        field: &str,
        value: &Value,
    ) -> StoreResult<()> {
        if field == T::PRIMARY_KEY {
            return Err(StoreError::PrimaryKeyImmutable {
                table: T::TABLE,
                field: field.to_string(),
            });
        }

        let sql = format!(
            "UPDATE {} SET {} = ?1 WHERE {} = ?2;",
            quote_table::<T>()?,
            quote_identifier(T::TABLE, field)?,
            quote_identifier(T::TABLE, T::PRIMARY_KEY)?
        );
        let changed = self.conn.execute(&sql, params![value, id])?;
        if changed == 0 {
            return Err(not_found::<T>(id));
        }

        Ok(())
    }

    /// Removes the row identified by `id`.
    pub fn remove<T: Persistable>(&self, id: &Value) -> StoreResult<()> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1;",
            quote_table::<T>()?,
            quote_identifier(T::TABLE, T::PRIMARY_KEY)?
        );
        let changed = self.conn.execute(&sql, [id])?;
        if changed == 0 {
            return Err(not_found::<T>(id));
        }

        Ok(())
    }

    /// Loads the row identified by `id`, if it exists.
    pub fn load<T: Persistable>(&self, id: &Value) -> StoreResult<Option<T>> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = ?1;",
            quote_table::<T>()?,
            quote_identifier(T::TABLE, T::PRIMARY_KEY)?
        );
        let object = self
            .conn
            .query_row(&sql, [id], |row| T::from_row(row))
            .optional()?;
        Ok(object)
    }

    /// Counts rows of `T`'s table.
    pub fn count<T: Persistable>(&self) -> StoreResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM {};", quote_table::<T>()?);
        let count = self.conn.query_row(&sql, [], |row| row.get::<_, i64>(0))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

fn quote_table<T: Persistable>() -> StoreResult<String> {
    quote_identifier(T::TABLE, T::TABLE)
}

fn quote_identifier(table: &'static str, name: &str) -> StoreResult<String> {
    if !is_valid_identifier(name) {
        return Err(StoreError::InvalidFieldName {
            table,
            field: name.to_string(),
        });
    }
    Ok(format!("\"{name}\""))
}

fn not_found<T: Persistable>(id: &Value) -> StoreError {
    StoreError::NotFound {
        table: T::TABLE,
        id: describe_identity(id),
    }
}

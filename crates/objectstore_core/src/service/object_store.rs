//! Object store service: generic create/update/delete with error broadcast.
//!
//! # Responsibility
//! - Run every mutation inside exactly one write transaction.
//! - Report failures to the error broadcast channel instead of the caller.
//!
//! # Invariants
//! - No object-graph mutation happens outside an open transaction scope.
//! - A failed scope is rolled back before its event is published.
//! - Events are published after the connection lock is released, so a
//!   subscriber may call back into the service.
//! - Callers that never subscribe observe every mutation as successful.

use crate::db::{open_store, Migration, StoreConfig};
use crate::events::broadcast::ErrorBroadcast;
use crate::events::error_event::{ErrorEvent, Mutation};
use crate::model::patch::FieldPatch;
use crate::model::persistable::{describe_identity, Persistable};
use crate::repo::object_repo::{SqliteObjectRepository, StoreError, StoreResult};
use log::{debug, info, warn};
use rusqlite::types::Value;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Single access point for persisting `Persistable` objects.
///
/// Construct one per store at process start and hand it to callers; the
/// process entry point also owns shutdown through [`ObjectStoreService::close`].
pub struct ObjectStoreService {
    conn: Mutex<Connection>,
    errors: Arc<ErrorBroadcast>,
}

impl ObjectStoreService {
    /// Wraps an opened connection with a private error channel.
    pub fn new(conn: Connection) -> Self {
        Self::with_broadcast(conn, Arc::new(ErrorBroadcast::new()))
    }

    /// Wraps an opened connection, reporting into an existing channel.
    pub fn with_broadcast(conn: Connection, errors: Arc<ErrorBroadcast>) -> Self {
        Self {
            conn: Mutex::new(conn),
            errors,
        }
    }

    /// Opens the store described by `config` and wraps it.
    pub fn open(config: &StoreConfig, migrations: &[Migration]) -> StoreResult<Self> {
        let conn = open_store(config, migrations)?;
        Ok(Self::new(conn))
    }

    /// Channel that receives this service's error events.
    pub fn errors(&self) -> &Arc<ErrorBroadcast> {
        &self.errors
    }

    /// Persists a new object.
    ///
    /// Duplicate identities, schema mismatches and engine failures are
    /// published as an error event; the store is left unchanged.
    pub fn create<T: Persistable>(&self, object: &T) {
        let id = object.identity();
        let outcome = self.with_write_scope(Mutation::Create, T::TABLE, |tx| {
            SqliteObjectRepository::new(tx).insert(object)
        });
        self.finish(Mutation::Create, T::TABLE, &id, outcome);
    }

    /// Applies `patch` to a tracked object as one all-or-nothing write.
    ///
    /// On success `object` is refreshed from the committed row. On failure
    /// neither the stored row nor `object` change. An empty patch commits an
    /// empty transaction.
    pub fn update<T: Persistable>(&self, object: &mut T, patch: &FieldPatch) {
        let id = object.identity();
        let outcome = self.with_write_scope(Mutation::Update, T::TABLE, |tx| {
            if patch.is_empty() {
                return Ok(None);
            }

            let repo = SqliteObjectRepository::new(tx);
            for (field, value) in patch.iter() {
                repo.set_field::<T>(&id, field, value)?;
            }
            debug!(
                "event=object_update module=service status=applied table={} fields={}",
                T::TABLE,
                patch.field_names().join(",")
            );

            match repo.load::<T>(&id)? {
                Some(refreshed) => Ok(Some(refreshed)),
                None => Err(StoreError::NotFound {
                    table: T::TABLE,
                    id: describe_identity(&id),
                }),
            }
        });

        let outcome = outcome.map(|refreshed| {
            if let Some(refreshed) = refreshed {
                *object = refreshed;
            }
        });
        self.finish(Mutation::Update, T::TABLE, &id, outcome);
    }

    /// Removes a tracked object.
    ///
    /// Deleting an object that is not in the store (never created or already
    /// deleted) is published as an error event.
    pub fn delete<T: Persistable>(&self, object: &T) {
        let id = object.identity();
        let outcome = self.with_write_scope(Mutation::Delete, T::TABLE, |tx| {
            SqliteObjectRepository::new(tx).remove::<T>(&id)
        });
        self.finish(Mutation::Delete, T::TABLE, &id, outcome);
    }

    /// Reads one object by identity outside any write scope.
    pub fn find<T: Persistable>(&self, id: impl Into<Value>) -> StoreResult<Option<T>> {
        let conn = self.connection();
        SqliteObjectRepository::new(&conn).load::<T>(&id.into())
    }

    /// Counts stored objects of type `T`.
    pub fn count<T: Persistable>(&self) -> StoreResult<u64> {
        let conn = self.connection();
        SqliteObjectRepository::new(&conn).count::<T>()
    }

    /// Flushes and closes the underlying connection.
    pub fn close(self) -> StoreResult<()> {
        let conn = self.conn.into_inner().unwrap_or_else(PoisonError::into_inner);
        conn.close().map_err(|(_, err)| StoreError::from(err))?;
        info!("event=store_close module=service status=ok");
        Ok(())
    }

    fn with_write_scope<R>(
        &self,
        operation: Mutation,
        table: &'static str,
        mutate: impl FnOnce(&Transaction<'_>) -> StoreResult<R>,
    ) -> StoreResult<R> {
        let started_at = Instant::now();
        let mut conn = self.connection();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        // Dropping `tx` on the error path rolls the scope back.
        let value = mutate(&tx)?;
        tx.commit()?;
        debug!(
            "event=object_{} module=service status=committed table={} duration_ms={}",
            operation,
            table,
            started_at.elapsed().as_millis()
        );
        Ok(value)
    }

    fn finish(
        &self,
        operation: Mutation,
        table: &'static str,
        id: &Value,
        outcome: StoreResult<()>,
    ) {
        match outcome {
            Ok(()) => info!(
                "event=object_{} module=service status=ok table={}",
                operation, table
            ),
            Err(err) => {
                warn!(
                    "event=object_{} module=service status=error table={} error={}",
                    operation, table, err
                );
                let event = ErrorEvent::new(operation, table, describe_identity(id), err);
                self.errors.publish(&event);
            }
        }
    }

    fn connection(&self) -> MutexGuard<'_, Connection> {
        // A panic inside a write scope unwinds through the transaction guard,
        // which rolls back, so a poisoned connection is still consistent.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

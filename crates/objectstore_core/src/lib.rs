//! Generic persistence façade over an embedded SQLite store.
//!
//! Objects are created, patched and deleted through [`ObjectStoreService`];
//! failures never come back to the caller and are delivered to
//! subscribers of the service's [`ErrorBroadcast`] instead.

pub mod db;
pub mod events;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{
    open_store, open_store_in_memory, DbError, DbResult, Migration, StoreConfig, StoreLocation,
};
pub use events::broadcast::{ContextKey, ErrorBroadcast, ErrorCallback, SubscriptionToken};
pub use events::error_event::{ErrorEvent, Mutation};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::patch::FieldPatch;
pub use model::persistable::Persistable;
pub use repo::object_repo::{SqliteObjectRepository, StoreError, StoreResult};
pub use service::object_store::ObjectStoreService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}

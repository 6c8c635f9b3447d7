//! Repository layer over SQLite tables.
//!
//! # Responsibility
//! - Provide the four store primitives the service builds on: add by value,
//!   set one field by name, remove by identity, load by identity.
//! - Keep SQL text inside the persistence boundary.
//!
//! # Invariants
//! - Identifiers are validated before being spliced into SQL.
//! - Writes that match no row surface as `NotFound`, never as silent no-ops.

pub mod object_repo;

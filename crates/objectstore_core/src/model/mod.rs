//! Storage-facing model contracts.
//!
//! # Responsibility
//! - Describe what the store needs from a domain object (`Persistable`).
//! - Carry dynamically typed partial updates (`FieldPatch`).
//!
//! # Invariants
//! - Every persistable object is identified by one primary-key value.
//! - The store never inspects concrete schemas beyond these contracts.

pub mod patch;
pub mod persistable;

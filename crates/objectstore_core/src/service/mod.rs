//! Core use-case services.
//!
//! # Responsibility
//! - Expose the persistence façade callers use instead of raw SQL.
//! - Keep UI/application layers decoupled from storage details.

pub mod object_store;

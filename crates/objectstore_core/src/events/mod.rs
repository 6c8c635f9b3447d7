//! Failure notification channel.
//!
//! # Responsibility
//! - Carry transaction failures from the object store to subscribers that
//!   registered interest under a caller-owned context key.
//!
//! # Invariants
//! - Events are delivered to current subscribers only; nothing is replayed.
//! - Publishing with no subscribers is a silent drop.

pub mod broadcast;
pub mod error_event;

//! In-process error broadcast channel.
//!
//! # Responsibility
//! - Keep the registry of error subscriptions keyed by caller context.
//! - Fan each published event out to every active subscription.
//!
//! # Invariants
//! - The registry is only touched under its mutex; callbacks run on a
//!   snapshot taken under the lock, never while holding it.
//! - A panicking callback does not stop delivery to the others.
//! - Subscribing the same context twice yields two deliveries per event.

use crate::events::error_event::ErrorEvent;
use log::{debug, error, info};
use std::fmt::{Display, Formatter};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Callback invoked for every delivered error event.
pub type ErrorCallback = Arc<dyn Fn(&ErrorEvent) + Send + Sync>;

/// Identity of the caller-owned context a subscription belongs to.
///
/// The context only needs this key to unsubscribe later; it never holds a
/// reference into the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextKey(String);

impl ContextKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Generates a key no other context shares.
    pub fn unique() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ContextKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContextKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ContextKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Handle for exactly one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionToken(u64);

impl SubscriptionToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

struct Registration {
    token: SubscriptionToken,
    context: ContextKey,
    callback: ErrorCallback,
}

/// Publish/subscribe channel for store failures.
///
/// Scoped to whoever constructs it; share it with `Arc` to let several
/// services report into the same set of subscribers.
pub struct ErrorBroadcast {
    registrations: Mutex<Vec<Registration>>,
    next_token: AtomicU64,
}

impl Default for ErrorBroadcast {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorBroadcast {
    pub fn new() -> Self {
        Self {
            registrations: Mutex::new(Vec::new()),
            next_token: AtomicU64::new(1),
        }
    }

    /// Registers `callback` under `context`.
    ///
    /// No deduplication: every call adds an independent subscription.
    pub fn subscribe<F>(&self, context: impl Into<ContextKey>, callback: F) -> SubscriptionToken
    where
        F: Fn(&ErrorEvent) + Send + Sync + 'static,
    {
        let context = context.into();
        let token = SubscriptionToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        let mut registry = self.registry();
        registry.push(Registration {
            token,
            context: context.clone(),
            callback: Arc::new(callback),
        });
        info!(
            "event=subscription_add module=events status=ok context={} token={} active={}",
            context,
            token.value(),
            registry.len()
        );
        token
    }

    /// Removes every subscription registered under `context`.
    ///
    /// Returns how many were removed; zero is not an error.
    pub fn unsubscribe(&self, context: &ContextKey) -> usize {
        let mut registry = self.registry();
        let before = registry.len();
        registry.retain(|registration| &registration.context != context);
        let removed = before - registry.len();
        info!(
            "event=subscription_remove module=events status=ok context={} removed={} active={}",
            context,
            removed,
            registry.len()
        );
        removed
    }

    /// Removes the single subscription behind `token`.
    pub fn cancel(&self, token: SubscriptionToken) -> bool {
        let mut registry = self.registry();
        let Some(index) = registry
            .iter()
            .position(|registration| registration.token == token)
        else {
            return false;
        };
        let registration = registry.remove(index);
        info!(
            "event=subscription_remove module=events status=ok context={} token={} active={}",
            registration.context,
            token.value(),
            registry.len()
        );
        true
    }

    /// Delivers `event` to every current subscription, in registration order.
    ///
    /// Returns the number of callbacks that completed without panicking.
    pub fn publish(&self, event: &ErrorEvent) -> usize {
        let targets: Vec<(ContextKey, ErrorCallback)> = self
            .registry()
            .iter()
            .map(|registration| {
                (
                    registration.context.clone(),
                    Arc::clone(&registration.callback),
                )
            })
            .collect();

        if targets.is_empty() {
            debug!(
                "event=error_publish module=events status=dropped operation={} table={} subscribers=0",
                event.operation, event.table
            );
            return 0;
        }

        let mut delivered = 0usize;
        for (context, callback) in &targets {
            match catch_unwind(AssertUnwindSafe(|| callback(event))) {
                Ok(()) => delivered += 1,
                Err(_) => error!(
                    "event=subscriber_panic module=events status=error context={} operation={} table={}",
                    context, event.operation, event.table
                ),
            }
        }

        debug!(
            "event=error_publish module=events status=ok operation={} table={} subscribers={} delivered={}",
            event.operation,
            event.table,
            targets.len(),
            delivered
        );
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry().len()
    }

    pub fn is_subscribed(&self, context: &ContextKey) -> bool {
        self.registry()
            .iter()
            .any(|registration| &registration.context == context)
    }

    fn registry(&self) -> MutexGuard<'_, Vec<Registration>> {
        // Callbacks never run under this lock, so a poisoned guard still
        // holds a consistent registry.
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

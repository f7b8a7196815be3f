//! Per-operation loading and error bookkeeping.
//!
//! Every store owns one tracker. Each operation kind keeps its own
//! in-flight count and last error; the store as a whole keeps the message
//! of its most recent failure, cleared whenever a new call starts.

use std::{fmt::Debug, hash::Hash};

use dashmap::DashMap;
use tokio::sync::RwLock;
use tracing::warn;

use crate::error::StoreError;

/// Status of one kind of operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationStatus {
    /// Number of calls of this kind currently awaiting a response.
    pub in_flight: u32,

    /// Message of the most recent failure, cleared when a new call starts.
    pub last_error: Option<String>,
}

impl OperationStatus {
    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }
}

/// An operation kind with a message to show when the server gives none.
pub trait Operation: Debug + Copy + Eq + Hash + Send + Sync {
    fn fallback_message(self) -> &'static str;
}

/// Tracks every operation kind of a store independently.
///
/// Entries are updated in place; no `DashMap` guard is held across an
/// await.
#[derive(Debug)]
pub struct OperationTracker<K: Eq + Hash> {
    statuses: DashMap<K, OperationStatus>,
    error: RwLock<Option<String>>,
}

impl<K: Eq + Hash> Default for OperationTracker<K> {
    fn default() -> Self {
        Self {
            statuses: DashMap::new(),
            error: RwLock::new(None),
        }
    }
}

impl<K: Operation> OperationTracker<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a call of `op` as started and clears the store's error.
    ///
    /// The call stays in flight until the returned guard is finished or
    /// dropped, so a caller that abandons the future does not leave the
    /// operation loading.
    pub async fn begin(&self, op: K) -> InFlight<'_, K> {
        let call = InFlight::start(self, op);
        *self.error.write().await = None;
        call
    }

    pub fn status(&self, op: K) -> OperationStatus {
        self.statuses
            .get(&op)
            .map(|status| status.clone())
            .unwrap_or_default()
    }

    /// True while any operation of this store is awaiting a response.
    pub fn is_loading(&self) -> bool {
        self.statuses.iter().any(|entry| entry.value().is_loading())
    }

    /// Message of the store's most recent failure.
    pub async fn error(&self) -> Option<String> {
        self.error.read().await.clone()
    }

    pub async fn clear_error(&self) {
        *self.error.write().await = None;
    }
}

// =============================================================================
// In-flight Calls
// =============================================================================

/// One started call of an operation.
///
/// Dropping it ends the call without recording an outcome.
#[must_use = "dropping the guard ends the call immediately"]
#[derive(Debug)]
pub struct InFlight<'a, K: Operation> {
    tracker: &'a OperationTracker<K>,
    op: K,
}

impl<'a, K: Operation> InFlight<'a, K> {
    fn start(tracker: &'a OperationTracker<K>, op: K) -> Self {
        {
            let mut status = tracker.statuses.entry(op).or_default();
            status.in_flight += 1;
            status.last_error = None;
        }
        Self { tracker, op }
    }

    pub fn op(&self) -> K {
        self.op
    }

    /// Records the outcome of the call and hands the result back.
    ///
    /// Failures are stored under the server's message, or the operation's
    /// fallback when there is none. Nothing is retried.
    pub async fn finish<T>(self, result: Result<T, StoreError>) -> Result<T, StoreError> {
        if let Err(error) = &result {
            let message = error.user_message(self.op.fallback_message());
            warn!(op = ?self.op, %message, "operation failed");

            if let Some(mut status) = self.tracker.statuses.get_mut(&self.op) {
                status.last_error = Some(message.clone());
            }
            *self.tracker.error.write().await = Some(message);
        }
        result
    }
}

impl<K: Operation> Drop for InFlight<'_, K> {
    fn drop(&mut self) {
        if let Some(mut status) = self.tracker.statuses.get_mut(&self.op) {
            status.in_flight = status.in_flight.saturating_sub(1);
        }
    }
}

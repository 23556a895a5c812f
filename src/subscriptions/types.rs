//! Subscription types for live store updates.

use crate::state::NormalizedState;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Unique identifier for a subscription within one observable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

type Cancel = Box<dyn FnOnce() + Send>;

/// Handle to an active subscription.
///
/// Dropping the handle unsubscribes. [`Subscription::unsubscribe`] may be
/// called any number of times; only the first call has an effect.
#[must_use = "dropping a Subscription unsubscribes it"]
pub struct Subscription {
    cancel: Mutex<Option<Cancel>>,
}

impl Subscription {
    pub(crate) fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Mutex::new(Some(Box::new(cancel))),
        }
    }

    /// Stop receiving notifications.
    pub fn unsubscribe(&self) {
        // Take first so the cancel hook runs without the lock held.
        let cancel = self.cancel.lock().take();
        if let Some(cancel) = cancel {
            cancel();
        }
    }

    /// Whether the subscription is still registered.
    pub fn is_active(&self) -> bool {
        self.cancel.lock().is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Configuration for a channel-backed watch.
#[derive(Clone, Debug)]
pub struct WatchConfig {
    /// Max buffered snapshots before the watch is dropped.
    /// Default: 64
    pub buffer_size: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { buffer_size: 64 }
    }
}

/// Events delivered to a watch.
#[derive(Clone, Debug)]
pub enum WatchEvent<T> {
    /// The store's snapshot after a write (or the current one, first).
    Snapshot(Arc<NormalizedState<T>>),

    /// The watch was dropped and will receive nothing further.
    Dropped { reason: DropReason },
}

/// Why a watch was dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropReason {
    /// Send buffer overflowed (slow consumer).
    BufferOverflow,
    /// Receiving side went away.
    Disconnected,
    /// Explicitly unsubscribed.
    Unsubscribed,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::BufferOverflow => write!(f, "buffer overflow"),
            DropReason::Disconnected => write!(f, "disconnected"),
            DropReason::Unsubscribed => write!(f, "unsubscribed"),
        }
    }
}

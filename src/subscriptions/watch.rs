//! Channel-backed watches for consumers on other threads.

use crate::state::NormalizedState;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use std::sync::Arc;

use super::observable::Observable;
use super::types::{DropReason, Subscription, WatchConfig, WatchEvent};

type Slot = Arc<Mutex<Option<Subscription>>>;

/// Handle to a watch on a store's snapshots.
///
/// The current snapshot is the first event. A watch whose buffer fills up is
/// dropped: it receives a best-effort [`WatchEvent::Dropped`] and nothing
/// after it.
pub struct WatchHandle<T> {
    /// Channel to receive events.
    pub receiver: Receiver<WatchEvent<T>>,
    sender: Sender<WatchEvent<T>>,
    slot: Slot,
}

impl<T: Send + Sync + 'static> WatchHandle<T> {
    pub(crate) fn attach(
        source: &Observable<Arc<NormalizedState<T>>>,
        config: WatchConfig,
        label: &str,
    ) -> Self {
        let (sender, receiver) = bounded(config.buffer_size.max(1));
        let slot: Slot = Arc::new(Mutex::new(None));

        let tx = sender.clone();
        let own_slot = Arc::clone(&slot);
        let label = label.to_string();
        let subscription = source.subscribe(move |state: &Arc<NormalizedState<T>>| {
            let reason = match tx.try_send(WatchEvent::Snapshot(Arc::clone(state))) {
                Ok(()) => return,
                Err(TrySendError::Full(_)) => DropReason::BufferOverflow,
                Err(TrySendError::Disconnected(_)) => DropReason::Disconnected,
            };
            tracing::warn!(store = %label, %reason, "dropping watch");

            // Send dropped event (best effort)
            let _ = tx.try_send(WatchEvent::Dropped { reason });
            let dropped = own_slot.lock().take();
            drop(dropped);
        });

        // Overflow on the very first snapshot cannot happen with a buffer of
        // at least one, so the slot is always filled here.
        *slot.lock() = Some(subscription);

        Self {
            receiver,
            sender,
            slot,
        }
    }
}

impl<T> WatchHandle<T> {
    /// Receive the next event (blocking).
    pub fn recv(&self) -> Result<WatchEvent<T>, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Result<WatchEvent<T>, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<WatchEvent<T>, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Whether the watch still receives snapshots.
    pub fn is_active(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Stop the watch. Idempotent.
    pub fn unsubscribe(&self) {
        let subscription = self.slot.lock().take();
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
            let _ = self.sender.try_send(WatchEvent::Dropped {
                reason: DropReason::Unsubscribed,
            });
        }
    }
}

impl<T> Drop for WatchHandle<T> {
    fn drop(&mut self) {
        let subscription = self.slot.lock().take();
        drop(subscription);
    }
}

//! Observable value cell with synchronous delivery.

use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use super::types::{Subscription, SubscriptionId};

type Callback<V> = Arc<dyn Fn(&V) + Send + Sync>;

/// Registered callback.
struct Subscriber<V> {
    id: SubscriptionId,
    /// Cleared on unsubscribe so queued deliveries are skipped.
    active: Arc<AtomicBool>,
    callback: Callback<V>,
}

impl<V> Clone for Subscriber<V> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            active: Arc::clone(&self.active),
            callback: Arc::clone(&self.callback),
        }
    }
}

struct Inner<V> {
    value: RwLock<V>,
    subscribers: Mutex<Vec<Subscriber<V>>>,
    /// Deliveries not yet made, in order.
    pending: Mutex<VecDeque<(Subscriber<V>, Arc<V>)>>,
    /// Set while some caller is draining `pending`.
    draining: AtomicBool,
    /// Serializes writers.
    write_lock: Mutex<()>,
    next_id: AtomicU64,
}

/// A shared value that notifies subscribers when it is replaced.
///
/// Cloning an `Observable` creates a new handle to the **same** value.
///
/// # Invariants
///
/// 1. `subscribe` delivers the current value to the new callback before it
///    returns.
/// 2. Every write delivers the new value to each subscriber exactly once, in
///    subscription order, after the value has been replaced.
/// 3. No lock is held while callbacks run. A write made from inside a
///    callback is queued and delivered after the current round, so every
///    subscriber sees values in write order.
/// 4. Deliveries are queued while the writer lock is held, so writes from
///    different threads reach subscribers in the order they were applied.
pub struct Observable<V> {
    inner: Arc<Inner<V>>,
}

impl<V> Clone for Observable<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for Observable<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &*self.inner.value.read())
            .field("subscribers", &self.inner.subscribers.lock().len())
            .finish()
    }
}

impl<V: Clone + Send + Sync + 'static> Observable<V> {
    pub fn new(value: V) -> Self {
        Self {
            inner: Arc::new(Inner {
                value: RwLock::new(value),
                subscribers: Mutex::new(Vec::new()),
                pending: Mutex::new(VecDeque::new()),
                draining: AtomicBool::new(false),
                write_lock: Mutex::new(()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Current value.
    pub fn get(&self) -> V {
        self.inner.value.read().clone()
    }

    /// Replace the value and notify every subscriber.
    pub fn set(&self, value: V) {
        let guard = self.inner.write_lock.lock();
        *self.inner.value.write() = value.clone();
        self.enqueue(value);
        drop(guard);
        self.drain();
    }

    /// Compute a new value from the current one.
    ///
    /// Returning `None` leaves the value alone and notifies nobody. Returns
    /// whether the value was replaced.
    pub fn update(&self, f: impl FnOnce(&V) -> Option<V>) -> bool {
        match self.try_update(|current| Ok::<_, std::convert::Infallible>(f(current))) {
            Ok(replaced) => replaced,
            Err(never) => match never {},
        }
    }

    /// Like [`Observable::update`], with a fallible computation.
    ///
    /// On error the value is left alone and nobody is notified.
    pub fn try_update<E>(
        &self,
        f: impl FnOnce(&V) -> Result<Option<V>, E>,
    ) -> Result<bool, E> {
        let guard = self.inner.write_lock.lock();
        let current = self.get();

        let next = match f(&current)? {
            Some(next) => next,
            None => return Ok(false),
        };

        *self.inner.value.write() = next.clone();
        self.enqueue(next);
        drop(guard);

        self.drain();
        Ok(true)
    }

    /// Register a callback. It receives the current value immediately, then
    /// every later value.
    pub fn subscribe(&self, callback: impl Fn(&V) + Send + Sync + 'static) -> Subscription {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::SeqCst));
        let subscriber = Subscriber {
            id,
            active: Arc::new(AtomicBool::new(true)),
            callback: Arc::new(callback),
        };

        let active = Arc::clone(&subscriber.active);
        let callback = Arc::clone(&subscriber.callback);

        // Registered before the first delivery, so a write made from that
        // delivery reaches this subscriber too.
        let current = {
            let _guard = self.inner.write_lock.lock();
            self.inner.subscribers.lock().push(subscriber);
            self.get()
        };
        tracing::trace!(subscription = id.0, "subscribed");

        // Built before the first delivery so a panicking callback unregisters.
        let weak: Weak<Inner<V>> = Arc::downgrade(&self.inner);
        let subscription = Subscription::new(move || {
            active.store(false, Ordering::Release);
            if let Some(inner) = weak.upgrade() {
                inner.subscribers.lock().retain(|s| s.id != id);
                tracing::trace!(subscription = id.0, "unsubscribed");
            }
        });

        callback(&current);
        subscription
    }

    /// Number of registered callbacks.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }

    /// Queue `value` for every current subscriber. Called with `write_lock`
    /// held so deliveries are queued in swap order.
    fn enqueue(&self, value: V) {
        let value = Arc::new(value);
        let subscribers = self.inner.subscribers.lock();
        let mut pending = self.inner.pending.lock();
        pending.extend(subscribers.iter().map(|s| (s.clone(), Arc::clone(&value))));
    }

    fn drain(&self) {
        loop {
            if self.inner.draining.swap(true, Ordering::AcqRel) {
                // An outer call on the stack (or another thread) delivers.
                return;
            }

            {
                let _reset = DrainGuard(&self.inner);
                loop {
                    let next = self.inner.pending.lock().pop_front();
                    let Some((subscriber, value)) = next else {
                        break;
                    };
                    if subscriber.active.load(Ordering::Acquire) {
                        (subscriber.callback)(&value);
                    }
                }
            }

            // A delivery queued between the last pop and the reset would
            // otherwise wait for the next write.
            if self.inner.pending.lock().is_empty() {
                return;
            }
        }
    }
}

/// Clears the draining flag, and the queue if a callback panicked.
struct DrainGuard<'a, V>(&'a Inner<V>);

impl<V> Drop for DrainGuard<'_, V> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.pending.lock().clear();
        }
        self.0.draining.store(false, Ordering::Release);
    }
}

//! Derived, read-only views over an [`Observable`].

use std::fmt;
use std::sync::Arc;

use super::observable::Observable;
use super::types::Subscription;

struct ViewInner<V> {
    output: Observable<V>,
    /// Keeps the view attached to its source.
    _upstream: Subscription,
}

/// A projection of an observable source that stays up to date.
///
/// The projection is recomputed on every source notification and redelivered
/// to the view's subscribers without comparing it to the previous value.
///
/// Cloning a `View` creates a new handle to the **same** projection. The view
/// detaches from its source once every handle and every subscription to it
/// has been dropped.
pub struct View<V> {
    inner: Arc<ViewInner<V>>,
}

impl<V> Clone for View<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Clone + fmt::Debug + Send + Sync + 'static> fmt::Debug for View<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("value", &self.inner.output.get())
            .finish()
    }
}

impl<V: Clone + Send + Sync + 'static> View<V> {
    /// Derive a view from `source` through `map`.
    pub fn derive<S>(source: &Observable<S>, map: impl Fn(&S) -> V + Send + Sync + 'static) -> Self
    where
        S: Clone + Send + Sync + 'static,
    {
        let output = Observable::new(map(&source.get()));

        let target = output.clone();
        let upstream = source.subscribe(move |value: &S| target.set(map(value)));

        Self {
            inner: Arc::new(ViewInner {
                output,
                _upstream: upstream,
            }),
        }
    }

    /// Current projected value.
    pub fn get(&self) -> V {
        self.inner.output.get()
    }

    /// Register a callback. It receives the current projection immediately,
    /// then one projection per source notification.
    pub fn subscribe(&self, callback: impl Fn(&V) + Send + Sync + 'static) -> Subscription {
        let subscription = self.inner.output.subscribe(callback);
        let keep_alive = Arc::clone(&self.inner);
        Subscription::new(move || {
            subscription.unsubscribe();
            drop(keep_alive);
        })
    }

    /// Number of callbacks subscribed to this view.
    pub fn subscriber_count(&self) -> usize {
        self.inner.output.subscriber_count()
    }
}

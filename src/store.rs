//! Main EntityStore struct tying all components together.

use crate::error::{BoxError, Result};
use crate::selector::{resolve, Selection, Selector};
use crate::state::{self, normalize, NormalizedState};
use crate::subscriptions::{Observable, Subscription, View, WatchConfig, WatchHandle};
use crate::types::{GetId, Id};
use std::fmt;
use std::sync::Arc;

/// Store configuration.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Name attached to the store's log events.
    pub label: String,

    /// Capacity reserved for the seeded snapshot.
    pub capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            label: "entities".to_string(),
            capacity: 0,
        }
    }
}

/// The normalized entity store.
///
/// Provides a unified interface for:
/// - Adding and replacing entities (`set`, `set_many`)
/// - Removing and transforming entities by [`Selector`]
/// - Live read views (`get`, `get_many`, `filter`, `get_all`, `view`)
/// - Subscribing to the raw normalized snapshot
///
/// Every write builds a complete new snapshot, swaps it in, then notifies
/// subscribers once. `set_many` with no entities and `reset` on an empty
/// store notify nobody; `remove` and `update` always notify once.
///
/// Cloning an `EntityStore` creates a new handle to the **same** store.
///
/// `get_id` and update transforms run while the store's writer lock is held
/// and must not write to the same store. Subscriber callbacks run with no
/// lock held and may read or write freely.
pub struct EntityStore<T> {
    /// Store configuration.
    config: Arc<StoreConfig>,

    /// Entity id extractor, fixed for the store's lifetime.
    get_id: GetId<T>,

    /// Current snapshot.
    state: Observable<Arc<NormalizedState<T>>>,
}

impl<T> Clone for EntityStore<T> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            get_id: Arc::clone(&self.get_id),
            state: self.state.clone(),
        }
    }
}

impl<T> fmt::Debug for EntityStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityStore")
            .field("label", &self.config.label)
            .finish_non_exhaustive()
    }
}

impl<T: Clone + Send + Sync + 'static> EntityStore<T> {
    /// Create an empty store.
    pub fn new(get_id: impl Fn(&T) -> Id + Send + Sync + 'static) -> Self {
        Self::with_config(get_id, Vec::new(), StoreConfig::default())
    }

    /// Create a store seeded with `entities`, in order.
    pub fn with_records(
        get_id: impl Fn(&T) -> Id + Send + Sync + 'static,
        entities: impl IntoIterator<Item = T>,
    ) -> Self {
        Self::with_config(get_id, entities, StoreConfig::default())
    }

    /// Create a store with explicit configuration.
    pub fn with_config(
        get_id: impl Fn(&T) -> Id + Send + Sync + 'static,
        entities: impl IntoIterator<Item = T>,
        config: StoreConfig,
    ) -> Self {
        let get_id: GetId<T> = Arc::new(get_id);

        let mut seeded = normalize(&*get_id, entities);
        seeded.reserve(config.capacity.saturating_sub(seeded.len()));
        tracing::debug!(store = %config.label, count = seeded.len(), "created store");

        Self {
            config: Arc::new(config),
            get_id,
            state: Observable::new(Arc::new(seeded)),
        }
    }

    /// Store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // --- Reads ---

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<NormalizedState<T>> {
        self.state.get()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    pub fn contains(&self, id: impl Into<Id>) -> bool {
        self.snapshot().contains(&id.into())
    }

    /// View of every entity, in insertion order.
    pub fn get_all(&self) -> View<Vec<T>> {
        self.view_with(Selector::All, |resolved| resolved.into_vec())
    }

    /// View of one entity; `None` while no entity has this id.
    pub fn get(&self, id: impl Into<Id>) -> View<Option<T>> {
        self.view_with(Selector::Id(id.into()), |resolved| resolved.into_option())
    }

    /// View of the entities with the given ids, in the order given.
    /// Unknown ids are skipped.
    pub fn get_many<I>(&self, ids: I) -> View<Vec<T>>
    where
        I: IntoIterator,
        I::Item: Into<Id>,
    {
        self.view_with(Selector::ids(ids), |resolved| resolved.into_vec())
    }

    /// View of the entities matching `pred`, in insertion order.
    pub fn filter(&self, pred: impl Fn(&T) -> bool + Send + Sync + 'static) -> View<Vec<T>> {
        self.view_with(Selector::predicate(pred), |resolved| resolved.into_vec())
    }

    /// View of whatever `selector` denotes.
    pub fn view(&self, selector: impl Into<Selector<T>>) -> View<Selection<T>> {
        self.view_with(selector.into(), |resolved| resolved)
    }

    fn view_with<V>(
        &self,
        selector: Selector<T>,
        finish: impl Fn(Selection<T>) -> V + Send + Sync + 'static,
    ) -> View<V>
    where
        V: Clone + Send + Sync + 'static,
    {
        let get_id = Arc::clone(&self.get_id);
        View::derive(&self.state, move |state: &Arc<NormalizedState<T>>| {
            finish(resolve(&selector, &**state, &*get_id).map(T::clone))
        })
    }

    // --- Writes ---

    /// Add an entity, replacing any entity with the same id in place.
    pub fn set(&self, entity: T) {
        self.set_many(std::iter::once(entity));
    }

    /// Add entities, replacing existing ones in place and appending new ones
    /// in order. Subscribers are notified once; not at all for no entities.
    pub fn set_many(&self, entities: impl IntoIterator<Item = T>) {
        let entities: Vec<T> = entities.into_iter().collect();
        let count = entities.len();

        let written = self.state.update(|current| {
            let next = state::upsert(current, entities, &*self.get_id);
            if Arc::ptr_eq(current, &next) {
                return None;
            }
            let inserted = next.len() - current.len();
            tracing::debug!(
                store = %self.config.label,
                inserted,
                replaced = count - inserted,
                "set entities"
            );
            Some(next)
        });

        if !written {
            tracing::trace!(store = %self.config.label, "set with no entities skipped");
        }
    }

    /// Remove the entities `selector` denotes. Always notifies once.
    pub fn remove(&self, selector: impl Into<Selector<T>>) {
        let selector = selector.into();
        self.state.update(|current| {
            let next = state::remove_many(current, &selector, &*self.get_id);
            tracing::debug!(
                store = %self.config.label,
                removed = current.len() - next.len(),
                "removed entities"
            );
            Some(next)
        });
    }

    /// Replace the entities `selector` denotes with `transform(entity)`.
    /// Always notifies once.
    ///
    /// A panicking transform leaves the store unchanged and notifies nobody.
    pub fn update(&self, transform: impl Fn(&T) -> T, selector: impl Into<Selector<T>>) {
        let selector = selector.into();
        self.state.update(|current| {
            let updated = resolve(&selector, &**current, &*self.get_id).len();
            let next = state::update_many(current, &transform, &selector, &*self.get_id);
            tracing::debug!(
                store = %self.config.label,
                selector = selector_kind(&selector),
                updated,
                "updated entities"
            );
            Some(next)
        });
    }

    /// Apply `transform` to every entity. Always notifies once.
    pub fn update_all(&self, transform: impl Fn(&T) -> T) {
        self.update(transform, Selector::<T>::All);
    }

    /// Like [`EntityStore::update`], with a fallible transform.
    ///
    /// Nothing is written and nobody is notified unless the transform
    /// succeeds for every selected entity.
    pub fn try_update<E>(
        &self,
        transform: impl Fn(&T) -> std::result::Result<T, E>,
        selector: impl Into<Selector<T>>,
    ) -> Result<()>
    where
        E: Into<BoxError>,
    {
        let selector = selector.into();
        let result = self.state.try_update(|current| {
            state::try_update_many(current, &transform, &selector, &*self.get_id).map(Some)
        });

        if let Err(e) = &result {
            tracing::debug!(store = %self.config.label, error = %e, "update aborted");
        }
        result.map(|_| ())
    }

    /// Remove every entity. Notifies nobody when the store is already empty.
    pub fn reset(&self) {
        let written = self.state.update(|current| {
            let next = state::reset(current);
            (!Arc::ptr_eq(current, &next)).then_some(next)
        });

        if written {
            tracing::debug!(store = %self.config.label, "reset store");
        }
    }

    // --- Subscriptions ---

    /// Subscribe to the raw normalized snapshot. The callback receives the
    /// current snapshot immediately, then one snapshot per write.
    pub fn subscribe(
        &self,
        callback: impl Fn(&Arc<NormalizedState<T>>) + Send + Sync + 'static,
    ) -> Subscription {
        self.state.subscribe(callback)
    }

    /// Receive snapshots over a bounded channel.
    pub fn watch(&self, config: WatchConfig) -> WatchHandle<T> {
        WatchHandle::attach(&self.state, config, &self.config.label)
    }

    /// Number of active subscribers, including views and watches.
    pub fn subscriber_count(&self) -> usize {
        self.state.subscriber_count()
    }
}

fn selector_kind<T>(selector: &Selector<T>) -> &'static str {
    match selector {
        Selector::All => "all",
        Selector::Id(_) => "id",
        Selector::Ids(_) => "ids",
        Selector::Record(_) => "record",
        Selector::Records(_) => "records",
        Selector::Predicate(_) => "predicate",
    }
}

//! Selectors: which entities an operation applies to.
//!
//! Reads, removals and updates all resolve their selector through
//! [`resolve`], so there is exactly one definition of what a selector means.

use crate::state::NormalizedState;
use crate::types::{Id, Predicate};
use std::fmt;
use std::sync::Arc;

/// A set of entities, named by id, by entity, or by filter.
pub enum Selector<T> {
    /// Every entity.
    All,
    /// One entity by id.
    Id(Id),
    /// Entities by id. Unknown ids are skipped.
    Ids(Vec<Id>),
    /// One entity, matched by its id.
    Record(T),
    /// Entities, matched by their ids.
    Records(Vec<T>),
    /// Entities for which the predicate holds.
    Predicate(Predicate<T>),
}

impl<T> Selector<T> {
    pub fn id(id: impl Into<Id>) -> Self {
        Selector::Id(id.into())
    }

    pub fn ids<I>(ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Id>,
    {
        Selector::Ids(ids.into_iter().map(Into::into).collect())
    }

    pub fn record(entity: T) -> Self {
        Selector::Record(entity)
    }

    pub fn records(entities: impl IntoIterator<Item = T>) -> Self {
        Selector::Records(entities.into_iter().collect())
    }

    pub fn predicate(pred: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        Selector::Predicate(Arc::new(pred))
    }

    /// Whether this selector names at most one entity.
    pub fn is_single(&self) -> bool {
        matches!(self, Selector::Id(_) | Selector::Record(_))
    }
}

impl<T: Clone> Clone for Selector<T> {
    fn clone(&self) -> Self {
        match self {
            Selector::All => Selector::All,
            Selector::Id(id) => Selector::Id(id.clone()),
            Selector::Ids(ids) => Selector::Ids(ids.clone()),
            Selector::Record(entity) => Selector::Record(entity.clone()),
            Selector::Records(entities) => Selector::Records(entities.clone()),
            Selector::Predicate(pred) => Selector::Predicate(Arc::clone(pred)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Selector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::All => write!(f, "All"),
            Selector::Id(id) => f.debug_tuple("Id").field(id).finish(),
            Selector::Ids(ids) => f.debug_tuple("Ids").field(ids).finish(),
            Selector::Record(entity) => f.debug_tuple("Record").field(entity).finish(),
            Selector::Records(entities) => f.debug_tuple("Records").field(entities).finish(),
            Selector::Predicate(_) => write!(f, "Predicate(..)"),
        }
    }
}

impl<T> Default for Selector<T> {
    fn default() -> Self {
        Selector::All
    }
}

impl<T> From<Id> for Selector<T> {
    fn from(id: Id) -> Self {
        Selector::Id(id)
    }
}

impl<T> From<&str> for Selector<T> {
    fn from(id: &str) -> Self {
        Selector::Id(id.into())
    }
}

impl<T> From<String> for Selector<T> {
    fn from(id: String) -> Self {
        Selector::Id(id.into())
    }
}

impl<T> From<i64> for Selector<T> {
    fn from(id: i64) -> Self {
        Selector::Id(id.into())
    }
}

impl<T> From<i32> for Selector<T> {
    fn from(id: i32) -> Self {
        Selector::Id(id.into())
    }
}

impl<T> From<Vec<Id>> for Selector<T> {
    fn from(ids: Vec<Id>) -> Self {
        Selector::Ids(ids)
    }
}

impl<T> From<Vec<&str>> for Selector<T> {
    fn from(ids: Vec<&str>) -> Self {
        Selector::ids(ids)
    }
}

impl<T> From<Vec<i64>> for Selector<T> {
    fn from(ids: Vec<i64>) -> Self {
        Selector::ids(ids)
    }
}

impl<T> From<Predicate<T>> for Selector<T> {
    fn from(pred: Predicate<T>) -> Self {
        Selector::Predicate(pred)
    }
}

/// Outcome of resolving a selector.
///
/// Single-entity selectors produce [`Resolved::One`] so that "no such entity"
/// stays distinct from an empty list.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolved<E> {
    One(Option<E>),
    Many(Vec<E>),
}

impl<E> Resolved<E> {
    /// Flatten into a list.
    pub fn into_vec(self) -> Vec<E> {
        match self {
            Resolved::One(entity) => entity.into_iter().collect(),
            Resolved::Many(entities) => entities,
        }
    }

    /// First resolved entity, if any.
    pub fn into_option(self) -> Option<E> {
        match self {
            Resolved::One(entity) => entity,
            Resolved::Many(entities) => entities.into_iter().next(),
        }
    }

    pub fn map<U>(self, f: impl FnMut(E) -> U) -> Resolved<U> {
        match self {
            Resolved::One(entity) => Resolved::One(entity.map(f)),
            Resolved::Many(entities) => Resolved::Many(entities.into_iter().map(f).collect()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Resolved::One(entity) => usize::from(entity.is_some()),
            Resolved::Many(entities) => entities.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Owned selection, as delivered by dynamic views.
pub type Selection<T> = Resolved<T>;

/// Resolve a selector to `(id, entity)` pairs of the given state.
///
/// List results follow the order of `state.all_ids()`, except for `Ids` and
/// `Records`, which follow the order of the selector.
pub fn resolve_entries<'a, T>(
    selector: &Selector<T>,
    state: &'a NormalizedState<T>,
    get_id: &dyn Fn(&T) -> Id,
) -> Resolved<(&'a Id, &'a T)> {
    match selector {
        Selector::All => Resolved::Many(state.iter().collect()),
        Selector::Id(id) => Resolved::One(state.by_id().get_key_value(id)),
        Selector::Ids(ids) => Resolved::Many(lookup_all(state, ids.iter().cloned())),
        Selector::Record(entity) => Resolved::One(state.by_id().get_key_value(&get_id(entity))),
        Selector::Records(entities) => {
            Resolved::Many(lookup_all(state, entities.iter().map(|e| get_id(e))))
        }
        Selector::Predicate(pred) => {
            Resolved::Many(state.iter().filter(|(_, entity)| pred(*entity)).collect())
        }
    }
}

/// Resolve a selector to entities of the given state.
pub fn resolve<'a, T>(
    selector: &Selector<T>,
    state: &'a NormalizedState<T>,
    get_id: &dyn Fn(&T) -> Id,
) -> Resolved<&'a T> {
    resolve_entries(selector, state, get_id).map(|(_, entity)| entity)
}

fn lookup_all<'a, T>(
    state: &'a NormalizedState<T>,
    ids: impl Iterator<Item = Id>,
) -> Vec<(&'a Id, &'a T)> {
    ids.filter_map(|id| state.by_id().get_key_value(&id)).collect()
}

//! Mutation engine.
//!
//! Every operation reads the current snapshot and builds a complete new one;
//! the input snapshot is never modified. Operations that leave the state
//! untouched by contract return the input `Arc` itself, which callers detect
//! with [`Arc::ptr_eq`] to skip notification.

use crate::error::{BoxError, Result, StoreError};
use crate::selector::{resolve_entries, Selector};
use crate::state::NormalizedState;
use crate::types::Id;
use std::collections::HashSet;
use std::sync::Arc;

/// Insert new entities and replace existing ones.
///
/// Existing ids keep their position; new ids are appended in input order.
/// An empty input returns `state` itself.
pub fn upsert<T: Clone>(
    state: &Arc<NormalizedState<T>>,
    entities: Vec<T>,
    get_id: &dyn Fn(&T) -> Id,
) -> Arc<NormalizedState<T>> {
    if entities.is_empty() {
        return Arc::clone(state);
    }

    let mut next = (**state).clone();
    for entity in entities {
        next.insert(get_id(&entity), entity);
    }
    Arc::new(next)
}

/// Remove every entity the selector resolves to.
///
/// Always returns a new snapshot, equal in content to `state` when nothing
/// matched.
pub fn remove_many<T: Clone>(
    state: &Arc<NormalizedState<T>>,
    selector: &Selector<T>,
    get_id: &dyn Fn(&T) -> Id,
) -> Arc<NormalizedState<T>> {
    let doomed: HashSet<&Id> = resolve_entries(selector, &**state, get_id)
        .into_vec()
        .into_iter()
        .map(|(id, _)| id)
        .collect();

    let mut next = NormalizedState::with_capacity(state.len().saturating_sub(doomed.len()));
    for (id, entity) in state.iter().filter(|(id, _)| !doomed.contains(id)) {
        next.insert(id.clone(), entity.clone());
    }
    Arc::new(next)
}

/// Replace every entity the selector resolves to with `transform(entity)`.
///
/// `all_ids` is never changed. The transform must keep the entity's id.
pub fn update_many<T: Clone>(
    state: &Arc<NormalizedState<T>>,
    transform: &dyn Fn(&T) -> T,
    selector: &Selector<T>,
    get_id: &dyn Fn(&T) -> Id,
) -> Arc<NormalizedState<T>> {
    let updated: Vec<(Id, T)> = resolve_entries(selector, &**state, get_id)
        .into_vec()
        .into_iter()
        .map(|(id, entity)| (id.clone(), transform(entity)))
        .collect();

    Arc::new(apply_updates(&**state, updated))
}

/// Like [`update_many`], with a fallible transform.
///
/// The first failure aborts the whole update; no partial snapshot is built.
pub fn try_update_many<T, E>(
    state: &Arc<NormalizedState<T>>,
    transform: &dyn Fn(&T) -> std::result::Result<T, E>,
    selector: &Selector<T>,
    get_id: &dyn Fn(&T) -> Id,
) -> Result<Arc<NormalizedState<T>>>
where
    T: Clone,
    E: Into<BoxError>,
{
    let mut updated = Vec::new();
    for (id, entity) in resolve_entries(selector, &**state, get_id).into_vec() {
        match transform(entity) {
            Ok(value) => updated.push((id.clone(), value)),
            Err(e) => {
                return Err(StoreError::Transform {
                    id: id.clone(),
                    source: e.into(),
                })
            }
        }
    }

    Ok(Arc::new(apply_updates(&**state, updated)))
}

/// The canonical empty state, or `state` itself when it is already empty.
pub fn reset<T>(state: &Arc<NormalizedState<T>>) -> Arc<NormalizedState<T>> {
    if state.is_empty() {
        Arc::clone(state)
    } else {
        Arc::new(NormalizedState::new())
    }
}

fn apply_updates<T: Clone>(state: &NormalizedState<T>, updated: Vec<(Id, T)>) -> NormalizedState<T> {
    let mut next = state.clone();
    for (id, value) in updated {
        next.replace(&id, value);
    }
    next
}

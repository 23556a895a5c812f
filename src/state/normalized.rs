//! Normalized entity state.

use crate::error::{Result, StoreError};
use crate::types::Id;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{HashMap, HashSet};

/// Entities keyed by id, plus their insertion order.
///
/// # Invariants
///
/// 1. `all_ids` contains no duplicate id.
/// 2. The key set of `by_id` and the set of `all_ids` are equal.
/// 3. Replacing an existing entity never moves its id; new ids are appended.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(
    try_from = "RawState<T>",
    bound(deserialize = "T: Deserialize<'de>")
)]
pub struct NormalizedState<T> {
    by_id: HashMap<Id, T>,
    all_ids: Vec<Id>,
}

impl<T> NormalizedState<T> {
    /// Create an empty state.
    pub fn new() -> Self {
        Self {
            by_id: HashMap::new(),
            all_ids: Vec::new(),
        }
    }

    /// Create an empty state with room for `capacity` entities.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            by_id: HashMap::with_capacity(capacity),
            all_ids: Vec::with_capacity(capacity),
        }
    }

    /// Build a state from raw parts, checking the invariants.
    pub fn from_parts(by_id: HashMap<Id, T>, all_ids: Vec<Id>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(all_ids.len());
        for id in &all_ids {
            if !seen.insert(id) {
                return Err(StoreError::DuplicateId(id.clone()));
            }
            if !by_id.contains_key(id) {
                return Err(StoreError::MissingRecord(id.clone()));
            }
        }

        if by_id.len() != all_ids.len() {
            if let Some(orphan) = by_id.keys().find(|id| !seen.contains(id)) {
                return Err(StoreError::OrphanRecord(orphan.clone()));
            }
        }

        Ok(Self { by_id, all_ids })
    }

    /// Entities keyed by id.
    pub fn by_id(&self) -> &HashMap<Id, T> {
        &self.by_id
    }

    /// Ids in insertion order.
    pub fn all_ids(&self) -> &[Id] {
        &self.all_ids
    }

    /// Look up an entity.
    pub fn get(&self, id: &Id) -> Option<&T> {
        self.by_id.get(id)
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.all_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all_ids.is_empty()
    }

    /// Iterate `(id, entity)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Id, &T)> + '_ {
        self.all_ids
            .iter()
            .filter_map(move |id| self.by_id.get(id).map(|entity| (id, entity)))
    }

    /// Iterate entities in insertion order.
    pub fn entities(&self) -> impl Iterator<Item = &T> + '_ {
        self.iter().map(|(_, entity)| entity)
    }

    /// Insert or replace an entity. Only new ids are appended to `all_ids`.
    pub(crate) fn insert(&mut self, id: Id, entity: T) {
        if self.by_id.insert(id.clone(), entity).is_none() {
            self.all_ids.push(id);
        }
    }

    /// Replace the entity stored under an existing id. Unknown ids are ignored.
    pub(crate) fn replace(&mut self, id: &Id, entity: T) {
        if let Some(slot) = self.by_id.get_mut(id) {
            *slot = entity;
        }
    }

    /// Reserve room for `additional` more entities.
    pub(crate) fn reserve(&mut self, additional: usize) {
        self.by_id.reserve(additional);
        self.all_ids.reserve(additional);
    }

    /// Decompose into `(by_id, all_ids)`.
    pub fn into_parts(self) -> (HashMap<Id, T>, Vec<Id>) {
        (self.by_id, self.all_ids)
    }
}

impl<T: Clone> NormalizedState<T> {
    /// Clone entities out in insertion order.
    pub fn to_vec(&self) -> Vec<T> {
        self.entities().cloned().collect()
    }
}

impl<T: Serialize> NormalizedState<T> {
    /// Encode as JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl<T: for<'de> Deserialize<'de>> NormalizedState<T> {
    /// Decode from JSON produced by [`NormalizedState::to_json`].
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl<T> Default for NormalizedState<T> {
    fn default() -> Self {
        Self::new()
    }
}

// JSON object keys are always strings, so `byId` is encoded as ordered
// `[id, entity]` pairs to keep numeric ids numeric.
impl<T: Serialize> Serialize for NormalizedState<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let entries: Vec<(&Id, &T)> = self.iter().collect();
        let mut out = serializer.serialize_struct("NormalizedState", 2)?;
        out.serialize_field("byId", &entries)?;
        out.serialize_field("allIds", &self.all_ids)?;
        out.end()
    }
}

/// Wire form of [`NormalizedState`] before invariant checks.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawState<T> {
    by_id: Vec<(Id, T)>,
    all_ids: Vec<Id>,
}

impl<T> TryFrom<RawState<T>> for NormalizedState<T> {
    type Error = StoreError;

    fn try_from(raw: RawState<T>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(raw.by_id.len());
        for (id, entity) in raw.by_id {
            if by_id.insert(id.clone(), entity).is_some() {
                return Err(StoreError::DuplicateId(id));
            }
        }
        Self::from_parts(by_id, raw.all_ids)
    }
}

/// Normalize entities in order.
///
/// When an id repeats, the later entity wins in `by_id` while the id keeps
/// the position of its first occurrence.
pub fn normalize<T, I>(get_id: &dyn Fn(&T) -> Id, entities: I) -> NormalizedState<T>
where
    I: IntoIterator<Item = T>,
{
    let entities = entities.into_iter();
    let mut state = NormalizedState::with_capacity(entities.size_hint().0);
    for entity in entities {
        state.insert(get_id(&entity), entity);
    }
    state
}

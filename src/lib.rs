//! # Entity Store
//!
//! An in-memory, normalized entity store with live, subscribable views.
//!
//! ## Core Concepts
//!
//! - **Entities**: Caller-defined values, identified by a fixed `get_id` function
//! - **Normalized state**: Entities by id plus insertion order, replaced wholesale on write
//! - **Selectors**: One type naming entities by id, ids, entity, entities, or predicate
//! - **Views**: Read-only projections that update on every write
//!
//! ## Example
//!
//! ```
//! use entity_store::{EntityStore, Id, Selector};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Todo {
//!     id: String,
//!     completed: bool,
//! }
//!
//! let store = EntityStore::new(|t: &Todo| Id::from(t.id.as_str()));
//! let open = store.filter(|t| !t.completed);
//!
//! store.set_many(vec![
//!     Todo { id: "abc".into(), completed: false },
//!     Todo { id: "def".into(), completed: true },
//! ]);
//! assert_eq!(open.get().len(), 1);
//!
//! // Toggle every open todo
//! store.update(
//!     |t| Todo { completed: !t.completed, ..t.clone() },
//!     Selector::predicate(|t: &Todo| !t.completed),
//! );
//! assert!(open.get().is_empty());
//! ```

pub mod error;
pub mod selector;
pub mod state;
pub mod store;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use error::{BoxError, Result, StoreError};
pub use selector::{resolve, resolve_entries, Resolved, Selection, Selector};
pub use state::{normalize, NormalizedState};
pub use store::{EntityStore, StoreConfig};
pub use subscriptions::{
    DropReason, Observable, Subscription, SubscriptionId, View, WatchConfig, WatchEvent,
    WatchHandle,
};
pub use types::*;

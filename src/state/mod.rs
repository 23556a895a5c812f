//! Normalized state and the operations that produce new snapshots.
//!
//! A snapshot is never mutated once published; every write builds a new
//! [`NormalizedState`] from the current one.

mod normalized;
mod operations;

pub use normalized::{normalize, NormalizedState};
pub use operations::{remove_many, reset, try_update_many, update_many, upsert};

//! Reactive layer: observable values, derived views, and watches.
//!
//! - [`Observable`]: a shared value with synchronous change notification.
//! - [`View`]: a read-only projection of an observable that recomputes on
//!   every source notification.
//! - [`WatchHandle`]: snapshots delivered over a bounded channel, with
//!   slow-consumer dropping.
//!
//! # Example
//!
//! ```
//! use entity_store::subscriptions::{Observable, View};
//!
//! let count = Observable::new(1);
//! let doubled = View::derive(&count, |n: &i32| n * 2);
//!
//! let sub = doubled.subscribe(|n| println!("doubled: {n}"));
//! count.set(21);
//! assert_eq!(doubled.get(), 42);
//! sub.unsubscribe();
//! ```

mod observable;
mod types;
mod view;
mod watch;

pub use observable::Observable;
pub use types::{DropReason, Subscription, SubscriptionId, WatchConfig, WatchEvent};
pub use view::View;
pub use watch::WatchHandle;

//! # Statekit
//!
//! Two small state-management building blocks for view code that re-renders
//! itself when state changes.
//!
//! ## Local state
//!
//! [`LocalState<T>`] is a single value cell owned by one component:
//! - `get` reads the value, `set`/`update` write it
//! - writes that yield the same value (see [`SameValue`]) are ignored
//! - every other write synchronously notifies all subscribers
//!
//! ## Store
//!
//! [`Store<S>`] holds an immutable snapshot of a shared record:
//! - `set_state` merges a partial record shallowly and publishes a new snapshot
//! - listeners are notified after every commit
//! - [`AppState`] adds the todo and theme actions, and [`store::global`]
//!   is the process-wide instance
//!
//! A listener that fails or panics is logged through `tracing` and never
//! stops the remaining listeners or reaches the writer.

pub mod error;
pub mod listeners;
pub mod state;
pub mod store;

// Re-export main types for convenience
pub use error::{BoxError, ListenerError, ParseThemeError};
pub use listeners::{Listener, Listeners, NotifyReport, Unsubscribe};
pub use state::{create_state, LocalState, SameValue, Update};
pub use store::{AppPatch, AppState, Patch, Store, Theme, TodoId, TodoItem, Todos};

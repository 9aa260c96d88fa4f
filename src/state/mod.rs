//! Component-local reactive state.
//!
//! A [`LocalState`] is a single value cell with get/set/subscribe semantics.
//! Writes that produce the same value (by [`SameValue`]) are dropped;
//! every other write notifies all subscribers synchronously.

mod local_state;
mod same_value;

pub use local_state::{create_state, LocalState, Update};
pub use same_value::SameValue;

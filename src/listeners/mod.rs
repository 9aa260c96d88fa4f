//! Listener registration and synchronous notification.
//!
//! Both [`LocalState`](crate::LocalState) and [`Store`](crate::Store) keep
//! their subscribers in a [`Listeners`] registry. A notification pass calls
//! every registered callback in registration order and isolates failures:
//! an error or panic in one listener is logged and the pass moves on.

mod registry;

pub use registry::{Listener, Listeners, NotifyReport, Unsubscribe};

//! Shared application state.
//!
//! A [`Store`] holds one immutable snapshot at a time. Updates are patches
//! merged shallowly into the current snapshot to build the next one, which
//! is then published and announced to every listener. [`AppState`] is the
//! application's record (theme and todo list); its actions live on
//! `Store<AppState>`, and [`global`] gives the process-wide instance.

mod app;
mod global;
mod store;

pub use app::{AppPatch, AppState, Theme, TodoId, TodoItem, Todos};
pub use global::{
    add_todo, get_state, global, remove_todo, set_state, subscribe_to_state, toggle_theme,
    toggle_todo,
};
pub use store::{Patch, Store};

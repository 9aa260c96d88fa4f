use super::{AppPatch, AppState, Store, TodoId};
use crate::listeners::Unsubscribe;
use std::sync::{Arc, OnceLock};

/// The process-wide application store.
///
/// Created on first use with [`AppState::default`] and kept for the life of
/// the process.
pub fn global() -> &'static Store<AppState> {
    static STORE: OnceLock<Store<AppState>> = OnceLock::new();
    STORE.get_or_init(|| {
        tracing::debug!("initializing global store");
        Store::default()
    })
}

/// Current global snapshot.
pub fn get_state() -> Arc<AppState> {
    global().get_state()
}

/// Shallow-merge `patch` into the global state.
pub fn set_state(patch: AppPatch) {
    global().set_state(patch);
}

/// Subscribe to the global store.
pub fn subscribe_to_state<F>(callback: F) -> Unsubscribe
where
    F: Fn(&Arc<AppState>) + Send + Sync + 'static,
{
    global().subscribe(callback)
}

pub fn add_todo(text: impl Into<String>) -> TodoId {
    global().add_todo(text)
}

pub fn toggle_todo(id: TodoId) {
    global().toggle_todo(id);
}

pub fn remove_todo(id: TodoId) {
    global().remove_todo(id);
}

pub fn toggle_theme() {
    global().toggle_theme();
}

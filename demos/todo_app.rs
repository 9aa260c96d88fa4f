//! Header and todo list bound to the global store.
//!
//! Run with `cargo run --example todo_app`. Both views read the store once
//! to render, then re-render wholesale on every notification.

use statekit::store::{self, AppState};
use statekit::TodoId;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Applies the current theme to the "document".
struct Header;

impl Header {
    fn mount() -> Self {
        apply_theme(&store::get_state());
        store::subscribe_to_state(|state| apply_theme(state));
        Header
    }

    fn on_theme_click(&self) {
        store::toggle_theme();
    }
}

fn apply_theme(state: &AppState) {
    println!("   <html data-theme=\"{}\">", state.theme);
}

/// Renders the todo list and forwards user input to the store actions.
struct TodoList;

impl TodoList {
    fn mount() -> Self {
        render_list(&store::get_state());
        store::subscribe_to_state(|state: &Arc<AppState>| render_list(state));
        TodoList
    }

    /// Returns the new id, or `None` if the input was blank.
    fn on_add(&self, input: &str) -> Option<TodoId> {
        let text = input.trim();
        if text.is_empty() {
            return None;
        }
        Some(store::add_todo(text))
    }

    fn on_toggle(&self, id: TodoId) {
        store::toggle_todo(id);
    }

    fn on_remove(&self, id: TodoId) {
        store::remove_todo(id);
    }
}

fn render_list(state: &AppState) {
    if state.todos.is_empty() {
        println!("   No tasks yet. Add one!");
        return;
    }
    for item in state.todos.iter() {
        let mark = if item.done { "x" } else { " " };
        println!("   [{mark}] {} (#{})", item.text, item.id);
    }
    println!("   {} remaining", state.remaining());
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== Todo app (global store) ===\n");
    let header = Header::mount();
    let todos = TodoList::mount();

    println!("\nAdd \"  Buy milk  \"");
    let milk = todos.on_add("  Buy milk  ");

    println!("\nAdd \"   \" (ignored)");
    assert!(todos.on_add("   ").is_none());

    println!("\nAdd \"Walk the dog\"");
    let dog = todos.on_add("Walk the dog");

    if let Some(milk) = milk {
        println!("\nToggle \"Buy milk\"");
        todos.on_toggle(milk);
    }

    if let Some(dog) = dog {
        println!("\nRemove \"Walk the dog\"");
        todos.on_remove(dog);
    }

    println!("\nToggle theme");
    header.on_theme_click();
}

//! Integration tests for Statekit

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use statekit::{create_state, AppPatch, AppState, LocalState, Store, Theme, TodoId, Unsubscribe};

#[test]
fn local_state_integration() {
    let count = create_state(0i64);

    // Test read
    assert_eq!(count.get(), 0);

    // Test write
    count.set(42);
    assert_eq!(count.get(), 42);

    // Test update
    count.update(|n| n + 10);
    assert_eq!(count.get(), 52);
}

#[test]
fn counter_component_renders_on_change() {
    // A view binds once, renders the initial value, then re-renders per change.
    let count = LocalState::new(0i64);
    let rendered = Arc::new(Mutex::new(vec![count.get().to_string()]));

    let rendered_clone = rendered.clone();
    count.subscribe(move |value| rendered_clone.lock().unwrap().push(value.to_string()));

    count.update(|v| v - 1);
    count.update(|v| v + 1);
    count.update(|v| v + 1);
    count.set(0);
    count.set(0);

    assert_eq!(*rendered.lock().unwrap(), vec!["0", "-1", "0", "1", "0"]);
}

#[test]
fn clones_share_a_cell_but_instances_are_isolated() {
    let a = LocalState::new(String::from("a"));
    let a_handle = a.clone();
    let b = LocalState::new(String::from("b"));

    a_handle.set("changed".to_string());
    assert_eq!(a.get(), "changed");
    assert_eq!(b.get(), "b");
}

#[test]
fn unsubscribing_during_notification_does_not_crash() {
    let state = LocalState::new(0);
    let calls = Arc::new(AtomicUsize::new(0));
    let handles: Arc<Mutex<Vec<Unsubscribe>>> = Arc::new(Mutex::new(Vec::new()));

    for _ in 0..3 {
        let calls_clone = calls.clone();
        let handles_clone = handles.clone();
        let handle = state.subscribe(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            for handle in handles_clone.lock().unwrap().iter() {
                handle.unsubscribe();
            }
        });
        handles.lock().unwrap().push(handle);
    }

    state.set(1);
    state.set(2);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(state.subscriber_count(), 0);
}

#[test]
fn store_integration() {
    let store = Store::<AppState>::default();

    // Test get
    assert_eq!(store.get_state().theme, Theme::Light);
    assert!(store.get_state().todos.is_empty());

    // Test actions
    let milk = store.add_todo("Buy milk");
    let bread = store.add_todo("Buy bread");
    store.toggle_todo(milk);
    store.remove_todo(bread);
    store.toggle_theme();

    let state = store.get_state();
    assert_eq!(state.theme, Theme::Dark);
    assert_eq!(state.todos.len(), 1);
    assert_eq!(state.todos[0].id, milk);
    assert!(state.todos[0].done);
}

#[test]
fn store_subscribe() {
    let store = Store::<AppState>::default();

    let call_count = Arc::new(AtomicUsize::new(0));
    let call_count_clone = call_count.clone();

    store.subscribe(move |_state| {
        call_count_clone.fetch_add(1, Ordering::SeqCst);
    });

    assert_eq!(call_count.load(Ordering::SeqCst), 0);

    store.set_state(AppPatch::default());
    assert_eq!(call_count.load(Ordering::SeqCst), 1);

    store.remove_todo(TodoId(1));
    assert_eq!(call_count.load(Ordering::SeqCst), 2);
}

#[test]
fn old_snapshots_never_change() {
    let store = Store::<AppState>::default();
    let id = store.add_todo("a");
    let snapshot = store.get_state();

    store.toggle_todo(id);
    store.toggle_theme();
    store.add_todo("b");

    assert_eq!(snapshot.theme, Theme::Light);
    assert_eq!(snapshot.todos.len(), 1);
    assert!(!snapshot.todos[0].done);
}

#[test]
fn todo_view_renders_every_commit() {
    let store = Store::<AppState>::default();
    let frames: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    let render = |state: &AppState| -> String {
        if state.todos.is_empty() {
            return "(empty)".to_string();
        }
        state
            .todos
            .iter()
            .map(|item| format!("[{}] {}", if item.done { "x" } else { " " }, item.text))
            .collect::<Vec<_>>()
            .join(", ")
    };

    frames.lock().unwrap().push(render(&store.get_state()));
    let frames_clone = frames.clone();
    store.subscribe(move |state| frames_clone.lock().unwrap().push(render(state)));

    let id = store.add_todo("write tests");
    store.toggle_todo(id);
    store.remove_todo(id);

    assert_eq!(
        *frames.lock().unwrap(),
        vec!["(empty)", "[ ] write tests", "[x] write tests", "(empty)"]
    );
}

#[test]
fn store_is_shareable_across_threads() {
    let store = Store::<AppState>::default();
    let workers: Vec<_> = (0..4)
        .map(|n| {
            let store = store.clone();
            std::thread::spawn(move || {
                for i in 0..25 {
                    store.add_todo(format!("worker {n} item {i}"));
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    let state = store.get_state();
    assert_eq!(state.todos.len(), 100);
    let mut ids: Vec<_> = state.todos.iter().map(|item| item.id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 100);
}

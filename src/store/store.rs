use crate::error::BoxError;
use crate::listeners::{Listener, Listeners, Unsubscribe};
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::sync::Arc;

/// State that can be updated by merging a partial record into it.
pub trait Patch: Sized {
    /// Partial record. Fields that are present replace the matching
    /// top-level fields; absent fields are carried over unchanged.
    type Patch;

    /// Build the next state from `self` and `patch`. `self` is not modified.
    fn merge(&self, patch: Self::Patch) -> Self;
}

struct Inner<S> {
    // Serializes commits. Reentrant so listeners may commit from the
    // notifying thread.
    commit: ReentrantMutex<RefCell<Arc<S>>>,
    listeners: Listeners<Arc<S>>,
}

/// A shared observable store of immutable snapshots.
///
/// Every commit publishes a new `Arc<S>`; snapshots handed out earlier are
/// never modified. Cloning a `Store` yields another handle to the same state.
pub struct Store<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Store<S>
where
    S: Patch + Send + Sync + 'static,
{
    /// Create a new store with the given initial state.
    pub fn new(initial: S) -> Self {
        Self {
            inner: Arc::new(Inner {
                commit: ReentrantMutex::new(RefCell::new(Arc::new(initial))),
                listeners: Listeners::new(),
            }),
        }
    }

    /// The current snapshot. This is the published value itself, not a copy.
    pub fn get_state(&self) -> Arc<S> {
        let guard = self.inner.commit.lock();
        let state = guard.borrow().clone();
        state
    }

    /// Shallow-merge `patch` into the current state and notify listeners.
    ///
    /// A new snapshot is published on every call, so listeners are notified
    /// even when the patch is empty or carries the values already present.
    pub fn set_state(&self, patch: S::Patch) {
        self.update_state(move |_| patch);
    }

    /// Compute a patch from the current snapshot and commit it.
    ///
    /// The read, the merge, the publish and the notification all happen
    /// inside one commit section.
    pub fn update_state<F>(&self, f: F)
    where
        F: FnOnce(&S) -> S::Patch,
    {
        let guard = self.inner.commit.lock();
        let current = guard.borrow().clone();
        let next = Arc::new(current.merge(f(&current)));

        *guard.borrow_mut() = next;
        tracing::trace!(
            listeners = self.inner.listeners.len(),
            "store state committed"
        );
        // Each listener gets the snapshot published when it is called, so a
        // commit made by an earlier listener is what later ones render.
        self.inner.listeners.notify_live(|| guard.borrow().clone());
        drop(guard);
    }

    /// Subscribe to state changes.
    ///
    /// The callback receives the new snapshot after every commit.
    pub fn subscribe<F>(&self, callback: F) -> Unsubscribe
    where
        F: Fn(&Arc<S>) + Send + Sync + 'static,
    {
        self.inner.listeners.insert_fn(callback)
    }

    /// Subscribe with a callback that may fail. Failures are logged and do
    /// not affect other listeners.
    pub fn try_subscribe<F, E>(&self, callback: F) -> Unsubscribe
    where
        F: Fn(&Arc<S>) -> Result<(), E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.inner.listeners.insert_try_fn(callback)
    }

    /// Subscribe a shared callback. Subscribing the same `Arc` twice keeps a
    /// single registration.
    pub fn subscribe_shared(&self, callback: Arc<Listener<Arc<S>>>) -> Unsubscribe {
        self.inner.listeners.insert(callback)
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }
}

impl<S> Default for Store<S>
where
    S: Patch + Default + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Debug, PartialEq)]
    struct Settings {
        count: usize,
        name: Arc<str>,
    }

    #[derive(Default)]
    struct SettingsPatch {
        count: Option<usize>,
        name: Option<Arc<str>>,
    }

    impl Patch for Settings {
        type Patch = SettingsPatch;

        fn merge(&self, patch: SettingsPatch) -> Self {
            Self {
                count: patch.count.unwrap_or(self.count),
                name: patch.name.unwrap_or_else(|| Arc::clone(&self.name)),
            }
        }
    }

    fn store() -> Store<Settings> {
        Store::new(Settings {
            count: 0,
            name: "test".into(),
        })
    }

    #[test]
    fn set_state_merges_shallowly() {
        let store = store();
        let before = store.get_state();

        store.set_state(SettingsPatch {
            count: Some(42),
            ..Default::default()
        });

        let after = store.get_state();
        assert_eq!(after.count, 42);
        assert!(Arc::ptr_eq(&before.name, &after.name));
        // The superseded snapshot is untouched.
        assert_eq!(before.count, 0);
    }

    #[test]
    fn get_state_returns_published_snapshot() {
        let store = store();
        assert!(Arc::ptr_eq(&store.get_state(), &store.get_state()));
    }

    #[test]
    fn empty_patch_still_notifies() {
        let store = store();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        store.subscribe(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        let before = store.get_state();
        store.set_state(SettingsPatch::default());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!Arc::ptr_eq(&before, &store.get_state()));
        assert_eq!(*before, *store.get_state());
    }

    #[test]
    fn listeners_share_the_committed_snapshot() {
        let store = store();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        for _ in 0..2 {
            let seen = seen.clone();
            store.subscribe(move |state| seen.lock().push(Arc::clone(state)));
        }

        store.update_state(|s| SettingsPatch {
            count: Some(s.count + 1),
            ..Default::default()
        });

        let seen = seen.lock();
        let current = store.get_state();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|s| Arc::ptr_eq(s, &current)));
    }

    #[test]
    fn listener_failure_does_not_reach_caller() {
        let store = store();
        store.try_subscribe(|_| Err::<(), _>("listener failed"));
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        store.subscribe(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        store.set_state(SettingsPatch {
            count: Some(1),
            ..Default::default()
        });
        assert_eq!(store.get_state().count, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn nested_commit_from_listener() {
        let store = store();
        let handle = store.clone();
        store.subscribe(move |state| {
            if state.count == 1 && &*state.name != "nested" {
                handle.set_state(SettingsPatch {
                    name: Some("nested".into()),
                    ..Default::default()
                });
            }
        });

        store.set_state(SettingsPatch {
            count: Some(1),
            ..Default::default()
        });
        let state = store.get_state();
        assert_eq!(state.count, 1);
        assert_eq!(&*state.name, "nested");
    }
}

use super::SameValue;
use crate::error::BoxError;
use crate::listeners::{Listener, Listeners, Unsubscribe};
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::sync::Arc;

/// The next value for a [`LocalState`]: either a replacement value or a
/// function of the current one.
pub enum Update<'a, T> {
    Value(T),
    Updater(Box<dyn FnOnce(&T) -> T + 'a>),
}

impl<'a, T> Update<'a, T> {
    pub fn updater<F>(f: F) -> Self
    where
        F: FnOnce(&T) -> T + 'a,
    {
        Update::Updater(Box::new(f))
    }

    fn resolve(self, current: &T) -> T {
        match self {
            Update::Value(value) => value,
            Update::Updater(f) => f(current),
        }
    }
}

struct Inner<T> {
    // Held across read-modify-publish-notify. Reentrant so listeners may
    // read or write the same cell from the notifying thread.
    value: ReentrantMutex<RefCell<T>>,
    listeners: Listeners<T>,
}

/// A single reactive value owned by one component.
///
/// Cloning a `LocalState` yields another handle to the same cell. Separately
/// created cells never see each other's writes.
///
/// # Examples
///
/// ```
/// use statekit::LocalState;
/// use std::sync::{Arc, atomic::{AtomicI64, Ordering}};
///
/// let count = LocalState::new(0i64);
/// let rendered = Arc::new(AtomicI64::new(count.get()));
///
/// let rendered_clone = rendered.clone();
/// count.subscribe(move |value| rendered_clone.store(*value, Ordering::SeqCst));
///
/// count.update(|v| v + 1);
/// assert_eq!(rendered.load(Ordering::SeqCst), 1);
///
/// count.set(0);
/// assert_eq!(count.get(), 0);
/// ```
pub struct LocalState<T> {
    inner: Arc<Inner<T>>,
}

impl<T> LocalState<T>
where
    T: SameValue + Clone + Send + 'static,
{
    /// Create a new cell holding `initial`.
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(Inner {
                value: ReentrantMutex::new(RefCell::new(initial)),
                listeners: Listeners::new(),
            }),
        }
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> T {
        let guard = self.inner.value.lock();
        let value = guard.borrow().clone();
        value
    }

    /// Read the current value without cloning it.
    ///
    /// `f` must not write to this same cell.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.inner.value.lock();
        let value = guard.borrow();
        f(&value)
    }

    /// Replace the value.
    pub fn set(&self, value: T) {
        self.apply(Update::Value(value));
    }

    /// Compute the next value from the current one.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        self.apply(Update::updater(f));
    }

    /// Commit `next` and notify subscribers if it differs from the current value.
    ///
    /// Subscribers run synchronously before this returns, each receiving the
    /// value held when it is called. A write that is the same value (see
    /// [`SameValue`]) changes nothing and notifies no one.
    pub fn apply(&self, next: Update<'_, T>) {
        let guard = self.inner.value.lock();
        let current = guard.borrow().clone();
        let next = next.resolve(&current);
        if next.same_value(&current) {
            return;
        }

        *guard.borrow_mut() = next;
        tracing::trace!(listeners = self.inner.listeners.len(), "local state changed");
        // Read the cell per listener: a nested write from an earlier
        // listener must reach the ones after it.
        self.inner.listeners.notify_live(|| guard.borrow().clone());
        drop(guard);
    }

    /// Subscribe to changes. The callback receives each new value.
    pub fn subscribe<F>(&self, callback: F) -> Unsubscribe
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.inner.listeners.insert_fn(callback)
    }

    /// Subscribe with a callback that may fail. Failures are logged and do
    /// not affect other subscribers.
    pub fn try_subscribe<F, E>(&self, callback: F) -> Unsubscribe
    where
        F: Fn(&T) -> Result<(), E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.inner.listeners.insert_try_fn(callback)
    }

    /// Subscribe a shared callback. Subscribing the same `Arc` twice keeps a
    /// single registration.
    pub fn subscribe_shared(&self, callback: Arc<Listener<T>>) -> Unsubscribe {
        self.inner.listeners.insert(callback)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.len()
    }
}

impl<T> Clone for LocalState<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for LocalState<T>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = self.inner.value.lock();
        let result = match guard.try_borrow() {
            Ok(value) => f.debug_struct("LocalState").field("value", &*value).finish(),
            Err(_) => f.debug_struct("LocalState").finish_non_exhaustive(),
        };
        result
    }
}

/// Create a new [`LocalState`].
pub fn create_state<T>(initial: T) -> LocalState<T>
where
    T: SameValue + Clone + Send + 'static,
{
    LocalState::new(initial)
}

use crate::error::{BoxError, ListenerError};
use parking_lot::Mutex;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};

/// A registered callback. Infallible callbacks are wrapped to return `Ok(())`.
pub type Listener<T> = dyn Fn(&T) -> Result<(), BoxError> + Send + Sync;

struct Registry<T> {
    next_id: u64,
    // Ids are handed out in increasing order, so key order is registration order.
    entries: BTreeMap<u64, Arc<Listener<T>>>,
}

impl<T> Registry<T> {
    fn new() -> Self {
        Self {
            next_id: 0,
            entries: BTreeMap::new(),
        }
    }
}

/// Type-erased view of a registry, so an [`Unsubscribe`] handle does not
/// carry the value type.
trait Detach: Send + Sync {
    fn detach(&self, id: u64) -> bool;
    fn contains(&self, id: u64) -> bool;
}

impl<T> Detach for Mutex<Registry<T>> {
    fn detach(&self, id: u64) -> bool {
        self.lock().entries.remove(&id).is_some()
    }

    fn contains(&self, id: u64) -> bool {
        self.lock().entries.contains_key(&id)
    }
}

/// Handle returned by every subscribe operation.
///
/// Dropping the handle does not remove the registration; call
/// [`unsubscribe`](Self::unsubscribe) to stop receiving notifications.
#[derive(Clone)]
pub struct Unsubscribe {
    id: u64,
    registry: Weak<dyn Detach>,
}

impl Unsubscribe {
    /// Remove the registration. Calling this more than once is harmless.
    pub fn unsubscribe(&self) {
        if let Some(registry) = self.registry.upgrade() {
            if registry.detach(self.id) {
                tracing::trace!(listener = self.id, "listener unsubscribed");
            }
        }
    }

    /// Whether the registration is still live.
    pub fn is_subscribed(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.contains(self.id))
    }

    /// Registration id, as reported in [`ListenerError`].
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl std::fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Unsubscribe").field("id", &self.id).finish()
    }
}

/// Outcome of one notification pass.
#[derive(Debug, Default)]
pub struct NotifyReport {
    /// Listeners that ran to completion.
    pub delivered: usize,
    /// Listeners removed during the pass before they were reached.
    pub skipped: usize,
    /// Listeners that returned an error or panicked.
    pub failures: Vec<ListenerError>,
}

impl NotifyReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// An ordered set of listeners for values of type `T`.
pub struct Listeners<T> {
    registry: Arc<Mutex<Registry<T>>>,
}

impl<T: 'static> Listeners<T> {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry::new())),
        }
    }

    /// Register a shared callback.
    ///
    /// If the same `Arc` is already registered, no second registration is
    /// made and the returned handle refers to the existing one.
    pub fn insert(&self, callback: Arc<Listener<T>>) -> Unsubscribe {
        let mut registry = self.registry.lock();
        let existing = registry
            .entries
            .iter()
            .find(|(_, registered)| Arc::ptr_eq(registered, &callback))
            .map(|(id, _)| *id);

        let id = match existing {
            Some(id) => id,
            None => {
                let id = registry.next_id;
                registry.next_id += 1;
                registry.entries.insert(id, callback);
                id
            }
        };
        drop(registry);

        let detach: Arc<dyn Detach> = self.registry.clone();
        Unsubscribe {
            id,
            registry: Arc::downgrade(&detach),
        }
    }

    /// Register an infallible callback.
    pub fn insert_fn<F>(&self, callback: F) -> Unsubscribe
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.insert(Arc::new(move |value: &T| {
            callback(value);
            Ok(())
        }))
    }

    /// Register a fallible callback.
    pub fn insert_try_fn<F, E>(&self, callback: F) -> Unsubscribe
    where
        F: Fn(&T) -> Result<(), E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.insert(Arc::new(move |value: &T| callback(value).map_err(Into::into)))
    }

    /// Call every live listener with `value`, in registration order.
    ///
    /// The list is read once when the pass starts. A listener removed while
    /// the pass is running is skipped if it has not been called yet; one
    /// added while the pass is running is not called until the next pass.
    pub fn notify(&self, value: &T) -> NotifyReport {
        self.notify_each(|callback| callback(value))
    }

    /// Like [`notify`](Self::notify), but `current` is called right before
    /// each listener runs, so a listener that follows a nested write sees the
    /// latest value rather than the one this pass started with.
    pub fn notify_live<F>(&self, current: F) -> NotifyReport
    where
        F: Fn() -> T,
    {
        self.notify_each(|callback| callback(&current()))
    }

    fn notify_each<F>(&self, call: F) -> NotifyReport
    where
        F: Fn(&Listener<T>) -> Result<(), BoxError>,
    {
        let snapshot: Vec<(u64, Arc<Listener<T>>)> = self
            .registry
            .lock()
            .entries
            .iter()
            .map(|(id, callback)| (*id, Arc::clone(callback)))
            .collect();

        let mut report = NotifyReport::default();
        for (id, callback) in snapshot {
            if !self.registry.lock().entries.contains_key(&id) {
                report.skipped += 1;
                continue;
            }

            let failure = match panic::catch_unwind(AssertUnwindSafe(|| call(callback.as_ref()))) {
                Ok(Ok(())) => {
                    report.delivered += 1;
                    continue;
                }
                Ok(Err(source)) => ListenerError::Failed { id, source },
                Err(payload) => ListenerError::Panicked {
                    id,
                    message: panic_message(payload.as_ref()),
                },
            };
            tracing::error!(listener = id, error = %failure, "listener failed during notification");
            report.failures.push(failure);
        }

        tracing::trace!(
            delivered = report.delivered,
            skipped = report.skipped,
            failed = report.failures.len(),
            "notification pass complete"
        );
        report
    }

    pub fn len(&self) -> usize {
        self.registry.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every registration. Outstanding handles become no-ops.
    pub fn clear(&self) {
        self.registry.lock().entries.clear();
    }
}

impl<T: 'static> Default for Listeners<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

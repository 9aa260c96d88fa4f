use super::{Patch, Store};
use crate::error::ParseThemeError;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Colour theme of the application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// The other theme.
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Name written into the document's `data-theme` attribute.
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ParseThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(ParseThemeError(other.to_string())),
        }
    }
}

/// Identifier of a todo item, derived from its creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TodoId(pub u64);

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

static LAST_ID: AtomicU64 = AtomicU64::new(0);

impl TodoId {
    /// Mint a fresh id from the wall clock, in milliseconds since the epoch.
    ///
    /// Ids minted in the same millisecond are bumped past the previous one,
    /// so ids are unique and strictly increasing within the process.
    pub fn next() -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);

        let mut last = LAST_ID.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(last.saturating_add(1));
            match LAST_ID.compare_exchange_weak(last, candidate, Ordering::AcqRel, Ordering::Relaxed) {
                Ok(_) => return TodoId(candidate),
                Err(actual) => last = actual,
            }
        }
    }
}

/// A single todo entry. Entries are never modified once published; toggling
/// builds a new entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoItem {
    pub id: TodoId,
    pub text: String,
    pub done: bool,
}

/// Ordered todo list. Untouched entries are shared between snapshots.
pub type Todos = Arc<[Arc<TodoItem>]>;

/// The application-wide state record.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub theme: Theme,
    pub todos: Todos,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            todos: Vec::new().into(),
        }
    }
}

impl AppState {
    /// Look up a todo by id.
    pub fn todo(&self, id: TodoId) -> Option<&Arc<TodoItem>> {
        self.todos.iter().find(|item| item.id == id)
    }

    /// Number of todos not yet done.
    pub fn remaining(&self) -> usize {
        self.todos.iter().filter(|item| !item.done).count()
    }
}

/// Partial [`AppState`]. Present fields replace the current ones wholesale.
#[derive(Debug, Clone, Default)]
pub struct AppPatch {
    pub theme: Option<Theme>,
    pub todos: Option<Todos>,
}

impl AppPatch {
    pub fn theme(theme: Theme) -> Self {
        Self {
            theme: Some(theme),
            ..Default::default()
        }
    }

    pub fn todos(todos: Todos) -> Self {
        Self {
            todos: Some(todos),
            ..Default::default()
        }
    }
}

impl Patch for AppState {
    type Patch = AppPatch;

    fn merge(&self, patch: AppPatch) -> Self {
        Self {
            theme: patch.theme.unwrap_or(self.theme),
            todos: patch.todos.unwrap_or_else(|| Arc::clone(&self.todos)),
        }
    }
}

/// Actions. Each one builds a new value for one field and commits it with a
/// single patch.
impl Store<AppState> {
    /// Append a new, not-done todo and return its id.
    pub fn add_todo(&self, text: impl Into<String>) -> TodoId {
        let item = Arc::new(TodoItem {
            id: TodoId::next(),
            text: text.into(),
            done: false,
        });
        let id = item.id;
        tracing::debug!(%id, "adding todo");

        self.update_state(move |state| {
            let todos: Todos = state
                .todos
                .iter()
                .cloned()
                .chain(std::iter::once(item))
                .collect();
            AppPatch::todos(todos)
        });
        id
    }

    /// Flip `done` on the todo with `id`. Unknown ids leave the list as is,
    /// but a new list is still committed.
    pub fn toggle_todo(&self, id: TodoId) {
        self.update_state(|state| {
            let todos: Todos = state
                .todos
                .iter()
                .map(|item| {
                    if item.id == id {
                        Arc::new(TodoItem {
                            id: item.id,
                            text: item.text.clone(),
                            done: !item.done,
                        })
                    } else {
                        Arc::clone(item)
                    }
                })
                .collect();
            AppPatch::todos(todos)
        });
    }

    /// Drop the todo with `id`, keeping the order of the others. Unknown ids
    /// leave the list as is, but a new list is still committed.
    pub fn remove_todo(&self, id: TodoId) {
        self.update_state(|state| {
            let todos: Todos = state
                .todos
                .iter()
                .filter(|item| item.id != id)
                .cloned()
                .collect();
            AppPatch::todos(todos)
        });
    }

    /// Switch between light and dark.
    pub fn toggle_theme(&self) {
        self.update_state(|state| AppPatch::theme(state.theme.toggled()));
    }
}

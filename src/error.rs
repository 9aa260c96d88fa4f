//! Error types.

use thiserror::Error;

/// Boxed error returned by fallible listeners.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A failure raised by a single listener during a notification pass.
///
/// These never reach the caller of `set`/`set_state`; they are logged and
/// collected in a [`NotifyReport`](crate::listeners::NotifyReport).
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("listener {id} returned an error: {source}")]
    Failed {
        id: u64,
        #[source]
        source: BoxError,
    },

    #[error("listener {id} panicked: {message}")]
    Panicked { id: u64, message: String },
}

impl ListenerError {
    /// Registration id of the listener that failed.
    pub fn listener_id(&self) -> u64 {
        match self {
            Self::Failed { id, .. } | Self::Panicked { id, .. } => *id,
        }
    }
}

/// Error returned when parsing an unknown theme name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown theme '{0}', expected 'light' or 'dark'")]
pub struct ParseThemeError(pub String);

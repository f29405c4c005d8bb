//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`DobbyError`]
//! via `From`, so callers only ever match on one enum.

use std::error::Error as StdError;

/// Top-level error shared by every crate in the workspace.
#[derive(Debug, thiserror::Error)]
pub enum DobbyError {
    /// Input rejected before any state was mutated.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A referenced record does not exist.
    #[error("{0}")]
    NotFound(#[from] NotFoundError),

    /// A single action could not be delivered.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// An external collaborator is not reachable right now.
    #[error("{0}")]
    Unavailable(#[from] UnavailableError),

    /// The automation store could not be read or written.
    #[error("storage error")]
    Storage(#[source] Box<dyn StdError + Send + Sync>),
}

/// Reasons an automation payload is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("invalid time of day {hour:02}:{minute:02}")]
    InvalidTimeOfDay { hour: u8, minute: u8 },

    #[error("a between time condition requires an endTime")]
    MissingEndTime,

    #[error("invalid identifier {0:?}")]
    InvalidId(String),
}

/// A lookup by identifier found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Failure to deliver one action to its sink.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("unknown device {0}")]
    UnknownDevice(String),

    #[error("failed to send command to {device}")]
    Send {
        device: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

/// A collaborator (device bus, broker, …) is not connected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0} is not connected")]
pub struct UnavailableError(pub &'static str);

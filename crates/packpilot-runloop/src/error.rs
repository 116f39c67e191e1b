//! Error types for the run loop.

use thiserror::Error;

use crate::state::RunState;

/// Errors returned by [`RunLoop::start`](crate::RunLoop::start).
///
/// Adapter failures never surface here; they are structured outcomes the
/// loop reacts to.
#[derive(Debug, Error)]
pub enum RunLoopError {
    /// A session is already active.
    #[error("Run loop is already running")]
    AlreadyRunning,

    /// The state changed underneath the session.
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: RunState, to: RunState },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for run loop operations.
pub type RunLoopResult<T> = Result<T, RunLoopError>;

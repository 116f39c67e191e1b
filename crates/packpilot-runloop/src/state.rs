//! Run loop state and session summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Run loop state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum RunState {
    /// No session active.
    Idle = 0,
    /// A session is opening packs.
    Running = 1,
    /// The last session was cancelled or got stuck.
    Stopped = 2,
}

impl From<u8> for RunState {
    fn from(v: u8) -> Self {
        match v {
            1 => RunState::Running,
            2 => RunState::Stopped,
            _ => RunState::Idle,
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Idle => write!(f, "idle"),
            RunState::Running => write!(f, "running"),
            RunState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// The target number of packs was opened.
    Completed,
    /// `stop()` was requested.
    Cancelled,
    /// No pack could be opened and recovery found nothing to do.
    Stuck,
}

impl StopReason {
    /// State the loop settles in after a session ending for this reason.
    pub fn final_state(self) -> RunState {
        match self {
            StopReason::Completed => RunState::Idle,
            StopReason::Cancelled | StopReason::Stuck => RunState::Stopped,
        }
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::Completed => write!(f, "completed"),
            StopReason::Cancelled => write!(f, "cancelled"),
            StopReason::Stuck => write!(f, "stuck"),
        }
    }
}

/// Result of one `start` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub session_id: String,
    /// Packs opened in this session.
    pub opened: u32,
    /// Requested number of packs.
    pub target: u32,
    pub reason: StopReason,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// What the loop does after one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IterationOutcome {
    /// Iteration finished; pause, then go again.
    Continue,
    /// Recovery acted; go again without counting anything.
    Restart,
    /// End the session.
    Stop(StopReason),
}

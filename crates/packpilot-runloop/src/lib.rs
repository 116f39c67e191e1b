//! Run loop for packpilot.
//!
//! Repeatedly opens packs and disposes of their contents through an
//! [`ActionAdapter`](packpilot_adapter::ActionAdapter), deciding between
//! "send all to club", recycle workflows and quick sell from the
//! purchased-items payloads the event bridge delivers.
//!
//! ## State machine
//!
//! ```text
//!                start(runs)
//!   Idle / Stopped ──────────► Running ──┬── target reached ──► Idle
//!                                        └── stop() / stuck ──► Stopped
//! ```
//!
//! Cancellation is cooperative: `stop()` is observed between adapter calls,
//! never in the middle of one.

mod config;
mod disposal;
mod error;
mod iteration;
mod run_loop;
mod state;

pub use config::{CallPolicies, RunLoopConfig};
pub use error::{RunLoopError, RunLoopResult};
pub use run_loop::{CounterCallback, RunLoop};
pub use state::{RunState, RunSummary, StopReason};

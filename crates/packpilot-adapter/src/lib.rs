//! Action adapter for packpilot.
//!
//! The run loop never touches the page directly. It talks to an
//! [`ActionAdapter`], a set of named operations that each drive one UI
//! workflow and report a structured [`Outcome`]. Timeouts and page errors
//! are reported as `ok: false` outcomes, never as `Err`.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐  ActionAdapter  ┌───────────────────┐   WebSocket   ┌──────────────┐
//! │    Run loop     │ ──────────────► │ PageActionAdapter │ ◄───────────► │    Chrome    │
//! │                 │                 │  (page scripts)   │      CDP      │  (game tab)  │
//! └─────────────────┘                 └───────────────────┘               └──────────────┘
//! ```
//!
//! ## Setup
//!
//! Start Chrome with remote debugging enabled and log into the web app:
//!
//! ```bash
//! google-chrome --remote-debugging-port=9222
//! ```
//!
//! ## Building blocks
//!
//! - [`call_with_timeout`], [`call_with_retry`]: bound and retry any adapter call
//! - [`poll_until`]: wait for a probe to produce a value
//! - [`InFlight`]: re-entrancy guard for workflows that must not overlap
//! - [`RecycleToggle`]: round-robin choice of recycle option labels

mod adapter;
mod call;
pub mod cdp;
mod guard;
mod outcome;
pub mod page;
mod toggle;

pub use adapter::ActionAdapter;
pub use call::{call_with_retry, call_with_timeout, poll_until, poll_until_true, CallPolicy};
pub use cdp::{CdpClient, CdpError, PageInfo, PageSession};
pub use guard::{InFlight, InFlightGuard};
pub use outcome::{
    ClickDetail, ControlProbe, HookDetail, Outcome, PingDetail, QuickSellDetail, RecycleDetail,
    UnassignedDetail,
};
pub use page::{FrameContext, PageActionAdapter, PageAdapterConfig, PageExecutor};
pub use toggle::RecycleToggle;

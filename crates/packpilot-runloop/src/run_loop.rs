//! The pack-opening run loop.
//!
//! One session opens up to `runs` packs. Each iteration opens a pack,
//! reads the purchased-items payload the open produced, and disposes of the
//! items: send all to club when some are new, otherwise recycle and
//! quick-sell according to the rating histogram.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use packpilot_adapter::{call_with_timeout, ActionAdapter};
use packpilot_bridge::EventBridge;
use packpilot_core::{ClassifierThresholds, PurchaseStore};

use crate::config::RunLoopConfig;
use crate::error::{RunLoopError, RunLoopResult};
use crate::state::{IterationOutcome, RunState, RunSummary, StopReason};

/// Progress callback invoked with `(opened, total)`.
pub type CounterCallback = Arc<dyn Fn(u32, u32) + Send + Sync>;

/// Per-session bookkeeping.
pub(crate) struct Session {
    pub(crate) target: u32,
    pub(crate) opened: u32,
    /// A pack was pre-opened at the end of the previous iteration.
    pub(crate) credit: bool,
    pub(crate) cancel: CancellationToken,
}

impl Session {
    pub(crate) fn cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn target_reached(&self) -> bool {
        self.opened >= self.target
    }
}

/// Drives pack-opening sessions against an [`ActionAdapter`].
pub struct RunLoop {
    pub(crate) config: RunLoopConfig,
    pub(crate) thresholds: ClassifierThresholds,
    pub(crate) adapter: Arc<dyn ActionAdapter>,
    pub(crate) bridge: Arc<EventBridge>,
    state: AtomicU8,
    cancel: Mutex<CancellationToken>,
    counter: Option<CounterCallback>,
}

impl RunLoop {
    /// Create a run loop. The purchase store is the bridge's.
    pub fn new(config: RunLoopConfig, adapter: Arc<dyn ActionAdapter>, bridge: Arc<EventBridge>) -> Self {
        Self {
            config,
            thresholds: ClassifierThresholds::default(),
            adapter,
            bridge,
            state: AtomicU8::new(RunState::Idle as u8),
            cancel: Mutex::new(CancellationToken::new()),
            counter: None,
        }
    }

    pub fn with_thresholds(mut self, thresholds: ClassifierThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_counter(mut self, counter: CounterCallback) -> Self {
        self.counter = Some(counter);
        self
    }

    pub fn state(&self) -> RunState {
        RunState::from(self.state.load(Ordering::SeqCst))
    }

    pub fn is_running(&self) -> bool {
        self.state() == RunState::Running
    }

    pub fn config(&self) -> &RunLoopConfig {
        &self.config
    }

    pub(crate) fn store(&self) -> &Arc<PurchaseStore> {
        self.bridge.store()
    }

    /// Request cooperative cancellation of the active session.
    ///
    /// The adapter call in flight completes; no further pack is opened.
    pub fn stop(&self) {
        if self.is_running() {
            info!("Stop requested");
        }
        self.cancel.lock().cancel();
    }

    /// Open up to `runs` packs. `runs` below 1 is treated as 1.
    ///
    /// Returns once the session completes, is cancelled, or gets stuck.
    pub async fn start(&self, runs: u32) -> RunLoopResult<RunSummary> {
        self.config.validate()?;
        let (mut active, token) = self.begin()?;

        let mut session = Session {
            target: runs.max(1),
            opened: 0,
            credit: false,
            cancel: token,
        };
        let session_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        info!("Session {} started: target {} pack(s)", session_id, session.target);

        let hooked = call_with_timeout(
            "HookPurchasedItems",
            self.config.policies.hook.timeout(),
            self.adapter.hook_purchased_items(),
        )
        .await;
        if !hooked.ok {
            warn!(
                "Purchased-items hook not confirmed: {}",
                hooked.error.as_deref().unwrap_or("unknown error")
            );
        }

        self.report(&session);
        let reason = self.drive(&mut session).await;

        self.finish(&mut active, reason)?;
        let summary = RunSummary {
            session_id,
            opened: session.opened,
            target: session.target,
            reason,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            "Session {} finished ({}): opened {}/{}",
            summary.session_id, summary.reason, summary.opened, summary.target
        );
        Ok(summary)
    }

    async fn drive(&self, session: &mut Session) -> StopReason {
        loop {
            if session.cancelled() {
                return StopReason::Cancelled;
            }
            if session.target_reached() {
                return StopReason::Completed;
            }
            match self.iteration(session).await {
                IterationOutcome::Continue => sleep(self.config.iteration_delay()).await,
                IterationOutcome::Restart => {}
                IterationOutcome::Stop(reason) => return reason,
            }
        }
    }

    /// Enter `Running` with a fresh cancellation token.
    ///
    /// The token is swapped under the same lock `stop` takes, so a stop
    /// issued once the state reads `Running` always reaches this session.
    fn begin(&self) -> RunLoopResult<(ActiveSession<'_>, CancellationToken)> {
        let mut cancel = self.cancel.lock();
        loop {
            let current = self.state();
            if current == RunState::Running {
                return Err(RunLoopError::AlreadyRunning);
            }
            if self
                .state
                .compare_exchange(current as u8, RunState::Running as u8, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                break;
            }
        }
        let token = CancellationToken::new();
        *cancel = token.clone();
        let active = ActiveSession {
            state: &self.state,
            finished: false,
        };
        Ok((active, token))
    }

    fn finish(&self, active: &mut ActiveSession<'_>, reason: StopReason) -> RunLoopResult<()> {
        active.finished = true;
        let to = reason.final_state();
        self.state
            .compare_exchange(RunState::Running as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| ())
            .map_err(|actual| RunLoopError::InvalidStateTransition {
                from: RunState::from(actual),
                to,
            })
    }

    pub(crate) fn report(&self, session: &Session) {
        if let Some(counter) = &self.counter {
            counter(session.opened, session.target);
        }
    }
}

/// Leaves `Running` if a session future is dropped before it finishes.
struct ActiveSession<'a> {
    state: &'a AtomicU8,
    finished: bool,
}

impl Drop for ActiveSession<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let abandoned = self
            .state
            .compare_exchange(
                RunState::Running as u8,
                RunState::Stopped as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok();
        if abandoned {
            warn!("Session dropped before it finished");
        }
    }
}

#[cfg(test)]
#[path = "run_loop_tests.rs"]
mod tests;

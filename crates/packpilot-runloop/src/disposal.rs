//! Disposal branch: recycle by rating histogram, then quick sell.

use tokio::time::sleep;
use tracing::{debug, info, warn};

use packpilot_adapter::call_with_retry;
use packpilot_core::{has_x10_criteria, DisposalMode, RatingHistogram, RecycleMode};

use crate::run_loop::{RunLoop, Session};

impl RunLoop {
    pub(crate) async fn dispose(&self, session: &Session, histogram: RatingHistogram) {
        let mode = self.mode_of(&histogram);
        info!("Disposal mode: {}", mode);

        match mode {
            DisposalMode::Ovr89 => {
                let histogram = self.recycle_and_refresh(RecycleMode::Ovr89).await;
                if session.cancelled() {
                    return;
                }
                if has_x10_criteria(&histogram, &self.thresholds) {
                    self.x10_passes(session, histogram).await;
                }
            }
            DisposalMode::X10Of84 => {
                self.x10_passes(session, histogram).await;
            }
            DisposalMode::None => {}
        }

        if session.cancelled() {
            return;
        }
        self.quick_sell_pass().await;
    }

    /// Recycle as X10_84 while the histogram still qualifies, up to the
    /// configured number of passes.
    async fn x10_passes(&self, session: &Session, mut histogram: RatingHistogram) {
        for pass in 1..=self.config.max_x10_passes {
            if session.cancelled() {
                return;
            }
            if !has_x10_criteria(&histogram, &self.thresholds) {
                debug!("X10 criterion no longer met after {} pass(es)", pass - 1);
                return;
            }
            info!("X10 recycle pass {}/{}", pass, self.config.max_x10_passes);
            histogram = self.recycle_and_refresh(RecycleMode::X10Of84).await;
        }
    }

    /// Run one recycle and return the histogram of the payload it produced.
    async fn recycle_and_refresh(&self, mode: RecycleMode) -> RatingHistogram {
        let waiter = self.bridge.arm();
        let outcome = call_with_retry(&format!("RecycleWorkflow({})", mode), &self.config.policies.recycle, move || {
            self.adapter.recycle(mode)
        })
        .await;
        if !outcome.submitted() {
            warn!("Recycle {} not submitted: {:?}", mode, outcome.error);
        }

        sleep(self.config.stabilize()).await;
        let refreshed = waiter.wait(self.config.refresh_wait()).await.map(|event| event.data);
        if refreshed.is_none() {
            debug!("No refreshed payload after recycle; using the store");
        }
        self.histogram_of(refreshed)
    }

    pub(crate) async fn quick_sell_pass(&self) {
        let outcome = call_with_retry("QuickSellUntradeables", &self.config.policies.quick_sell, move || {
            self.adapter.quick_sell_untradeables()
        })
        .await;
        if outcome.detail.skipped {
            debug!("Quick sell skipped: another one is running");
        } else if !outcome.ok {
            warn!("Quick sell failed: {:?}", outcome.error);
        }
        sleep(self.config.quick_sell_settle()).await;
    }
}

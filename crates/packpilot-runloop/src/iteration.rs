//! One iteration of the run loop: open, read the payload, dispose.

use serde_json::Value;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use packpilot_adapter::{call_with_retry, call_with_timeout, poll_until};
use packpilot_core::{compute_histogram, compute_stats, decide_mode, DisposalMode, RatingHistogram};

use crate::run_loop::{RunLoop, Session};
use crate::state::{IterationOutcome, StopReason};

impl RunLoop {
    pub(crate) async fn iteration(&self, session: &mut Session) -> IterationOutcome {
        let deadline = Instant::now() + self.config.iteration_timeout();
        let expired = || Instant::now() >= deadline;

        // Armed before the open so a fast payload is not missed.
        let waiter = self.bridge.arm();

        let opened = if std::mem::take(&mut session.credit) {
            info!("Using pre-opened pack");
            true
        } else {
            self.open_pack().await
        };

        if !opened {
            return self.recover_or_stop(session).await;
        }

        session.opened += 1;
        self.report(session);
        info!("Opened pack {}/{}", session.opened, session.target);

        if expired() {
            warn!("Iteration watchdog elapsed after open");
            self.pre_open(session).await;
            return IterationOutcome::Continue;
        }
        sleep(self.config.stabilize()).await;
        if session.cancelled() {
            return IterationOutcome::Stop(StopReason::Cancelled);
        }

        let unassigned = call_with_timeout(
            "HandleUnassignedDialog",
            self.config.policies.unassigned.timeout(),
            self.adapter.handle_unassigned_dialog(),
        )
        .await;
        if unassigned.handled() {
            info!("Unassigned items handled; quick-selling");
            self.quick_sell_pass().await;
            return self.after_disposal(session).await;
        }

        let data = match waiter.wait(self.config.purchase_wait()).await {
            Some(event) => Some(event.data),
            None => {
                debug!("No payload within {}ms; using the latest one", self.config.purchase_wait_ms);
                self.store().latest_data()
            }
        };
        let stats = compute_stats(data.as_ref());
        let histogram = compute_histogram(data.as_ref());
        info!(
            "Pack stats: available={} total={} duplicates={} all_duplicates={} histogram={:?}",
            stats.available, stats.total_items, stats.duplicate_count, stats.all_duplicates, histogram
        );

        if stats.all_duplicates {
            info!("All items are duplicates; skipping send-all");
            self.dispose(session, histogram).await;
        } else if self.send_all().await {
            if expired() {
                warn!("Iteration watchdog elapsed after send-all");
                return IterationOutcome::Continue;
            }
            sleep(self.config.stabilize()).await;
            let histogram = self.store().histogram();
            self.dispose(session, histogram).await;
        } else {
            let stats = self.store().stats();
            if stats.all_duplicates && !expired() {
                info!("Send-all unavailable and the pack is all duplicates; disposing");
                let histogram = self.store().histogram();
                self.dispose(session, histogram).await;
            } else {
                debug!("Send-all unavailable; nothing to dispose");
                return IterationOutcome::Continue;
            }
        }

        self.after_disposal(session).await
    }

    async fn after_disposal(&self, session: &mut Session) -> IterationOutcome {
        if session.cancelled() {
            return IterationOutcome::Stop(StopReason::Cancelled);
        }
        self.pre_open(session).await;
        IterationOutcome::Continue
    }

    async fn open_pack(&self) -> bool {
        let policy = self.config.policies.open;
        let outcome = call_with_retry("OpenPack", &policy, move || self.adapter.open_pack()).await;
        outcome.clicked()
    }

    /// SendAllToClub, then a local probe-and-click fallback.
    async fn send_all(&self) -> bool {
        let policy = self.config.policies.send_all;
        if call_with_retry("SendAllToClub", &policy, move || self.adapter.send_all_to_club())
            .await
            .clicked()
        {
            return true;
        }

        let probe_timeout = self.config.policies.probe.timeout();
        let clicked = poll_until(
            self.config.send_all_fallback(),
            self.config.fallback_poll(),
            move || async move {
                let probe = call_with_timeout("ProbeControls", probe_timeout, self.adapter.probe_controls()).await;
                if !probe.ok || !probe.detail.send_all_visible {
                    return None;
                }
                let click = call_with_timeout(
                    "SendAllToClub fallback",
                    policy.timeout(),
                    self.adapter.send_all_to_club(),
                )
                .await;
                click.clicked().then_some(())
            },
        )
        .await
        .is_some();
        if clicked {
            info!("Send-all clicked by fallback");
        }
        clicked
    }

    /// Pre-open the next pack so the next iteration starts immediately.
    async fn pre_open(&self, session: &mut Session) {
        if session.target_reached() || session.cancelled() {
            return;
        }
        let outcome = call_with_timeout(
            "PreOpen",
            self.config.pre_open_timeout(),
            self.adapter.open_pack(),
        )
        .await;
        if outcome.clicked() {
            info!("Pre-opened the next pack");
            session.credit = true;
            sleep(self.config.pre_open_credit_settle()).await;
        } else {
            sleep(self.config.pre_open_settle()).await;
        }
    }

    /// Recovery when no open control was found.
    async fn recover_or_stop(&self, session: &Session) -> IterationOutcome {
        if self.recover().await {
            sleep(self.config.recovery_settle()).await;
            return IterationOutcome::Restart;
        }
        if session.cancelled() {
            return IterationOutcome::Stop(StopReason::Cancelled);
        }

        let probe = call_with_timeout(
            "ProbeControls",
            self.config.stop_probe(),
            self.adapter.probe_controls(),
        )
        .await;
        if probe.ok && (probe.detail.send_all_visible || probe.detail.recycle_visible) {
            info!("Open control missing but send-all or recycle is visible; retrying");
            sleep(self.config.recovery_settle()).await;
            return IterationOutcome::Restart;
        }

        warn!("No open control and nothing to recover; stopping");
        IterationOutcome::Stop(StopReason::Stuck)
    }

    async fn recover(&self) -> bool {
        let policies = &self.config.policies;
        let step = self.config.recovery_step_delay();

        let confirm = call_with_timeout(
            "DismissConfirmDialog",
            policies.confirm.timeout(),
            self.adapter.dismiss_confirm_dialog(),
        )
        .await;
        if confirm.clicked() {
            info!("Recovery: dismissed a confirm dialog");
            sleep(step).await;
            return true;
        }

        let quick_sell = call_with_retry("QuickSellUntradeables (recovery)", &policies.recovery_quick_sell, move || {
            self.adapter.quick_sell_untradeables()
        })
        .await;
        if quick_sell.acted() {
            info!("Recovery: quick-sold leftovers");
            sleep(step).await;
            return true;
        }

        let send_all = call_with_retry("SendAllToClub (recovery)", &policies.recovery_send_all, move || {
            self.adapter.send_all_to_club()
        })
        .await;
        if send_all.clicked() {
            info!("Recovery: sent items to club");
            sleep(step).await;
            return true;
        }

        let probe = call_with_timeout("ProbeControls", policies.probe.timeout(), self.adapter.probe_controls()).await;
        if probe.ok && probe.detail.recycle_visible {
            let histogram = self.store().histogram();
            let mode = decide_mode(&histogram, &self.thresholds);
            if let Some(mode) = mode.recycle_mode() {
                info!("Recovery: recycling as {}", mode);
                let outcome = call_with_retry("RecycleWorkflow (recovery)", &policies.recycle, move || {
                    self.adapter.recycle(mode)
                })
                .await;
                sleep(step).await;
                return outcome.ok && outcome.detail.opened;
            }
        }

        false
    }

    /// Histogram of the next payload, or of the store if none arrives.
    pub(crate) fn histogram_of(&self, data: Option<Value>) -> RatingHistogram {
        match data {
            Some(data) => compute_histogram(Some(&data)),
            None => self.store().histogram(),
        }
    }

    pub(crate) fn mode_of(&self, histogram: &RatingHistogram) -> DisposalMode {
        decide_mode(histogram, &self.thresholds)
    }
}

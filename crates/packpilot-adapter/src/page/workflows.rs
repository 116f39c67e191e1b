//! Multi-step UI workflows.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use packpilot_core::RecycleMode;

use crate::call::poll_until;
use crate::outcome::{QuickSellDetail, RecycleDetail, UnassignedDetail};

use super::adapter::Inner;
use super::config::ms;
use super::executor::PageExecutor;
use super::scripts;

impl<E: PageExecutor> Inner<E> {
    pub(super) async fn open_pack(&self) -> bool {
        let script = scripts::click_control("open_pack", scripts::OPEN_SELECTORS, scripts::OPEN_NEEDLES, true);
        let clicked = self.poll_any(ms(self.config.open_wait_ms), &script).await;
        if clicked {
            debug!("Open control pressed");
        } else {
            debug!("No open control within {}ms", self.config.open_wait_ms);
        }
        clicked
    }

    /// Best effort; the header buttons of a scrolled unassigned view are
    /// not rendered.
    async fn scroll_unassigned_top(&self) {
        let reset: u64 = self
            .eval_frames(&scripts::scroll_unassigned_top())
            .await
            .iter()
            .filter_map(|value| value.as_u64())
            .sum();
        if reset > 0 {
            debug!("Scrolled {} unassigned container(s) to the top", reset);
        }
    }

    pub(super) async fn send_all(&self) -> bool {
        self.scroll_unassigned_top().await;
        let script = scripts::click_control(
            "send_all",
            scripts::SEND_ALL_SELECTORS,
            scripts::SEND_ALL_NEEDLES,
            false,
        );
        self.poll_any(ms(self.config.send_all_wait_ms), &script).await
    }

    /// Find the unassigned-items interstitial within `limit`, press
    /// "take me there" and wait for it to close.
    pub(super) async fn unassigned(&self, limit: Duration) -> UnassignedDetail {
        let mut detail = UnassignedDetail {
            found: self.poll_any(limit, &scripts::unassigned_present()).await,
            ..Default::default()
        };
        if !detail.found {
            return detail;
        }

        detail.take_me_there_clicked = self
            .poll_any(ms(self.config.unassigned_dismiss_ms), &scripts::unassigned_take_me_there())
            .await;
        if detail.take_me_there_clicked {
            detail.dismissed = self
                .poll_all(ms(self.config.unassigned_dismiss_ms), &scripts::unassigned_gone())
                .await;
        }
        info!(
            "Unassigned interstitial: take_me_there={} dismissed={}",
            detail.take_me_there_clicked, detail.dismissed
        );
        detail
    }

    /// Press the quick-sell option, narrowest match first. Returns the name
    /// of the attempt that worked.
    async fn quick_sell_option(&self, limit: Duration) -> Option<&'static str> {
        let attempts = scripts::quick_sell_attempts();
        let names = [
            "strict scoped",
            "loose scoped",
            "strict global",
            "loose global",
        ];
        let attempts = &attempts;
        poll_until(limit, self.interval(), move || async move {
            for (script, name) in attempts.iter().zip(names) {
                if self.any_frame(script).await {
                    return Some(name);
                }
            }
            None
        })
        .await
    }

    pub(super) async fn quick_sell(&self) -> QuickSellDetail {
        let Some(_guard) = self.quick_sell.try_enter() else {
            info!("Quick sell already in flight; skipping");
            return QuickSellDetail {
                skipped: true,
                ..Default::default()
            };
        };

        let mut detail = QuickSellDetail::default();

        let unassigned = self.unassigned(ms(self.config.unassigned_probe_ms)).await;
        detail.take_me_there_clicked = unassigned.take_me_there_clicked;

        let ellipsis = scripts::click_ellipsis();
        let mut option = None;
        for round in 1..=2 {
            let opened = self.poll_any(ms(self.config.ellipsis_wait_ms), &ellipsis).await;
            detail.ellipsis_clicked |= opened;
            if !opened {
                debug!("Ellipsis menu not found (round {})", round);
            }
            option = self
                .quick_sell_option(ms(self.config.quick_sell_option_wait_ms))
                .await;
            if option.is_some() {
                break;
            }
        }

        let Some(matched) = option else {
            info!("No quick-sell option found");
            return detail;
        };
        debug!("Quick-sell option pressed ({} match)", matched);
        detail.quick_sell_clicked = true;

        let confirm = scripts::click_confirm();
        detail.confirm_clicked = self.poll_any(ms(self.config.confirm_wait_ms), &confirm).await;
        if !detail.confirm_clicked {
            warn!("No quick-sell confirmation; retrying the option once");
            if self
                .quick_sell_option(ms(self.config.quick_sell_option_wait_ms))
                .await
                .is_some()
            {
                detail.confirm_clicked = self
                    .poll_any(ms(self.config.confirm_retry_wait_ms), &confirm)
                    .await;
            }
        }

        if detail.confirm_clicked {
            sleep(self.interval()).await;
            if !self.all_frames(&scripts::no_dialogs()).await
                && self.any_frame(&scripts::keyboard_confirm()).await
            {
                debug!("Confirmation dialog persisted; sent keyboard confirm");
            }
        }

        detail.dismissed = self
            .poll_all(ms(self.config.dismiss_wait_ms), &scripts::no_dialogs())
            .await;

        info!(
            "Quick sell: ellipsis={} option={} confirm={} dismissed={}",
            detail.ellipsis_clicked, detail.quick_sell_clicked, detail.confirm_clicked, detail.dismissed
        );
        detail
    }

    pub(super) async fn recycle(self: &Arc<Self>, mode: RecycleMode) -> RecycleDetail {
        let labels = match mode {
            RecycleMode::Ovr89 => self.config.ovr89_labels.clone(),
            RecycleMode::X10Of84 => self.x10_toggle.next_order(),
        };
        let container = self.config.recycle_container_selector.as_str();
        let mut detail = RecycleDetail::default();

        self.scroll_unassigned_top().await;
        let entry = scripts::press_selector("recycle_entry", &self.config.recycle_entry_selector);
        detail.opened = self.poll_any(ms(self.config.recycle_entry_wait_ms), &entry).await;
        if !detail.opened {
            warn!("Recycle entry for {} not available", mode);
            return detail;
        }

        let rendered = self
            .poll_any(
                ms(self.config.recycle_container_wait_ms),
                &scripts::visible("recycle_container", container),
            )
            .await;

        if rendered {
            detail.label = self
                .poll_string(
                    ms(self.config.recycle_select_wait_ms),
                    &scripts::select_recycle_option(container, &labels),
                )
                .await;
            detail.selected = detail.label.is_some();
            if !detail.selected {
                warn!("No recycle option matched {:?}", labels);
                return detail;
            }

            sleep(ms(self.config.recycle_step_settle_ms)).await;
            detail.submit_clicked = self
                .poll_any(
                    ms(self.config.recycle_select_wait_ms),
                    &scripts::press_submit(container),
                )
                .await;
            if detail.submit_clicked {
                detail.dismissed = self
                    .poll_all(
                        ms(self.config.recycle_dismiss_wait_ms),
                        &scripts::hidden("recycle_container_gone", container),
                    )
                    .await;
            }
        } else {
            warn!("Recycle container never rendered; searching the whole page");
            detail.fallback = true;
            detail.label = self.first_string(&scripts::recycle_fallback(&labels)).await;
            detail.selected = detail.label.is_some();
            detail.submit_clicked = detail.selected;
        }

        if detail.submit_clicked {
            detail.autosbc_cancel_clicked = self
                .poll_any(
                    ms(self.config.follow_up_wait_ms),
                    &scripts::click_follow_up_cancel(),
                )
                .await;
            if detail.autosbc_cancel_clicked {
                info!("Follow-up suggestion declined; quick-selling leftovers");
                let inner = Arc::clone(self);
                tokio::spawn(async move {
                    let result = inner.quick_sell().await;
                    debug!("Follow-up quick sell finished: {:?}", result);
                });
            }
        }

        info!(
            "Recycle {}: label={:?} submit={} dismissed={} fallback={}",
            mode, detail.label, detail.submit_clicked, detail.dismissed, detail.fallback
        );
        detail
    }
}

//! [`PageActionAdapter`]: the adapter over a live page.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use packpilot_bridge::{EventBridge, CAPTURE_BINDING};
use packpilot_core::RecycleMode;

use crate::adapter::ActionAdapter;
use crate::call::{poll_until, poll_until_true};
use crate::guard::InFlight;
use crate::outcome::{
    ClickDetail, ControlProbe, HookDetail, Outcome, PingDetail, QuickSellDetail, RecycleDetail,
    UnassignedDetail,
};
use crate::toggle::RecycleToggle;

use super::config::PageAdapterConfig;
use super::executor::PageExecutor;
use super::scripts;

/// Frame id used for the install record when no frame has been reported yet.
const TOP_FRAME: &str = "main";

/// Drives the game tab through a [`PageExecutor`].
///
/// Cheap to clone; clones share the in-flight guard and the recycle toggle.
pub struct PageActionAdapter<E: PageExecutor> {
    inner: Arc<Inner<E>>,
}

impl<E: PageExecutor> Clone for PageActionAdapter<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

pub(super) struct Inner<E: PageExecutor> {
    pub(super) executor: E,
    pub(super) bridge: Arc<EventBridge>,
    pub(super) config: PageAdapterConfig,
    pub(super) quick_sell: InFlight,
    pub(super) x10_toggle: RecycleToggle,
    /// Binding and new-document script registered with the page.
    hook_registered: tokio::sync::Mutex<bool>,
}

impl<E: PageExecutor> PageActionAdapter<E> {
    pub fn new(executor: E, bridge: Arc<EventBridge>, config: PageAdapterConfig) -> Self {
        let x10_toggle = RecycleToggle::new(config.x10_labels.clone());
        Self {
            inner: Arc::new(Inner {
                executor,
                bridge,
                config,
                quick_sell: InFlight::new(),
                x10_toggle,
                hook_registered: tokio::sync::Mutex::new(false),
            }),
        }
    }

    pub fn executor(&self) -> &E {
        &self.inner.executor
    }

    pub fn config(&self) -> &PageAdapterConfig {
        &self.inner.config
    }

    /// True while a quick sell is running.
    pub fn quick_sell_in_flight(&self) -> bool {
        self.inner.quick_sell.is_busy()
    }
}

impl<E: PageExecutor> Inner<E> {
    pub(super) fn interval(&self) -> Duration {
        self.config.poll_interval()
    }

    /// Evaluate `script` in every frame, or in the main frame when none is
    /// tracked. Failed frames are skipped.
    pub(super) async fn eval_frames(&self, script: &str) -> Vec<Value> {
        let frames = self.executor.frames();
        if frames.is_empty() {
            return match self.executor.evaluate(script).await {
                Ok(value) => vec![value],
                Err(e) => {
                    debug!("Script failed in main frame: {}", e);
                    Vec::new()
                }
            };
        }

        let mut values = Vec::with_capacity(frames.len());
        for frame in frames {
            match self.executor.evaluate_in(frame.context_id, script).await {
                Ok(value) => values.push(value),
                Err(e) => debug!("Script failed in frame {}: {}", frame.frame_id, e),
            }
        }
        values
    }

    /// True if any frame answers `true`. Stops at the first one.
    pub(super) async fn any_frame(&self, script: &str) -> bool {
        let frames = self.executor.frames();
        if frames.is_empty() {
            return matches!(self.executor.evaluate(script).await, Ok(Value::Bool(true)));
        }
        for frame in frames {
            match self.executor.evaluate_in(frame.context_id, script).await {
                Ok(Value::Bool(true)) => return true,
                Ok(_) => {}
                Err(e) => debug!("Script failed in frame {}: {}", frame.frame_id, e),
            }
        }
        false
    }

    /// True if at least one frame answered and every answer is `true`.
    pub(super) async fn all_frames(&self, script: &str) -> bool {
        let values = self.eval_frames(script).await;
        !values.is_empty() && values.iter().all(|v| v.as_bool() == Some(true))
    }

    /// First string answer across frames.
    pub(super) async fn first_string(&self, script: &str) -> Option<String> {
        self.eval_frames(script)
            .await
            .into_iter()
            .find_map(|v| v.as_str().map(str::to_string))
    }

    pub(super) async fn poll_any(&self, limit: Duration, script: &str) -> bool {
        poll_until_true(limit, self.interval(), move || self.any_frame(script)).await
    }

    pub(super) async fn poll_all(&self, limit: Duration, script: &str) -> bool {
        poll_until_true(limit, self.interval(), move || self.all_frames(script)).await
    }

    pub(super) async fn poll_string(&self, limit: Duration, script: &str) -> Option<String> {
        poll_until(limit, self.interval(), move || self.first_string(script)).await
    }

    async fn probe(&self) -> ControlProbe {
        let script = scripts::control_probe(&self.config.recycle_entry_selector);
        self.eval_frames(&script)
            .await
            .into_iter()
            .filter_map(|v| serde_json::from_value::<ControlProbe>(v).ok())
            .fold(ControlProbe::default(), ControlProbe::merge)
    }

    /// Register the binding and the new-document script once both succeed.
    /// A failed registration is attempted again on the next hook call.
    async fn register_hook(&self, source: &str) {
        let mut registered = self.hook_registered.lock().await;
        if *registered {
            return;
        }
        if let Err(e) = self.executor.add_binding(CAPTURE_BINDING).await {
            warn!("Failed to register capture binding: {}", e);
            return;
        }
        if let Err(e) = self.executor.add_init_script(source).await {
            warn!("Failed to register hook for new documents: {}", e);
            return;
        }
        *registered = true;
    }

    async fn hook(&self) -> HookDetail {
        let source = self.bridge.hook_script();

        self.register_hook(source).await;

        let mut installed = 0;
        let frames = self.executor.frames();
        if frames.is_empty() {
            if self.bridge.mark_installed(TOP_FRAME) {
                match self.executor.evaluate(source).await {
                    Ok(_) => installed += 1,
                    Err(e) => {
                        warn!("Failed to hook main frame: {}", e);
                        self.bridge.forget_frame(TOP_FRAME);
                    }
                }
            }
        } else {
            for frame in frames {
                if !self.bridge.mark_installed(&frame.frame_id) {
                    continue;
                }
                match self.executor.evaluate_in(frame.context_id, source).await {
                    Ok(_) => installed += 1,
                    Err(e) => {
                        warn!("Failed to hook frame {}: {}", frame.frame_id, e);
                        self.bridge.forget_frame(&frame.frame_id);
                    }
                }
            }
        }

        if installed > 0 {
            info!("Purchased-items hook installed in {} frame(s)", installed);
        }
        HookDetail {
            installed_frames: installed,
        }
    }
}

#[async_trait]
impl<E: PageExecutor> ActionAdapter for PageActionAdapter<E> {
    async fn ping(&self) -> Outcome<PingDetail> {
        match self.inner.executor.evaluate(&scripts::ping()).await {
            Ok(Value::String(data)) => Outcome::success(PingDetail { data }),
            Ok(other) => Outcome::failed(format!("unexpected ping answer: {}", other)),
            Err(e) => Outcome::failed(e.to_string()),
        }
    }

    async fn open_pack(&self) -> Outcome<ClickDetail> {
        Outcome::success(ClickDetail {
            clicked: self.inner.open_pack().await,
        })
    }

    async fn send_all_to_club(&self) -> Outcome<ClickDetail> {
        Outcome::success(ClickDetail {
            clicked: self.inner.send_all().await,
        })
    }

    async fn quick_sell_untradeables(&self) -> Outcome<QuickSellDetail> {
        Outcome::success(self.inner.quick_sell().await)
    }

    async fn recycle(&self, mode: RecycleMode) -> Outcome<RecycleDetail> {
        Outcome::success(self.inner.recycle(mode).await)
    }

    async fn hook_purchased_items(&self) -> Outcome<HookDetail> {
        Outcome::success(self.inner.hook().await)
    }

    async fn dismiss_confirm_dialog(&self) -> Outcome<ClickDetail> {
        let limit = Duration::from_millis(self.inner.config.confirm_probe_ms);
        let clicked = self
            .inner
            .poll_any(limit, &scripts::click_generic_confirm())
            .await;
        Outcome::success(ClickDetail { clicked })
    }

    async fn handle_unassigned_dialog(&self) -> Outcome<UnassignedDetail> {
        let limit = Duration::from_millis(self.inner.config.unassigned_find_ms);
        Outcome::success(self.inner.unassigned(limit).await)
    }

    async fn probe_controls(&self) -> Outcome<ControlProbe> {
        Outcome::success(self.inner.probe().await)
    }
}

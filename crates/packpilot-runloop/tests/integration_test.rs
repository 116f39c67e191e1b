//! End-to-end tests: run loop driving the page adapter over a scripted page.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use packpilot_adapter::{
    call_with_retry, ActionAdapter, CdpError, FrameContext, PageActionAdapter, PageAdapterConfig, PageExecutor,
};
use packpilot_bridge::{BridgeConfig, EventBridge, RawCapture};
use packpilot_core::{CaptureSource, PurchaseStore};
use packpilot_runloop::{RunLoop, RunLoopConfig, RunState, StopReason};

const PURCHASED_URL: &str = "https://utas.mob.v4.prd.futc-ext.gcp.ea.com/ut/game/fc25/purchased/items";

// ============================================================================
// Scripted page
// ============================================================================

/// A page that answers every script by its marker name.
///
/// Pressing "Open" delivers `payload` through the bridge, the way the
/// installed hook would. Entries in `answers` win over the defaults.
struct ScriptedPage {
    bridge: Arc<EventBridge>,
    payload: Value,
    has_open: bool,
    answers: HashMap<&'static str, Value>,
    log: Mutex<Vec<String>>,
}

impl ScriptedPage {
    fn calls(&self, name: &str) -> usize {
        self.log.lock().iter().filter(|n| n.as_str() == name).count()
    }

    fn answer(&self, script: &str) -> Value {
        let name = script
            .strip_prefix("/* packpilot:")
            .and_then(|rest| rest.split_once(" */"))
            .map_or("unnamed", |(name, _)| name);
        self.log.lock().push(name.to_string());

        if let Some(answer) = self.answers.get(name) {
            return answer.clone();
        }
        match name {
            "ping" => json!("PONG"),
            "open_pack" => {
                if self.has_open {
                    self.bridge.ingest(RawCapture {
                        frame_id: "main".to_string(),
                        source: CaptureSource::Fetch,
                        method: "GET".to_string(),
                        url: PURCHASED_URL.to_string(),
                        body: self.payload.to_string(),
                    });
                }
                json!(self.has_open)
            }
            "unassigned_present" | "click_follow_up_cancel" => json!(false),
            "select_recycle_option" | "recycle_fallback" => json!("89+"),
            "control_probe" => json!({"openVisible": self.has_open}),
            "click_generic_confirm" => json!(false),
            _ => json!(self.has_open),
        }
    }
}

#[async_trait]
impl PageExecutor for ScriptedPage {
    async fn evaluate(&self, script: &str) -> Result<Value, CdpError> {
        Ok(self.answer(script))
    }

    async fn evaluate_in(&self, _context_id: i64, script: &str) -> Result<Value, CdpError> {
        Ok(self.answer(script))
    }

    fn frames(&self) -> Vec<FrameContext> {
        Vec::new()
    }

    async fn add_binding(&self, _name: &str) -> Result<(), CdpError> {
        Ok(())
    }

    async fn add_init_script(&self, _source: &str) -> Result<(), CdpError> {
        Ok(())
    }
}

fn session(payload: Value, has_open: bool) -> (RunLoop, PageActionAdapter<ScriptedPage>) {
    let bridge = Arc::new(EventBridge::new(Arc::new(PurchaseStore::new()), &BridgeConfig::default()).unwrap());
    let page = ScriptedPage {
        bridge: bridge.clone(),
        payload,
        has_open,
        answers: HashMap::new(),
        log: Mutex::new(Vec::new()),
    };
    let adapter = PageActionAdapter::new(page, bridge.clone(), PageAdapterConfig::default());
    let run_loop = RunLoop::new(RunLoopConfig::default(), Arc::new(adapter.clone()), bridge);
    (run_loop, adapter)
}

// ============================================================================
// Sessions
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_new_items_session() {
    let (run_loop, adapter) = session(json!({"items": [{"rating": 75}], "duplicateItemIdList": []}), true);

    let summary = run_loop.start(2).await.unwrap();

    assert_eq!(summary.reason, StopReason::Completed);
    assert_eq!(summary.opened, 2);
    assert_eq!(run_loop.state(), RunState::Idle);
    let page = adapter.executor();
    assert!(page.calls("send_all") >= 2);
    assert_eq!(page.calls("recycle_entry"), 0);
    assert!(page.calls("quick_sell_strict_scoped") >= 2);
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_high_rated_pack_is_recycled() {
    let (run_loop, adapter) = session(
        json!({"items": [{"id": 1, "rating": 91}], "duplicateItemIdList": [1]}),
        true,
    );

    let summary = run_loop.start(1).await.unwrap();

    assert_eq!(summary.reason, StopReason::Completed);
    let page = adapter.executor();
    assert_eq!(page.calls("send_all"), 0);
    assert_eq!(page.calls("recycle_entry"), 1);
    assert_eq!(page.calls("press_submit"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_page_without_open_control_gets_stuck() {
    let (run_loop, adapter) = session(json!({}), false);

    let summary = run_loop.start(5).await.unwrap();

    assert_eq!(summary.reason, StopReason::Stuck);
    assert_eq!(summary.opened, 0);
    assert_eq!(run_loop.state(), RunState::Stopped);
    assert!(adapter.executor().calls("open_pack") >= 1);
}

// ============================================================================
// Policy timeouts against real workflows
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_recovery_quick_sell_runs_to_completion() {
    // Only the menu and the option respond, so every later wait runs out.
    let bridge = Arc::new(EventBridge::new(Arc::new(PurchaseStore::new()), &BridgeConfig::default()).unwrap());
    let page = ScriptedPage {
        bridge: bridge.clone(),
        payload: json!({}),
        has_open: false,
        answers: HashMap::from([
            ("click_ellipsis", json!(true)),
            ("quick_sell_strict_scoped", json!(true)),
        ]),
        log: Mutex::new(Vec::new()),
    };
    let adapter = PageActionAdapter::new(page, bridge, PageAdapterConfig::default());
    let policy = RunLoopConfig::default().policies.recovery_quick_sell;

    let outcome = call_with_retry("QuickSellUntradeables (recovery)", &policy, || {
        adapter.quick_sell_untradeables()
    })
    .await;

    assert!(outcome.ok);
    assert!(!outcome.timeout);
    assert!(outcome.detail.ellipsis_clicked);
    assert!(outcome.detail.quick_sell_clicked);
    assert!(!outcome.detail.confirm_clicked);
    assert!(!outcome.detail.dismissed);
    let page = adapter.executor();
    assert!(page.calls("click_confirm") >= 1);
    assert!(page.calls("no_dialogs") >= 1);
}

#[tokio::test(start_paused = true)]
async fn test_recovery_send_all_runs_to_completion() {
    let (_, adapter) = session(json!({}), false);
    let policy = RunLoopConfig::default().policies.recovery_send_all;

    let outcome = call_with_retry("SendAllToClub (recovery)", &policy, || adapter.send_all_to_club()).await;

    assert!(outcome.ok);
    assert!(!outcome.timeout);
    assert!(!outcome.detail.clicked);
}

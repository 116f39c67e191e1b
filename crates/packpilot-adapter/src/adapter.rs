//! The action adapter contract.

use async_trait::async_trait;

use packpilot_core::RecycleMode;

use crate::outcome::{
    ClickDetail, ControlProbe, HookDetail, Outcome, PingDetail, QuickSellDetail, RecycleDetail,
    UnassignedDetail,
};

/// Named UI workflows the run loop can request.
///
/// Implementations own their polling, timeouts and fallbacks. Every method
/// returns an [`Outcome`]; a missing control is `ok: true` with the relevant
/// flag unset, while transport and page errors are `ok: false`.
#[async_trait]
pub trait ActionAdapter: Send + Sync {
    /// Liveness check; answers `data: "PONG"`.
    async fn ping(&self) -> Outcome<PingDetail>;

    /// Click the "Open" control once it is visible and enabled.
    async fn open_pack(&self) -> Outcome<ClickDetail>;

    /// Click the "Send all to club" control.
    async fn send_all_to_club(&self) -> Outcome<ClickDetail>;

    /// Quick-sell the untradeable items of the current pack.
    ///
    /// A call made while another is running returns `skipped: true`.
    async fn quick_sell_untradeables(&self) -> Outcome<QuickSellDetail>;

    /// Run the recycle workflow for `mode`.
    async fn recycle(&self, mode: RecycleMode) -> Outcome<RecycleDetail>;

    /// Install the purchased-items hook in every frame. Idempotent.
    async fn hook_purchased_items(&self) -> Outcome<HookDetail>;

    /// Click the confirmation of a generic confirm dialog, if one is open.
    async fn dismiss_confirm_dialog(&self) -> Outcome<ClickDetail>;

    /// Take the "take me there" action of the unassigned-items interstitial.
    async fn handle_unassigned_dialog(&self) -> Outcome<UnassignedDetail>;

    /// Report which top-level controls are visible.
    async fn probe_controls(&self) -> Outcome<ControlProbe>;
}

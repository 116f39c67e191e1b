//! Structured results of adapter operations.

use std::time::Duration;

use serde::{Deserialize, Serialize};

fn is_false(value: &bool) -> bool {
    !*value
}

/// Result of one adapter operation: an `ok` flag plus operation-specific
/// fields.
///
/// Serializes flat, e.g. `{"ok": true, "clicked": true}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Outcome<T> {
    pub ok: bool,

    /// Set when the call did not finish within its deadline.
    #[serde(default, skip_serializing_if = "is_false")]
    pub timeout: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(flatten)]
    pub detail: T,
}

impl<T> Outcome<T> {
    pub fn success(detail: T) -> Self {
        Self {
            ok: true,
            timeout: false,
            error: None,
            detail,
        }
    }
}

impl<T: Default> Outcome<T> {
    /// A failed call with no detail.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            timeout: false,
            error: Some(error.into()),
            detail: T::default(),
        }
    }

    /// A call that did not settle in time.
    pub fn timed_out(label: &str, after: Duration) -> Self {
        Self {
            ok: false,
            timeout: true,
            error: Some(format!("{} timed out after {}ms", label, after.as_millis())),
            detail: T::default(),
        }
    }
}

/// `Ping` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PingDetail {
    pub data: String,
}

/// Result of clicking a single labeled control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClickDetail {
    pub clicked: bool,
}

impl Outcome<ClickDetail> {
    /// True only for a successful call that clicked something.
    pub fn clicked(&self) -> bool {
        self.ok && self.detail.clicked
    }
}

/// Steps reached by the quick-sell workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuickSellDetail {
    pub ellipsis_clicked: bool,
    pub quick_sell_clicked: bool,
    pub confirm_clicked: bool,
    pub dismissed: bool,
    pub take_me_there_clicked: bool,
    /// Another quick sell was already running; nothing was done.
    pub skipped: bool,
}

impl Outcome<QuickSellDetail> {
    /// True if the workflow got as far as selecting or confirming a sale.
    pub fn acted(&self) -> bool {
        self.ok && (self.detail.quick_sell_clicked || self.detail.confirm_clicked)
    }
}

/// Steps reached by the recycle workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecycleDetail {
    pub opened: bool,
    pub selected: bool,
    pub submit_clicked: bool,
    pub dismissed: bool,
    pub autosbc_cancel_clicked: bool,
    /// The container never rendered; a page-wide search was used instead.
    pub fallback: bool,
    /// Option label that was selected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Outcome<RecycleDetail> {
    /// True if the recycle submit was pressed.
    pub fn submitted(&self) -> bool {
        self.ok && self.detail.submit_clicked
    }
}

/// `HookPurchasedItems` response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HookDetail {
    /// Frames newly hooked by this call.
    pub installed_frames: usize,
}

/// Handling of the "unassigned items remain" interstitial.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UnassignedDetail {
    pub found: bool,
    pub take_me_there_clicked: bool,
    pub dismissed: bool,
}

impl Outcome<UnassignedDetail> {
    /// True if the interstitial was present and its action was taken.
    pub fn handled(&self) -> bool {
        self.ok && self.detail.take_me_there_clicked
    }
}

/// Which top-level controls are currently visible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ControlProbe {
    pub open_visible: bool,
    pub send_all_visible: bool,
    pub recycle_visible: bool,
}

impl ControlProbe {
    /// Field-wise OR, used to merge per-frame probes.
    pub fn merge(self, other: ControlProbe) -> ControlProbe {
        ControlProbe {
            open_visible: self.open_visible || other.open_visible,
            send_all_visible: self.send_all_visible || other.send_all_visible,
            recycle_visible: self.recycle_visible || other.recycle_visible,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_serialization() {
        let outcome = Outcome::success(ClickDetail { clicked: true });
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"ok": true, "clicked": true})
        );
    }

    #[test]
    fn test_timed_out() {
        let outcome: Outcome<ClickDetail> =
            Outcome::timed_out("OpenPack", Duration::from_millis(1500));
        assert!(!outcome.ok);
        assert!(outcome.timeout);
        assert!(outcome.error.as_deref().unwrap().contains("1500ms"));
        assert!(!outcome.clicked());
        assert_eq!(serde_json::to_value(&outcome).unwrap()["timeout"], true);
    }

    #[test]
    fn test_deserialize_quick_sell() {
        let outcome: Outcome<QuickSellDetail> = serde_json::from_value(json!({
            "ok": true,
            "ellipsisClicked": true,
            "quickSellClicked": true
        }))
        .unwrap();
        assert!(outcome.acted());
        assert!(!outcome.detail.confirm_clicked);
        assert!(!outcome.timeout);
    }

    #[test]
    fn test_failed_never_acts() {
        let mut outcome: Outcome<QuickSellDetail> = Outcome::failed("boom");
        outcome.detail.confirm_clicked = true;
        assert!(!outcome.acted());
        assert_eq!(outcome.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_recycle_serialization_names() {
        let outcome = Outcome::success(RecycleDetail {
            opened: true,
            submit_clicked: true,
            autosbc_cancel_clicked: true,
            ..Default::default()
        });
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["submitClicked"], true);
        assert_eq!(value["autosbcCancelClicked"], true);
        assert!(value.get("label").is_none());
        assert!(outcome.submitted());
    }

    #[test]
    fn test_probe_merge() {
        let a = ControlProbe {
            open_visible: true,
            ..Default::default()
        };
        let b = ControlProbe {
            recycle_visible: true,
            ..Default::default()
        };
        let merged = a.merge(b);
        assert!(merged.open_visible);
        assert!(merged.recycle_visible);
        assert!(!merged.send_all_visible);
    }
}

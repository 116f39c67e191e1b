//! Page adapter settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Polling interval, per-step waits and recycle option labels.
///
/// All durations are in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageAdapterConfig {
    /// Interval between page probes.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// How long OpenPack waits for the "Open" control.
    #[serde(default = "default_open_wait_ms")]
    pub open_wait_ms: u64,

    /// How long SendAllToClub waits for its control.
    #[serde(default = "default_send_all_wait_ms")]
    pub send_all_wait_ms: u64,

    #[serde(default = "default_ellipsis_wait_ms")]
    pub ellipsis_wait_ms: u64,

    #[serde(default = "default_quick_sell_option_wait_ms")]
    pub quick_sell_option_wait_ms: u64,

    /// First wait for a confirmation control after quick sell.
    #[serde(default = "default_confirm_wait_ms")]
    pub confirm_wait_ms: u64,

    /// Confirmation wait after the quick-sell step was retried.
    #[serde(default = "default_confirm_retry_wait_ms")]
    pub confirm_retry_wait_ms: u64,

    /// Wait for every dialog to disappear after confirming.
    #[serde(default = "default_dismiss_wait_ms")]
    pub dismiss_wait_ms: u64,

    /// Probe window for the unassigned-items interstitial before quick sell.
    #[serde(default = "default_unassigned_probe_ms")]
    pub unassigned_probe_ms: u64,

    /// Search window for the interstitial when handled on its own.
    #[serde(default = "default_unassigned_find_ms")]
    pub unassigned_find_ms: u64,

    /// Wait for the interstitial to close after "take me there".
    #[serde(default = "default_unassigned_dismiss_ms")]
    pub unassigned_dismiss_ms: u64,

    /// Window for a generic confirm dialog during recovery.
    #[serde(default = "default_confirm_probe_ms")]
    pub confirm_probe_ms: u64,

    #[serde(default = "default_recycle_entry_wait_ms")]
    pub recycle_entry_wait_ms: u64,

    #[serde(default = "default_recycle_container_wait_ms")]
    pub recycle_container_wait_ms: u64,

    #[serde(default = "default_recycle_select_wait_ms")]
    pub recycle_select_wait_ms: u64,

    /// Pause between selecting an option and pressing submit.
    #[serde(default = "default_recycle_step_settle_ms")]
    pub recycle_step_settle_ms: u64,

    #[serde(default = "default_recycle_dismiss_wait_ms")]
    pub recycle_dismiss_wait_ms: u64,

    /// Window for the follow-up suggestion dialog after a recycle.
    #[serde(default = "default_follow_up_wait_ms")]
    pub follow_up_wait_ms: u64,

    /// Control that opens the recycle workflow.
    #[serde(default = "default_recycle_entry_selector")]
    pub recycle_entry_selector: String,

    /// Container the recycle options render in.
    #[serde(default = "default_recycle_container_selector")]
    pub recycle_container_selector: String,

    /// Option labels for OVR89, in preference order.
    #[serde(default = "default_ovr89_labels")]
    pub ovr89_labels: Vec<String>,

    /// Option labels for X10_84, rotated round-robin between calls.
    #[serde(default = "default_x10_labels")]
    pub x10_labels: Vec<String>,
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_open_wait_ms() -> u64 {
    18_000
}

fn default_send_all_wait_ms() -> u64 {
    12_000
}

fn default_ellipsis_wait_ms() -> u64 {
    8_000
}

fn default_quick_sell_option_wait_ms() -> u64 {
    8_000
}

fn default_confirm_wait_ms() -> u64 {
    12_000
}

fn default_confirm_retry_wait_ms() -> u64 {
    6_000
}

fn default_dismiss_wait_ms() -> u64 {
    6_000
}

fn default_unassigned_probe_ms() -> u64 {
    1_500
}

fn default_unassigned_find_ms() -> u64 {
    6_000
}

fn default_unassigned_dismiss_ms() -> u64 {
    8_000
}

fn default_confirm_probe_ms() -> u64 {
    1_500
}

fn default_recycle_entry_wait_ms() -> u64 {
    6_000
}

fn default_recycle_container_wait_ms() -> u64 {
    6_000
}

fn default_recycle_select_wait_ms() -> u64 {
    4_000
}

fn default_recycle_step_settle_ms() -> u64 {
    400
}

fn default_recycle_dismiss_wait_ms() -> u64 {
    8_000
}

fn default_follow_up_wait_ms() -> u64 {
    3_000
}

fn default_recycle_entry_selector() -> String {
    "#auto-sbc-recycle".to_string()
}

fn default_recycle_container_selector() -> String {
    ".autosbc-recycle, .auto-sbc-recycle-container, [data-autosbc=\"recycle\"]".to_string()
}

fn default_ovr89_labels() -> Vec<String> {
    vec!["89+".to_string()]
}

fn default_x10_labels() -> Vec<String> {
    vec!["84+ x10".to_string(), "x10 84+".to_string()]
}

impl Default for PageAdapterConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            open_wait_ms: default_open_wait_ms(),
            send_all_wait_ms: default_send_all_wait_ms(),
            ellipsis_wait_ms: default_ellipsis_wait_ms(),
            quick_sell_option_wait_ms: default_quick_sell_option_wait_ms(),
            confirm_wait_ms: default_confirm_wait_ms(),
            confirm_retry_wait_ms: default_confirm_retry_wait_ms(),
            dismiss_wait_ms: default_dismiss_wait_ms(),
            unassigned_probe_ms: default_unassigned_probe_ms(),
            unassigned_find_ms: default_unassigned_find_ms(),
            unassigned_dismiss_ms: default_unassigned_dismiss_ms(),
            confirm_probe_ms: default_confirm_probe_ms(),
            recycle_entry_wait_ms: default_recycle_entry_wait_ms(),
            recycle_container_wait_ms: default_recycle_container_wait_ms(),
            recycle_select_wait_ms: default_recycle_select_wait_ms(),
            recycle_step_settle_ms: default_recycle_step_settle_ms(),
            recycle_dismiss_wait_ms: default_recycle_dismiss_wait_ms(),
            follow_up_wait_ms: default_follow_up_wait_ms(),
            recycle_entry_selector: default_recycle_entry_selector(),
            recycle_container_selector: default_recycle_container_selector(),
            ovr89_labels: default_ovr89_labels(),
            x10_labels: default_x10_labels(),
        }
    }
}

impl PageAdapterConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Sum of `windows` plus one poll interval each for the final probe.
    fn budget(&self, windows: &[u64]) -> Duration {
        let polls = windows.len() as u64;
        ms(windows.iter().sum::<u64>() + polls * self.poll_interval_ms)
    }

    /// Longest OpenPack can take.
    pub fn open_budget(&self) -> Duration {
        self.budget(&[self.open_wait_ms])
    }

    pub fn send_all_budget(&self) -> Duration {
        self.budget(&[self.send_all_wait_ms])
    }

    /// Longest HandleUnassignedDialog can take: find, take me there, close.
    pub fn unassigned_budget(&self) -> Duration {
        self.budget(&[
            self.unassigned_find_ms,
            self.unassigned_dismiss_ms,
            self.unassigned_dismiss_ms,
        ])
    }

    pub fn confirm_budget(&self) -> Duration {
        self.budget(&[self.confirm_probe_ms])
    }

    /// Longest QuickSellUntradeables can take: the unassigned check, two
    /// ellipsis/option rounds, confirm with one retry, then the dismissal wait.
    pub fn quick_sell_budget(&self) -> Duration {
        self.budget(&[
            self.unassigned_probe_ms,
            self.unassigned_dismiss_ms,
            self.unassigned_dismiss_ms,
            self.ellipsis_wait_ms,
            self.quick_sell_option_wait_ms,
            self.ellipsis_wait_ms,
            self.quick_sell_option_wait_ms,
            self.confirm_wait_ms,
            self.quick_sell_option_wait_ms,
            self.confirm_retry_wait_ms,
            self.poll_interval_ms,
            self.dismiss_wait_ms,
        ])
    }

    /// Longest RecycleWorkflow can take, follow-up dialog included.
    pub fn recycle_budget(&self) -> Duration {
        self.budget(&[
            self.recycle_entry_wait_ms,
            self.recycle_container_wait_ms,
            self.recycle_select_wait_ms,
            self.recycle_step_settle_ms,
            self.recycle_select_wait_ms,
            self.recycle_dismiss_wait_ms,
            self.follow_up_wait_ms,
        ])
    }
}

pub(crate) fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

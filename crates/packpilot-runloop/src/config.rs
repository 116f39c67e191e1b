//! Configuration for the run loop.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use packpilot_adapter::CallPolicy;

use crate::error::{RunLoopError, RunLoopResult};

/// Run loop timings and call policies. Durations are in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLoopConfig {
    /// Watchdog for a single iteration.
    #[serde(default = "default_iteration_timeout_ms")]
    pub iteration_timeout_ms: u64,

    /// Wait for the purchased-items payload after an open.
    #[serde(default = "default_purchase_wait_ms")]
    pub purchase_wait_ms: u64,

    /// Wait for a refreshed payload after a recycle.
    #[serde(default = "default_refresh_wait_ms")]
    pub refresh_wait_ms: u64,

    /// Pause that lets the page settle after opening or recycling.
    #[serde(default = "default_stabilize_ms")]
    pub stabilize_ms: u64,

    #[serde(default = "default_quick_sell_settle_ms")]
    pub quick_sell_settle_ms: u64,

    /// Pause between iterations.
    #[serde(default = "default_iteration_delay_ms")]
    pub iteration_delay_ms: u64,

    #[serde(default = "default_pre_open_timeout_ms")]
    pub pre_open_timeout_ms: u64,

    /// Settle after a successful pre-open.
    #[serde(default = "default_pre_open_credit_settle_ms")]
    pub pre_open_credit_settle_ms: u64,

    /// Settle after a pre-open that found nothing.
    #[serde(default = "default_pre_open_settle_ms")]
    pub pre_open_settle_ms: u64,

    /// Settle after each recovery action.
    #[serde(default = "default_recovery_step_delay_ms")]
    pub recovery_step_delay_ms: u64,

    /// Settle before restarting an iteration.
    #[serde(default = "default_recovery_settle_ms")]
    pub recovery_settle_ms: u64,

    /// Upper bound on X10_84 recycle passes per disposal.
    #[serde(default = "default_max_x10_passes")]
    pub max_x10_passes: u32,

    /// Local send-all fallback window.
    #[serde(default = "default_send_all_fallback_ms")]
    pub send_all_fallback_ms: u64,

    #[serde(default = "default_fallback_poll_ms")]
    pub fallback_poll_ms: u64,

    /// Final control probe before giving up as stuck.
    #[serde(default = "default_stop_probe_ms")]
    pub stop_probe_ms: u64,

    #[serde(default)]
    pub policies: CallPolicies,
}

fn default_iteration_timeout_ms() -> u64 {
    120_000
}

fn default_purchase_wait_ms() -> u64 {
    12_000
}

fn default_refresh_wait_ms() -> u64 {
    8_000
}

fn default_stabilize_ms() -> u64 {
    987
}

fn default_quick_sell_settle_ms() -> u64 {
    350
}

fn default_iteration_delay_ms() -> u64 {
    600
}

fn default_pre_open_timeout_ms() -> u64 {
    2_500
}

fn default_pre_open_credit_settle_ms() -> u64 {
    350
}

fn default_pre_open_settle_ms() -> u64 {
    300
}

fn default_recovery_step_delay_ms() -> u64 {
    400
}

fn default_recovery_settle_ms() -> u64 {
    300
}

fn default_max_x10_passes() -> u32 {
    3
}

fn default_send_all_fallback_ms() -> u64 {
    10_000
}

fn default_fallback_poll_ms() -> u64 {
    250
}

fn default_stop_probe_ms() -> u64 {
    1_200
}

impl Default for RunLoopConfig {
    fn default() -> Self {
        Self {
            iteration_timeout_ms: default_iteration_timeout_ms(),
            purchase_wait_ms: default_purchase_wait_ms(),
            refresh_wait_ms: default_refresh_wait_ms(),
            stabilize_ms: default_stabilize_ms(),
            quick_sell_settle_ms: default_quick_sell_settle_ms(),
            iteration_delay_ms: default_iteration_delay_ms(),
            pre_open_timeout_ms: default_pre_open_timeout_ms(),
            pre_open_credit_settle_ms: default_pre_open_credit_settle_ms(),
            pre_open_settle_ms: default_pre_open_settle_ms(),
            recovery_step_delay_ms: default_recovery_step_delay_ms(),
            recovery_settle_ms: default_recovery_settle_ms(),
            max_x10_passes: default_max_x10_passes(),
            send_all_fallback_ms: default_send_all_fallback_ms(),
            fallback_poll_ms: default_fallback_poll_ms(),
            stop_probe_ms: default_stop_probe_ms(),
            policies: CallPolicies::default(),
        }
    }
}

impl RunLoopConfig {
    /// Reject settings the loop cannot run with.
    pub fn validate(&self) -> RunLoopResult<()> {
        if self.iteration_timeout_ms == 0 {
            return Err(RunLoopError::Config(
                "iteration_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.fallback_poll_ms == 0 {
            return Err(RunLoopError::Config(
                "fallback_poll_ms must be greater than 0".to_string(),
            ));
        }
        for (name, policy) in self.policies.named() {
            if policy.timeout_ms == 0 {
                return Err(RunLoopError::Config(format!(
                    "policies.{}.timeout_ms must be greater than 0",
                    name
                )));
            }
        }
        Ok(())
    }

    pub fn iteration_timeout(&self) -> Duration {
        Duration::from_millis(self.iteration_timeout_ms)
    }

    pub fn purchase_wait(&self) -> Duration {
        Duration::from_millis(self.purchase_wait_ms)
    }

    pub fn refresh_wait(&self) -> Duration {
        Duration::from_millis(self.refresh_wait_ms)
    }

    pub fn stabilize(&self) -> Duration {
        Duration::from_millis(self.stabilize_ms)
    }

    pub fn quick_sell_settle(&self) -> Duration {
        Duration::from_millis(self.quick_sell_settle_ms)
    }

    pub fn iteration_delay(&self) -> Duration {
        Duration::from_millis(self.iteration_delay_ms)
    }

    pub fn pre_open_timeout(&self) -> Duration {
        Duration::from_millis(self.pre_open_timeout_ms)
    }

    pub fn pre_open_credit_settle(&self) -> Duration {
        Duration::from_millis(self.pre_open_credit_settle_ms)
    }

    pub fn pre_open_settle(&self) -> Duration {
        Duration::from_millis(self.pre_open_settle_ms)
    }

    pub fn recovery_step_delay(&self) -> Duration {
        Duration::from_millis(self.recovery_step_delay_ms)
    }

    pub fn recovery_settle(&self) -> Duration {
        Duration::from_millis(self.recovery_settle_ms)
    }

    pub fn send_all_fallback(&self) -> Duration {
        Duration::from_millis(self.send_all_fallback_ms)
    }

    pub fn fallback_poll(&self) -> Duration {
        Duration::from_millis(self.fallback_poll_ms)
    }

    pub fn stop_probe(&self) -> Duration {
        Duration::from_millis(self.stop_probe_ms)
    }
}

/// Timeout and retry budget per adapter operation.
///
/// A timeout drops the workflow wherever it is, so each one must cover the
/// adapter's longest run (see `PageAdapterConfig::*_budget`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallPolicies {
    #[serde(default = "default_open_policy")]
    pub open: CallPolicy,
    #[serde(default = "default_send_all_policy")]
    pub send_all: CallPolicy,
    #[serde(default = "default_quick_sell_policy")]
    pub quick_sell: CallPolicy,
    #[serde(default = "default_recycle_policy")]
    pub recycle: CallPolicy,
    /// Quick sell attempted while recovering from a missing open control.
    #[serde(default = "default_recovery_quick_sell_policy")]
    pub recovery_quick_sell: CallPolicy,
    #[serde(default = "default_recovery_send_all_policy")]
    pub recovery_send_all: CallPolicy,
    #[serde(default = "default_confirm_policy")]
    pub confirm: CallPolicy,
    #[serde(default = "default_unassigned_policy")]
    pub unassigned: CallPolicy,
    #[serde(default = "default_probe_policy")]
    pub probe: CallPolicy,
    #[serde(default = "default_hook_policy")]
    pub hook: CallPolicy,
}

fn default_open_policy() -> CallPolicy {
    CallPolicy::new(20_000, 0, 0)
}

fn default_send_all_policy() -> CallPolicy {
    CallPolicy::new(15_000, 0, 0)
}

fn default_quick_sell_policy() -> CallPolicy {
    CallPolicy::new(90_000, 1, 500)
}

fn default_recycle_policy() -> CallPolicy {
    CallPolicy::new(40_000, 1, 500)
}

fn default_recovery_quick_sell_policy() -> CallPolicy {
    CallPolicy::new(90_000, 0, 0)
}

fn default_recovery_send_all_policy() -> CallPolicy {
    CallPolicy::new(15_000, 0, 0)
}

fn default_confirm_policy() -> CallPolicy {
    CallPolicy::new(2_500, 0, 0)
}

fn default_unassigned_policy() -> CallPolicy {
    CallPolicy::new(25_000, 0, 0)
}

fn default_probe_policy() -> CallPolicy {
    CallPolicy::new(2_000, 0, 0)
}

fn default_hook_policy() -> CallPolicy {
    CallPolicy::new(10_000, 0, 0)
}

impl Default for CallPolicies {
    fn default() -> Self {
        Self {
            open: default_open_policy(),
            send_all: default_send_all_policy(),
            quick_sell: default_quick_sell_policy(),
            recycle: default_recycle_policy(),
            recovery_quick_sell: default_recovery_quick_sell_policy(),
            recovery_send_all: default_recovery_send_all_policy(),
            confirm: default_confirm_policy(),
            unassigned: default_unassigned_policy(),
            probe: default_probe_policy(),
            hook: default_hook_policy(),
        }
    }
}

impl CallPolicies {
    /// Every policy with its config key.
    pub fn named(&self) -> [(&'static str, &CallPolicy); 10] {
        [
            ("open", &self.open),
            ("send_all", &self.send_all),
            ("quick_sell", &self.quick_sell),
            ("recycle", &self.recycle),
            ("recovery_quick_sell", &self.recovery_quick_sell),
            ("recovery_send_all", &self.recovery_send_all),
            ("confirm", &self.confirm),
            ("unassigned", &self.unassigned),
            ("probe", &self.probe),
            ("hook", &self.hook),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunLoopConfig::default();
        assert_eq!(config.iteration_timeout(), Duration::from_secs(120));
        assert_eq!(config.stabilize(), Duration::from_millis(987));
        assert_eq!(config.max_x10_passes, 3);
        assert_eq!(config.policies.quick_sell.retries, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_deserialize() {
        let config: RunLoopConfig = serde_json::from_value(serde_json::json!({
            "stabilize_ms": 10,
            "policies": {"open": {"timeout_ms": 5000}}
        }))
        .unwrap();
        assert_eq!(config.stabilize_ms, 10);
        assert_eq!(config.policies.open.timeout_ms, 5000);
        assert_eq!(config.policies.open.retries, 0);
        assert_eq!(config.policies.send_all, default_send_all_policy());
        assert_eq!(config.purchase_wait_ms, 12_000);
    }

    #[test]
    fn test_zero_policy_timeout_rejected() {
        let mut config = RunLoopConfig::default();
        config.policies.recycle.timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("policies.recycle.timeout_ms"));
    }

    #[test]
    fn test_default_policies_cover_adapter_workflows() {
        let adapter = packpilot_adapter::PageAdapterConfig::default();
        let policies = CallPolicies::default();
        assert!(policies.open.timeout() > adapter.open_budget());
        assert!(policies.send_all.timeout() > adapter.send_all_budget());
        assert!(policies.recovery_send_all.timeout() > adapter.send_all_budget());
        assert!(policies.quick_sell.timeout() > adapter.quick_sell_budget());
        assert!(policies.recovery_quick_sell.timeout() > adapter.quick_sell_budget());
        assert!(policies.recycle.timeout() > adapter.recycle_budget());
        assert!(policies.unassigned.timeout() > adapter.unassigned_budget());
        assert!(policies.confirm.timeout() > adapter.confirm_budget());
    }

    #[test]
    fn test_zero_watchdog_rejected() {
        let config = RunLoopConfig {
            iteration_timeout_ms: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(RunLoopError::Config(_))));
    }
}

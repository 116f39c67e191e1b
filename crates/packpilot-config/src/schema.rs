//! Configuration schema definitions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use packpilot_adapter::PageAdapterConfig;
use packpilot_bridge::BridgeConfig;
use packpilot_core::ClassifierThresholds;
use packpilot_runloop::RunLoopConfig;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub run: RunConfig,

    #[serde(default)]
    pub classifier: ClassifierThresholds,

    #[serde(default)]
    pub adapter: PageAdapterConfig,

    #[serde(default)]
    pub bridge: BridgeConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Chrome connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// DevTools HTTP endpoint of a Chrome started with `--remote-debugging-port`.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Substring of the URL of the tab to drive.
    #[serde(default = "default_target_url_contains")]
    pub target_url_contains: String,
}

fn default_endpoint() -> String {
    "http://127.0.0.1:9222".to_string()
}

fn default_target_url_contains() -> String {
    "ea.com".to_string()
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            target_url_contains: default_target_url_contains(),
        }
    }
}

/// `[run]`: pack count plus every run loop timing and call policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Packs to open when `--runs` is not given.
    #[serde(default = "default_runs")]
    pub runs: u32,

    #[serde(flatten)]
    pub run_loop: RunLoopConfig,
}

fn default_runs() -> u32 {
    5
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            runs: default_runs(),
            run_loop: RunLoopConfig::default(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,

    /// Log directory. Defaults to `~/.packpilot/logs`.
    #[serde(default)]
    pub dir: Option<String>,

    /// Daily log files kept before the oldest is removed.
    #[serde(default = "default_max_log_files")]
    pub max_log_files: usize,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    14
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            dir: None,
            max_log_files: default_max_log_files(),
        }
    }
}

impl LoggingConfig {
    /// The log directory with `~` expanded.
    pub fn log_dir(&self) -> PathBuf {
        match &self.dir {
            Some(dir) => PathBuf::from(shellexpand::tilde(dir).as_ref()),
            None => dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".packpilot")
                .join("logs"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.browser.endpoint, "http://127.0.0.1:9222");
        assert_eq!(config.browser.target_url_contains, "ea.com");
        assert_eq!(config.run.runs, 5);
        assert_eq!(config.run.run_loop, RunLoopConfig::default());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.max_log_files, 14);
    }

    #[test]
    fn test_run_section_is_flat() {
        let config: Config = toml::from_str(
            r#"
            [run]
            runs = 12
            stabilize_ms = 500
            max_x10_passes = 2

            [run.policies.open]
            timeout_ms = 9000
            retries = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.run.runs, 12);
        assert_eq!(config.run.run_loop.stabilize_ms, 500);
        assert_eq!(config.run.run_loop.max_x10_passes, 2);
        assert_eq!(config.run.run_loop.policies.open.timeout_ms, 9000);
        assert_eq!(config.run.run_loop.policies.open.retries, 2);
        // Untouched fields keep their defaults.
        assert_eq!(
            config.run.run_loop.purchase_wait_ms,
            RunLoopConfig::default().purchase_wait_ms
        );
    }

    #[test]
    fn test_log_dir_expands_tilde() {
        let logging = LoggingConfig {
            dir: Some("~/packpilot-logs".to_string()),
            ..Default::default()
        };
        let dir = logging.log_dir();
        assert!(!dir.to_string_lossy().starts_with('~'));
        assert!(dir.ends_with("packpilot-logs"));
    }

    #[test]
    fn test_default_log_dir() {
        let dir = LoggingConfig::default().log_dir();
        assert!(dir.ends_with(".packpilot/logs"));
    }
}

//! Configuration validation.

use regex::Regex;

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Turn the first error into a [`ConfigError::InvalidValue`].
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(ConfigError::InvalidValue {
                field: error.path,
                message: error.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_browser(config, &mut result);
        Self::validate_run(config, &mut result);
        Self::validate_classifier(config, &mut result);
        Self::validate_adapter(config, &mut result);
        Self::validate_budgets(config, &mut result);
        Self::validate_bridge(config, &mut result);
        Self::validate_logging(config, &mut result);

        Ok(result)
    }

    fn validate_browser(config: &Config, result: &mut ValidationResult) {
        let endpoint = &config.browser.endpoint;
        if endpoint.is_empty() {
            result.add_error(ValidationError::new("browser.endpoint", "Endpoint cannot be empty"));
        } else if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            result.add_error(ValidationError::new(
                "browser.endpoint",
                "Endpoint must start with http:// or https://",
            ));
        }

        if config.browser.target_url_contains.is_empty() {
            result.add_warning(ValidationWarning::new(
                "browser.target_url_contains",
                "Empty target filter, the first open page will be driven",
            ));
        }
    }

    fn validate_run(config: &Config, result: &mut ValidationResult) {
        if config.run.runs == 0 {
            result.add_error(ValidationError::new("run.runs", "runs must be at least 1"));
        }

        if let Err(e) = config.run.run_loop.validate() {
            result.add_error(ValidationError::new("run", e.to_string()));
        }

        if config.run.run_loop.max_x10_passes > 10 {
            result.add_warning(ValidationWarning::new(
                "run.max_x10_passes",
                "More than 10 X10 passes per pack, a stale histogram can keep recycling",
            ));
        }
    }

    fn validate_classifier(config: &Config, result: &mut ValidationResult) {
        let thresholds = &config.classifier;
        if thresholds.x10_min_count == 0 {
            result.add_warning(ValidationWarning::new(
                "classifier.x10_min_count",
                "x10_min_count is 0, every pack qualifies for X10_84",
            ));
        }
        if thresholds.x10_rating >= thresholds.ovr_min_rating {
            result.add_warning(ValidationWarning::new(
                "classifier.x10_rating",
                "x10_rating is not below ovr_min_rating, X10_84 is shadowed by OVR89",
            ));
        }
    }

    fn validate_adapter(config: &Config, result: &mut ValidationResult) {
        let adapter = &config.adapter;
        if adapter.poll_interval_ms == 0 {
            result.add_error(ValidationError::new(
                "adapter.poll_interval_ms",
                "poll_interval_ms must be greater than 0",
            ));
        }
        if adapter.ovr89_labels.is_empty() {
            result.add_error(ValidationError::new("adapter.ovr89_labels", "At least one label is required"));
        }
        if adapter.x10_labels.is_empty() {
            result.add_error(ValidationError::new("adapter.x10_labels", "At least one label is required"));
        }
        if adapter.recycle_entry_selector.trim().is_empty() {
            result.add_error(ValidationError::new(
                "adapter.recycle_entry_selector",
                "Selector cannot be empty",
            ));
        }
    }

    /// A policy timeout that does not outlast the adapter's own waits
    /// cancels the workflow between clicks.
    fn validate_budgets(config: &Config, result: &mut ValidationResult) {
        let adapter = &config.adapter;
        let policies = &config.run.run_loop.policies;
        let pairs = [
            ("open", &policies.open, adapter.open_budget()),
            ("send_all", &policies.send_all, adapter.send_all_budget()),
            ("recovery_send_all", &policies.recovery_send_all, adapter.send_all_budget()),
            ("quick_sell", &policies.quick_sell, adapter.quick_sell_budget()),
            ("recovery_quick_sell", &policies.recovery_quick_sell, adapter.quick_sell_budget()),
            ("recycle", &policies.recycle, adapter.recycle_budget()),
            ("unassigned", &policies.unassigned, adapter.unassigned_budget()),
            ("confirm", &policies.confirm, adapter.confirm_budget()),
        ];
        for (name, policy, budget) in pairs {
            if policy.timeout() <= budget {
                result.add_error(ValidationError::new(
                    format!("run.policies.{}.timeout_ms", name),
                    format!(
                        "{}ms does not cover the adapter's worst case of {}ms",
                        policy.timeout_ms,
                        budget.as_millis()
                    ),
                ));
            }
        }
    }

    fn validate_bridge(config: &Config, result: &mut ValidationResult) {
        if let Err(e) = Regex::new(&config.bridge.url_pattern) {
            result.add_error(ValidationError::new(
                "bridge.url_pattern",
                format!("Invalid regular expression: {}", e),
            ));
        }
        if config.bridge.channel_capacity == 0 {
            result.add_error(ValidationError::new(
                "bridge.channel_capacity",
                "channel_capacity must be greater than 0",
            ));
        }
    }

    fn validate_logging(config: &Config, result: &mut ValidationResult) {
        let level = config.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) && !level.contains('=') {
            result.add_warning(ValidationWarning::new(
                "logging.level",
                format!("Unknown log level '{}', valid values: {:?}", config.logging.level, LOG_LEVELS),
            ));
        }
        if config.logging.max_log_files == 0 {
            result.add_error(ValidationError::new(
                "logging.max_log_files",
                "max_log_files must be greater than 0",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;

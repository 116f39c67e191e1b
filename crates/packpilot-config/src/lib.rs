//! # packpilot config
//!
//! TOML configuration for the packpilot binary: browser endpoint, run loop
//! timings, classifier thresholds, page adapter settings and logging.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};

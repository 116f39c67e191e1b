//! Reads `packpilot.toml`, substituting `${VAR}` references from the environment.

use std::path::Path;

use regex::{Captures, Regex};

use crate::error::ConfigError;
use crate::schema::Config;

const ENV_REFERENCE: &str = r"\$\{([^}]+)\}";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Parse the file at `path`. A missing file is [`ConfigError::NotFound`].
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::NotFound(path.display().to_string()),
            _ => ConfigError::Io(e),
        })?;
        Self::load_str(&text)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::NotFound(missing)) => {
                tracing::debug!("No config at {}, using defaults", missing);
                Ok(Config::default())
            }
            loaded => loaded,
        }
    }

    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        Ok(toml::from_str(&Self::expand_env_vars(content)?)?)
    }

    /// Replace every `${VAR}`. The first unset variable is an error.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let pattern = Regex::new(ENV_REFERENCE).map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        let mut missing = None;
        let expanded = pattern.replace_all(content, |caps: &Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| {
                missing.get_or_insert_with(|| caps[1].to_string());
                String::new()
            })
        });
        match missing {
            Some(name) => Err(ConfigError::EnvVarNotSet(name)),
            None => Ok(expanded.into_owned()),
        }
    }
}

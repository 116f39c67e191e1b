use thiserror::Error;

/// Errors from reading or validating `packpilot.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// The file could not be preprocessed before parsing.
    #[error("Malformed config: {0}")]
    InvalidFormat(String),

    /// First error reported by the validator.
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// A `${VAR}` reference names an unset variable.
    #[error("Config references unset environment variable {0}")]
    EnvVarNotSet(String),

    #[error("Reading config failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

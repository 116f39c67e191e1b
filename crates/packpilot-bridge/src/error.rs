//! Bridge error types.

use thiserror::Error;

/// Errors raised while setting up the bridge.
///
/// Delivery itself never fails; bad captures are dropped.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The configured URL pattern is not a valid regular expression.
    #[error("Invalid URL pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Channel capacity must be non-zero.
    #[error("Invalid channel capacity: {0}")]
    InvalidCapacity(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_pattern_display() {
        let err = BridgeError::InvalidPattern {
            pattern: "(".to_string(),
            message: "unclosed group".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("'('"));
        assert!(display.contains("unclosed group"));
    }

    #[test]
    fn test_invalid_capacity_display() {
        assert!(BridgeError::InvalidCapacity(0).to_string().contains('0'));
    }
}

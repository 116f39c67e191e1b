//! Request filter for purchased-items traffic.

use regex::Regex;

use crate::error::BridgeError;

/// Path of the purchased-items endpoint on both API hosts.
pub const DEFAULT_URL_PATTERN: &str = r"/(ut|ut2)/game/fc25/purchased/items(\?|$)";

/// Decides whether a captured request belongs to the bridge.
#[derive(Debug, Clone)]
pub struct RequestMatcher {
    url: Regex,
}

impl RequestMatcher {
    /// Build a matcher from a URL regular expression.
    pub fn new(pattern: &str) -> Result<Self, BridgeError> {
        let url = Regex::new(pattern).map_err(|e| BridgeError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { url })
    }

    /// True for GET or POST requests whose URL matches the pattern.
    pub fn matches(&self, method: &str, url: &str) -> bool {
        let method_ok =
            method.eq_ignore_ascii_case("GET") || method.eq_ignore_ascii_case("POST");
        method_ok && self.url.is_match(url)
    }

    pub fn pattern(&self) -> &str {
        self.url.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_both_hosts() {
        let m = RequestMatcher::new(DEFAULT_URL_PATTERN).unwrap();
        assert!(m.matches("GET", "https://utas.mob.v4.prd.futc-ext.gcp.ea.com/ut/game/fc25/purchased/items"));
        assert!(m.matches("POST", "https://example.com/ut2/game/fc25/purchased/items?x=1"));
        assert!(m.matches("get", "/ut/game/fc25/purchased/items"));
    }

    #[test]
    fn test_rejects_other_methods() {
        let m = RequestMatcher::new(DEFAULT_URL_PATTERN).unwrap();
        assert!(!m.matches("PUT", "/ut/game/fc25/purchased/items"));
        assert!(!m.matches("DELETE", "/ut/game/fc25/purchased/items"));
        assert!(!m.matches("OPTIONS", "/ut/game/fc25/purchased/items"));
    }

    #[test]
    fn test_rejects_other_paths() {
        let m = RequestMatcher::new(DEFAULT_URL_PATTERN).unwrap();
        assert!(!m.matches("GET", "/ut/game/fc25/purchased/itemsX"));
        assert!(!m.matches("GET", "/ut/game/fc25/purchased/items/123"));
        assert!(!m.matches("GET", "/ut/game/fc24/purchased/items"));
        assert!(!m.matches("GET", "/ut3/game/fc25/purchased/items"));
        assert!(!m.matches("GET", "/ut/game/fc25/club"));
    }

    #[test]
    fn test_custom_pattern() {
        let m = RequestMatcher::new(r"/purchased/items$").unwrap();
        assert!(m.matches("GET", "/ut/game/fc26/purchased/items"));
        assert_eq!(m.pattern(), r"/purchased/items$");
    }

    #[test]
    fn test_invalid_pattern() {
        let err = RequestMatcher::new("(unclosed").unwrap_err();
        assert!(matches!(err, BridgeError::InvalidPattern { .. }));
    }
}

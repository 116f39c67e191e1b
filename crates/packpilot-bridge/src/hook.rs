//! In-page network hook.

/// Name of the runtime binding the hook script reports through.
pub const CAPTURE_BINDING: &str = "__packpilotCapture";

const URL_PATTERN_SLOT: &str = "__PACKPILOT_URL_PATTERN__";

/// Script that patches `fetch` and `XMLHttpRequest` in the current frame.
///
/// Only responses whose URL matches `url_pattern` are reported; a pattern the
/// page cannot compile reports every response and leaves filtering to the
/// bridge. Evaluates to `true` when it installed the hook and `false` when the
/// frame was already hooked. The page always receives the original response.
pub(crate) fn render(url_pattern: &str) -> String {
    let literal = serde_json::Value::String(url_pattern.to_string()).to_string();
    include_str!("hook_script.js").replace(URL_PATTERN_SLOT, &literal)
}

//! Page scripts evaluated by the workflows.
//!
//! Every script starts with a `/* packpilot:<name> */` marker, then the
//! shared helpers, then an expression whose value is returned by value.

use serde_json::json;

const HELPERS: &str = include_str!("page_helpers.js");

pub(crate) const OPEN_SELECTORS: &[&str] = &["button.currency.call-to-action", "button.call-to-action", "button"];
pub(crate) const OPEN_NEEDLES: &[&str] = &["open"];

pub(crate) const SEND_ALL_SELECTORS: &[&str] = &[
    "button.autosbc-header-button",
    "button.btn-standard.call-to-action",
    "button.section-header-btn",
    "button",
];
pub(crate) const SEND_ALL_NEEDLES: &[&str] = &["send all to club"];

const ELLIPSIS_SELECTOR: &str = "button.ut-image-button-control.ellipsis-btn";
const MENU_SELECTOR: &str =
    ".ut-bottom-sheet-view, .ut-context-menu, .context-menu, .ui-layout-menu, [role=\"menu\"], .dialog, .modal";

/// Quick-sell confirmation labels, matched exactly.
const CONFIRM_LABELS: &[&str] = &["ok", "okay", "yes", "confirm", "accept", "discard", "sell", "continue"];
/// Labels of a generic confirm dialog left open between iterations.
const GENERIC_CONFIRM_LABELS: &[&str] = &["ok", "confirm", "continue", "proceed"];
/// Labels that decline the follow-up suggestion after a recycle.
const FOLLOW_UP_CANCEL_LABELS: &[&str] = &["cancel", "no thanks", "not now"];

const UNASSIGNED_TITLES: &[&str] = &["unassigned items remain", "unassigned pile"];
const TAKE_ME_THERE: &[&str] = &["take me there"];

const SUBMIT_LABELS: &[&str] = &["submit"];

const UNASSIGNED_VIEW_SELECTOR: &str = "section.ut-unassigned-view, .ut-unassigned-view";

fn wrap(name: &str, body: &str) -> String {
    format!(
        "/* packpilot:{name} */\n{HELPERS}\n(() => {{\n  const P = window.__packpilotPage;\n{body}\n}})()"
    )
}

fn list(values: &[&str]) -> String {
    json!(values).to_string()
}

pub(crate) fn ping() -> String {
    "/* packpilot:ping */\n'PONG'".to_string()
}

/// Press the first visible, enabled control matching `needles`.
pub(crate) fn click_control(name: &str, selectors: &[&str], needles: &[&str], exact: bool) -> String {
    wrap(
        name,
        &format!(
            "  const el = P.find({}, {}, {});\n  return el ? P.press(el) : false;",
            list(selectors),
            list(needles),
            exact
        ),
    )
}

/// `{openVisible, sendAllVisible, recycleVisible}` for this frame.
pub(crate) fn control_probe(recycle_selector: &str) -> String {
    wrap(
        "control_probe",
        &format!(
            "  const recycle = document.querySelector({});\n  return {{\n    openVisible: !!P.find({}, {}, true),\n    sendAllVisible: !!P.find({}, {}, false),\n    recycleVisible: !!(recycle && P.isVisible(recycle) && P.isEnabled(recycle)),\n  }};",
            json!(recycle_selector),
            list(OPEN_SELECTORS),
            list(OPEN_NEEDLES),
            list(SEND_ALL_SELECTORS),
            list(SEND_ALL_NEEDLES)
        ),
    )
}

fn click_in_dialog(name: &str, needles: &[&str], exact: bool) -> String {
    wrap(name, &format!("  return P.clickInDialogs({}, {});", list(needles), exact))
}

pub(crate) fn click_confirm() -> String {
    click_in_dialog("click_confirm", CONFIRM_LABELS, true)
}

pub(crate) fn click_generic_confirm() -> String {
    click_in_dialog("click_generic_confirm", GENERIC_CONFIRM_LABELS, true)
}

pub(crate) fn click_follow_up_cancel() -> String {
    click_in_dialog("click_follow_up_cancel", FOLLOW_UP_CANCEL_LABELS, false)
}

fn unassigned_dialog_lookup() -> String {
    format!(
        "  const titles = {};\n  const dialog = P.dialogs().find((d) => titles.some((t) => P.labelOf(d).includes(t)));",
        list(UNASSIGNED_TITLES)
    )
}

pub(crate) fn unassigned_present() -> String {
    wrap("unassigned_present", &format!("{}\n  return !!dialog;", unassigned_dialog_lookup()))
}

pub(crate) fn unassigned_gone() -> String {
    wrap("unassigned_gone", &format!("{}\n  return !dialog;", unassigned_dialog_lookup()))
}

pub(crate) fn unassigned_take_me_there() -> String {
    wrap(
        "unassigned_take_me_there",
        &format!(
            "{}\n  if (!dialog) return false;\n  const el = P.find([P.CLICKABLE_SELECTOR], {}, false, dialog);\n  return el ? P.press(el) : false;",
            unassigned_dialog_lookup(),
            list(TAKE_ME_THERE)
        ),
    )
}

/// Scroll the page and the unassigned view back to the top so its header
/// buttons are rendered. Returns how many containers were reset.
pub(crate) fn scroll_unassigned_top() -> String {
    wrap(
        "scroll_unassigned_top",
        &format!(
            "  window.scrollTo(0, 0);\n  if (document.scrollingElement) document.scrollingElement.scrollTop = 0;\n  let reset = 0;\n  for (const root of document.querySelectorAll({})) {{\n    for (const el of [root, ...root.querySelectorAll('*')]) {{\n      if (el.scrollTop > 0 && el.scrollHeight > el.clientHeight + 4) {{ el.scrollTop = 0; reset += 1; }}\n    }}\n  }}\n  return reset;",
            json!(UNASSIGNED_VIEW_SELECTOR)
        ),
    )
}

pub(crate) fn no_dialogs() -> String {
    wrap("no_dialogs", "  return P.dialogs().length === 0;")
}

pub(crate) fn click_ellipsis() -> String {
    click_control("click_ellipsis", &[ELLIPSIS_SELECTOR], &[], false)
}

/// Press the quick-sell option.
///
/// `strict` requires an untradeable qualifier next to "quick sell";
/// `global` searches the whole document instead of open menus.
pub(crate) fn quick_sell_option(strict: bool, global: bool) -> String {
    let name = match (strict, global) {
        (true, false) => "quick_sell_strict_scoped",
        (false, false) => "quick_sell_loose_scoped",
        (true, true) => "quick_sell_strict_global",
        (false, true) => "quick_sell_loose_global",
    };
    wrap(
        name,
        &format!(
            "  const strict = {strict};\n  const global = {global};\n  const wanted = (label) => label.includes('quick sell') && (!strict || /untrad(e)?ables?/.test(label));\n  const roots = global ? [document] : Array.from(document.querySelectorAll({menu})).filter(P.isVisible);\n  for (const root of roots) {{\n    for (const el of root.querySelectorAll(P.CLICKABLE_SELECTOR + ', li')) {{\n      if (P.isVisible(el) && P.isEnabled(el) && wanted(P.labelOf(el))) return P.press(el);\n    }}\n  }}\n  return false;",
            menu = json!(MENU_SELECTOR)
        ),
    )
}

/// All quick-sell option attempts, narrowest first.
pub(crate) fn quick_sell_attempts() -> [String; 4] {
    [
        quick_sell_option(true, false),
        quick_sell_option(false, false),
        quick_sell_option(true, true),
        quick_sell_option(false, true),
    ]
}

/// Enter/Space on the confirmation control of a dialog that stayed open.
pub(crate) fn keyboard_confirm() -> String {
    wrap(
        "keyboard_confirm",
        &format!(
            "  for (const dialog of P.dialogs()) {{\n    const el = P.find([P.CLICKABLE_SELECTOR], {}, true, dialog);\n    if (el) return P.keyboard(el);\n  }}\n  return false;",
            list(CONFIRM_LABELS)
        ),
    )
}

pub(crate) fn press_selector(name: &str, selector: &str) -> String {
    wrap(
        name,
        &format!(
            "  const el = document.querySelector({});\n  return el && P.isVisible(el) && P.isEnabled(el) ? P.press(el) : false;",
            json!(selector)
        ),
    )
}

pub(crate) fn visible(name: &str, selector: &str) -> String {
    wrap(
        name,
        &format!(
            "  return Array.from(document.querySelectorAll({})).some(P.isVisible);",
            json!(selector)
        ),
    )
}

pub(crate) fn hidden(name: &str, selector: &str) -> String {
    wrap(
        name,
        &format!(
            "  return !Array.from(document.querySelectorAll({})).some(P.isVisible);",
            json!(selector)
        ),
    )
}

fn option_search(root: &str) -> String {
    format!(
        "  for (const label of labels) {{\n    const el = P.find([P.CLICKABLE_SELECTOR, '[role=\"option\"]', 'li'], [label], false, {root});\n    if (el && P.press(el)) return label;\n  }}"
    )
}

/// Press the first option matching `labels` (in order) inside the recycle
/// container. Returns the label or null.
pub(crate) fn select_recycle_option(container: &str, labels: &[String]) -> String {
    wrap(
        "select_recycle_option",
        &format!(
            "const labels = {};\n  const root = Array.from(document.querySelectorAll({})).find(P.isVisible);\n  if (!root) return null;\n{}\n  return null;",
            json!(labels),
            json!(container),
            option_search("root")
        ),
    )
}

/// Press submit inside the recycle container: pointer sequence, then
/// keyboard, then form submission.
pub(crate) fn press_submit(container: &str) -> String {
    wrap(
        "press_submit",
        &format!(
            "  const root = Array.from(document.querySelectorAll({})).find(P.isVisible);\n  if (!root) return false;\n  const el = P.find([P.CLICKABLE_SELECTOR, 'input[type=\"submit\"]'], {}, false, root);\n  if (!el) return false;\n  P.press(el);\n  if (el.isConnected && P.isVisible(el)) P.keyboard(el);\n  const form = el.closest('form');\n  if (el.isConnected && form && typeof form.requestSubmit === 'function') {{\n    try {{ form.requestSubmit(); }} catch {{}}\n  }}\n  return true;",
            json!(container),
            list(SUBMIT_LABELS)
        ),
    )
}

/// Page-wide option search and submit, used when the container never
/// rendered. Returns the pressed label or null.
pub(crate) fn recycle_fallback(labels: &[String]) -> String {
    wrap(
        "recycle_fallback",
        &format!(
            "const labels = {};\n  const pick = (() => {{\n{}\n    return null;\n  }})();\n  if (!pick) return null;\n  const submit = P.find([P.CLICKABLE_SELECTOR], {}, false);\n  if (submit) P.press(submit);\n  return pick;",
            json!(labels),
            option_search("document"),
            list(SUBMIT_LABELS)
        ),
    )
}

/// Name from a script's marker comment.
#[cfg(test)]
pub(crate) fn script_name(script: &str) -> Option<&str> {
    script
        .strip_prefix("/* packpilot:")
        .and_then(|rest| rest.split_once(" */"))
        .map(|(name, _)| name)
}

/// Labels embedded in a recycle script.
#[cfg(test)]
pub(crate) fn embedded_labels(script: &str) -> Vec<String> {
    script
        .lines()
        .find_map(|line| line.trim().strip_prefix("const labels = "))
        .and_then(|rest| serde_json::from_str(rest.trim_end_matches(';')).ok())
        .unwrap_or_default()
}

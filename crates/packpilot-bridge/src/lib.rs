//! # packpilot bridge
//!
//! Page event bridge. A small script patched into every frame of the page
//! forwards purchased-items responses to the native side as [`RawCapture`]s;
//! [`EventBridge::ingest`] filters and decodes them, records them in the
//! shared [`PurchaseStore`](packpilot_core::PurchaseStore) and republishes
//! them on a single broadcast channel.
//!
//! Captures from nested frames and from the top frame take the same path, so
//! each network match reaches a [`PurchaseWaiter`] exactly once.

mod bridge;
mod error;
mod hook;
mod matcher;

pub use bridge::{BridgeConfig, EventBridge, PurchaseWaiter, RawCapture};
pub use error::BridgeError;
pub use hook::CAPTURE_BINDING;
pub use matcher::{RequestMatcher, DEFAULT_URL_PATTERN};

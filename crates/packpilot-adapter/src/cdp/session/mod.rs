//! Page session: command scope, frame tracking and script evaluation.

mod core;
mod frames;
mod js;

pub use self::core::PageSession;

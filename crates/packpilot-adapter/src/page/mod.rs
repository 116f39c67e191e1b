//! Page-script implementation of [`ActionAdapter`](crate::ActionAdapter).
//!
//! Each workflow is a sequence of small scripts evaluated in every tracked
//! frame of the game tab. A frame's boolean result is aggregated by OR, so a
//! control living in an iframe is found the same way as one in the top
//! document.

mod adapter;
mod config;
mod executor;
mod scripts;
mod workflows;

pub use adapter::PageActionAdapter;
pub use config::PageAdapterConfig;
pub use executor::{FrameContext, PageExecutor};

#[cfg(test)]
#[path = "adapter_tests.rs"]
mod tests;

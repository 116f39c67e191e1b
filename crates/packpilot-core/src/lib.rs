//! # packpilot core
//!
//! Data model, item classifier and the shared purchase store.
//!
//! Everything in this crate is synchronous and free of I/O. The classifier
//! functions are total: malformed payloads degrade to empty summaries rather
//! than errors, so callers never need a recovery path for bad input.
//!
//! ## Key Components
//!
//! - [`PurchaseResponse`]: a captured purchased-items payload
//! - [`ItemStats`], [`RatingHistogram`]: summaries derived from a payload
//! - [`DisposalMode`]: which disposal workflow a histogram calls for
//! - [`PurchaseStore`]: single-slot store for the latest payload and histogram

pub mod classifier;
pub mod model;
pub mod store;

pub use classifier::{
    compute_histogram, compute_stats, decide_mode, diff, has_x10_criteria, ClassifierThresholds,
};
pub use model::{
    CaptureSource, DisposalMode, HistogramDiff, ItemStats, PurchaseResponse, RatingHistogram,
    RecycleMode,
};
pub use store::PurchaseStore;

//! Purchase payload and the summaries derived from it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Web request mechanism that produced a captured response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureSource {
    Fetch,
    Xhr,
}

impl std::fmt::Display for CaptureSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureSource::Fetch => write!(f, "fetch"),
            CaptureSource::Xhr => write!(f, "xhr"),
        }
    }
}

/// A decoded purchased-items response.
///
/// `data` is kept opaque; only `items[].rating` and `duplicateItemIdList`
/// are ever read from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseResponse {
    #[serde(default = "default_ok")]
    pub ok: bool,
    pub source: CaptureSource,
    pub url: String,
    pub data: Value,
}

fn default_ok() -> bool {
    true
}

impl PurchaseResponse {
    pub fn new(source: CaptureSource, url: impl Into<String>, data: Value) -> Self {
        Self {
            ok: true,
            source,
            url: url.into(),
            data,
        }
    }
}

/// Item counts for one payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStats {
    /// False when the payload was absent or had no item list.
    pub available: bool,
    pub total_items: usize,
    pub duplicate_count: usize,
    pub all_duplicates: bool,
}

/// Integer rating to item count.
pub type RatingHistogram = BTreeMap<i64, u32>;

/// Rating to signed change in count between two histograms.
pub type HistogramDiff = BTreeMap<i64, i64>;

/// Recycle variant a histogram calls for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisposalMode {
    /// Nothing worth recycling; quick sell only.
    #[default]
    None,
    /// At least one item rated 90 or above.
    #[serde(rename = "OVR89")]
    Ovr89,
    /// Enough mid-tier (84-86) items for the x10 upgrade.
    #[serde(rename = "X10_84")]
    X10Of84,
}

impl DisposalMode {
    /// The recycle workflow for this mode, if any.
    pub fn recycle_mode(self) -> Option<RecycleMode> {
        match self {
            DisposalMode::None => None,
            DisposalMode::Ovr89 => Some(RecycleMode::Ovr89),
            DisposalMode::X10Of84 => Some(RecycleMode::X10Of84),
        }
    }
}

impl std::fmt::Display for DisposalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisposalMode::None => write!(f, "none"),
            DisposalMode::Ovr89 => write!(f, "OVR89"),
            DisposalMode::X10Of84 => write!(f, "X10_84"),
        }
    }
}

/// Argument of the recycle workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecycleMode {
    #[serde(rename = "OVR89")]
    Ovr89,
    #[serde(rename = "X10_84")]
    X10Of84,
}

impl std::fmt::Display for RecycleMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecycleMode::Ovr89 => write!(f, "OVR89"),
            RecycleMode::X10Of84 => write!(f, "X10_84"),
        }
    }
}

//! Item classifier.
//!
//! Pure functions over a purchased-items payload. None of them fail: a
//! payload without an item list is reported as unavailable, and items with
//! a non-numeric rating are left out of the histogram.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{DisposalMode, HistogramDiff, ItemStats, RatingHistogram};

/// Keys under which the site has returned the item list, in priority order.
const ITEM_KEYS: [&str; 3] = ["items", "itemData", "itemList"];

/// Rating thresholds behind [`decide_mode`] and [`has_x10_criteria`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierThresholds {
    /// Any item at or above this rating selects OVR89.
    #[serde(default = "default_ovr_min_rating")]
    pub ovr_min_rating: i64,

    /// Rating counted for the x10 minimum.
    #[serde(default = "default_x10_rating")]
    pub x10_rating: i64,

    /// How many `x10_rating` items satisfy the x10 criterion.
    #[serde(default = "default_x10_min_count")]
    pub x10_min_count: u32,

    /// A single item at any of these ratings satisfies the x10 criterion.
    #[serde(default = "default_x10_any_ratings")]
    pub x10_any_ratings: Vec<i64>,
}

fn default_ovr_min_rating() -> i64 {
    90
}

fn default_x10_rating() -> i64 {
    84
}

fn default_x10_min_count() -> u32 {
    4
}

fn default_x10_any_ratings() -> Vec<i64> {
    vec![85, 86]
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            ovr_min_rating: default_ovr_min_rating(),
            x10_rating: default_x10_rating(),
            x10_min_count: default_x10_min_count(),
            x10_any_ratings: default_x10_any_ratings(),
        }
    }
}

fn item_list(data: &Value) -> Option<&Vec<Value>> {
    let obj = data.as_object()?;
    ITEM_KEYS
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_array))
}

fn rating_of(item: &Value) -> Option<i64> {
    let raw = item.get("rating")?;
    let rating = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    rating.is_finite().then(|| rating.trunc() as i64)
}

/// Count items and duplicates in a payload.
pub fn compute_stats(data: Option<&Value>) -> ItemStats {
    let Some(data) = data else {
        return ItemStats::default();
    };
    let Some(items) = item_list(data) else {
        return ItemStats::default();
    };

    let total_items = items.len();
    let duplicate_count = data
        .get("duplicateItemIdList")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);

    ItemStats {
        available: true,
        total_items,
        duplicate_count,
        all_duplicates: total_items > 0 && duplicate_count == total_items,
    }
}

/// Count items per integer rating.
pub fn compute_histogram(data: Option<&Value>) -> RatingHistogram {
    let mut histogram = RatingHistogram::new();
    if let Some(items) = data.and_then(item_list) {
        for rating in items.iter().filter_map(rating_of) {
            *histogram.entry(rating).or_insert(0) += 1;
        }
    }
    histogram
}

/// The mid-tier predicate: enough items at the x10 rating, or any item at
/// one of the `x10_any_ratings`.
pub fn has_x10_criteria(histogram: &RatingHistogram, thresholds: &ClassifierThresholds) -> bool {
    let at_rating = histogram.get(&thresholds.x10_rating).copied().unwrap_or(0);
    at_rating >= thresholds.x10_min_count
        || thresholds
            .x10_any_ratings
            .iter()
            .any(|r| histogram.get(r).is_some_and(|count| *count > 0))
}

/// Pick the disposal mode for a histogram. OVR89 takes precedence over X10_84.
pub fn decide_mode(histogram: &RatingHistogram, thresholds: &ClassifierThresholds) -> DisposalMode {
    let has_high = histogram
        .range(thresholds.ovr_min_rating..)
        .any(|(_, count)| *count > 0);
    if has_high {
        DisposalMode::Ovr89
    } else if has_x10_criteria(histogram, thresholds) {
        DisposalMode::X10Of84
    } else {
        DisposalMode::None
    }
}

/// Per-rating change from `prev` to `curr`, keeping only non-zero deltas.
pub fn diff(prev: &RatingHistogram, curr: &RatingHistogram) -> HistogramDiff {
    prev.keys()
        .chain(curr.keys())
        .filter_map(|rating| {
            let before = i64::from(prev.get(rating).copied().unwrap_or(0));
            let after = i64::from(curr.get(rating).copied().unwrap_or(0));
            (after != before).then_some((*rating, after - before))
        })
        .collect()
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;

//! Single-slot store for the latest purchased-items payload.

use parking_lot::RwLock;
use serde_json::Value;

use crate::classifier::{compute_histogram, compute_stats, diff};
use crate::model::{HistogramDiff, ItemStats, PurchaseResponse, RatingHistogram};

#[derive(Debug, Default)]
struct StoreState {
    last: Option<PurchaseResponse>,
    histogram: Option<RatingHistogram>,
}

/// Holds the most recent [`PurchaseResponse`] and the histogram built from it.
///
/// Written only by the event bridge; read by the run loop. Each `record`
/// overwrites the previous payload. Readers must tolerate a payload that is
/// one or more iterations old.
#[derive(Debug, Default)]
pub struct PurchaseStore {
    state: RwLock<StoreState>,
}

impl PurchaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored payload and rebuild the histogram.
    ///
    /// Returns the change against the previous histogram.
    pub fn record(&self, response: PurchaseResponse) -> HistogramDiff {
        let histogram = compute_histogram(Some(&response.data));
        let mut state = self.state.write();
        let changes = match &state.histogram {
            Some(prev) => diff(prev, &histogram),
            None => diff(&RatingHistogram::new(), &histogram),
        };
        state.last = Some(response);
        state.histogram = Some(histogram);
        changes
    }

    pub fn latest(&self) -> Option<PurchaseResponse> {
        self.state.read().last.clone()
    }

    /// The `data` object of the latest payload.
    pub fn latest_data(&self) -> Option<Value> {
        self.state.read().last.as_ref().map(|r| r.data.clone())
    }

    /// Stats for the latest payload; unavailable if nothing was recorded.
    pub fn stats(&self) -> ItemStats {
        let state = self.state.read();
        compute_stats(state.last.as_ref().map(|r| &r.data))
    }

    /// The latest histogram, empty if nothing was recorded.
    pub fn histogram(&self) -> RatingHistogram {
        self.state.read().histogram.clone().unwrap_or_default()
    }

    /// Forget everything recorded so far.
    pub fn reset(&self) {
        *self.state.write() = StoreState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CaptureSource;
    use serde_json::json;

    fn response(data: Value) -> PurchaseResponse {
        PurchaseResponse::new(CaptureSource::Fetch, "/ut/game/fc25/purchased/items", data)
    }

    #[test]
    fn test_empty_store() {
        let store = PurchaseStore::new();
        assert!(store.latest().is_none());
        assert!(store.histogram().is_empty());
        assert!(!store.stats().available);
    }

    #[test]
    fn test_record_overwrites() {
        let store = PurchaseStore::new();
        store.record(response(json!({"items": [{"rating": 84}]})));
        store.record(response(json!({"items": [{"rating": 90}, {"rating": 91}]})));

        let latest = store.latest_data().unwrap();
        assert_eq!(latest["items"].as_array().unwrap().len(), 2);
        assert!(!store.histogram().contains_key(&84));
        assert_eq!(store.stats().total_items, 2);
    }

    #[test]
    fn test_record_returns_diff() {
        let store = PurchaseStore::new();
        let first = store.record(response(json!({"items": [{"rating": 84}, {"rating": 84}]})));
        assert_eq!(first.get(&84), Some(&2));

        let second = store.record(response(json!({"items": [{"rating": 84}, {"rating": 86}]})));
        assert_eq!(second.get(&84), Some(&-1));
        assert_eq!(second.get(&86), Some(&1));
    }

    #[test]
    fn test_reset() {
        let store = PurchaseStore::new();
        store.record(response(json!({"items": [{"rating": 84}]})));
        store.reset();
        assert!(store.latest().is_none());
        assert!(store.histogram().is_empty());
    }
}

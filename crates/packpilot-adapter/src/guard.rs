//! Re-entrancy guard for workflows that must not overlap.

use std::sync::atomic::{AtomicBool, Ordering};

/// Tracks whether a workflow is in flight.
#[derive(Debug, Default)]
pub struct InFlight {
    busy: AtomicBool,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot. Returns `None` if another caller holds it.
    pub fn try_enter(&self) -> Option<InFlightGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard { owner: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases the [`InFlight`] slot when dropped, including on cancellation.
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    owner: &'a InFlight,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.owner.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_enter_is_refused() {
        let flight = InFlight::new();
        let guard = flight.try_enter();
        assert!(guard.is_some());
        assert!(flight.is_busy());
        assert!(flight.try_enter().is_none());

        drop(guard);
        assert!(!flight.is_busy());
        assert!(flight.try_enter().is_some());
    }
}

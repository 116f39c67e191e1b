//! Round-robin choice between recycle option labels.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Cycles through candidate labels so consecutive recycles alternate between
/// equivalent options.
#[derive(Debug)]
pub struct RecycleToggle {
    candidates: Vec<String>,
    next: AtomicUsize,
}

impl RecycleToggle {
    pub fn new(candidates: Vec<String>) -> Self {
        Self {
            candidates,
            next: AtomicUsize::new(0),
        }
    }

    /// Candidates in preference order for the next attempt, advancing the
    /// toggle.
    pub fn next_order(&self) -> Vec<String> {
        let len = self.candidates.len();
        if len == 0 {
            return Vec::new();
        }
        let start = self.next.fetch_add(1, Ordering::AcqRel) % len;
        self.rotated(start)
    }

    /// Candidates in preference order without advancing.
    #[cfg(test)]
    fn peek_order(&self) -> Vec<String> {
        let len = self.candidates.len();
        if len == 0 {
            return Vec::new();
        }
        self.rotated(self.next.load(Ordering::Acquire) % len)
    }

    fn rotated(&self, start: usize) -> Vec<String> {
        let mut order = self.candidates.clone();
        order.rotate_left(start);
        order
    }
}

//! Running upload budget.

use barter_exchange_primitives::Bandwidth;

/// Tracks bandwidth granted so far against the cap.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Budget {
    cap: Bandwidth,
    used: Bandwidth,
}

impl Budget {
    pub(crate) fn new(cap: Bandwidth) -> Self {
        Self { cap, used: 0.0 }
    }

    /// Reserve `amount` if it fits under the cap.
    pub(crate) fn try_grant(&mut self, amount: Bandwidth) -> bool {
        if self.used + amount <= self.cap {
            self.used += amount;
            true
        } else {
            false
        }
    }

    pub(crate) fn is_exhausted(&self) -> bool {
        self.used >= self.cap
    }
}

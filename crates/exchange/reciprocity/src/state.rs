//! Reciprocity state of a single neighbor.

use barter_exchange_primitives::{Bandwidth, Round};
use serde::{Deserialize, Serialize};

/// Smallest tau an entry may hold.
pub(crate) const MIN_TAU: Bandwidth = 1e-9;

/// Largest tau an entry may hold. Keeps tau finite so decay can recover it.
pub(crate) const MAX_TAU: Bandwidth = f64::MAX;

/// Trust estimate for one neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReciprocityState {
    /// Most recent observed (or seeded) inbound rate from the neighbor.
    pub flow: Bandwidth,
    /// Bandwidth this peer commits to the neighbor if chosen. Always > 0.
    pub tau: Bandwidth,
    /// Consecutive rounds the neighbor has reciprocated.
    pub streak: u32,
    /// Last round the neighbor was seen in views, requests or the ledger.
    pub last_seen: Round,
}

impl ReciprocityState {
    pub fn new(flow: Bandwidth, tau: Bandwidth, round: Round) -> Self {
        Self {
            flow,
            tau: tau.max(MIN_TAU),
            streak: 0,
            last_seen: round,
        }
    }

    /// Observed flow per unit of committed bandwidth.
    pub fn ratio(&self) -> f64 {
        self.flow / self.tau
    }

    /// The neighbor delivered `blocks` last round.
    pub(crate) fn reciprocated(&mut self, blocks: u64, gamma: f64, patience: u32) {
        self.flow = blocks as Bandwidth;
        self.streak = self.streak.saturating_add(1);
        if self.streak > patience {
            self.tau = (self.tau * (1.0 - gamma)).max(MIN_TAU);
        }
    }

    /// We uploaded to the neighbor and got nothing back.
    pub(crate) fn defected(&mut self, alpha: f64) {
        self.tau = (self.tau * (1.0 + alpha)).min(MAX_TAU);
        self.streak = 0;
    }
}

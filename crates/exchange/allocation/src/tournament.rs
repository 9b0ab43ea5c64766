//! Tournament (auction) allocation.

use std::collections::HashSet;

use barter_exchange_primitives::{PeerId, Upload};
use barter_reciprocity::TauSeed;
use rand::{Rng, RngCore};
use tracing::trace;

use crate::budget::Budget;
use crate::{AllocationContext, AllocationPolicy, DEFAULT_SUBSTITUTION_RATE};

/// Admit requesters ranked by `flow / tau` ascending, granting each its
/// `tau` while the cap allows.
///
/// Before each pick, with probability `substitution_rate * admitted` the
/// requester holding the most pieces the local peer still needs is
/// considered instead of the next one by efficiency. Tau is seeded at one
/// unit so early rounds stay cheap.
#[derive(Debug, Clone, Copy)]
pub struct Tournament {
    substitution_rate: f64,
}

impl Tournament {
    pub fn new(substitution_rate: f64) -> Self {
        Self { substitution_rate }
    }

    pub fn substitution_rate(&self) -> f64 {
        self.substitution_rate
    }
}

impl Default for Tournament {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSTITUTION_RATE)
    }
}

fn next_unconsidered<'a>(
    ranking: &mut impl Iterator<Item = &'a PeerId>,
    considered: &HashSet<&PeerId>,
) -> Option<&'a PeerId> {
    ranking.find(|peer| !considered.contains(peer))
}

impl AllocationPolicy for Tournament {
    fn name(&self) -> &'static str {
        "tournament"
    }

    fn tau_seed(&self) -> TauSeed {
        TauSeed::Unit
    }

    fn allocate(&self, ctx: &AllocationContext<'_>, rng: &mut dyn RngCore) -> Vec<Upload> {
        let mut by_efficiency: Vec<&PeerId> = ctx.requesters.iter().collect();
        by_efficiency.sort_by(|a, b| ctx.state(a).ratio().total_cmp(&ctx.state(b).ratio()));

        let mut by_need: Vec<(&PeerId, usize)> = ctx
            .requesters
            .iter()
            .map(|peer| (peer, ctx.need_overlap(peer)))
            .collect();
        by_need.sort_by(|(_, a), (_, b)| b.cmp(a));

        let mut efficiency = by_efficiency.into_iter();
        let mut need = by_need.into_iter().map(|(peer, _)| peer);
        let mut considered = HashSet::new();
        let mut budget = Budget::new(ctx.upload_cap);
        let mut uploads = Vec::new();

        while !budget.is_exhausted() {
            let odds = (self.substitution_rate * uploads.len() as f64).clamp(0.0, 1.0);
            let substituted = if rng.random_bool(odds) {
                next_unconsidered(&mut need, &considered)
            } else {
                None
            };
            let Some(candidate) = substituted
                .or_else(|| next_unconsidered(&mut efficiency, &considered))
                .or_else(|| next_unconsidered(&mut need, &considered))
            else {
                break;
            };
            considered.insert(candidate);

            let tau = ctx.state(candidate).tau;
            if budget.try_grant(tau) {
                trace!(peer = %candidate, tau, substituted = substituted.is_some(), "Admitted");
                uploads.push(ctx.upload(candidate, tau));
            }
        }
        uploads
    }
}

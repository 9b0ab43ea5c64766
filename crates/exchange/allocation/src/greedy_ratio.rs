//! Greedy-ratio ("tyrant") allocation.

use barter_exchange_primitives::{PeerId, Upload};
use barter_reciprocity::ReciprocityState;
use rand::RngCore;
use rand::seq::SliceRandom;
use tracing::trace;

use crate::budget::Budget;
use crate::{AllocationContext, AllocationPolicy};

/// Admit requesters best reciprocators first, ranked by `flow / tau`
/// descending, granting each its `tau` while the cap allows.
///
/// Ties are broken uniformly at random.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyRatio;

impl AllocationPolicy for GreedyRatio {
    fn name(&self) -> &'static str {
        "greedy-ratio"
    }

    fn allocate(&self, ctx: &AllocationContext<'_>, rng: &mut dyn RngCore) -> Vec<Upload> {
        let mut ranked: Vec<(&PeerId, ReciprocityState)> = ctx
            .requesters
            .iter()
            .map(|peer| (peer, ctx.state(peer)))
            .collect();
        // Shuffle first: the stable sort keeps the random order among equal ratios.
        ranked.shuffle(rng);
        ranked.sort_by(|(_, a), (_, b)| b.ratio().total_cmp(&a.ratio()));

        let mut budget = Budget::new(ctx.upload_cap);
        let mut uploads = Vec::new();
        for (peer, state) in ranked {
            if budget.is_exhausted() {
                break;
            }
            if budget.try_grant(state.tau) {
                uploads.push(ctx.upload(peer, state.tau));
            } else {
                trace!(%peer, tau = state.tau, "Tau does not fit remaining budget");
            }
        }
        uploads
    }
}

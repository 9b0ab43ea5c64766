//! Proportional-share allocation.

use barter_exchange_primitives::{PeerId, Upload};
use rand::RngCore;
use rand::seq::IndexedRandom;
use tracing::debug;

use crate::{AllocationContext, AllocationPolicy, DEFAULT_EXPLOIT_FRACTION, even_split};

/// Split `exploit_fraction` of the cap among last round's contributors in
/// proportion to the blocks each delivered, and give the rest to one
/// randomly chosen requester that delivered nothing (optimistic unchoke).
#[derive(Debug, Clone, Copy)]
pub struct ProportionalShare {
    exploit_fraction: f64,
}

impl ProportionalShare {
    pub fn new(exploit_fraction: f64) -> Self {
        Self { exploit_fraction }
    }

    pub fn exploit_fraction(&self) -> f64 {
        self.exploit_fraction
    }
}

impl Default for ProportionalShare {
    fn default() -> Self {
        Self::new(DEFAULT_EXPLOIT_FRACTION)
    }
}

impl AllocationPolicy for ProportionalShare {
    fn name(&self) -> &'static str {
        "proportional-share"
    }

    fn allocate(&self, ctx: &AllocationContext<'_>, rng: &mut dyn RngCore) -> Vec<Upload> {
        if ctx.requesters.is_empty() {
            return Vec::new();
        }

        let received = ctx.received_last_round();
        let mut ranked: Vec<(&PeerId, u64)> = ctx
            .requesters
            .iter()
            .filter_map(|peer| {
                received
                    .get(peer)
                    .copied()
                    .filter(|blocks| *blocks > 0)
                    .map(|blocks| (peer, blocks))
            })
            .collect();
        let total: u64 = ranked.iter().map(|(_, blocks)| blocks).sum();
        if total == 0 {
            debug!(peer = %ctx.local, "No contributions last round, splitting evenly");
            return even_split(ctx);
        }
        ranked.sort_by_key(|(_, blocks)| *blocks);

        let exploit = self.exploit_fraction * ctx.upload_cap;
        let mut uploads: Vec<Upload> = ranked
            .iter()
            .map(|(peer, blocks)| ctx.upload(peer, *blocks as f64 / total as f64 * exploit))
            .collect();

        let others: Vec<&PeerId> = ctx
            .requesters
            .iter()
            .filter(|peer| !ranked.iter().any(|(contributor, _)| *contributor == *peer))
            .collect();
        if let Some(optimistic) = others.choose(rng) {
            uploads.push(ctx.upload(optimistic, (1.0 - self.exploit_fraction) * ctx.upload_cap));
        }
        uploads
    }
}

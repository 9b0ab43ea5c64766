//! Per-neighbor request generation.

use barter_exchange_primitives::{
    ExchangeError, NeighborView, PeerId, Pieces, Request, validate_neighbors,
};
use rand::Rng;
use tracing::{debug, trace};

use crate::RarityTiers;

/// Rarest-first request generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceSelector {
    max_requests_per_neighbor: usize,
}

impl PieceSelector {
    pub fn new(max_requests_per_neighbor: usize) -> Self {
        Self {
            max_requests_per_neighbor,
        }
    }

    pub fn max_requests_per_neighbor(&self) -> usize {
        self.max_requests_per_neighbor
    }

    /// Requests for this round, grouped by neighbor in `neighbors` order.
    ///
    /// Within a neighbor's group pieces appear rarest first. Returns an empty
    /// list when nothing is needed or nobody can serve it.
    pub fn select<R: Rng + ?Sized>(
        &self,
        local: &PeerId,
        pieces: &Pieces,
        neighbors: &[NeighborView],
        rng: &mut R,
    ) -> Result<Vec<Request>, ExchangeError> {
        validate_neighbors(local, pieces.num_pieces(), neighbors)?;

        let mut tiers = RarityTiers::build(pieces, neighbors);
        if tiers.is_empty() {
            debug!(peer = %local, "No needed piece is available from any neighbor");
            return Ok(Vec::new());
        }
        tiers.shuffle(rng);

        let mut requests = Vec::new();
        for neighbor in neighbors {
            let before = requests.len();
            for piece in tiers
                .ordered()
                .filter(|piece| neighbor.holds(*piece))
                .take(self.max_requests_per_neighbor)
            {
                // Already-needed pieces are always in range, so this never defaults.
                let start_block = pieces.owned(piece).unwrap_or_default();
                requests.push(Request {
                    requester: local.clone(),
                    responder: neighbor.id.clone(),
                    piece,
                    start_block,
                });
            }
            trace!(
                peer = %local,
                neighbor = %neighbor.id,
                count = requests.len() - before,
                "Requested pieces"
            );
        }

        debug!(peer = %local, requests = requests.len(), candidates = tiers.len(), "Selected requests");
        Ok(requests)
    }
}

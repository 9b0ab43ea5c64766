//! Inputs shared by every allocation policy.

use std::collections::HashMap;

use barter_exchange_primitives::{Bandwidth, Download, NeighborView, PeerId, Pieces, Upload};
use barter_reciprocity::{ReciprocityBook, ReciprocityState};

/// Everything a policy may look at when deciding one round's uploads.
#[derive(Debug, Clone, Copy)]
pub struct AllocationContext<'a> {
    /// The uploading peer.
    pub local: &'a PeerId,
    /// Distinct requesters this round, in the order their requests arrived.
    pub requesters: &'a [PeerId],
    /// This round's neighbor views.
    pub neighbors: &'a [NeighborView],
    /// The local peer's owned blocks.
    pub pieces: &'a Pieces,
    /// Reciprocity state after last round's update.
    pub book: &'a ReciprocityBook,
    /// Blocks received in the previous round.
    pub last_downloads: &'a [Download],
    pub upload_cap: Bandwidth,
}

impl<'a> AllocationContext<'a> {
    /// Reciprocity state of `peer`, seeded if it was never met.
    pub fn state(&self, peer: &PeerId) -> ReciprocityState {
        self.book.state_or_seed(peer, self.upload_cap)
    }

    pub fn upload(&self, to: &PeerId, bandwidth: Bandwidth) -> Upload {
        Upload::new(self.local.clone(), to.clone(), bandwidth)
    }

    /// Blocks each peer delivered last round, summed over its download records.
    pub fn received_last_round(&self) -> HashMap<&'a PeerId, u64> {
        let mut received = HashMap::new();
        for download in self.last_downloads {
            *received.entry(&download.from).or_default() += download.blocks;
        }
        received
    }

    /// Number of pieces `peer` holds that the local peer still needs.
    pub fn need_overlap(&self, peer: &PeerId) -> usize {
        self.neighbors
            .iter()
            .find(|neighbor| &neighbor.id == peer)
            .map(|neighbor| {
                neighbor
                    .available_pieces
                    .iter()
                    .filter(|piece| self.pieces.is_needed(**piece))
                    .count()
            })
            .unwrap_or_default()
    }
}

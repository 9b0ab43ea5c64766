//! Per-round messages exchanged between a peer and the harness.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::{Bandwidth, ExchangeError, PeerId, PieceId};

/// Snapshot of one neighbor for the current round.
///
/// A piece is listed only once the neighbor holds all of its blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborView {
    pub id: PeerId,
    pub available_pieces: BTreeSet<PieceId>,
}

impl NeighborView {
    pub fn new(id: impl Into<PeerId>, available_pieces: impl IntoIterator<Item = PieceId>) -> Self {
        Self {
            id: id.into(),
            available_pieces: available_pieces.into_iter().collect(),
        }
    }

    pub fn holds(&self, piece: PieceId) -> bool {
        self.available_pieces.contains(&piece)
    }
}

/// Check a round's neighbor views against the local peer and file size.
pub fn validate_neighbors(
    local: &PeerId,
    num_pieces: usize,
    neighbors: &[NeighborView],
) -> Result<(), ExchangeError> {
    let mut seen = HashSet::with_capacity(neighbors.len());
    for neighbor in neighbors {
        if &neighbor.id == local {
            return Err(ExchangeError::SelfNeighbor(neighbor.id.clone()));
        }
        if !seen.insert(&neighbor.id) {
            return Err(ExchangeError::DuplicateNeighbor(neighbor.id.clone()));
        }
        // BTreeSet is ordered, so the last element is the largest.
        if let Some(&piece) = neighbor.available_pieces.last()
            && piece.index() >= num_pieces
        {
            return Err(ExchangeError::UnknownPiece { piece, num_pieces });
        }
    }
    Ok(())
}

/// Request for blocks of one piece.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub requester: PeerId,
    pub responder: PeerId,
    pub piece: PieceId,
    /// First missing block, equal to the requester's owned count for `piece`.
    pub start_block: u32,
}

/// Bandwidth granted by `from` to `to` for one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Upload {
    pub from: PeerId,
    pub to: PeerId,
    pub bandwidth: Bandwidth,
}

impl Upload {
    pub fn new(from: PeerId, to: PeerId, bandwidth: Bandwidth) -> Self {
        Self {
            from,
            to,
            bandwidth,
        }
    }
}

/// Blocks actually transferred, seen from the recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Download {
    pub from: PeerId,
    pub to: PeerId,
    pub blocks: u64,
}

//! Exchange contract violations.

use crate::{PeerId, PieceId};

/// Errors reported to the harness when it hands the core malformed input.
///
/// Degenerate-but-valid input (no needed pieces, no requesters, first
/// contact with a neighbor, empty history) never produces an error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExchangeError {
    /// A neighbor view or request names a piece outside the file.
    #[error("piece {piece} out of range, file has {num_pieces} pieces")]
    UnknownPiece { piece: PieceId, num_pieces: usize },

    /// Two neighbor views in the same round share an id.
    #[error("duplicate neighbor view for peer {0}")]
    DuplicateNeighbor(PeerId),

    /// The harness listed the local peer among its own neighbors.
    #[error("peer {0} listed as its own neighbor")]
    SelfNeighbor(PeerId),

    /// Owned-block count exceeds the blocks in a piece.
    #[error("piece {piece} owns {owned} blocks, more than {blocks_per_piece} per piece")]
    OwnedBlocksOverflow {
        piece: PieceId,
        owned: u32,
        blocks_per_piece: u32,
    },

    /// An incoming request is addressed to a different peer.
    #[error("request from {requester} addressed to {responder}, not {local}")]
    MisroutedRequest {
        requester: PeerId,
        responder: PeerId,
        local: PeerId,
    },

    /// Bandwidth is negative, NaN or infinite.
    #[error("invalid bandwidth {0}")]
    InvalidBandwidth(f64),

    /// An allocation granted more than the upload cap.
    #[error("allocation of {granted} exceeds upload cap {cap}")]
    CapExceeded { granted: f64, cap: f64 },
}

impl ExchangeError {
    /// Validate a bandwidth value (finite and non-negative).
    pub fn check_bandwidth(bandwidth: f64) -> Result<f64, Self> {
        if bandwidth.is_finite() && bandwidth >= 0.0 {
            Ok(bandwidth)
        } else {
            Err(Self::InvalidBandwidth(bandwidth))
        }
    }
}

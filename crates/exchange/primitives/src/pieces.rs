//! Owned-blocks bookkeeping for the local peer.

use serde::{Deserialize, Serialize};

use crate::{ExchangeError, PieceId};

/// Blocks the local peer owns for every piece of the file.
///
/// The exchange core only reads this; the harness records delivered blocks
/// through [`Pieces::add_blocks`] between rounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pieces {
    blocks_per_piece: u32,
    owned: Vec<u32>,
}

impl Pieces {
    /// A peer that owns nothing yet.
    pub fn empty(num_pieces: usize, blocks_per_piece: u32) -> Self {
        Self {
            blocks_per_piece,
            owned: vec![0; num_pieces],
        }
    }

    /// A seed that owns every block.
    pub fn complete(num_pieces: usize, blocks_per_piece: u32) -> Self {
        Self {
            blocks_per_piece,
            owned: vec![blocks_per_piece; num_pieces],
        }
    }

    /// Build from an explicit owned-blocks vector.
    pub fn from_owned(owned: Vec<u32>, blocks_per_piece: u32) -> Result<Self, ExchangeError> {
        if let Some((index, &count)) = owned
            .iter()
            .enumerate()
            .find(|(_, count)| **count > blocks_per_piece)
        {
            return Err(ExchangeError::OwnedBlocksOverflow {
                piece: PieceId::new(index),
                owned: count,
                blocks_per_piece,
            });
        }
        Ok(Self {
            blocks_per_piece,
            owned,
        })
    }

    pub fn num_pieces(&self) -> usize {
        self.owned.len()
    }

    pub fn blocks_per_piece(&self) -> u32 {
        self.blocks_per_piece
    }

    /// Blocks owned for `piece`, or `None` if the piece is out of range.
    pub fn owned(&self, piece: PieceId) -> Option<u32> {
        self.owned.get(piece.index()).copied()
    }

    /// Blocks still missing for `piece`.
    pub fn missing(&self, piece: PieceId) -> Option<u32> {
        self.owned(piece)
            .map(|owned| self.blocks_per_piece.saturating_sub(owned))
    }

    pub fn is_needed(&self, piece: PieceId) -> bool {
        self.missing(piece).is_some_and(|missing| missing > 0)
    }

    /// Pieces not yet fully owned, in index order.
    pub fn needed(&self) -> impl Iterator<Item = PieceId> + '_ {
        self.owned
            .iter()
            .enumerate()
            .filter(|(_, owned)| **owned < self.blocks_per_piece)
            .map(|(index, _)| PieceId::new(index))
    }

    /// Pieces fully owned, in index order.
    pub fn held(&self) -> impl Iterator<Item = PieceId> + '_ {
        self.owned
            .iter()
            .enumerate()
            .filter(|(_, owned)| **owned >= self.blocks_per_piece)
            .map(|(index, _)| PieceId::new(index))
    }

    pub fn is_complete(&self) -> bool {
        self.owned.iter().all(|owned| *owned >= self.blocks_per_piece)
    }

    /// Record delivered blocks, saturating at `blocks_per_piece`.
    ///
    /// Returns the number of blocks actually added.
    pub fn add_blocks(&mut self, piece: PieceId, blocks: u32) -> Result<u32, ExchangeError> {
        let num_pieces = self.owned.len();
        let owned = self
            .owned
            .get_mut(piece.index())
            .ok_or(ExchangeError::UnknownPiece { piece, num_pieces })?;
        let added = blocks.min(self.blocks_per_piece.saturating_sub(*owned));
        *owned += added;
        Ok(added)
    }

    pub fn check_piece(&self, piece: PieceId) -> Result<(), ExchangeError> {
        if piece.index() < self.owned.len() {
            Ok(())
        } else {
            Err(ExchangeError::UnknownPiece {
                piece,
                num_pieces: self.owned.len(),
            })
        }
    }
}

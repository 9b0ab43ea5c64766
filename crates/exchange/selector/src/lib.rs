//! Rarest-first piece selection.
//!
//! Each round the selector:
//!
//! 1. builds the set of pieces the local peer still needs,
//! 2. counts how many neighbors can serve each needed piece (its rarity),
//! 3. orders pieces by rarity, shuffling within each rarity tier,
//! 4. walks that order once per neighbor, requesting the pieces it holds
//!    until the per-neighbor cap is reached.
//!
//! Requests resume from the first missing block of the piece being requested.

mod rarity;
mod selector;

pub use rarity::RarityTiers;
pub use selector::PieceSelector;

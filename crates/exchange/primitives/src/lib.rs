//! Value types for the per-round block-exchange core.
//!
//! Everything the harness hands to a peer (neighbor views, the exchange
//! history) and everything a peer hands back (requests, uploads) lives here,
//! so the selector, reciprocity and allocation crates share one vocabulary.
//!
//! # Components
//!
//! - [`PeerId`] / [`PieceId`] - Identifiers
//! - [`Pieces`] - Owned-blocks vector of the local peer
//! - [`NeighborView`] - Per-round snapshot of what a neighbor holds
//! - [`Request`] / [`Upload`] / [`Download`] - Round messages
//! - [`ExchangeHistory`] / [`RoundLedger`] - Completed-round history
//! - [`ExchangeError`] - Contract violations

mod error;
mod history;
mod ids;
mod messages;
mod pieces;

pub use error::ExchangeError;
pub use history::{ExchangeHistory, RoundLedger, RoundRecord};
pub use ids::{PeerId, PieceId};
pub use messages::{Download, NeighborView, Request, Upload, validate_neighbors};
pub use pieces::Pieces;

/// Bandwidth in abstract "blocks per round" units.
pub type Bandwidth = f64;

/// Round number, starting at 0.
pub type Round = u64;

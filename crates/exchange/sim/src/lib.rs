//! Reference round driver for [`ExchangePeer`](barter_peer::ExchangePeer).
//!
//! A [`Simulation`] owns a fixed swarm of seeds and leechers, all neighbors of
//! each other. Every round it asks each peer for requests, routes them to
//! their responders, asks each peer for uploads and then realizes the
//! transfers into the recipients' pieces and everyone's ledgers.

mod args;
mod constants;
mod error;
mod report;
mod simulation;

pub use args::SimArgs;
pub use error::SimError;
pub use report::{PeerSummary, RoundReport, SimReport};
pub use simulation::{SimPeer, Simulation};

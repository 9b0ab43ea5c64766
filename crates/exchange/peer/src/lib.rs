//! Per-round decision engine of a simulated block-exchange peer.
//!
//! [`ExchangePeer`] is what the round driver talks to. Each round it is asked
//! for [`requests`](ExchangePeer::requests) and then for
//! [`uploads`](ExchangePeer::uploads); between rounds the driver records
//! delivered blocks through [`pieces_mut`](ExchangePeer::pieces_mut) and
//! appends the realized exchange to the peer's history.

pub mod args;
mod constants;
mod engine;
mod error;

pub use args::PeerArgs;
pub use engine::ExchangePeer;
pub use error::ConfigError;

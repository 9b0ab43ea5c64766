//! Simulation errors.

use barter_exchange_primitives::ExchangeError;
use barter_peer::ConfigError;

/// Simulation setup or round failure.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("simulation needs at least one piece with at least one block")]
    EmptyFile,

    #[error("simulation needs at least one peer")]
    NoPeers,

    #[error("invalid upload cap range [{min}, {max}]")]
    UploadCapRange { min: f64, max: f64 },

    #[error("peer config: {0}")]
    Config(#[from] ConfigError),

    #[error("round failed: {0}")]
    Exchange(#[from] ExchangeError),
}

//! Simulation CLI arguments.

use barter_allocation::AllocationStrategy;
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::SimError;
use crate::constants::*;

/// Swarm shape and run length of a simulation.
#[derive(Debug, Args, Clone, PartialEq, Serialize, Deserialize)]
#[command(next_help_heading = "Simulation")]
#[serde(default)]
pub struct SimArgs {
    /// Pieces in the shared file
    #[arg(long = "sim.pieces", default_value_t = DEFAULT_NUM_PIECES)]
    pub num_pieces: usize,

    /// Blocks per piece
    #[arg(long = "sim.blocks-per-piece", default_value_t = DEFAULT_BLOCKS_PER_PIECE)]
    pub blocks_per_piece: u32,

    /// Peers that start with the whole file
    #[arg(long = "sim.seeds", default_value_t = DEFAULT_SEEDS)]
    pub seeds: usize,

    /// Peers that start with nothing
    #[arg(long = "sim.leechers", default_value_t = DEFAULT_LEECHERS)]
    pub leechers: usize,

    /// Stop after this many rounds even if some peers are incomplete
    #[arg(long = "sim.rounds", default_value_t = DEFAULT_MAX_ROUNDS)]
    pub max_rounds: u64,

    /// Seed for every random choice in the run
    #[arg(long = "sim.seed", default_value_t = DEFAULT_RNG_SEED)]
    pub rng_seed: u64,

    /// Lower bound of the per-peer upload cap; peers use the configured cap when unset
    #[arg(long = "sim.min-upload-cap", requires = "max_upload_cap")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_upload_cap: Option<f64>,

    /// Upper bound of the per-peer upload cap
    #[arg(long = "sim.max-upload-cap", requires = "min_upload_cap")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_upload_cap: Option<f64>,

    /// Strategies assigned to leechers round-robin; all peers use the configured strategy when empty
    #[arg(long = "sim.strategies", value_enum, value_delimiter = ',')]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub strategies: Vec<AllocationStrategy>,
}

impl Default for SimArgs {
    fn default() -> Self {
        Self {
            num_pieces: DEFAULT_NUM_PIECES,
            blocks_per_piece: DEFAULT_BLOCKS_PER_PIECE,
            seeds: DEFAULT_SEEDS,
            leechers: DEFAULT_LEECHERS,
            max_rounds: DEFAULT_MAX_ROUNDS,
            rng_seed: DEFAULT_RNG_SEED,
            min_upload_cap: None,
            max_upload_cap: None,
            strategies: Vec::new(),
        }
    }
}

impl SimArgs {
    pub fn validate(&self) -> Result<(), SimError> {
        if self.num_pieces == 0 || self.blocks_per_piece == 0 {
            return Err(SimError::EmptyFile);
        }
        if self.seeds + self.leechers == 0 {
            return Err(SimError::NoPeers);
        }
        if let Some((min, max)) = self.upload_cap_range()
            && !(min.is_finite() && max.is_finite() && 0.0 <= min && min <= max)
        {
            return Err(SimError::UploadCapRange { min, max });
        }
        Ok(())
    }

    /// Per-peer upload cap bounds, when both are set.
    pub fn upload_cap_range(&self) -> Option<(f64, f64)> {
        self.min_upload_cap.zip(self.max_upload_cap)
    }
}

//! Simulation defaults.

pub(crate) const DEFAULT_NUM_PIECES: usize = 32;
pub(crate) const DEFAULT_BLOCKS_PER_PIECE: u32 = 4;
pub(crate) const DEFAULT_SEEDS: usize = 2;
pub(crate) const DEFAULT_LEECHERS: usize = 8;
pub(crate) const DEFAULT_MAX_ROUNDS: u64 = 500;
pub(crate) const DEFAULT_RNG_SEED: u64 = 0;

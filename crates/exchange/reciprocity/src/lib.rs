//! Per-neighbor reciprocity bookkeeping.
//!
//! Each neighbor carries a [`ReciprocityState`]: the inbound `flow` last
//! observed from it, the bandwidth `tau` this peer is willing to commit to it,
//! and the `streak` of consecutive rounds it reciprocated. The
//! [`ReciprocityBook`] owns all entries and applies the round update:
//!
//! ```text
//! reciprocated:            flow = blocks, streak += 1, tau *= (1 - gamma) if streak > r
//! uploaded-to, no return:  tau *= (1 + alpha), streak = 0
//! neither:                 untouched
//! ```

mod book;
mod params;
mod state;

pub use book::{BookSnapshot, ReciprocityBook, UpdateSummary};
pub use params::{
    DEFAULT_ALPHA, DEFAULT_GAMMA, DEFAULT_PATIENCE, ParamsError, ReciprocityParams, TauSeed,
    seed_flow,
};
pub use state::ReciprocityState;

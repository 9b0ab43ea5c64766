//! Upload-bandwidth allocation policies.
//!
//! Every policy receives this round's requesters and the local peer's
//! reciprocity state and returns the uploads to grant, never exceeding the
//! upload cap.
//!
//! | Policy | Selection | Bandwidth |
//! |---|---|---|
//! | [`EvenSplit`] | all requesters | `cap / n` |
//! | [`ProportionalShare`] | last round's contributors + one optimistic pick | share of `p * cap` by blocks, `(1 - p) * cap` |
//! | [`Tournament`] | `flow / tau` ascending, occasional need-overlap substitution | `tau` while it fits |
//! | [`GreedyRatio`] | `flow / tau` descending, random ties | `tau` while it fits |

mod budget;
mod constants;
mod context;
mod even_split;
mod greedy_ratio;
mod proportional;
mod strategy;
mod tournament;

pub use constants::{DEFAULT_EXPLOIT_FRACTION, DEFAULT_SUBSTITUTION_RATE};
pub use context::AllocationContext;
pub use even_split::{EvenSplit, even_split};
pub use greedy_ratio::GreedyRatio;
pub use proportional::ProportionalShare;
pub use strategy::{AllocationStrategy, PolicyParams};
pub use tournament::Tournament;

use barter_exchange_primitives::Upload;
use barter_reciprocity::TauSeed;
use rand::RngCore;

/// Strategy for dividing the upload cap among requesters.
#[auto_impl::auto_impl(&, Box, Arc)]
pub trait AllocationPolicy: std::fmt::Debug + Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// How tau is seeded for neighbors this policy has never seen.
    fn tau_seed(&self) -> TauSeed {
        TauSeed::QuarterCap
    }

    /// Uploads to grant this round. The sum of bandwidths must not exceed
    /// `ctx.upload_cap`.
    fn allocate(&self, ctx: &AllocationContext<'_>, rng: &mut dyn RngCore) -> Vec<Upload>;
}

//! Tunable reciprocity parameters.

use barter_exchange_primitives::Bandwidth;
use serde::{Deserialize, Serialize};

/// Default decay rate applied to tau after a sustained streak.
pub const DEFAULT_GAMMA: f64 = 0.1;

/// Default growth rate applied to tau after an unreciprocated upload.
pub const DEFAULT_ALPHA: f64 = 0.2;

/// Default streak length before tau starts to decay.
pub const DEFAULT_PATIENCE: u32 = 3;

/// How tau is seeded for a neighbor on first contact.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    clap::ValueEnum,
    strum::Display,
    strum::EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TauSeed {
    /// One bandwidth unit: start cheap and let defections raise it.
    Unit,
    /// A quarter of the upload cap.
    #[default]
    QuarterCap,
}

impl TauSeed {
    pub fn tau(self, upload_cap: Bandwidth) -> Bandwidth {
        match self {
            Self::Unit => 1.0,
            Self::QuarterCap => upload_cap / 4.0,
        }
    }
}

/// Seeded inbound flow for a neighbor we have never observed.
pub fn seed_flow(upload_cap: Bandwidth) -> Bandwidth {
    upload_cap / 4.0
}

/// Invalid reciprocity parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamsError {
    #[error("gamma must be in [0, 1), got {0}")]
    Gamma(f64),
    #[error("alpha must be finite and >= 0, got {0}")]
    Alpha(f64),
}

/// Update-rule parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReciprocityParams {
    /// Tau decay rate once a neighbor's streak exceeds `patience`.
    pub gamma: f64,
    /// Tau growth rate after an unreciprocated upload.
    pub alpha: f64,
    /// Streak threshold `r`.
    pub patience: u32,
    /// Reset streak and tau of neighbors that went quiet.
    pub idle_reset: bool,
    /// Drop entries not seen for more than this many rounds.
    pub prune_after: Option<u64>,
}

impl Default for ReciprocityParams {
    fn default() -> Self {
        Self {
            gamma: DEFAULT_GAMMA,
            alpha: DEFAULT_ALPHA,
            patience: DEFAULT_PATIENCE,
            idle_reset: false,
            prune_after: None,
        }
    }
}

impl ReciprocityParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if !(0.0..1.0).contains(&self.gamma) {
            return Err(ParamsError::Gamma(self.gamma));
        }
        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(ParamsError::Alpha(self.alpha));
        }
        Ok(())
    }
}

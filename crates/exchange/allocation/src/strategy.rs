//! Selectable allocation strategies.

use serde::{Deserialize, Serialize};

use crate::{
    AllocationPolicy, DEFAULT_EXPLOIT_FRACTION, DEFAULT_SUBSTITUTION_RATE, EvenSplit, GreedyRatio,
    ProportionalShare, Tournament,
};

/// Allocation strategy, selectable from the CLI or a config file.
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
    strum::EnumIter,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AllocationStrategy {
    /// Split the cap evenly among all requesters.
    EvenSplit,
    /// Share the cap in proportion to last round's contributions.
    ProportionalShare,
    /// Auction-style admission by ascending flow/tau.
    Tournament,
    /// Tyrant-style admission by descending flow/tau.
    #[default]
    GreedyRatio,
}

/// Strategy-specific tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolicyParams {
    pub exploit_fraction: f64,
    pub substitution_rate: f64,
}

impl Default for PolicyParams {
    fn default() -> Self {
        Self {
            exploit_fraction: DEFAULT_EXPLOIT_FRACTION,
            substitution_rate: DEFAULT_SUBSTITUTION_RATE,
        }
    }
}

impl AllocationStrategy {
    /// Build the policy for this strategy.
    pub fn build(self, params: &PolicyParams) -> Box<dyn AllocationPolicy> {
        match self {
            Self::EvenSplit => Box::new(EvenSplit),
            Self::ProportionalShare => Box::new(ProportionalShare::new(params.exploit_fraction)),
            Self::Tournament => Box::new(Tournament::new(params.substitution_rate)),
            Self::GreedyRatio => Box::new(GreedyRatio),
        }
    }
}

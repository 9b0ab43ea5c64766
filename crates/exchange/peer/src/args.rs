//! CLI and config-file arguments for an exchange peer.

use std::path::Path;

use barter_allocation::{
    AllocationStrategy, DEFAULT_EXPLOIT_FRACTION, DEFAULT_SUBSTITUTION_RATE, PolicyParams,
};
use barter_reciprocity::{
    DEFAULT_ALPHA, DEFAULT_GAMMA, DEFAULT_PATIENCE, ReciprocityParams, TauSeed,
};
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::ConfigError;
use crate::constants::*;

/// Exchange peer arguments. Bandwidths are in blocks per round.
#[derive(Debug, Args, Clone, PartialEq, Serialize, Deserialize)]
#[command(next_help_heading = "Exchange Peer")]
#[serde(default)]
pub struct PeerArgs {
    /// Upload capacity per round
    #[arg(long = "peer.upload-cap", default_value_t = DEFAULT_UPLOAD_CAP)]
    pub upload_cap: f64,

    /// Maximum requests sent to each neighbor per round
    #[arg(long = "peer.max-requests", default_value_t = DEFAULT_MAX_REQUESTS)]
    pub max_requests: usize,

    /// Upload allocation strategy
    #[arg(long = "peer.strategy", value_enum, default_value_t = AllocationStrategy::GreedyRatio)]
    pub strategy: AllocationStrategy,

    /// Completed rounds required before leaving the even-split bootstrap
    #[arg(long = "peer.lookback", default_value_t = DEFAULT_LOOKBACK_ROUNDS)]
    pub lookback_rounds: u64,

    /// Tau decay rate after a sustained reciprocation streak
    #[arg(long = "reciprocity.gamma", default_value_t = DEFAULT_GAMMA)]
    pub gamma: f64,

    /// Tau growth rate after an unreciprocated upload
    #[arg(long = "reciprocity.alpha", default_value_t = DEFAULT_ALPHA)]
    pub alpha: f64,

    /// Streak length before tau starts to decay
    #[arg(long = "reciprocity.patience", default_value_t = DEFAULT_PATIENCE)]
    pub patience: u32,

    /// Override the strategy's tau seed convention
    #[arg(long = "reciprocity.tau-seed", value_enum)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tau_seed: Option<TauSeed>,

    /// Reset streak and tau of neighbors that went quiet
    #[arg(long = "reciprocity.idle-reset")]
    pub idle_reset: bool,

    /// Forget neighbors not seen for this many rounds
    #[arg(long = "reciprocity.prune-after", value_name = "ROUNDS")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prune_after: Option<u64>,

    /// Share of the cap proportional-share gives to contributors
    #[arg(long = "allocation.exploit-fraction", default_value_t = DEFAULT_EXPLOIT_FRACTION)]
    pub exploit_fraction: f64,

    /// Tournament need-overlap substitution rate per admitted peer
    #[arg(long = "allocation.substitution-rate", default_value_t = DEFAULT_SUBSTITUTION_RATE)]
    pub substitution_rate: f64,
}

impl Default for PeerArgs {
    fn default() -> Self {
        Self {
            upload_cap: DEFAULT_UPLOAD_CAP,
            max_requests: DEFAULT_MAX_REQUESTS,
            strategy: AllocationStrategy::default(),
            lookback_rounds: DEFAULT_LOOKBACK_ROUNDS,
            gamma: DEFAULT_GAMMA,
            alpha: DEFAULT_ALPHA,
            patience: DEFAULT_PATIENCE,
            tau_seed: None,
            idle_reset: false,
            prune_after: None,
            exploit_fraction: DEFAULT_EXPLOIT_FRACTION,
            substitution_rate: DEFAULT_SUBSTITUTION_RATE,
        }
    }
}

impl PeerArgs {
    /// Parse arguments from TOML. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let args: Self = toml::from_str(source)?;
        args.validate()?;
        Ok(args)
    }

    /// Read and parse a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.upload_cap.is_finite() || self.upload_cap < 0.0 {
            return Err(ConfigError::UploadCap(self.upload_cap));
        }
        if !(0.0..=1.0).contains(&self.exploit_fraction) {
            return Err(ConfigError::ExploitFraction(self.exploit_fraction));
        }
        if !self.substitution_rate.is_finite() || self.substitution_rate < 0.0 {
            return Err(ConfigError::SubstitutionRate(self.substitution_rate));
        }
        self.reciprocity_params().validate()?;
        Ok(())
    }

    pub fn reciprocity_params(&self) -> ReciprocityParams {
        ReciprocityParams {
            gamma: self.gamma,
            alpha: self.alpha,
            patience: self.patience,
            idle_reset: self.idle_reset,
            prune_after: self.prune_after,
        }
    }

    pub fn policy_params(&self) -> PolicyParams {
        PolicyParams {
            exploit_fraction: self.exploit_fraction,
            substitution_rate: self.substitution_rate,
        }
    }
}

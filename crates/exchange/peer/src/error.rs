//! Configuration errors.

use std::path::PathBuf;

use barter_reciprocity::ParamsError;

/// Invalid or unreadable peer configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("upload cap must be finite and >= 0, got {0}")]
    UploadCap(f64),

    #[error("exploit fraction must be in [0, 1], got {0}")]
    ExploitFraction(f64),

    #[error("substitution rate must be finite and >= 0, got {0}")]
    SubstitutionRate(f64),

    #[error(transparent)]
    Reciprocity(#[from] ParamsError),

    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

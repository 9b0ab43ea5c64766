//! Default constants for peer configuration.

/// Default upload capacity in blocks per round.
pub(crate) const DEFAULT_UPLOAD_CAP: f64 = 4.0;

/// Default number of requests sent to each neighbor per round.
pub(crate) const DEFAULT_MAX_REQUESTS: usize = 4;

/// Completed rounds required before leaving the even-split bootstrap.
pub(crate) const DEFAULT_LOOKBACK_ROUNDS: u64 = 1;

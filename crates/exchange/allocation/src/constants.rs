//! Default policy constants.

/// Share of the upload cap proportional-share hands to last round's contributors.
pub const DEFAULT_EXPLOIT_FRACTION: f64 = 0.9;

/// Per-admitted-peer probability that tournament substitutes a need-overlap pick.
pub const DEFAULT_SUBSTITUTION_RATE: f64 = 0.02;

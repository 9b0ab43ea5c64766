//! Logging for barter binaries.
//!
//! Library crates only emit `tracing` events; binaries call [`init_logging`]
//! once at startup with the parsed [`LogArgs`].

mod args;
mod logging;

pub use args::LogArgs;
pub use logging::init_logging;

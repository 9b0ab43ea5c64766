//! Tracing subscriber setup.

use eyre::{Result, eyre};
use tracing_subscriber::EnvFilter;

use crate::LogArgs;

/// Initialize logging based on command line arguments.
///
/// The filter is built with the following precedence:
/// 1. If `--quiet` is set, only errors are shown
/// 2. Otherwise, start with `RUST_LOG` env var if set, or a level derived
///    from the verbosity flags (info, debug, trace)
/// 3. Apply any custom filter from `--log.filter`
pub fn init_logging(args: &LogArgs) -> Result<()> {
    let filter = build_filter(args, std::env::var(EnvFilter::DEFAULT_ENV).ok());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time();

    if args.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    }
    .map_err(|err| eyre!("failed to install log subscriber: {err}"))
}

fn build_filter(args: &LogArgs, env: Option<String>) -> EnvFilter {
    if args.quiet {
        return EnvFilter::new("error");
    }

    let base_level = match args.verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let mut filter = env
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(base_level));

    if let Some(custom_filter) = &args.filter {
        for directive in custom_filter.split(',') {
            if let Ok(d) = directive.parse() {
                filter = filter.add_directive(d);
            }
        }
    }
    filter
}

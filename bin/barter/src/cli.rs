//! Command-line entry point.

use std::path::PathBuf;

use barter_observability::{LogArgs, init_logging};
use barter_peer::PeerArgs;
use barter_sim::{SimArgs, SimReport, Simulation};
use clap::{Parser, Subcommand};
use eyre::{Result, WrapErr};
use tracing::{info, warn};

/// barter - rarest-first, reciprocity-driven block exchange simulator
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub(crate) struct BarterCli {
    /// Logging configuration (applies to all subcommands).
    #[command(flatten)]
    logs: LogArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a simulated swarm to completion.
    Sim(SimCommandArgs),
    /// Print the effective peer configuration as TOML.
    Config(ConfigCommandArgs),
}

#[derive(Debug, clap::Args)]
struct PeerConfigArgs {
    /// Peer config file (TOML); replaces the peer flags when given
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(flatten)]
    peer: PeerArgs,
}

impl PeerConfigArgs {
    fn resolve(self) -> Result<PeerArgs> {
        match self.config {
            Some(path) => PeerArgs::load(&path)
                .wrap_err_with(|| format!("failed to load {}", path.display())),
            None => {
                self.peer.validate()?;
                Ok(self.peer)
            }
        }
    }
}

#[derive(Debug, clap::Args)]
struct SimCommandArgs {
    #[command(flatten)]
    peer: PeerConfigArgs,

    #[command(flatten)]
    sim: SimArgs,

    /// Print the final report as JSON on stdout
    #[arg(long = "report.json")]
    json: bool,
}

#[derive(Debug, clap::Args)]
struct ConfigCommandArgs {
    #[command(flatten)]
    peer: PeerConfigArgs,
}

pub(crate) fn run() -> Result<()> {
    color_eyre::install()?;

    let cli = BarterCli::parse();
    init_logging(&cli.logs)?;

    info!("Starting barter {}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Sim(args) => run_sim(args),
        Commands::Config(args) => {
            let peer = args.peer.resolve()?;
            print!("{}", toml::to_string_pretty(&peer)?);
            Ok(())
        }
    }
}

fn run_sim(args: SimCommandArgs) -> Result<()> {
    let peer = args.peer.resolve()?;
    info!(
        strategy = %peer.strategy,
        upload_cap = peer.upload_cap,
        seeds = args.sim.seeds,
        leechers = args.sim.leechers,
        pieces = args.sim.num_pieces,
        "Starting simulation"
    );

    let mut sim = Simulation::new(args.sim, peer)?;
    let report = sim.run()?;
    log_report(&report);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

fn log_report(report: &SimReport) {
    for peer in report.peers.iter().filter(|peer| !peer.seed) {
        match peer.completed_at {
            Some(round) => info!(
                peer = %peer.id,
                strategy = %peer.strategy,
                upload_cap = peer.upload_cap,
                round,
                uploaded = peer.blocks_uploaded,
                "Peer completed"
            ),
            None => warn!(
                peer = %peer.id,
                strategy = %peer.strategy,
                downloaded = peer.blocks_downloaded,
                "Peer did not complete"
            ),
        }
    }
    info!(
        rounds = report.rounds,
        all_complete = report.all_complete(),
        mean_completion = ?report.mean_completion(),
        "Simulation finished"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        BarterCli::command().debug_assert();
    }

    #[test]
    fn test_parse_sim_command() {
        let cli = BarterCli::parse_from([
            "barter",
            "-v",
            "sim",
            "--peer.strategy",
            "tournament",
            "--sim.leechers",
            "3",
            "--report.json",
        ]);
        assert_eq!(cli.logs.verbosity, 1);
        let Commands::Sim(args) = cli.command else {
            panic!("expected sim command");
        };
        assert!(args.json);
        assert_eq!(args.sim.leechers, 3);
        assert_eq!(args.peer.peer.strategy.to_string(), "tournament");
    }
}

//! barter swarm simulator binary.

mod cli;

fn main() -> eyre::Result<()> {
    cli::run()
}

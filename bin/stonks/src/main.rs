//! Stonks operator binary.

mod cli;
mod commands;
mod logging;

use clap::Parser;

use crate::cli::{Cli, Commands};

fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_args)?;

    match &cli.command {
        Commands::Leaderboard(args) => commands::leaderboard(&cli.datadir, args),
        Commands::Queue(output) => commands::queue(&cli.datadir, *output),
        Commands::User(args) => commands::user(&cli.datadir, args),
        Commands::Config(command) => commands::config(&cli.datadir, command),
    }
}

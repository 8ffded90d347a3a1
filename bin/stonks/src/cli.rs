//! Command-line interface for the stonks operator tool.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use directories::ProjectDirs;
use stonks_primitives::Shares;

/// Stonks - engagement to shares tracker
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub(crate) struct Cli {
    /// Logging configuration
    #[command(flatten)]
    pub(crate) log_args: LogArgs,

    /// Data directory configuration
    #[command(flatten)]
    pub(crate) datadir: DataDirArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub(crate) command: Commands,
}

/// Logging configuration.
#[derive(Debug, Args, Clone)]
#[command(next_help_heading = "Logging")]
pub(crate) struct LogArgs {
    /// Silence all output.
    #[arg(short, long, global = true)]
    pub(crate) quiet: bool,

    /// Verbose mode (-v, -vv, -vvv, etc.).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub(crate) verbosity: u8,

    /// Log filter directive (e.g., "stonks_engine=debug").
    #[arg(id = "log_filter", long = "log.filter", value_name = "DIRECTIVE", global = true)]
    pub(crate) filter: Option<String>,

    /// Use JSON format for log output.
    #[arg(id = "log_json", long = "log.json", global = true)]
    pub(crate) json: bool,
}

/// Data directory configuration
#[derive(Debug, Args, Clone)]
#[command(next_help_heading = "Data directory")]
pub(crate) struct DataDirArgs {
    /// Data directory path
    #[arg(long, value_name = "PATH", env = "STONKS_DATADIR", global = true)]
    pub(crate) datadir: Option<PathBuf>,
}

impl DataDirArgs {
    /// Root data directory, falling back to the platform default.
    pub(crate) fn root(&self) -> PathBuf {
        self.datadir.clone().unwrap_or_else(|| {
            ProjectDirs::from("org", "stonks", "stonks")
                .map(|dirs| dirs.data_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".stonks"))
        })
    }

    /// Returns the path to the settings file.
    pub(crate) fn settings_file(&self) -> PathBuf {
        self.root().join("settings.toml")
    }

    /// Returns the path to the score database.
    pub(crate) fn db_file(&self) -> PathBuf {
        self.root().join("scores.redb")
    }
}

/// Operator commands
#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Show the shares leaderboard
    Leaderboard(LeaderboardArgs),

    /// Show the reconciliation queue, next user first
    Queue(OutputArgs),

    /// Show what is stored for one user
    User(UserArgs),

    /// Manage installation settings
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Args, Clone, Copy)]
pub(crate) struct OutputArgs {
    /// Print JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

/// Arguments for the 'leaderboard' command
#[derive(Debug, Args)]
pub(crate) struct LeaderboardArgs {
    /// Minimum shares to be listed (defaults to the configured value)
    #[arg(long)]
    pub(crate) min_score: Option<Shares>,

    /// 1-based page number
    #[arg(long, default_value_t = 1)]
    pub(crate) page: usize,

    #[command(flatten)]
    pub(crate) output: OutputArgs,
}

/// Arguments for the 'user' command
#[derive(Debug, Args)]
pub(crate) struct UserArgs {
    /// Platform user id
    pub(crate) id: String,

    #[command(flatten)]
    pub(crate) output: OutputArgs,
}

/// Settings management
#[derive(Debug, Subcommand)]
pub(crate) enum ConfigCommand {
    /// Write the default settings file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective settings
    Show,

    /// Check the settings file
    Validate,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_leaderboard() {
        let cli = Cli::try_parse_from([
            "stonks",
            "--datadir",
            "/tmp/stonks",
            "leaderboard",
            "--min-score",
            "5",
            "--page",
            "2",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.log_args.verbosity, 2);
        assert_eq!(cli.datadir.db_file(), PathBuf::from("/tmp/stonks/scores.redb"));
        match cli.command {
            Commands::Leaderboard(args) => {
                assert_eq!(args.min_score, Some(5));
                assert_eq!(args.page, 2);
                assert!(!args.output.json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_config() {
        let cli = Cli::try_parse_from(["stonks", "config", "init", "--force"]).unwrap();
        assert!(matches!(cli.command, Commands::Config(ConfigCommand::Init { force: true })));
    }
}

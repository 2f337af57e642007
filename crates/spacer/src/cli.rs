//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

pub use crate::commands::list::ListArgs;
pub use crate::commands::restore::RestoreArgs;

/// Spacer - Scheduled, encrypted PostgreSQL snapshots to object storage
#[derive(Parser, Debug)]
#[command(name = "spacer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Env file to load before reading configuration (defaults to ./.env)
    #[arg(long, global = true, env = "SPACER_ENV_FILE")]
    pub env_file: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run backup cycles on the configured interval until stopped
    Run,

    /// Run a single backup cycle and exit
    Backup,

    /// List snapshots in the backup folder
    List(ListArgs),

    /// Download and decrypt a snapshot
    Restore(RestoreArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::restore::PolicyArg;

    #[test]
    fn test_parse_run_with_globals() {
        let cli = Cli::try_parse_from(["spacer", "-vv", "run", "--env-file", "prod.env"]).unwrap();

        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
        assert_eq!(cli.env_file.as_deref().map(|p| p.as_str()), Some("prod.env"));
        assert!(matches!(cli.command, Commands::Run));
    }

    #[test]
    fn test_parse_list_flags() {
        let cli = Cli::try_parse_from(["spacer", "list", "--prefix", "shop", "--json"]).unwrap();

        match cli.command {
            Commands::List(args) => {
                assert_eq!(args.prefix.as_deref(), Some("shop"));
                assert!(args.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_restore_policy() {
        let cli = Cli::try_parse_from([
            "spacer", "restore", "--policy", "newest", "--output", "/tmp/out",
        ])
        .unwrap();

        match cli.command {
            Commands::Restore(args) => {
                assert!(matches!(args.policy, Some(PolicyArg::Newest)));
                assert_eq!(args.output.as_deref().map(|p| p.as_str()), Some("/tmp/out"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_unknown_policy() {
        assert!(Cli::try_parse_from(["spacer", "restore", "--policy", "latest"]).is_err());
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["spacer"]).is_err());
    }
}

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use pkgkit::Operation;

#[derive(Parser)]
#[command(name = "sloth")]
#[command(author = "Benjamin Walkenhorst")]
#[command(version)]
#[command(about = "One front end for your system's package manager", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Answer yes to the package manager's prompts
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show platform, backend and configuration
    Info,

    /// Search the package index
    Search(SearchArgs),

    /// Install packages
    Install(PackagesArgs),

    /// Remove packages
    #[command(alias = "rm", alias = "delete")]
    Remove(PackagesArgs),

    /// Search, then pick packages to install or remove interactively
    Pick {
        /// Search terms
        #[arg(required = true)]
        terms: Vec<String>,
    },

    /// Refresh the package index
    Refresh {
        /// Refresh even if the index is up to date
        #[arg(short, long)]
        force: bool,
    },

    /// Upgrade installed packages
    Upgrade(UpgradeArgs),

    /// Remove packages that are no longer needed
    Autoremove {
        /// Remove configuration files as well, where supported
        #[arg(long)]
        purge: bool,
    },

    /// Clear the package cache
    Cleanup,

    /// List installed packages with known vulnerabilities
    Audit {
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show recent operations
    History(HistoryArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct SearchArgs {
    /// Search terms
    #[arg(required = true)]
    pub terms: Vec<String>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,

    /// Only show installed packages
    #[arg(short, long)]
    pub installed: bool,
}

#[derive(Args)]
pub struct PackagesArgs {
    /// Package names
    #[arg(required = true)]
    pub packages: Vec<String>,
}

#[derive(Args)]
pub struct UpgradeArgs {
    /// Allow removals and vendor changes
    #[arg(long, conflicts_with = "release")]
    pub big: bool,

    /// Upgrade to the next distribution release
    #[arg(long)]
    pub release: bool,
}

#[derive(Args)]
pub struct HistoryArgs {
    /// Number of records to show
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,

    /// Only show this operation (install, delete, refresh, ...)
    #[arg(long)]
    pub op: Option<Operation>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_history_op() {
        let cli = Cli::try_parse_from(["sloth", "history", "--op", "upgrade-big", "-n", "5"]).unwrap();
        match cli.command {
            Command::History(args) => {
                assert_eq!(args.op, Some(Operation::UpgradeBig));
                assert_eq!(args.limit, 5);
            }
            _ => panic!("expected history"),
        }
        assert!(Cli::try_parse_from(["sloth", "history", "--op", "frobnicate"]).is_err());
    }

    #[test]
    fn test_upgrade_flags_conflict() {
        assert!(Cli::try_parse_from(["sloth", "upgrade", "--big", "--release"]).is_err());
        assert!(Cli::try_parse_from(["sloth", "-y", "upgrade", "--big"]).is_ok());
    }

    #[test]
    fn test_install_requires_packages() {
        assert!(Cli::try_parse_from(["sloth", "install"]).is_err());
        let cli = Cli::try_parse_from(["sloth", "rm", "nano"]).unwrap();
        assert!(matches!(cli.command, Command::Remove(_)));
    }
}

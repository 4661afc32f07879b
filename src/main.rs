mod cli;
mod commands;
mod config;
mod paths;
mod progress;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use config::Config;
use std::io;

/// Global context for the application
pub struct Context {
    pub quiet: bool,
    pub yes: bool,
    pub config: Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    if let Command::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "sloth", &mut io::stdout());
        return Ok(());
    }

    let ctx = Context {
        quiet: cli.quiet,
        yes: cli.yes,
        config: Config::load()?,
    };

    match cli.command {
        Command::Info => commands::info::run(&ctx),
        Command::Search(args) => commands::search::run(&ctx, &args),
        Command::Install(args) => commands::packages::install(&ctx, &args.packages),
        Command::Remove(args) => commands::packages::remove(&ctx, &args.packages),
        Command::Pick { terms } => commands::pick::run(&ctx, &terms),
        Command::Refresh { force } => commands::packages::refresh(&ctx, force),
        Command::Upgrade(args) => commands::packages::upgrade(&ctx, &args),
        Command::Autoremove { purge } => commands::packages::autoremove(&ctx, purge),
        Command::Cleanup => commands::packages::cleanup(&ctx),
        Command::Audit { json } => commands::audit::run(&ctx, json),
        Command::History(args) => commands::history::run(&ctx, &args),
        Command::Completions { .. } => Ok(()),
    }
}

mod assets;
mod cli;
mod commands;
mod config;
mod progress;
mod provider;
mod stack;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
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

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    match cli.command {
        Command::Init(args) => commands::init::run(&ctx, &cli.config, &args),
        Command::Plan => commands::plan::run(&ctx, &cli.config),
        Command::Apply(args) => commands::apply::run(&ctx, &cli.config, &args),
        Command::Destroy(args) => commands::destroy::run(&ctx, &cli.config, &args),
        Command::Status => commands::status::run(&ctx, &cli.config),
        Command::Outputs => commands::outputs::run(&ctx, &cli.config),
        Command::Completions { shell } => {
            generate(shell, &mut Cli::command(), "groundwork", &mut io::stdout());
            Ok(())
        }
    }
}

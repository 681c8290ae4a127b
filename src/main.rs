mod cli;
mod commands;
mod config;
mod paths;
mod resource;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::process::ExitCode;

/// Global context for the application
pub struct Context {
    pub quiet: bool,
}

fn main() -> ExitCode {
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

    let ctx = Context { quiet: cli.quiet };

    match run(&ctx, cli.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            ui::error(&format!("{err:#}"));
            if let Some(err) = err.downcast_ref::<incuskit::Error>() {
                let category = err.category();
                ui::dim(&format!("{}: {}", category.description(), category.advice()));
            }
            ExitCode::FAILURE
        }
    }
}

fn run(ctx: &Context, command: Command) -> Result<bool> {
    match command {
        Command::Profile(args) => commands::profile::run(ctx, &args),
        Command::Volume(args) => commands::volume::run(ctx, &args),
        Command::Apply(args) => commands::apply::apply(ctx, &args),
        Command::Diff(args) => commands::apply::diff(ctx, &args),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "incant", &mut io::stdout());
            Ok(true)
        }
    }
}

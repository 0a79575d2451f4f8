//! `netinv` - command-line front-end for the netinv inventory collector
//!
//! Loads an inventory file, collects hardware and firmware facts from every
//! device over SSH and prints the result as a table or JSON report.

mod cli;
mod commands;
mod error;
mod format;

use clap::Parser;
use cli::Cli;
use netinv_core::tracing::{TracingConfig, TracingLevel, TracingOutput, init_tracing};

use crate::error::CliError;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = setup_logging(&cli) {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }

    let ctx = commands::Context {
        quiet: cli.quiet,
        color: !cli.no_color,
    };
    let result = commands::dispatch(&ctx, cli.command);

    if let Err(e) = result {
        if !cli.quiet || e.exit_code() == error::exit_codes::GENERAL_ERROR {
            eprintln!("Error: {e}");
        }
        std::process::exit(e.exit_code());
    }
}

fn setup_logging(cli: &Cli) -> Result<(), CliError> {
    let level = if cli.quiet {
        TracingLevel::Error
    } else {
        TracingLevel::from_verbosity(cli.verbose)
    };
    let mut config = TracingConfig::new().with_level(level).with_ansi(!cli.no_color);
    if let Some(path) = &cli.log_file {
        config = config.with_output(TracingOutput::File {
            path: path.clone(),
            append: true,
        });
    }
    if let Some(filter) = &cli.log_filter {
        config = config.with_filter(filter.clone());
    }
    init_tracing(&config).map_err(|e| CliError::Logging(e.to_string()))
}

//! Command handler modules for the CLI.

mod collect;
mod completions;
mod template;
mod validate;
mod vendors;

use std::path::{Path, PathBuf};

use netinv_core::config::default_inventory_path;

use crate::cli::Commands;
use crate::error::CliError;

/// Output settings shared by every command
#[derive(Debug, Clone, Copy)]
pub struct Context {
    /// Only errors are printed
    pub quiet: bool,
    /// ANSI colors allowed on the terminal
    pub color: bool,
}

/// Dispatch a CLI command to the appropriate handler.
pub fn dispatch(ctx: &Context, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Collect(args) => collect::cmd_collect(ctx, &args),
        Commands::Validate { inventory } => validate::cmd_validate(ctx, inventory.as_deref()),
        Commands::Vendors { inventory, format } => vendors::cmd_vendors(inventory.as_deref(), format),
        Commands::Template { output, force } => template::cmd_template(ctx, output.as_deref(), force),
        Commands::Completions { shell } => completions::cmd_completions(shell),
    }
}

/// Inventory path from the command line or the user config directory
fn inventory_path(arg: Option<&Path>) -> Result<PathBuf, CliError> {
    match arg {
        Some(path) => Ok(path.to_path_buf()),
        None => default_inventory_path().map_err(CliError::from),
    }
}

//! Inventory validation command.

use std::path::Path;

use netinv_core::load_inventory;

use super::{Context, inventory_path};
use crate::error::CliError;
use crate::format::format_targets;

/// Validate command handler
///
/// Loads the inventory exactly as `collect` would, including environment
/// secrets and profile overrides, and prints the resolved device list.
pub fn cmd_validate(ctx: &Context, inventory: Option<&Path>) -> Result<(), CliError> {
    let path = inventory_path(inventory)?;
    let inventory = load_inventory(&path)?;

    if ctx.quiet {
        return Ok(());
    }
    println!("{}", format_targets(&inventory.targets));
    println!();
    println!(
        "{}: {} devices, {} credentials, concurrency {}",
        path.display(),
        inventory.targets.len(),
        inventory.credentials.len(),
        inventory.concurrency
    );
    Ok(())
}

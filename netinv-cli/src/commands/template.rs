//! Sample inventory command.

use std::path::Path;

use netinv_core::config::{INVENTORY_TEMPLATE, write_template};

use super::Context;
use crate::error::CliError;

/// Template command handler
pub fn cmd_template(ctx: &Context, output: Option<&Path>, force: bool) -> Result<(), CliError> {
    let Some(path) = output else {
        print!("{INVENTORY_TEMPLATE}");
        return Ok(());
    };

    write_template(path, force)?;
    if !ctx.quiet {
        println!("Sample inventory written to {}", path.display());
    }
    Ok(())
}

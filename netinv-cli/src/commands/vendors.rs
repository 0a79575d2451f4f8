//! Vendor profile listing command.

use std::path::Path;

use netinv_core::{AdapterRegistry, VendorProfile, load_inventory};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::format::format_profiles;

/// Serializable view of a profile
#[derive(Debug, Serialize)]
struct ProfileView<'a> {
    vendor: &'static str,
    setup_commands: &'a [String],
    commands: Vec<CommandView<'a>>,
    detect_patterns: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt_pattern: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    enable_command: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct CommandView<'a> {
    name: &'a str,
    command: &'a str,
    required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout_secs: Option<u64>,
}

impl<'a> From<&'a VendorProfile> for ProfileView<'a> {
    fn from(profile: &'a VendorProfile) -> Self {
        Self {
            vendor: profile.vendor.key(),
            setup_commands: &profile.setup_commands,
            commands: profile
                .commands
                .iter()
                .map(|spec| CommandView {
                    name: &spec.name,
                    command: &spec.command,
                    required: spec.required,
                    timeout_secs: spec.timeout.map(|t| t.as_secs()),
                })
                .collect(),
            detect_patterns: profile.detect_patterns.iter().map(|re| re.as_str()).collect(),
            prompt_pattern: profile.prompt_pattern.as_ref().map(|re| re.as_str()),
            enable_command: profile.enable_command.as_deref(),
        }
    }
}

/// Vendors command handler
///
/// Without an inventory the built-in profiles are shown; with one, its
/// `[profiles.*]` overrides are applied first.
pub fn cmd_vendors(inventory: Option<&Path>, format: OutputFormat) -> Result<(), CliError> {
    let registry = match inventory {
        Some(path) => load_inventory(path)?.registry,
        None => AdapterRegistry::with_defaults(),
    };
    let profiles = registry.profiles();

    match format {
        OutputFormat::Table => println!("{}", format_profiles(&profiles)),
        OutputFormat::Json => {
            let views: Vec<ProfileView<'_>> = profiles.iter().map(|p| ProfileView::from(*p)).collect();
            let json = serde_json::to_string_pretty(&views)
                .map_err(|e| CliError::Report(format!("Failed to serialize profiles: {e}")))?;
            println!("{json}");
        }
    }
    Ok(())
}

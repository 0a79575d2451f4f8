//! CLI argument parsing types using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// `netinv` collects hardware and firmware inventory from network devices
#[derive(Parser)]
#[command(name = "netinv")]
#[command(author, version, about = "Network device inventory collector")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Log filter in `RUST_LOG` syntax; overrides -v
    #[arg(long, global = true, value_name = "FILTER", env = "NETINV_LOG")]
    pub log_filter: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Collect inventory from every device in an inventory file
    #[command(about = "Collect inventory from the devices in an inventory file")]
    Collect(CollectArgs),

    /// Validate an inventory file without connecting to any device
    #[command(about = "Load and validate an inventory file")]
    Validate {
        /// Inventory file (defaults to the user config directory)
        #[arg(short, long, env = "NETINV_INVENTORY")]
        inventory: Option<PathBuf>,
    },

    /// Show the effective vendor profiles
    #[command(about = "List vendor adapters and their command profiles")]
    Vendors {
        /// Inventory file whose profile overrides should be applied
        #[arg(short, long, env = "NETINV_INVENTORY")]
        inventory: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// Write a commented sample inventory file
    #[command(about = "Write a sample inventory file")]
    Template {
        /// Destination file; prints to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    #[command(about = "Generate shell completion scripts")]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments of `netinv collect`
#[derive(clap::Args, Debug)]
pub struct CollectArgs {
    /// Inventory file (defaults to the user config directory)
    #[arg(short, long, env = "NETINV_INVENTORY")]
    pub inventory: Option<PathBuf>,

    /// Devices processed in parallel; overrides the inventory setting
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// Deadline per device in seconds; overrides the inventory setting
    #[arg(long, value_name = "SECS")]
    pub device_timeout: Option<u64>,

    /// Also write the JSON report to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format on stdout
    #[arg(short, long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    /// Prompt for a password used by credentials that have none
    #[arg(long)]
    pub ask_pass: bool,

    /// Do not print a line per finished device
    #[arg(long)]
    pub no_progress: bool,

    /// Only collect these devices (by name; repeatable)
    #[arg(short, long = "device", value_name = "NAME")]
    pub devices: Vec<String>,
}

/// Output format for reports and listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON document
    Json,
}

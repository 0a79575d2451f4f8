//! Inventory file loading and validation
//!
//! An inventory file lists devices, the credentials they reference, run
//! settings and optional vendor profile overrides. TOML is the default
//! format; `.yaml` / `.yml` files are read as YAML.

mod file;
mod loader;
mod template;

use std::path::PathBuf;

use thiserror::Error;

pub use file::{CredentialEntry, DeviceEntry, InventoryFile, SettingsSection};
pub use loader::{FileFormat, Inventory, default_inventory_path, is_valid_host, load_inventory};
pub use template::{INVENTORY_TEMPLATE, write_template};

/// Errors that can occur while loading an inventory
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the file
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        /// File path
        path: PathBuf,
        /// OS error
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        /// File path
        path: PathBuf,
        /// OS error
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or schema error
    #[error("Invalid TOML inventory: {0}")]
    Toml(#[from] toml::de::Error),

    /// YAML syntax or schema error
    #[error("Invalid YAML inventory: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// One or more entries failed validation
    #[error("Inventory validation failed:\n  {}", .0.join("\n  "))]
    Invalid(Vec<String>),

    /// The platform has no configuration directory
    #[error("Cannot determine the configuration directory")]
    NoConfigDir,

    /// Refusing to overwrite an existing file
    #[error("{} already exists (use --force to overwrite)", .0.display())]
    AlreadyExists(PathBuf),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

//! On-disk inventory file format
//!
//! ```toml
//! [settings]
//! concurrency = 10
//!
//! [credentials.core]
//! username = "admin"
//! password_env = "NETINV_CORE_PASSWORD"
//!
//! [[devices]]
//! name = "core-sw-01"
//! host = "10.0.0.1"
//! vendor = "cisco"
//! credential = "core"
//! ```

use std::collections::BTreeMap;

use secrecy::SecretString;
use serde::Deserialize;

use crate::collector::{
    DEFAULT_COMMAND_TIMEOUT_SECS, DEFAULT_CONCURRENCY, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_DEVICE_TIMEOUT_SECS,
    RetryConfig,
};
use crate::models::{DEFAULT_SSH_PORT, Vendor};
use crate::transport::SshSettings;
use crate::vendor::ProfileOverride;

/// Parsed, not yet validated, inventory file
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InventoryFile {
    /// Run-wide settings
    pub settings: SettingsSection,
    /// Named credentials
    pub credentials: BTreeMap<String, CredentialEntry>,
    /// Devices in collection order
    pub devices: Vec<DeviceEntry>,
    /// Vendor profile overrides
    pub profiles: BTreeMap<Vendor, ProfileOverride>,
}

/// `[settings]`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsSection {
    /// Devices processed in parallel
    pub concurrency: usize,
    /// Connect timeout per attempt
    pub connect_timeout_secs: u64,
    /// Default command timeout
    pub command_timeout_secs: u64,
    /// Overall deadline per device
    pub device_timeout_secs: u64,
    /// Hand undetected devices to the generic adapter
    pub generic_fallback: bool,
    /// Command run when the banner matches no vendor
    pub detect_command: Option<String>,
    /// Connect retry policy
    pub retry: RetryConfig,
    /// SSH client options
    pub ssh: SshSettings,
}

impl Default for SettingsSection {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            device_timeout_secs: DEFAULT_DEVICE_TIMEOUT_SECS,
            generic_fallback: true,
            detect_command: None,
            retry: RetryConfig::default(),
            ssh: SshSettings::default(),
        }
    }
}

/// `[credentials.<name>]`
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialEntry {
    /// Login username
    pub username: String,
    /// Inline password (discouraged)
    #[serde(default)]
    pub password: Option<SecretString>,
    /// Environment variable holding the password
    #[serde(default)]
    pub password_env: Option<String>,
    /// Inline enable secret
    #[serde(default)]
    pub enable_password: Option<SecretString>,
    /// Environment variable holding the enable secret
    #[serde(default)]
    pub enable_password_env: Option<String>,
    /// Private key file; `~` and `$VAR` are expanded
    #[serde(default)]
    pub key_path: Option<String>,
}

/// `[[devices]]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceEntry {
    /// Unique device name
    pub name: String,
    /// IP address or hostname
    pub host: String,
    /// SSH port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Vendor tag (`auto`, `cisco`, `hirschmann`, `hp`, `generic`)
    #[serde(default = "default_vendor")]
    pub vendor: String,
    /// Credential reference
    pub credential: String,
    /// Per-device deadline override
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

const fn default_port() -> u16 {
    DEFAULT_SSH_PORT
}

fn default_vendor() -> String {
    "auto".to_string()
}

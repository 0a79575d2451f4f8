//! Sample inventory file

use std::path::Path;

use super::{ConfigError, ConfigResult};

/// Commented sample inventory, written by `netinv template`
pub const INVENTORY_TEMPLATE: &str = r#"# netinv inventory
#
# Devices are collected in the order listed here; the report keeps that order.

[settings]
# Devices processed in parallel
concurrency = 10
# Seconds per connect attempt, per command, and per device overall
connect_timeout_secs = 30
command_timeout_secs = 30
device_timeout_secs = 180
# Undetected devices are tried with the generic parser
generic_fallback = true

[settings.retry]
# Connection failures only; rejected credentials are never retried
max_attempts = 2
initial_delay_ms = 1000
max_delay_ms = 30000
backoff_multiplier = 2.0
enabled = true

[settings.ssh]
strict_host_key_checking = "accept-new"
# Older switches may need legacy algorithms:
# extra_options = ["KexAlgorithms=+diffie-hellman-group14-sha1", "HostKeyAlgorithms=+ssh-rsa"]
extra_options = []
pre_connect_check = true

# Secrets are read from the environment. Inline `password` works too but is
# logged as a warning.
[credentials.core]
username = "admin"
password_env = "NETINV_CORE_PASSWORD"
enable_password_env = "NETINV_CORE_ENABLE"

[credentials.access]
username = "netops"
key_path = "~/.ssh/id_ed25519"

[[devices]]
name = "core-sw-01"
host = "10.0.0.1"
vendor = "cisco"
credential = "core"

[[devices]]
name = "ring-sw-07"
host = "10.0.10.7"
vendor = "hirschmann"
credential = "access"

[[devices]]
name = "edge-sw-12"
host = "edge-sw-12.example.net"
port = 22
# auto: detect from the login banner or `show version`
vendor = "auto"
credential = "access"
timeout_secs = 60

# Profile overrides replace single fields of the built-in vendor profile.
# [profiles.hp]
# setup_commands = ["no page", "terminal width 200"]
#
# [[profiles.hp.commands]]
# name = "show_system"
# command = "show system"
# timeout_secs = 20
# required = true
"#;

/// Writes [`INVENTORY_TEMPLATE`] to a path
///
/// # Errors
///
/// Returns [`ConfigError::AlreadyExists`] if the file exists and `force` is
/// not set, or [`ConfigError::Write`] on I/O failure.
pub fn write_template(path: &Path, force: bool) -> ConfigResult<()> {
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists(path.to_path_buf()));
    }
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    std::fs::write(path, INVENTORY_TEMPLATE).map_err(write_err)?;
    tracing::info!(path = %path.display(), "Inventory template written");
    Ok(())
}

//! Loading and validating inventory files

use std::collections::{BTreeMap, HashSet};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use secrecy::SecretString;
use tracing::{debug, warn};

use crate::collector::{CollectorSettings, MAX_TIMEOUT_SECS};
use crate::models::{Credential, CredentialStore, DeviceTarget, VendorTag};
use crate::transport::SshSettings;
use crate::vendor::AdapterRegistry;

use super::file::{CredentialEntry, DeviceEntry, InventoryFile};
use super::{ConfigError, ConfigResult};

/// One RFC-1123 label; underscores are tolerated as many inventories use them
static HOST_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_](?:[A-Za-z0-9_-]{0,61}[A-Za-z0-9_])?$").expect("HOST_LABEL is a valid regex pattern")
});

/// File format, picked by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// TOML (default)
    Toml,
    /// YAML (`.yaml` / `.yml`)
    Yaml,
}

impl FileFormat {
    /// Format for a path
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase) {
            Some(ext) if ext == "yaml" || ext == "yml" => Self::Yaml,
            _ => Self::Toml,
        }
    }
}

/// Validated inventory, ready to hand to a collector
#[derive(Debug)]
pub struct Inventory {
    /// Targets in file order
    pub targets: Vec<DeviceTarget>,
    /// Credentials referenced by the targets
    pub credentials: CredentialStore,
    /// Timeouts and retry policy
    pub settings: CollectorSettings,
    /// Concurrency limit
    pub concurrency: usize,
    /// SSH client options
    pub ssh: SshSettings,
    /// Adapter registry with profile overrides applied
    pub registry: AdapterRegistry,
}

impl InventoryFile {
    /// Reads an inventory file, TOML or YAML by extension
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Loading inventory file");
        match FileFormat::from_path(path) {
            FileFormat::Toml => Self::from_toml_str(&content),
            FileFormat::Yaml => Self::from_yaml_str(&content),
        }
    }

    /// Parses TOML text
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] on syntax or schema errors.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Parses YAML text
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] on syntax or schema errors.
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Validates the file, reading secrets from the process environment
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] listing every problem found.
    pub fn resolve(self) -> ConfigResult<Inventory> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Validates the file with a custom environment lookup
    ///
    /// Every invalid entry is reported, not just the first one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] listing every problem found.
    pub fn resolve_with<F>(self, env: F) -> ConfigResult<Inventory>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut errors = Vec::new();
        let settings = &self.settings;

        if settings.concurrency == 0 {
            errors.push("settings.concurrency must be at least 1".to_string());
        }
        for (key, value) in [
            ("connect_timeout_secs", settings.connect_timeout_secs),
            ("command_timeout_secs", settings.command_timeout_secs),
            ("device_timeout_secs", settings.device_timeout_secs),
        ] {
            if !(1..=MAX_TIMEOUT_SECS).contains(&value) {
                errors.push(format!("settings.{key} must be between 1 and {MAX_TIMEOUT_SECS}"));
            }
        }
        if settings.detect_command.as_deref().is_some_and(|c| c.trim().is_empty()) {
            errors.push("settings.detect_command must not be empty".to_string());
        }

        let mut credentials = CredentialStore::new();
        for (name, entry) in &self.credentials {
            match resolve_credential(name, entry, &env) {
                Ok(credential) => credentials.insert(name.clone(), credential),
                Err(mut problems) => errors.append(&mut problems),
            }
        }

        if self.devices.is_empty() {
            errors.push("No devices defined".to_string());
        }
        let mut names = HashSet::new();
        let mut targets = Vec::with_capacity(self.devices.len());
        for (idx, entry) in self.devices.iter().enumerate() {
            let label = if entry.name.trim().is_empty() {
                format!("devices[{idx}]")
            } else {
                format!("devices[{idx}] '{}'", entry.name)
            };
            if !entry.name.trim().is_empty() && !names.insert(entry.name.as_str()) {
                errors.push(format!("{label}: duplicate device name"));
                continue;
            }
            if !self.credentials.contains_key(&entry.credential) {
                errors.push(format!("{label}: unknown credential '{}'", entry.credential));
            }
            match device_target(entry) {
                Ok(target) => targets.push(target),
                Err(problems) => errors.extend(problems.into_iter().map(|p| format!("{label}: {p}"))),
            }
        }

        let mut registry = AdapterRegistry::with_defaults().with_generic_fallback(settings.generic_fallback);
        if let Some(command) = &settings.detect_command {
            registry = registry.with_detect_command(command.trim());
        }
        for (vendor, overrides) in &self.profiles {
            let single: BTreeMap<_, _> = std::iter::once((*vendor, overrides.clone())).collect();
            if let Err(err) = registry.apply_overrides(&single) {
                errors.push(format!("profiles.{}: {err}", vendor.key()));
            }
        }

        if !errors.is_empty() {
            return Err(ConfigError::Invalid(errors));
        }

        let collector_settings = CollectorSettings::new()
            .with_connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .with_command_timeout(Duration::from_secs(settings.command_timeout_secs))
            .with_device_timeout(Duration::from_secs(settings.device_timeout_secs))
            .with_retry(settings.retry.clone());

        debug!(
            devices = targets.len(),
            credentials = credentials.len(),
            profiles = self.profiles.len(),
            "Inventory validated"
        );

        Ok(Inventory {
            targets,
            credentials,
            settings: collector_settings,
            concurrency: settings.concurrency,
            ssh: settings.ssh.clone(),
            registry,
        })
    }
}

/// Reads and validates an inventory file
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read, parsed or validated.
pub fn load_inventory(path: &Path) -> ConfigResult<Inventory> {
    InventoryFile::load(path)?.resolve()
}

/// `<config dir>/netinv/inventory.toml`
///
/// # Errors
///
/// Returns [`ConfigError::NoConfigDir`] if the platform has no config
/// directory.
pub fn default_inventory_path() -> ConfigResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("netinv").join("inventory.toml"))
        .ok_or(ConfigError::NoConfigDir)
}

fn resolve_credential<F>(name: &str, entry: &CredentialEntry, env: &F) -> Result<Credential, Vec<String>>
where
    F: Fn(&str) -> Option<String>,
{
    let mut problems = Vec::new();
    let label = format!("credentials.{name}");

    if entry.username.trim().is_empty() {
        problems.push(format!("{label}: username must not be empty"));
    }

    let secret = pick_secret(
        &label,
        "password",
        entry.password.as_ref(),
        entry.password_env.as_deref(),
        env,
        &mut problems,
    );
    let enable_secret = pick_secret(
        &label,
        "enable_password",
        entry.enable_password.as_ref(),
        entry.enable_password_env.as_deref(),
        env,
        &mut problems,
    );

    let key_path = match entry.key_path.as_deref() {
        None => None,
        Some(raw) => match shellexpand::full(raw) {
            Ok(expanded) => Some(PathBuf::from(expanded.into_owned())),
            Err(err) => {
                problems.push(format!("{label}: cannot expand key_path '{raw}': {err}"));
                None
            }
        },
    };

    if !problems.is_empty() {
        return Err(problems);
    }
    Ok(Credential {
        username: entry.username.trim().to_string(),
        secret,
        enable_secret,
        key_path,
    })
}

/// Inline value or environment variable, never both
fn pick_secret<F>(
    label: &str,
    field: &str,
    inline: Option<&SecretString>,
    env_name: Option<&str>,
    env: &F,
    problems: &mut Vec<String>,
) -> Option<SecretString>
where
    F: Fn(&str) -> Option<String>,
{
    match (inline, env_name) {
        (Some(_), Some(_)) => {
            problems.push(format!("{label}: set either {field} or {field}_env, not both"));
            None
        }
        (Some(secret), None) => {
            warn!(credential = %label, field, "Inline secret in inventory file; prefer {field}_env");
            Some(secret.clone())
        }
        (None, Some(var)) => match env(var) {
            Some(value) if !value.is_empty() => Some(SecretString::from(value)),
            _ => {
                problems.push(format!("{label}: environment variable {var} is not set"));
                None
            }
        },
        (None, None) => None,
    }
}

fn device_target(entry: &DeviceEntry) -> Result<DeviceTarget, Vec<String>> {
    let mut problems = Vec::new();

    if entry.name.trim().is_empty() {
        problems.push("name must not be empty".to_string());
    }
    if !is_valid_host(entry.host.trim()) {
        problems.push(format!("invalid host '{}'", entry.host));
    }
    if entry.port == 0 {
        problems.push("port must be between 1 and 65535".to_string());
    }
    if entry.timeout_secs.is_some_and(|secs| !(1..=MAX_TIMEOUT_SECS).contains(&secs)) {
        problems.push(format!("timeout_secs must be between 1 and {MAX_TIMEOUT_SECS}"));
    }
    let vendor = entry.vendor.parse::<VendorTag>().unwrap_or_else(|err| {
        problems.push(err.to_string());
        VendorTag::Auto
    });

    if !problems.is_empty() {
        return Err(problems);
    }

    let mut target = DeviceTarget::new(entry.name.trim(), entry.host.trim(), entry.credential.as_str())
        .with_port(entry.port)
        .with_vendor(vendor);
    if let Some(secs) = entry.timeout_secs {
        target = target.with_timeout(Duration::from_secs(secs));
    }
    Ok(target)
}

/// IPv4/IPv6 literal or RFC-1123 hostname
#[must_use]
pub fn is_valid_host(host: &str) -> bool {
    if host.is_empty() || host.len() > 253 {
        return false;
    }
    if host.parse::<IpAddr>().is_ok() {
        return true;
    }
    // Dotted numbers that failed to parse as an address are typos, not names
    if host.split('.').all(|part| part.chars().all(|c| c.is_ascii_digit())) {
        return false;
    }
    host.trim_end_matches('.').split('.').all(|label| HOST_LABEL.is_match(label))
}

//! Normalized inventory data produced by vendor adapters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::target::{DeviceId, Vendor};

/// One physical or logical interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceInfo {
    /// Interface name as the device prints it (`Gi1/0/1`, `1/1`, `24`)
    pub name: String,
    /// Operational status (`up`, `down`, `connected`, `notconnect`, ...)
    pub status: String,
    /// Speed / mode column if the device reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<String>,
    /// Duplex setting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplex: Option<String>,
    /// Access VLAN
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlan: Option<String>,
    /// Port description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Administrative state (`enabled`, `disabled`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_status: Option<String>,
    /// Media / port type column (`100/1000T`, `10/100/1000BaseTX`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_type: Option<String>,
}

impl InterfaceInfo {
    /// Creates an interface with name and status only
    #[must_use]
    pub fn new(name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: status.into(),
            speed: None,
            duplex: None,
            vlan: None,
            description: None,
            admin_status: None,
            port_type: None,
        }
    }

    /// Sets the speed column
    #[must_use]
    pub fn with_speed(mut self, speed: Option<String>) -> Self {
        self.speed = speed;
        self
    }

    /// Sets the port type column
    #[must_use]
    pub fn with_port_type(mut self, port_type: Option<String>) -> Self {
        self.port_type = port_type;
        self
    }

    /// Returns true if the status reads as up/connected
    #[must_use]
    pub fn is_up(&self) -> bool {
        let status = self.status.to_lowercase();
        status == "up" || status == "connected" || status == "link-up"
    }
}

/// How a forwarding table entry was learned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MacEntryType {
    /// Learned from traffic
    Dynamic,
    /// Configured or permanent
    Static,
}

/// One row of a MAC address table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacEntry {
    /// MAC address as printed
    pub mac_address: String,
    /// VLAN id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlan: Option<String>,
    /// Port the address was learned on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    /// Dynamic or static
    #[serde(rename = "type")]
    pub entry_type: MacEntryType,
}

/// Normalized inventory of one device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    /// Target identity the record belongs to
    pub device: DeviceId,
    /// Hostname reported by the device (falls back to the prompt name)
    pub hostname: String,
    /// Adapter that produced the record
    pub vendor: Vendor,
    /// Hardware model / product code
    pub model: Option<String>,
    /// Chassis serial number
    pub serial: Option<String>,
    /// Firmware / software version
    pub firmware_version: Option<String>,
    /// Uptime string as printed by the device
    pub uptime: Option<String>,
    /// Base MAC address
    pub base_mac: Option<String>,
    /// Interfaces in device order
    pub interfaces: Vec<InterfaceInfo>,
    /// MAC address table, when the profile collects one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mac_entries: Vec<MacEntry>,
    /// Time the record was assembled
    pub collected_at: DateTime<Utc>,
}

impl InventoryRecord {
    /// Creates an empty record to be filled in by a parser
    #[must_use]
    pub fn new(device: DeviceId, hostname: impl Into<String>, vendor: Vendor) -> Self {
        Self {
            device,
            hostname: hostname.into(),
            vendor,
            model: None,
            serial: None,
            firmware_version: None,
            uptime: None,
            base_mac: None,
            interfaces: Vec::new(),
            mac_entries: Vec::new(),
            collected_at: Utc::now(),
        }
    }

    /// Number of interfaces reported as up/connected
    #[must_use]
    pub fn interfaces_up(&self) -> usize {
        self.interfaces.iter().filter(|i| i.is_up()).count()
    }
}

/// Captured output of one command on one device
///
/// Only lives inside a device worker; parsers receive a slice of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCommandOutput {
    /// Device the output came from
    pub device: DeviceId,
    /// Logical command name from the profile (`show_version`)
    pub name: String,
    /// Command text as sent
    pub command: String,
    /// Cleaned output text
    pub text: String,
    /// Capture time
    pub captured_at: DateTime<Utc>,
}

impl RawCommandOutput {
    /// Creates an output captured now
    #[must_use]
    pub fn new(
        device: DeviceId,
        name: impl Into<String>,
        command: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            device,
            name: name.into(),
            command: command.into(),
            text: text.into(),
            captured_at: Utc::now(),
        }
    }
}

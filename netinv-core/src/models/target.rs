//! Device targets and vendor tags

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default SSH port for management sessions
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Identity of a device within one collection run
///
/// Identities are unique per run; the aggregate is keyed by them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Creates a device identity from any string-like value
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identity as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for DeviceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Vendor families with a dedicated adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    /// Cisco IOS / IOS-XE
    Cisco,
    /// Hirschmann HiOS / Classic
    Hirschmann,
    /// HP ProCurve / ArubaOS-Switch
    Hp,
    /// Best-effort fallback for anything else
    Generic,
}

impl Vendor {
    /// All vendors in detection priority order, generic last
    pub const ALL: [Self; 4] = [Self::Cisco, Self::Hirschmann, Self::Hp, Self::Generic];

    /// Lowercase key used in configuration files
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Cisco => "cisco",
            Self::Hirschmann => "hirschmann",
            Self::Hp => "hp",
            Self::Generic => "generic",
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cisco => write!(f, "Cisco"),
            Self::Hirschmann => write!(f, "Hirschmann"),
            Self::Hp => write!(f, "HP"),
            Self::Generic => write!(f, "Generic"),
        }
    }
}

/// Vendor hint declared on a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VendorTag {
    /// Detect the vendor from the login banner
    #[default]
    Auto,
    /// Use the adapter for this vendor
    Declared(Vendor),
}

impl VendorTag {
    /// Returns the declared vendor, if any
    #[must_use]
    pub const fn declared(self) -> Option<Vendor> {
        match self {
            Self::Auto => None,
            Self::Declared(vendor) => Some(vendor),
        }
    }
}

/// Error returned when a vendor tag string is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown vendor '{0}' (expected auto, cisco, hirschmann, hp or generic)")]
pub struct UnknownVendorError(pub String);

impl FromStr for VendorTag {
    type Err = UnknownVendorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "auto" | "detect" => Ok(Self::Auto),
            "cisco" | "cisco_ios" | "cisco_xe" | "ios" => Ok(Self::Declared(Vendor::Cisco)),
            "hirschmann" | "hirschmann_hios" | "hios" => Ok(Self::Declared(Vendor::Hirschmann)),
            "hp" | "hpe" | "procurve" | "hp_procurve" | "aruba" => Ok(Self::Declared(Vendor::Hp)),
            "generic" | "generic_ssh" => Ok(Self::Declared(Vendor::Generic)),
            other => Err(UnknownVendorError(other.to_string())),
        }
    }
}

impl TryFrom<String> for VendorTag {
    type Error = UnknownVendorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VendorTag> for String {
    fn from(value: VendorTag) -> Self {
        value.to_string()
    }
}

impl fmt::Display for VendorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Declared(vendor) => write!(f, "{}", vendor.key()),
        }
    }
}

/// One network device to be inventoried
///
/// Targets are immutable once handed to the collector; the builder methods
/// consume and return `self`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTarget {
    id: DeviceId,
    host: String,
    port: u16,
    vendor: VendorTag,
    credential: String,
    timeout: Option<Duration>,
}

impl DeviceTarget {
    /// Creates a target on the default SSH port with vendor auto-detection
    #[must_use]
    pub fn new(id: impl Into<DeviceId>, host: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            host: host.into(),
            port: DEFAULT_SSH_PORT,
            vendor: VendorTag::Auto,
            credential: credential.into(),
            timeout: None,
        }
    }

    /// Sets the management port
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Declares the vendor instead of detecting it
    #[must_use]
    pub const fn with_vendor(mut self, vendor: VendorTag) -> Self {
        self.vendor = vendor;
        self
    }

    /// Overrides the overall per-device timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Device identity
    pub const fn id(&self) -> &DeviceId {
        &self.id
    }

    /// Hostname or IP address
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Management port
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Declared vendor or `Auto`
    pub const fn vendor(&self) -> VendorTag {
        self.vendor
    }

    /// Name of the credential entry used for this device
    pub fn credential(&self) -> &str {
        &self.credential
    }

    /// Per-device timeout override
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

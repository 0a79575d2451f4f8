//! Core data structures shared by the transport, adapters and collector

mod credential;
mod inventory;
mod result;
mod target;

pub use credential::{Credential, CredentialStore};
pub use inventory::{InterfaceInfo, InventoryRecord, MacEntry, MacEntryType, RawCommandOutput};
pub use result::{DeviceFailure, DeviceOutcome, DeviceResult, FailureKind, OutcomeKind, Stage};
pub use target::{DEFAULT_SSH_PORT, DeviceId, DeviceTarget, UnknownVendorError, Vendor, VendorTag};

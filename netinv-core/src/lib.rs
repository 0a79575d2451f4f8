//! `netinv` Core Library
//!
//! Concurrent multi-vendor inventory collection for network devices: open
//! SSH sessions in parallel, pick the right vendor adapter, run its command
//! sequence, parse the output into normalized records and report every
//! device as either a record or a typed failure.
//!
//! # Crate Structure
//!
//! - [`models`] - Targets, credentials, inventory records and per-device results
//! - [`vendor`] - Vendor adapters (Cisco, Hirschmann, HP, generic) and their profiles
//! - [`transport`] - Session transport traits and the system `ssh` implementation
//! - [`collector`] - Coordinator, device workers, cancellation and aggregation
//! - [`progress`] - Per-device progress events
//! - [`report`] - Report rows and sinks
//! - [`config`] - Inventory file loading and validation
//! - [`text`] - CLI output normalisation shared by transport and parsers

// Enable missing_docs warning for public API documentation
#![warn(missing_docs)]

pub mod collector;
pub mod config;
pub mod error;
pub mod models;
pub mod progress;
pub mod report;
pub mod text;
pub mod tracing;
pub mod transport;
pub mod vendor;

pub use collector::{
    CancellationToken, CollectionAggregate, CollectionSummary, Collector, CollectorSettings, DeviceWorker,
    RetryConfig,
};
pub use config::{ConfigError, ConfigResult, Inventory, InventoryFile, load_inventory};
pub use error::{CollectionError, CollectionResult, NetinvError};
pub use models::{
    Credential, CredentialStore, DeviceFailure, DeviceId, DeviceOutcome, DeviceResult, DeviceTarget, FailureKind,
    InterfaceInfo, InventoryRecord, MacEntry, MacEntryType, OutcomeKind, RawCommandOutput, Stage, Vendor, VendorTag,
};
pub use progress::{CallbackProgress, ChannelProgress, NoOpProgress, ProgressEvent, ProgressReporter};
pub use report::{JsonReportSink, ReportError, ReportResult, ReportRow, ReportSink};
pub use transport::{Session, SshSettings, SshTransport, Transport, TransportError, TransportResult};
pub use vendor::{AdapterRegistry, ParseError, VendorAdapter, VendorProfile};

//! Report rows and sinks
//!
//! A finished [`CollectionAggregate`] is flattened into one [`ReportRow`]
//! per device, in submission order, and handed to a [`ReportSink`]. Rows
//! carry inventory fields and failure details only; credentials never
//! reach this module.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::collector::{CollectionAggregate, CollectionSummary};
use crate::models::{DeviceId, DeviceOutcome, DeviceResult, FailureKind, InterfaceInfo, MacEntry, Stage, Vendor};

/// Errors that can occur while writing a report
#[derive(Debug, Error)]
pub enum ReportError {
    /// Failed to serialize rows
    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Failed to write to the destination
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for report operations
pub type ReportResult<T> = Result<T, ReportError>;

/// Row status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    /// Inventory collected
    Success,
    /// Device failed
    Failure,
}

/// One device in a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Device identity
    pub device: DeviceId,
    /// Host the worker talked to
    pub host: String,
    /// Success or failure
    pub status: RowStatus,
    /// Vendor of the adapter that parsed the output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<Vendor>,
    /// Reported hostname
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// Hardware model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Chassis serial number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    /// Firmware / software version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firmware_version: Option<String>,
    /// Uptime text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<String>,
    /// Base MAC address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_mac: Option<String>,
    /// Interfaces found
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<InterfaceInfo>,
    /// MAC address table entries
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mac_entries: Vec<MacEntry>,
    /// Failure category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<FailureKind>,
    /// Stage that failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_stage: Option<Stage>,
    /// Failure detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Time spent on the device
    pub elapsed_ms: u64,
}

impl ReportRow {
    /// Flattens one result
    #[must_use]
    pub fn from_result(result: &DeviceResult) -> Self {
        let mut row = Self {
            device: result.device.clone(),
            host: result.host.clone(),
            status: RowStatus::Success,
            vendor: None,
            hostname: None,
            model: None,
            serial: None,
            firmware_version: None,
            uptime: None,
            base_mac: None,
            interfaces: Vec::new(),
            mac_entries: Vec::new(),
            failure_kind: None,
            failure_stage: None,
            message: None,
            elapsed_ms: result.elapsed_ms,
        };

        match &result.outcome {
            DeviceOutcome::Success(record) => {
                row.vendor = Some(record.vendor);
                row.hostname = Some(record.hostname.clone());
                row.model.clone_from(&record.model);
                row.serial.clone_from(&record.serial);
                row.firmware_version.clone_from(&record.firmware_version);
                row.uptime.clone_from(&record.uptime);
                row.base_mac.clone_from(&record.base_mac);
                row.interfaces.clone_from(&record.interfaces);
                row.mac_entries.clone_from(&record.mac_entries);
            }
            DeviceOutcome::Failure(failure) => {
                row.status = RowStatus::Failure;
                row.failure_kind = Some(failure.kind);
                row.failure_stage = Some(failure.stage);
                row.message = Some(failure.message.clone());
            }
        }
        row
    }

    /// Returns true for successful devices
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == RowStatus::Success
    }

    /// Number of interfaces reported as up
    #[must_use]
    pub fn interfaces_up(&self) -> usize {
        self.interfaces.iter().filter(|i| i.is_up()).count()
    }
}

/// Report rows for every device, in submission order
#[must_use]
pub fn rows(aggregate: &CollectionAggregate) -> Vec<ReportRow> {
    aggregate.ordered().into_iter().map(ReportRow::from_result).collect()
}

/// Destination for a finished report
pub trait ReportSink {
    /// Renders the rows
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] if the rows cannot be written.
    fn render(&mut self, rows: &[ReportRow]) -> ReportResult<()>;
}

/// JSON document written by [`JsonReportSink`]
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    run_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'a CollectionSummary>,
    devices: &'a [ReportRow],
}

/// Writes rows as a JSON document
pub struct JsonReportSink<W: Write> {
    writer: W,
    pretty: bool,
    run_id: Option<String>,
    summary: Option<CollectionSummary>,
}

impl<W: Write> JsonReportSink<W> {
    /// Creates a sink writing pretty-printed JSON
    pub const fn new(writer: W) -> Self {
        Self {
            writer,
            pretty: true,
            run_id: None,
            summary: None,
        }
    }

    /// Switches between pretty and compact output
    #[must_use]
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Includes the run id and summary of an aggregate in the document
    #[must_use]
    pub fn with_run(mut self, aggregate: &CollectionAggregate) -> Self {
        self.run_id = Some(aggregate.run_id().to_string());
        self.summary = Some(aggregate.summary());
        self
    }

    /// Returns the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportSink for JsonReportSink<W> {
    fn render(&mut self, rows: &[ReportRow]) -> ReportResult<()> {
        let report = JsonReport {
            generated_at: Utc::now(),
            run_id: self.run_id.clone(),
            summary: self.summary.as_ref(),
            devices: rows,
        };
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, &report)?;
        } else {
            serde_json::to_writer(&mut self.writer, &report)?;
        }
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        tracing::debug!(rows = rows.len(), "JSON report written");
        Ok(())
    }
}

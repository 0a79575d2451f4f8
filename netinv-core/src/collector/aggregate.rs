//! Results of one collection run

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{DeviceId, DeviceResult, FailureKind, Vendor};

/// Device identity to result, for one run
///
/// Written only by the coordinator while the run is in progress; read-only
/// once [`crate::collector::Collector::run`] returns. Iteration follows the
/// order the targets were submitted in.
#[derive(Debug, Clone)]
pub struct CollectionAggregate {
    run_id: Uuid,
    order: Vec<DeviceId>,
    results: HashMap<DeviceId, DeviceResult>,
    cancelled: bool,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl CollectionAggregate {
    pub(crate) fn new(run_id: Uuid, order: Vec<DeviceId>) -> Self {
        let capacity = order.len();
        Self {
            run_id,
            order,
            results: HashMap::with_capacity(capacity),
            cancelled: false,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Stores a result; the first result for an identity wins
    pub(crate) fn insert(&mut self, result: DeviceResult) -> bool {
        if self.results.contains_key(&result.device) {
            tracing::warn!(device = %result.device, "Ignoring second result for device");
            return false;
        }
        self.results.insert(result.device.clone(), result);
        true
    }

    pub(crate) fn contains(&self, id: &DeviceId) -> bool {
        self.results.contains_key(id)
    }

    pub(crate) fn finish(&mut self, cancelled: bool) {
        self.cancelled = cancelled;
        self.finished_at = Some(Utc::now());
    }

    /// Unique id of the run
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Number of results
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns true if there are no results
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Result for one device
    #[must_use]
    pub fn get(&self, id: &DeviceId) -> Option<&DeviceResult> {
        self.results.get(id)
    }

    /// Device identities in submission order
    #[must_use]
    pub fn ids(&self) -> &[DeviceId] {
        &self.order
    }

    /// Results in submission order
    #[must_use]
    pub fn ordered(&self) -> Vec<&DeviceResult> {
        self.order.iter().filter_map(|id| self.results.get(id)).collect()
    }

    /// Consumes the aggregate, returning results in submission order
    #[must_use]
    pub fn into_ordered(mut self) -> Vec<DeviceResult> {
        self.order
            .iter()
            .filter_map(|id| self.results.remove(id))
            .collect()
    }

    /// Whether the run was cancelled before every device finished
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Run start time
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Run end time, once the run has finished
    #[must_use]
    pub const fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Wall time of the run
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.finished_at
            .unwrap_or_else(Utc::now)
            .signed_duration_since(self.started_at)
            .to_std()
            .unwrap_or_default()
    }

    /// Totals over all results
    #[must_use]
    pub fn summary(&self) -> CollectionSummary {
        CollectionSummary::from_results(self.ordered(), self.duration())
    }
}

/// Totals for a finished run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSummary {
    /// Number of devices submitted
    pub total: usize,
    /// Devices with an inventory record
    pub succeeded: usize,
    /// Devices that failed (including cancelled ones)
    pub failed: usize,
    /// Devices cancelled before or during processing
    pub cancelled: usize,
    /// Failure counts by kind
    pub by_failure: BTreeMap<FailureKind, usize>,
    /// Success counts by vendor
    pub by_vendor: BTreeMap<Vendor, usize>,
    /// Run wall time in milliseconds
    pub elapsed_ms: u64,
}

impl CollectionSummary {
    /// Builds a summary from results
    #[must_use]
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a DeviceResult>, elapsed: Duration) -> Self {
        let mut summary = Self {
            total: 0,
            succeeded: 0,
            failed: 0,
            cancelled: 0,
            by_failure: BTreeMap::new(),
            by_vendor: BTreeMap::new(),
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        };

        for result in results {
            summary.total += 1;
            if let Some(record) = result.record() {
                summary.succeeded += 1;
                *summary.by_vendor.entry(record.vendor).or_default() += 1;
            } else if let Some(failure) = result.failure_details() {
                summary.failed += 1;
                if failure.kind.is_cancellation() {
                    summary.cancelled += 1;
                }
                *summary.by_failure.entry(failure.kind).or_default() += 1;
            }
        }
        summary
    }

    /// Returns true if every device succeeded
    #[must_use]
    pub const fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    /// Returns true if any device failed
    #[must_use]
    pub const fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// Returns the success rate as a percentage (0.0 to 100.0)
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.succeeded as f64 / self.total as f64) * 100.0
    }

    /// Returns a one-line summary
    #[must_use]
    pub fn summary_string(&self) -> String {
        format!(
            "Total: {}, Succeeded: {}, Failed: {} ({:.1}% success rate)",
            self.total,
            self.succeeded,
            self.failed,
            self.success_rate()
        )
    }
}

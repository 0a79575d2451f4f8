//! Progress reporting for collection runs
//!
//! The coordinator emits exactly one [`ProgressEvent`] per completed device,
//! from its own task, in completion order.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::models::{DeviceId, DeviceResult, OutcomeKind};

/// One device finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Device that finished
    pub device: DeviceId,
    /// Success or failure kind
    pub outcome: OutcomeKind,
    /// Time spent on the device
    pub elapsed: Duration,
    /// Devices finished so far, including this one
    pub completed: usize,
    /// Devices in the run
    pub total: usize,
}

impl ProgressEvent {
    /// Builds the event for a result
    #[must_use]
    pub fn from_result(result: &DeviceResult, completed: usize, total: usize) -> Self {
        Self {
            device: result.device.clone(),
            outcome: result.outcome_kind(),
            elapsed: result.elapsed(),
            completed,
            total,
        }
    }

    /// Returns progress as a fraction (0.0 to 1.0)
    #[must_use]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.completed as f64 / self.total as f64
    }
}

/// Receives progress events
pub trait ProgressReporter: Send + Sync {
    /// Called once per completed device
    fn report(&self, event: &ProgressEvent);
}

/// Discards all events
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpProgress;

impl ProgressReporter for NoOpProgress {
    fn report(&self, _event: &ProgressEvent) {}
}

/// Forwards events to a closure
pub struct CallbackProgress<F>
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    callback: F,
}

impl<F> CallbackProgress<F>
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    /// Wraps a closure
    pub const fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for CallbackProgress<F>
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn report(&self, event: &ProgressEvent) {
        (self.callback)(event);
    }
}

/// Sends events over an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelProgress {
    /// Creates a reporter and the receiving end
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressReporter for ChannelProgress {
    fn report(&self, event: &ProgressEvent) {
        // A dropped receiver just means nobody is watching
        if self.tx.send(event.clone()).is_err() {
            tracing::trace!(device = %event.device, "Progress receiver dropped");
        }
    }
}

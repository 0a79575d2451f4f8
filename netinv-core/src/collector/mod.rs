//! Collection engine: coordinator, device workers and run results
//!
//! [`Collector::run`] fans one [`DeviceWorker`] out per target under a
//! semaphore, gathers every [`crate::models::DeviceResult`] into a
//! [`CollectionAggregate`] and reports progress once per finished device.

mod aggregate;
mod cancel;
mod coordinator;
mod retry;
mod settings;
mod worker;

pub use aggregate::{CollectionAggregate, CollectionSummary};
pub use cancel::CancellationToken;
pub use coordinator::Collector;
pub use retry::{
    DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_INITIAL_DELAY_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY_MS, RetryConfig,
    RetryState,
};
pub use settings::{
    CollectorSettings, DEFAULT_COMMAND_TIMEOUT_SECS, DEFAULT_CONCURRENCY, DEFAULT_CONNECT_TIMEOUT_SECS,
    DEFAULT_DEVICE_TIMEOUT_SECS, MAX_TIMEOUT_SECS,
};
pub use worker::DeviceWorker;

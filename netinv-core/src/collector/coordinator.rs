//! Fan-out of device workers under a concurrency limit

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::error::{CollectionError, CollectionResult};
use crate::models::{
    Credential, CredentialStore, DeviceFailure, DeviceId, DeviceResult, DeviceTarget, FailureKind, Stage, Vendor,
};
use crate::progress::{NoOpProgress, ProgressEvent, ProgressReporter};
use crate::transport::Transport;
use crate::vendor::{AdapterRegistry, ProfileOverride};

use super::aggregate::CollectionAggregate;
use super::cancel::CancellationToken;
use super::settings::CollectorSettings;
use super::worker::DeviceWorker;

/// Runs collections over a set of targets
///
/// Everything a run needs is passed in explicitly, so independent
/// collectors can run side by side in one process.
pub struct Collector {
    transport: Arc<dyn Transport>,
    registry: Arc<AdapterRegistry>,
    credentials: Arc<CredentialStore>,
    settings: Arc<CollectorSettings>,
    progress: Arc<dyn ProgressReporter>,
}

impl Collector {
    /// Creates a collector without progress reporting
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        registry: AdapterRegistry,
        credentials: CredentialStore,
        settings: CollectorSettings,
    ) -> Self {
        Self {
            transport,
            registry: Arc::new(registry),
            credentials: Arc::new(credentials),
            settings: Arc::new(settings),
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Sets the progress reporter
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Applies vendor profile overrides to this collector's registry
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::Registry`] if an override pattern does not
    /// compile or leaves a profile without commands.
    pub fn with_profile_overrides(mut self, overrides: &BTreeMap<Vendor, ProfileOverride>) -> CollectionResult<Self> {
        Arc::make_mut(&mut self.registry).apply_overrides(overrides)?;
        Ok(self)
    }

    /// Adapter registry used for detection and parsing
    #[must_use]
    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    /// Run-wide settings
    #[must_use]
    pub fn settings(&self) -> &CollectorSettings {
        &self.settings
    }

    /// Collects inventory from every target
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError`] if the run is rejected before any device
    /// is contacted. Device failures are reported inside the aggregate.
    pub async fn run(&self, targets: Vec<DeviceTarget>, concurrency: usize) -> CollectionResult<CollectionAggregate> {
        self.run_with_cancel(targets, concurrency, &CancellationToken::new())
            .await
    }

    /// Collects inventory from every target until done or cancelled
    ///
    /// After cancellation the aggregate still holds one result per target:
    /// finished devices keep their result, running ones end as `Cancelled`
    /// at their current stage and queued ones as `Cancelled` at `queued`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError`] if the run is rejected before any device
    /// is contacted.
    #[instrument(skip_all, fields(targets = targets.len(), concurrency = concurrency))]
    pub async fn run_with_cancel(
        &self,
        targets: Vec<DeviceTarget>,
        concurrency: usize,
        cancel: &CancellationToken,
    ) -> CollectionResult<CollectionAggregate> {
        let jobs = self.prepare(targets, concurrency)?;
        let total = jobs.len();
        let run_id = Uuid::new_v4();
        let hosts: HashMap<DeviceId, String> = jobs
            .iter()
            .map(|(target, _)| (target.id().clone(), target.host().to_string()))
            .collect();
        let mut aggregate =
            CollectionAggregate::new(run_id, jobs.iter().map(|(target, _)| target.id().clone()).collect());

        info!(run_id = %run_id, total, concurrency, "Starting collection");

        let worker = Arc::new(DeviceWorker::new(
            Arc::clone(&self.transport),
            Arc::clone(&self.registry),
            Arc::clone(&self.settings),
        ));
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let mut tasks = JoinSet::new();

        for (target, credential) in jobs {
            let worker = Arc::clone(&worker);
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();
            tasks.spawn(async move {
                let permit = tokio::select! {
                    biased;
                    () = cancel.cancelled() => None,
                    permit = semaphore.acquire_owned() => permit.ok(),
                };
                let Some(_permit) = permit else {
                    return DeviceResult::cancelled_before_start(target.id().clone(), target.host());
                };
                if cancel.is_cancelled() {
                    return DeviceResult::cancelled_before_start(target.id().clone(), target.host());
                }
                worker.process(&target, &credential, &cancel).await
            });
        }

        let mut completed = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => self.record(&mut aggregate, result, &mut completed, total),
                Err(err) => error!(error = %err, "Worker task terminated abnormally"),
            }
        }

        // Tasks that died without a result still need an entry
        let missing: Vec<DeviceId> = aggregate
            .ids()
            .iter()
            .filter(|id| !aggregate.contains(id))
            .cloned()
            .collect();
        for id in missing {
            let host = hosts.get(&id).cloned().unwrap_or_default();
            let failure = DeviceFailure::new(FailureKind::Internal, Stage::Queued, "Worker task terminated abnormally");
            let result = DeviceResult::failure(id, host, failure, std::time::Duration::ZERO);
            self.record(&mut aggregate, result, &mut completed, total);
        }

        aggregate.finish(cancel.is_cancelled());
        let summary = aggregate.summary();
        info!(
            run_id = %run_id,
            succeeded = summary.succeeded,
            failed = summary.failed,
            cancelled = aggregate.is_cancelled(),
            elapsed_ms = summary.elapsed_ms,
            "Collection finished"
        );
        Ok(aggregate)
    }

    fn record(&self, aggregate: &mut CollectionAggregate, result: DeviceResult, completed: &mut usize, total: usize) {
        let event = ProgressEvent::from_result(&result, *completed + 1, total);
        if aggregate.insert(result) {
            *completed += 1;
            self.progress.report(&event);
        }
    }

    /// Validates the run and resolves credentials
    fn prepare(
        &self,
        targets: Vec<DeviceTarget>,
        concurrency: usize,
    ) -> CollectionResult<Vec<(DeviceTarget, Credential)>> {
        if targets.is_empty() {
            return Err(CollectionError::EmptyTargets);
        }
        if concurrency == 0 {
            return Err(CollectionError::InvalidConcurrency(concurrency));
        }

        let mut seen = HashSet::with_capacity(targets.len());
        for target in &targets {
            if !seen.insert(target.id().clone()) {
                return Err(CollectionError::DuplicateTarget(target.id().clone()));
            }
        }

        targets
            .into_iter()
            .map(|target| {
                let credential = self.credentials.get(target.credential()).cloned().ok_or_else(|| {
                    CollectionError::MissingCredential {
                        device: target.id().clone(),
                        credential: target.credential().to_string(),
                    }
                })?;
                Ok((target, credential))
            })
            .collect()
    }
}

impl std::fmt::Debug for Collector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collector")
            .field("registry", &self.registry)
            .field("credentials", &self.credentials.names())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

//! Per-device processing: connect, authenticate, detect, command, parse
//!
//! Every error raised while handling one device is turned into a typed
//! [`DeviceFailure`] here; nothing escapes to the coordinator. The session
//! is closed exactly once on every path, including cancellation, the
//! device deadline and panics inside an adapter.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};

use futures::FutureExt;
use tracing::{debug, info, instrument, warn};

use crate::models::{
    Credential, DeviceFailure, DeviceResult, DeviceTarget, FailureKind, InventoryRecord, RawCommandOutput, Stage,
    Vendor,
};
use crate::text;
use crate::transport::{Session, Transport, TransportError, deadline_after};
use crate::vendor::{AdapterRegistry, PROMPT_OUTPUT, VendorAdapter};

use super::cancel::CancellationToken;
use super::retry::RetryState;
use super::settings::CollectorSettings;

/// Enable command used when the vendor is not known yet
const DEFAULT_ENABLE_COMMAND: &str = "enable";

/// Upper bound for closing a session after the device finished
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Stage the worker is currently in, readable from the cancel/deadline arms
struct StageCell(AtomicU8);

impl StageCell {
    const fn new(stage: Stage) -> Self {
        Self(AtomicU8::new(stage.as_u8()))
    }

    fn set(&self, stage: Stage) {
        self.0.store(stage.as_u8(), Ordering::Relaxed);
    }

    fn get(&self) -> Stage {
        Stage::from_u8(self.0.load(Ordering::Relaxed))
    }
}

/// Adapter chosen for a device
struct Selection {
    adapter: Arc<dyn VendorAdapter>,
    /// Picked because nothing else matched
    fallback: bool,
    /// Detection command and its output, reused if the profile runs it again
    detection: Option<(String, String)>,
}

impl Selection {
    const fn failure_kind(&self) -> FailureKind {
        if self.fallback {
            FailureKind::UnsupportedVendor
        } else {
            FailureKind::ParseError
        }
    }
}

/// Processes single devices for a run
///
/// Workers share nothing mutable; one instance is shared by every task of
/// a run.
pub struct DeviceWorker {
    transport: Arc<dyn Transport>,
    registry: Arc<AdapterRegistry>,
    settings: Arc<CollectorSettings>,
}

impl DeviceWorker {
    /// Creates a worker
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        registry: Arc<AdapterRegistry>,
        settings: Arc<CollectorSettings>,
    ) -> Self {
        Self {
            transport,
            registry,
            settings,
        }
    }

    /// Collects inventory from one device
    ///
    /// Never fails: every outcome, including cancellation and the device
    /// deadline, is returned as a [`DeviceResult`].
    #[instrument(skip_all, fields(device = %target.id(), host = %target.host()))]
    pub async fn process(
        &self,
        target: &DeviceTarget,
        credential: &Credential,
        cancel: &CancellationToken,
    ) -> DeviceResult {
        let started = Instant::now();
        let budget = target.timeout().unwrap_or(self.settings.device_timeout);
        let deadline = deadline_after(budget);
        let stage = StageCell::new(Stage::Connect);
        let mut session: Option<Box<dyn Session>> = None;

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(DeviceFailure::new(
                FailureKind::Cancelled,
                stage.get(),
                "Run cancelled while device was in progress",
            )),
            () = tokio::time::sleep_until(deadline) => Err(DeviceFailure::new(
                FailureKind::Timeout,
                stage.get(),
                format!("Device deadline of {}s exceeded", budget.as_secs()),
            )),
            result = AssertUnwindSafe(self.collect(target, credential, &stage, &mut session)).catch_unwind() => {
                result.unwrap_or_else(|panic| Err(DeviceFailure::new(
                    FailureKind::Internal,
                    stage.get(),
                    format!("Worker panicked: {}", panic_message(panic.as_ref())),
                )))
            }
        };

        if let Some(session) = session.take()
            && tokio::time::timeout(CLOSE_TIMEOUT, session.close()).await.is_err()
        {
            warn!("Session did not close in time");
        }

        let elapsed = started.elapsed();
        match outcome {
            Ok(record) => {
                info!(
                    vendor = %record.vendor,
                    interfaces = record.interfaces.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Inventory collected"
                );
                DeviceResult::success(target.id().clone(), target.host(), record, elapsed)
            }
            Err(failure) => {
                warn!(
                    kind = %failure.kind,
                    stage = %failure.stage,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Device failed: {}",
                    failure.message
                );
                DeviceResult::failure(target.id().clone(), target.host(), failure, elapsed)
            }
        }
    }

    async fn collect(
        &self,
        target: &DeviceTarget,
        credential: &Credential,
        stage: &StageCell,
        slot: &mut Option<Box<dyn Session>>,
    ) -> Result<InventoryRecord, DeviceFailure> {
        stage.set(Stage::Connect);
        let session = self.connect(target, credential, slot).await?;

        stage.set(Stage::Authenticate);
        let banner = session.banner().to_string();
        let hint = match target.vendor().declared() {
            Some(vendor) => Some(self.registry.adapter_for(vendor)),
            None => self.registry.detect(&banner),
        };
        self.elevate(credential, session, hint.as_deref()).await?;

        stage.set(Stage::Detect);
        let selection = self.select_adapter(session, &banner, hint).await?;
        let adapter = Arc::clone(&selection.adapter);
        let profile = adapter.profile();
        debug!(vendor = %adapter.vendor(), fallback = selection.fallback, "Adapter selected");

        stage.set(Stage::Command);
        if let Some(pattern) = &profile.prompt_pattern {
            session.set_prompt_pattern(pattern.clone());
        }
        for command in &profile.setup_commands {
            let output = self
                .guarded(session, command, self.settings.command_timeout, Stage::Command)
                .await?;
            if text::is_cli_error(&output) {
                debug!(command = %command, "Setup command rejected");
            }
        }

        let mut outputs = Vec::new();
        for spec in adapter.commands_for(profile) {
            let output = match &selection.detection {
                Some((command, output)) if *command == spec.command => output.clone(),
                _ => {
                    let timeout = spec.timeout.unwrap_or(self.settings.command_timeout);
                    self.guarded(session, &spec.command, timeout, Stage::Command).await?
                }
            };
            if text::is_cli_error(&output) {
                if spec.required {
                    return Err(DeviceFailure::new(
                        selection.failure_kind(),
                        Stage::Command,
                        format!("Device rejected required command '{}'", spec.command),
                    ));
                }
                debug!(command = %spec.command, "Optional command rejected");
            }
            outputs.push(RawCommandOutput::new(
                target.id().clone(),
                spec.name.as_str(),
                spec.command.as_str(),
                output,
            ));
        }
        outputs.push(RawCommandOutput::new(
            target.id().clone(),
            PROMPT_OUTPUT,
            "",
            session.prompt().to_string(),
        ));

        stage.set(Stage::Parse);
        adapter
            .parse(profile, &outputs)
            .map_err(|err| DeviceFailure::new(selection.failure_kind(), Stage::Parse, err.to_string()))
    }

    /// Opens the session, retrying connection failures per the retry policy
    async fn connect<'s>(
        &self,
        target: &DeviceTarget,
        credential: &Credential,
        slot: &'s mut Option<Box<dyn Session>>,
    ) -> Result<&'s mut Box<dyn Session>, DeviceFailure> {
        let timeout = self.settings.connect_timeout;
        let mut retry = RetryState::new(self.settings.retry.clone());

        loop {
            let attempt = tokio::time::timeout(timeout, self.transport.open(target, credential, timeout))
                .await
                .unwrap_or_else(|_| {
                    Err(TransportError::Connect {
                        host: target.host().to_string(),
                        port: target.port(),
                        reason: format!("No response within {}s", timeout.as_secs()),
                    })
                });

            match attempt {
                Ok(session) => {
                    debug!(attempt = retry.attempt_number(), "Session open");
                    return Ok(slot.insert(session));
                }
                Err(err) if err.is_retryable() => {
                    let Some(delay) = retry.next_delay() else {
                        return Err(failure_from(&err, Stage::Connect));
                    };
                    warn!(
                        attempt = retry.attempt_number(),
                        total = retry.total_attempts(),
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Connect failed, retrying"
                    );
                    retry.record_failure();
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(failure_from(&err, Stage::Connect)),
            }
        }
    }

    /// Enters privileged mode when an enable secret is configured and the
    /// device left us at an unprivileged prompt
    async fn elevate(
        &self,
        credential: &Credential,
        session: &mut Box<dyn Session>,
        hint: Option<&dyn VendorAdapter>,
    ) -> Result<(), DeviceFailure> {
        let Some(secret) = credential.enable_secret.as_ref() else {
            return Ok(());
        };
        if !session.prompt().trim_end().ends_with('>') {
            return Ok(());
        }
        let command = match hint {
            Some(adapter) => adapter.profile().enable_command.clone(),
            None => Some(DEFAULT_ENABLE_COMMAND.to_string()),
        };
        let Some(command) = command else {
            debug!("Profile has no enable command, staying unprivileged");
            return Ok(());
        };

        session
            .enable(&command, secret, self.settings.command_timeout)
            .await
            .map_err(|err| failure_from(&err, Stage::Authenticate))?;
        debug!("Privileged mode entered");
        Ok(())
    }

    /// Picks the adapter: declared or banner-detected first, then the
    /// detection command, then the generic fallback
    async fn select_adapter(
        &self,
        session: &mut Box<dyn Session>,
        banner: &str,
        hint: Option<Arc<dyn VendorAdapter>>,
    ) -> Result<Selection, DeviceFailure> {
        if let Some(adapter) = hint {
            let fallback = adapter.vendor() == Vendor::Generic;
            return Ok(Selection {
                adapter,
                fallback,
                detection: None,
            });
        }

        let command = self.registry.detect_command().to_string();
        let output = self
            .guarded(session, &command, self.settings.command_timeout, Stage::Detect)
            .await?;
        let evidence = if text::is_cli_error(&output) {
            banner.to_string()
        } else {
            format!("{banner}\n{output}")
        };

        if let Some(adapter) = self.registry.detect(&evidence) {
            return Ok(Selection {
                adapter,
                fallback: false,
                detection: Some((command, output)),
            });
        }
        if self.registry.allow_generic_fallback() {
            debug!("No vendor matched, using generic adapter");
            return Ok(Selection {
                adapter: self.registry.generic(),
                fallback: true,
                detection: Some((command, output)),
            });
        }
        Err(DeviceFailure::new(
            FailureKind::UnsupportedVendor,
            Stage::Detect,
            format!("No adapter matched the banner or '{command}' output"),
        ))
    }

    /// Runs one command under its timeout
    async fn guarded(
        &self,
        session: &mut Box<dyn Session>,
        command: &str,
        timeout: Duration,
        stage: Stage,
    ) -> Result<String, DeviceFailure> {
        let result = tokio::time::timeout(timeout, session.run(command, timeout))
            .await
            .unwrap_or_else(|_| {
                Err(TransportError::CommandTimeout {
                    command: command.to_string(),
                    timeout,
                })
            });
        result.map_err(|err| failure_from(&err, stage))
    }
}

impl std::fmt::Debug for DeviceWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceWorker")
            .field("registry", &self.registry)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Maps a transport error to a failure; connection and login errors carry
/// their own stage
fn failure_from(err: &TransportError, stage: Stage) -> DeviceFailure {
    let (kind, stage) = match err {
        TransportError::Connect { .. } => (FailureKind::ConnectError, Stage::Connect),
        TransportError::Auth { .. } => (FailureKind::AuthError, Stage::Authenticate),
        TransportError::CommandTimeout { .. } => (FailureKind::CommandTimeout, stage),
        TransportError::Disconnected(_) | TransportError::Io(_) => (FailureKind::TransportError, stage),
    };
    DeviceFailure::new(kind, stage, err.to_string())
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

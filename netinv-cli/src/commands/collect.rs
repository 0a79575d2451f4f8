//! Inventory collection command.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::sync::Arc;
use std::time::Duration;

use netinv_core::collector::MAX_TIMEOUT_SECS;
use netinv_core::report::{self, JsonReportSink, ReportSink};
use netinv_core::{
    CallbackProgress, CancellationToken, Collector, CredentialStore, DeviceTarget, NoOpProgress, OutcomeKind,
    ProgressEvent, ProgressReporter, SshTransport, load_inventory,
};
use secrecy::SecretString;
use tracing::{debug, warn};

use super::{Context, inventory_path};
use crate::cli::{CollectArgs, OutputFormat};
use crate::error::CliError;
use crate::format::{format_report, format_summary};

/// Collect command handler
pub fn cmd_collect(ctx: &Context, args: &CollectArgs) -> Result<(), CliError> {
    let path = inventory_path(args.inventory.as_deref())?;
    let mut inventory = load_inventory(&path)?;

    let targets = select_targets(inventory.targets, &args.devices)?;
    let concurrency = args.concurrency.unwrap_or(inventory.concurrency);
    let mut settings = inventory.settings;
    if let Some(secs) = args.device_timeout {
        if !(1..=MAX_TIMEOUT_SECS).contains(&secs) {
            return Err(CliError::Config(format!(
                "--device-timeout must be between 1 and {MAX_TIMEOUT_SECS}"
            )));
        }
        settings = settings.with_device_timeout(Duration::from_secs(secs));
    }
    if args.ask_pass {
        fill_missing_passwords(&mut inventory.credentials)?;
    }

    let progress: Arc<dyn ProgressReporter> = if ctx.quiet || args.no_progress {
        Arc::new(NoOpProgress)
    } else {
        let color = ctx.color;
        Arc::new(CallbackProgress::new(move |event: &ProgressEvent| {
            eprintln!("{}", progress_line(event, color));
        }))
    };

    let collector = Collector::new(
        Arc::new(SshTransport::new(inventory.ssh)),
        inventory.registry,
        inventory.credentials,
        settings,
    )
    .with_progress(progress);

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::Collection(format!("Failed to create async runtime: {e}")))?;

    debug!(inventory = %path.display(), devices = targets.len(), concurrency, "Collecting");
    let aggregate = runtime.block_on(async {
        let cancel = CancellationToken::new();
        let on_signal = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling collection");
                on_signal.cancel();
            }
        });
        collector.run_with_cancel(targets, concurrency, &cancel).await
    })?;

    let rows = report::rows(&aggregate);
    if let Some(output) = &args.output {
        let file = File::create(output)?;
        let mut sink = JsonReportSink::new(BufWriter::new(file)).with_run(&aggregate);
        sink.render(&rows)?;
        if !ctx.quiet {
            eprintln!("Report written to {}", output.display());
        }
    }

    let summary = aggregate.summary();
    match args.format {
        OutputFormat::Json => {
            let stdout = std::io::stdout();
            let mut sink = JsonReportSink::new(stdout.lock()).with_run(&aggregate);
            sink.render(&rows)?;
        }
        OutputFormat::Table if !ctx.quiet => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", format_report(&rows, ctx.color))?;
            writeln!(stdout)?;
            writeln!(stdout, "{}", format_summary(&summary, aggregate.is_cancelled()))?;
        }
        OutputFormat::Table => {}
    }

    if aggregate.is_cancelled() {
        return Err(CliError::Cancelled);
    }
    if summary.has_failures() {
        return Err(CliError::DevicesFailed {
            failed: summary.failed,
            total: summary.total,
        });
    }
    Ok(())
}

/// Keeps only the named devices, in inventory order
fn select_targets(targets: Vec<DeviceTarget>, names: &[String]) -> Result<Vec<DeviceTarget>, CliError> {
    if names.is_empty() {
        return Ok(targets);
    }
    let known: HashSet<&str> = targets.iter().map(|t| t.id().as_str()).collect();
    let unknown: Vec<&str> = names
        .iter()
        .map(String::as_str)
        .filter(|n| !known.contains(n))
        .collect();
    if !unknown.is_empty() {
        return Err(CliError::Config(format!("Unknown device(s): {}", unknown.join(", "))));
    }
    let wanted: HashSet<&str> = names.iter().map(String::as_str).collect();
    Ok(targets
        .into_iter()
        .filter(|t| wanted.contains(t.id().as_str()))
        .collect())
}

/// Prompts once and hands the password to every credential that has
/// neither a password nor a key
fn fill_missing_passwords(credentials: &mut CredentialStore) -> Result<(), CliError> {
    let missing: Vec<String> = credentials
        .names()
        .into_iter()
        .filter(|name| {
            credentials
                .get(name)
                .is_some_and(|c| !c.has_password() && c.key_path.is_none())
        })
        .map(str::to_string)
        .collect();
    if missing.is_empty() {
        return Ok(());
    }

    let password = rpassword::prompt_password(format!("Password for {}: ", missing.join(", ")))?;
    for name in &missing {
        if let Some(credential) = credentials.get_mut(name) {
            credential.secret = Some(SecretString::from(password.clone()));
        }
    }
    Ok(())
}

fn progress_line(event: &ProgressEvent, color: bool) -> String {
    const GREEN: &str = "\x1b[32m";
    const RED: &str = "\x1b[31m";
    const RESET: &str = "\x1b[0m";

    let width = event.total.to_string().len();
    let (mark, tint) = match event.outcome {
        OutcomeKind::Success => ("ok".to_string(), GREEN),
        OutcomeKind::Failure(kind) => (kind.to_string(), RED),
    };
    let mark = if color { format!("{tint}{mark}{RESET}") } else { mark };
    format!(
        "[{:>width$}/{}] {} {} ({:.1}s)",
        event.completed,
        event.total,
        event.device,
        mark,
        event.elapsed.as_secs_f64()
    )
}

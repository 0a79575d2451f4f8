//! End-to-end collector runs against the scripted transport

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use netinv_core::report::{self, JsonReportSink, ReportSink};
use netinv_core::{
    AdapterRegistry, CallbackProgress, CancellationToken, ChannelProgress, CollectionError, Collector,
    CollectorSettings, Credential, CredentialStore, DeviceId, DeviceOutcome, DeviceTarget, FailureKind, RetryConfig,
    Stage, Vendor, VendorTag,
};

use super::stub::{OpenBehavior, ScriptedDevice, StubStats, StubTransport};

fn credentials() -> CredentialStore {
    CredentialStore::new()
        .with("core", Credential::password("admin", "secret"))
        .with("priv", Credential::password("admin", "secret").with_enable_secret("letmein"))
}

fn fast_settings() -> CollectorSettings {
    CollectorSettings::new()
        .with_connect_timeout(Duration::from_secs(2))
        .with_command_timeout(Duration::from_secs(2))
        .with_device_timeout(Duration::from_secs(10))
        .with_retry(RetryConfig::no_retry())
}

fn collector(transport: StubTransport, settings: CollectorSettings) -> (Collector, Arc<StubStats>) {
    let stats = transport.stats();
    let collector = Collector::new(Arc::new(transport), AdapterRegistry::with_defaults(), credentials(), settings);
    (collector, stats)
}

fn target(id: &str, host: &str) -> DeviceTarget {
    DeviceTarget::new(id, host, "core")
}

fn failure_of(aggregate: &netinv_core::CollectionAggregate, id: &str) -> (FailureKind, Stage) {
    let result = aggregate.get(&DeviceId::new(id)).expect("result present");
    let failure = result.failure_details().expect(&format!("{id} should have failed"));
    (failure.kind, failure.stage)
}

#[tokio::test]
async fn test_mixed_run_reports_every_device() {
    let transport = StubTransport::new()
        .device("10.0.0.1", ScriptedDevice::cisco("core-sw01"))
        .device("10.0.0.2", ScriptedDevice::unreachable())
        .device("10.0.0.3", ScriptedDevice::hp("floor2").with_open(OpenBehavior::RejectLogin));
    let (collector, stats) = collector(transport, fast_settings());

    let targets = vec![
        target("A", "10.0.0.1"),
        target("B", "10.0.0.2"),
        target("C", "10.0.0.3").with_vendor(VendorTag::Declared(Vendor::Hp)),
    ];
    let aggregate = collector.run(targets, 2).await.unwrap();

    let ids: HashSet<_> = aggregate.ids().iter().map(DeviceId::as_str).collect();
    assert_eq!(ids, HashSet::from(["A", "B", "C"]));
    assert_eq!(aggregate.len(), 3);

    let a = aggregate.get(&DeviceId::new("A")).unwrap();
    let record = a.record().expect("A should succeed");
    assert_eq!(record.vendor, Vendor::Cisco);
    assert_eq!(record.hostname, "core-sw01");
    assert_eq!(record.firmware_version.as_deref(), Some("15.2(4)E10"));
    assert_eq!(record.interfaces.len(), 2);

    assert_eq!(failure_of(&aggregate, "B"), (FailureKind::ConnectError, Stage::Connect));
    assert_eq!(failure_of(&aggregate, "C"), (FailureKind::AuthError, Stage::Authenticate));

    // B never got a session, so no command could have been sent
    assert!(stats.commands_for("10.0.0.2").is_empty());
    assert_eq!(stats.opens(), stats.closes());

    let summary = aggregate.summary();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 2);
    assert!(!aggregate.is_cancelled());
}

#[tokio::test]
async fn test_connect_failures_are_retried() {
    let transport = StubTransport::new().device("10.0.0.2", ScriptedDevice::unreachable());
    let settings = fast_settings().with_retry(
        RetryConfig::new()
            .with_max_attempts(2)
            .with_initial_delay_ms(5)
            .with_max_delay_ms(10),
    );
    let (collector, stats) = collector(transport, settings);

    let aggregate = collector.run(vec![target("B", "10.0.0.2")], 1).await.unwrap();

    assert_eq!(failure_of(&aggregate, "B"), (FailureKind::ConnectError, Stage::Connect));
    assert_eq!(stats.attempts(), 3);
    assert_eq!(stats.opens(), 0);
}

#[tokio::test]
async fn test_command_timeout_closes_session_once() {
    let transport =
        StubTransport::new().device("10.0.0.1", ScriptedDevice::cisco("core-sw01").hang_on("show version"));
    let settings = fast_settings().with_command_timeout(Duration::from_millis(100));
    let (collector, stats) = collector(transport, settings);

    let aggregate = collector.run(vec![target("A", "10.0.0.1")], 1).await.unwrap();

    assert_eq!(failure_of(&aggregate, "A"), (FailureKind::CommandTimeout, Stage::Command));
    assert_eq!(stats.opens(), 1);
    assert_eq!(stats.closes(), 1);
}

#[tokio::test]
async fn test_device_deadline_becomes_timeout() {
    let transport = StubTransport::new().device(
        "10.0.0.1",
        ScriptedDevice::cisco("core-sw01").with_delay(Duration::from_millis(150)),
    );
    let (collector, stats) = collector(transport, fast_settings());

    let targets = vec![target("A", "10.0.0.1").with_timeout(Duration::from_millis(250))];
    let aggregate = collector.run(targets, 1).await.unwrap();

    assert_eq!(failure_of(&aggregate, "A"), (FailureKind::Timeout, Stage::Command));
    assert_eq!(stats.closes(), 1);
}

#[tokio::test]
async fn test_concurrency_limit_is_respected() {
    let mut transport = StubTransport::new();
    let mut targets = Vec::new();
    for i in 0..6 {
        let host = format!("10.0.1.{i}");
        transport = transport.device(
            &host,
            ScriptedDevice::cisco(&format!("sw{i}")).with_delay(Duration::from_millis(20)),
        );
        targets.push(target(&format!("sw{i}"), &host));
    }
    let (collector, stats) = collector(transport, fast_settings());

    let aggregate = collector.run(targets, 2).await.unwrap();

    assert!(aggregate.summary().all_succeeded());
    assert!(stats.peak() <= 2, "peak concurrency was {}", stats.peak());
    assert_eq!(stats.opens(), 6);
    assert_eq!(stats.closes(), 6);
}

#[tokio::test]
async fn test_results_keep_input_order() {
    let mut transport = StubTransport::new();
    let mut targets = Vec::new();
    for i in 0..5u64 {
        let host = format!("10.0.2.{i}");
        // Earlier devices are slower so completion order is reversed
        transport = transport.device(
            &host,
            ScriptedDevice::cisco(&format!("sw{i}")).with_delay(Duration::from_millis(5 * (5 - i))),
        );
        targets.push(target(&format!("dev-{i}"), &host));
    }
    let expected: Vec<String> = targets.iter().map(|t| t.id().to_string()).collect();
    let (collector, _) = collector(transport, fast_settings());

    let aggregate = collector.run(targets, 5).await.unwrap();
    let ordered: Vec<String> = aggregate.ordered().iter().map(|r| r.device.to_string()).collect();

    assert_eq!(ordered, expected);
}

/// Runs a fixed fleet with per-device command delays and renders the JSON
/// report with timing fields blanked
async fn render_run(delays_ms: [u64; 4]) -> String {
    let transport = StubTransport::new()
        .device(
            "10.0.3.1",
            ScriptedDevice::cisco("core-sw01").with_delay(Duration::from_millis(delays_ms[0])),
        )
        .device(
            "10.0.3.2",
            ScriptedDevice::hp("floor2").with_delay(Duration::from_millis(delays_ms[1])),
        )
        .device(
            "10.0.3.3",
            ScriptedDevice::generic("odd-1").with_delay(Duration::from_millis(delays_ms[2])),
        )
        .device("10.0.3.4", ScriptedDevice::unreachable().with_delay(Duration::from_millis(delays_ms[3])));
    let (collector, _) = collector(transport, fast_settings());
    let targets = vec![
        target("core", "10.0.3.1"),
        target("floor", "10.0.3.2"),
        target("odd", "10.0.3.3"),
        target("gone", "10.0.3.4"),
    ];
    let aggregate = collector.run(targets, 4).await.unwrap();

    let mut rows = report::rows(&aggregate);
    for row in &mut rows {
        row.elapsed_ms = 0;
    }
    let mut sink = JsonReportSink::new(Vec::new());
    sink.render(&rows).unwrap();
    String::from_utf8(sink.into_inner())
        .unwrap()
        .lines()
        .filter(|line| !line.trim_start().starts_with("\"generated_at\""))
        .collect::<Vec<_>>()
        .join("\n")
}

#[tokio::test]
async fn test_json_report_is_identical_across_runs() {
    let first = render_run([40, 30, 20, 0]).await;
    let second = render_run([0, 20, 30, 40]).await;

    assert_eq!(first, second);
    let core = first.find("\"core\"").unwrap();
    let gone = first.find("\"gone\"").unwrap();
    assert!(core < gone);
}

#[tokio::test]
async fn test_unbounded_timeouts_do_not_overflow() {
    let transport = StubTransport::new().device("10.0.0.1", ScriptedDevice::cisco("core-sw01"));
    let settings = fast_settings().with_device_timeout(Duration::from_secs(u64::MAX));
    let (collector, stats) = collector(transport, settings);

    let targets = vec![
        target("A", "10.0.0.1"),
        target("B", "10.0.0.1").with_timeout(Duration::MAX),
    ];
    let aggregate = collector.run(targets, 2).await.unwrap();

    assert!(aggregate.summary().all_succeeded());
    assert_eq!(stats.opens(), stats.closes());
}

#[tokio::test]
async fn test_one_progress_event_per_device() {
    let transport = StubTransport::new()
        .device("10.0.0.1", ScriptedDevice::cisco("core-sw01"))
        .device("10.0.0.3", ScriptedDevice::hp("floor2"));
    let (progress, mut events) = ChannelProgress::channel();
    let (collector, _) = collector(transport, fast_settings());
    let collector = collector.with_progress(Arc::new(progress));

    let targets = vec![
        target("A", "10.0.0.1"),
        target("B", "10.0.0.2"),
        target("C", "10.0.0.3"),
    ];
    collector.run(targets, 3).await.unwrap();

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        assert_eq!(event.total, 3);
        seen.push((event.device.to_string(), event.completed));
    }
    assert_eq!(seen.len(), 3);
    let devices: HashSet<_> = seen.iter().map(|(d, _)| d.as_str()).collect();
    assert_eq!(devices, HashSet::from(["A", "B", "C"]));
    let counts: Vec<_> = seen.iter().map(|(_, c)| *c).collect();
    assert_eq!(counts, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_cancel_after_some_devices() {
    let mut transport = StubTransport::new();
    let mut targets = Vec::new();
    for i in 0..5 {
        let host = format!("10.0.3.{i}");
        transport = transport.device(
            &host,
            ScriptedDevice::cisco(&format!("sw{i}")).with_delay(Duration::from_millis(30)),
        );
        targets.push(target(&format!("sw{i}"), &host));
    }
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let progress = CallbackProgress::new(move |event| {
        if event.completed == 2 {
            trigger.cancel();
        }
    });
    let (collector, stats) = collector(transport, fast_settings());
    let collector = collector.with_progress(Arc::new(progress));

    let aggregate = collector.run_with_cancel(targets, 1, &cancel).await.unwrap();

    assert!(aggregate.is_cancelled());
    assert_eq!(aggregate.len(), 5);
    let summary = aggregate.summary();
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.by_failure.get(&FailureKind::Cancelled), Some(&3));
    for result in aggregate.ordered().into_iter().skip(2) {
        match &result.outcome {
            DeviceOutcome::Failure(failure) => assert_eq!(failure.kind, FailureKind::Cancelled),
            DeviceOutcome::Success(_) => panic!("{} should have been cancelled", result.device),
        }
    }
    // Queued devices never got a session; in-flight ones were closed
    assert_eq!(stats.opens(), stats.closes());
    assert!(stats.opens() <= 3);
}

#[tokio::test]
async fn test_cancel_before_start_marks_all_queued() {
    let transport = StubTransport::new().device("10.0.0.1", ScriptedDevice::cisco("core-sw01"));
    let (collector, stats) = collector(transport, fast_settings());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let aggregate = collector
        .run_with_cancel(vec![target("A", "10.0.0.1"), target("B", "10.0.0.2")], 2, &cancel)
        .await
        .unwrap();

    assert_eq!(failure_of(&aggregate, "A"), (FailureKind::Cancelled, Stage::Queued));
    assert_eq!(failure_of(&aggregate, "B"), (FailureKind::Cancelled, Stage::Queued));
    assert_eq!(stats.opens(), 0);
}

#[tokio::test]
async fn test_undetected_device_uses_generic_fallback() {
    let transport = StubTransport::new().device("10.0.0.9", ScriptedDevice::generic("edge-9"));
    let (collector, stats) = collector(transport, fast_settings());

    let aggregate = collector.run(vec![target("E", "10.0.0.9")], 1).await.unwrap();

    let record = aggregate.get(&DeviceId::new("E")).unwrap().record().unwrap();
    assert_eq!(record.vendor, Vendor::Generic);
    assert_eq!(record.model.as_deref(), Some("AX-200"));
    assert_eq!(record.hostname, "edge-9");
    // The detection output is reused for the generic profile's `show version`
    let commands = stats.commands_for("10.0.0.9");
    assert_eq!(commands.iter().filter(|c| *c == "show version").count(), 1);
}

#[tokio::test]
async fn test_undetected_device_without_fallback_is_unsupported() {
    let transport = StubTransport::new().device("10.0.0.9", ScriptedDevice::generic("edge-9"));
    let stats = transport.stats();
    let collector = Collector::new(
        Arc::new(transport),
        AdapterRegistry::with_defaults().with_generic_fallback(false),
        credentials(),
        fast_settings(),
    );

    let aggregate = collector.run(vec![target("E", "10.0.0.9")], 1).await.unwrap();

    assert_eq!(failure_of(&aggregate, "E"), (FailureKind::UnsupportedVendor, Stage::Detect));
    assert_eq!(stats.closes(), 1);
}

#[tokio::test]
async fn test_required_command_rejected_is_parse_error() {
    let transport = StubTransport::new().device(
        "10.0.0.1",
        ScriptedDevice::cisco("core-sw01").respond("show version", super::stub::REJECTED),
    );
    let (collector, _) = collector(transport, fast_settings());

    let targets = vec![target("A", "10.0.0.1").with_vendor(VendorTag::Declared(Vendor::Cisco))];
    let aggregate = collector.run(targets, 1).await.unwrap();

    assert_eq!(failure_of(&aggregate, "A"), (FailureKind::ParseError, Stage::Command));
}

#[tokio::test]
async fn test_enable_secret_rejected_is_auth_error() {
    let transport = StubTransport::new().device(
        "10.0.0.1",
        ScriptedDevice::new("\nUser Access Verification\n", "core-sw01>").with_enable_secret("other"),
    );
    let (collector, stats) = collector(transport, fast_settings());

    let targets = vec![DeviceTarget::new("A", "10.0.0.1", "priv")];
    let aggregate = collector.run(targets, 1).await.unwrap();

    assert_eq!(failure_of(&aggregate, "A"), (FailureKind::AuthError, Stage::Authenticate));
    assert!(stats.commands_for("10.0.0.1").is_empty());
    assert_eq!(stats.closes(), 1);
}

#[tokio::test]
async fn test_enable_secret_accepted_collects() {
    let device = ScriptedDevice::new("\nUser Access Verification\n", "core-sw01>")
        .with_enable_secret("letmein")
        .respond("terminal length 0", "")
        .respond("show version", super::stub::CISCO_SHOW_VERSION);
    let transport = StubTransport::new().device("10.0.0.1", device);
    let (collector, _) = collector(transport, fast_settings());

    let aggregate = collector
        .run(vec![DeviceTarget::new("A", "10.0.0.1", "priv")], 1)
        .await
        .unwrap();

    assert!(aggregate.get(&DeviceId::new("A")).unwrap().is_success());
}

#[tokio::test]
async fn test_panicking_session_is_internal_failure() {
    let transport = StubTransport::new()
        .device("10.0.0.1", ScriptedDevice::cisco("core-sw01").panic_on("show version"))
        .device("10.0.0.3", ScriptedDevice::hp("floor2"));
    let (collector, stats) = collector(transport, fast_settings());

    let aggregate = collector
        .run(vec![target("A", "10.0.0.1"), target("C", "10.0.0.3")], 2)
        .await
        .unwrap();

    assert_eq!(failure_of(&aggregate, "A"), (FailureKind::Internal, Stage::Command));
    assert!(aggregate.get(&DeviceId::new("C")).unwrap().is_success());
    assert_eq!(stats.opens(), stats.closes());
}

#[tokio::test]
async fn test_run_level_errors_contact_nothing() {
    let transport = StubTransport::new().device("10.0.0.1", ScriptedDevice::cisco("core-sw01"));
    let (collector, stats) = collector(transport, fast_settings());

    assert!(matches!(collector.run(Vec::new(), 2).await, Err(CollectionError::EmptyTargets)));
    assert!(matches!(
        collector.run(vec![target("A", "10.0.0.1")], 0).await,
        Err(CollectionError::InvalidConcurrency(0))
    ));
    assert!(matches!(
        collector
            .run(vec![target("A", "10.0.0.1"), target("A", "10.0.0.2")], 2)
            .await,
        Err(CollectionError::DuplicateTarget(id)) if id.as_str() == "A"
    ));
    assert!(matches!(
        collector
            .run(vec![DeviceTarget::new("A", "10.0.0.1", "nobody")], 2)
            .await,
        Err(CollectionError::MissingCredential { credential, .. }) if credential == "nobody"
    ));
    assert_eq!(stats.opens(), 0);
}

//! Inventory file to report: load, collect, render

use std::sync::Arc;

use netinv_core::report::{self, JsonReportSink, ReportSink};
use netinv_core::{Collector, ConfigError, DeviceId, InventoryFile, Vendor, load_inventory};

use super::stub::{ScriptedDevice, StubTransport};

const INVENTORY: &str = r#"
[settings]
concurrency = 2
command_timeout_secs = 5

[settings.retry]
enabled = false

[credentials.core]
username = "admin"
password = "inline-secret"

[[devices]]
name = "core-sw01"
host = "10.0.0.1"
vendor = "cisco"
credential = "core"

[[devices]]
name = "floor2"
host = "10.0.0.3"
credential = "core"

[profiles.hp]
setup_commands = ["no page", "terminal width 200"]

[[profiles.hp.commands]]
name = "show_system"
command = "show system"
"#;

#[tokio::test]
async fn test_inventory_file_drives_a_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inventory.toml");
    std::fs::write(&path, INVENTORY).unwrap();

    let inventory = load_inventory(&path).unwrap();
    assert_eq!(inventory.concurrency, 2);
    assert_eq!(inventory.targets.len(), 2);

    let transport = StubTransport::new()
        .device("10.0.0.1", ScriptedDevice::cisco("core-sw01"))
        .device("10.0.0.3", ScriptedDevice::hp("floor2"));
    let stats = transport.stats();
    let collector = Collector::new(
        Arc::new(transport),
        inventory.registry,
        inventory.credentials,
        inventory.settings,
    );

    let aggregate = collector.run(inventory.targets, inventory.concurrency).await.unwrap();
    assert!(aggregate.summary().all_succeeded());

    let hp = aggregate.get(&DeviceId::new("floor2")).unwrap().record().unwrap();
    assert_eq!(hp.vendor, Vendor::Hp);
    assert_eq!(hp.hostname, "HP-2920-Floor2");
    assert_eq!(
        stats.commands_for("10.0.0.3"),
        vec!["no page", "terminal width 200", "show system"]
    );

    let rows = report::rows(&aggregate);
    let mut sink = JsonReportSink::new(Vec::new()).with_run(&aggregate);
    sink.render(&rows).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&sink.into_inner()).unwrap();

    let devices = json["devices"].as_array().unwrap();
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0]["device"], "core-sw01");
    assert_eq!(devices[1]["device"], "floor2");
    assert_eq!(json["summary"]["succeeded"], 2);
    assert!(!String::from_utf8_lossy(&serde_json::to_vec(&json).unwrap()).contains("inline-secret"));
}

#[test]
fn test_invalid_inventory_lists_every_problem() {
    let file = InventoryFile::from_toml_str(
        r#"
        [settings]
        concurrency = 0

        [credentials.core]
        username = "admin"
        password_env = "NETINV_TEST_UNSET_PASSWORD"

        [[devices]]
        name = "a"
        host = "bad host!"
        credential = "missing"
        vendor = "juniper"

        [[devices]]
        name = "a"
        host = "10.0.0.2"
        credential = "core"
        "#,
    )
    .unwrap();

    let Err(ConfigError::Invalid(errors)) = file.resolve_with(|_| None) else {
        panic!("inventory should be rejected");
    };
    assert!(errors.iter().any(|e| e.contains("concurrency")));
    assert!(errors.iter().any(|e| e.contains("unknown credential 'missing'")));
    assert!(errors.iter().any(|e| e.contains("juniper")));
    assert!(errors.iter().any(|e| e.contains("duplicate device name")));
}

//! Scripted in-memory transport
//!
//! Each host gets a [`ScriptedDevice`] describing its banner, prompt and the
//! output of every command it knows. Unknown commands answer with an IOS
//! style rejection. [`StubStats`] records opens, closes, peak concurrency
//! and every command sent.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use netinv_core::{Credential, DeviceTarget, Session, Transport, TransportError, TransportResult};
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};

pub const REJECTED: &str = "% Invalid input detected at '^' marker.";

pub const CISCO_SHOW_VERSION: &str = "\
Cisco IOS Software, C2960X Software (C2960X-UNIVERSALK9-M), Version 15.2(4)E10, RELEASE SOFTWARE (fc2)
Technical Support: http://www.cisco.com/techsupport

core-sw01 uptime is 1 year, 2 weeks, 3 days, 4 hours, 5 minutes

cisco WS-C2960X-48FPD-L (APM86XXX) processor (revision V02) with 524288K bytes of memory.
Processor board ID FOC1234X0AB

Base ethernet MAC Address       : 00:11:22:33:44:55
Model number                    : WS-C2960X-48FPD-L
System serial number            : FOC1234X0AB
";

pub const CISCO_SHOW_INTERFACES_STATUS: &str = "\
Port      Name               Status       Vlan       Duplex  Speed Type
Gi1/0/1                      notconnect   1            auto   auto 10/100/1000BaseTX
Gi1/0/2   uplink to core     connected    trunk      a-full a-1000 10/100/1000BaseTX
";

pub const HP_SHOW_SYSTEM: &str = "
 Status and Counters - General System Information

  System Name        : HP-2920-Floor2
  Software revision  : WB.16.10.0012        Base MAC Addr      : 001122-334455
  ROM Version        : WB.16.03.0003        Serial Number      : SG12ABC345
  Up Time            : 23 days              Memory   - Total   : 1,090,000,000
";

pub const GENERIC_SHOW_VERSION: &str =
    "Acme NetOS\nSoftware Version: 4.2.1-build7\nModel: AX-200\nSerial Number: AX2000012345\n";

/// How `open` behaves for a host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenBehavior {
    Accept,
    Refuse,
    RejectLogin,
}

/// Scripted behavior of one host
#[derive(Debug, Clone)]
pub struct ScriptedDevice {
    banner: String,
    prompt: String,
    responses: HashMap<String, String>,
    hang: HashSet<String>,
    delay: Duration,
    open: OpenBehavior,
    enable_secret: Option<String>,
    panic_on: Option<String>,
}

impl ScriptedDevice {
    pub fn new(banner: &str, prompt: &str) -> Self {
        Self {
            banner: banner.to_string(),
            prompt: prompt.to_string(),
            responses: HashMap::new(),
            hang: HashSet::new(),
            delay: Duration::ZERO,
            open: OpenBehavior::Accept,
            enable_secret: None,
            panic_on: None,
        }
    }

    pub fn cisco(hostname: &str) -> Self {
        Self::new("\nUser Access Verification\n", &format!("{hostname}#"))
            .respond("terminal length 0", "")
            .respond("show version", CISCO_SHOW_VERSION)
            .respond("show interfaces status", CISCO_SHOW_INTERFACES_STATUS)
    }

    pub fn hp(hostname: &str) -> Self {
        Self::new("HP J9727A 2920-24G-PoE+ Switch\nPress any key to continue\n", &format!("{hostname}#"))
            .respond("no page", "")
            .respond("show system", HP_SHOW_SYSTEM)
    }

    pub fn generic(hostname: &str) -> Self {
        Self::new("Welcome to the management shell\n", &format!("{hostname}>")).respond("show version", GENERIC_SHOW_VERSION)
    }

    pub fn unreachable() -> Self {
        Self::new("", "").with_open(OpenBehavior::Refuse)
    }

    pub fn respond(mut self, command: &str, output: &str) -> Self {
        self.responses.insert(command.to_string(), output.to_string());
        self
    }

    pub fn hang_on(mut self, command: &str) -> Self {
        self.hang.insert(command.to_string());
        self
    }

    pub fn panic_on(mut self, command: &str) -> Self {
        self.panic_on = Some(command.to_string());
        self
    }

    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub const fn with_open(mut self, open: OpenBehavior) -> Self {
        self.open = open;
        self
    }

    pub fn with_enable_secret(mut self, secret: &str) -> Self {
        self.enable_secret = Some(secret.to_string());
        self
    }
}

/// Counters shared by the transport and its sessions
#[derive(Debug, Default)]
pub struct StubStats {
    attempts: AtomicUsize,
    opens: AtomicUsize,
    closes: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
    commands: Mutex<Vec<(String, String)>>,
}

impl StubStats {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn commands_for(&self, host: &str) -> Vec<String> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .filter(|(h, _)| h == host)
            .map(|(_, c)| c.clone())
            .collect()
    }

    fn opened(&self) {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn closed(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Transport serving [`ScriptedDevice`]s by host
#[derive(Debug, Default)]
pub struct StubTransport {
    devices: HashMap<String, ScriptedDevice>,
    stats: Arc<StubStats>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn device(mut self, host: &str, device: ScriptedDevice) -> Self {
        self.devices.insert(host.to_string(), device);
        self
    }

    pub fn stats(&self) -> Arc<StubStats> {
        Arc::clone(&self.stats)
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn open(
        &self,
        target: &DeviceTarget,
        credential: &Credential,
        _timeout: Duration,
    ) -> TransportResult<Box<dyn Session>> {
        self.stats.attempts.fetch_add(1, Ordering::SeqCst);
        let device = self.devices.get(target.host()).cloned().unwrap_or_else(ScriptedDevice::unreachable);
        match device.open {
            OpenBehavior::Refuse => Err(TransportError::Connect {
                host: target.host().to_string(),
                port: target.port(),
                reason: "Connection refused".into(),
            }),
            OpenBehavior::RejectLogin => Err(TransportError::Auth {
                host: target.host().to_string(),
                username: credential.username.clone(),
                reason: "Permission denied".into(),
            }),
            OpenBehavior::Accept => {
                self.stats.opened();
                Ok(Box::new(StubSession {
                    host: target.host().to_string(),
                    device,
                    stats: Arc::clone(&self.stats),
                }))
            }
        }
    }
}

struct StubSession {
    host: String,
    device: ScriptedDevice,
    stats: Arc<StubStats>,
}

#[async_trait]
impl Session for StubSession {
    fn banner(&self) -> &str {
        &self.device.banner
    }

    fn prompt(&self) -> &str {
        &self.device.prompt
    }

    fn set_prompt_pattern(&mut self, _pattern: Regex) {}

    async fn run(&mut self, command: &str, _timeout: Duration) -> TransportResult<String> {
        self.stats
            .commands
            .lock()
            .unwrap()
            .push((self.host.clone(), command.to_string()));
        if self.device.panic_on.as_deref() == Some(command) {
            panic!("scripted panic on '{command}'");
        }
        if self.device.hang.contains(command) {
            std::future::pending::<()>().await;
        }
        if !self.device.delay.is_zero() {
            tokio::time::sleep(self.device.delay).await;
        }
        Ok(self
            .device
            .responses
            .get(command)
            .cloned()
            .unwrap_or_else(|| REJECTED.to_string()))
    }

    async fn enable(&mut self, _command: &str, secret: &SecretString, _timeout: Duration) -> TransportResult<()> {
        match &self.device.enable_secret {
            Some(expected) if expected == secret.expose_secret() => {
                self.device.prompt = self.device.prompt.trim_end_matches('>').to_string() + "#";
                Ok(())
            }
            _ => Err(TransportError::Auth {
                host: self.host.clone(),
                username: "enable".into(),
                reason: "Bad secrets".into(),
            }),
        }
    }

    async fn close(self: Box<Self>) {
        self.stats.closed();
    }
}

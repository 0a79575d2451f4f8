//! SSH transport over the system OpenSSH client
//!
//! Each session is one `ssh -tt` child process (or `sshpass -e ssh -tt` for
//! password logins) driven through its stdin/stdout. The password is handed
//! to `sshpass` through the `SSHPASS` environment variable and never appears
//! in the argument vector.

use std::process::Stdio;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use super::{Session, Transport, TransportError, TransportResult, check_port, deadline_after};
use crate::models::{Credential, DeviceTarget};
use crate::text;

/// Matches a typical CLI prompt on the last line of output
static DEFAULT_PROMPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w.\-@()/:\[\]~ ]{1,80}[>#$%]\s?$").expect("DEFAULT_PROMPT is a valid regex pattern")
});

static PASSWORD_PROMPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)password:\s*$").expect("PASSWORD_PROMPT is a valid regex pattern"));

static AUTH_FAILURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)permission denied|authentication failed|too many authentication failures|access denied|login incorrect|login invalid|bad secrets",
    )
    .expect("AUTH_FAILURE is a valid regex pattern")
});

/// `sshpass` exit status for a rejected password
const SSHPASS_WRONG_PASSWORD: i32 = 5;

/// Time allowed for the child to exit after `exit` or a failed login
const CLOSE_GRACE: Duration = Duration::from_secs(2);

const READ_CHUNK: usize = 4096;

/// Settings for the system SSH client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SshSettings {
    /// `ssh` executable
    pub program: String,
    /// `sshpass` executable used for password logins
    pub sshpass_program: String,
    /// Value for `-o StrictHostKeyChecking=`
    pub strict_host_key_checking: String,
    /// Additional `-o` options (`KexAlgorithms=+diffie-hellman-group14-sha1`)
    pub extra_options: Vec<String>,
    /// Check the TCP port before spawning `ssh`
    pub pre_connect_check: bool,
}

impl Default for SshSettings {
    fn default() -> Self {
        Self {
            program: "ssh".to_string(),
            sshpass_program: "sshpass".to_string(),
            strict_host_key_checking: "accept-new".to_string(),
            extra_options: Vec::new(),
            pre_connect_check: true,
        }
    }
}

/// Transport that spawns the system `ssh` client
#[derive(Debug, Clone, Default)]
pub struct SshTransport {
    settings: SshSettings,
}

impl SshTransport {
    /// Creates a transport with the given settings
    #[must_use]
    pub const fn new(settings: SshSettings) -> Self {
        Self { settings }
    }

    /// Returns the transport settings
    #[must_use]
    pub const fn settings(&self) -> &SshSettings {
        &self.settings
    }

    /// Arguments passed to `ssh` for a target (without the program itself)
    fn ssh_args(&self, target: &DeviceTarget, credential: &Credential, timeout: Duration) -> Vec<String> {
        let mut args = vec![
            "-tt".to_string(),
            "-o".to_string(),
            format!("StrictHostKeyChecking={}", self.settings.strict_host_key_checking),
            "-o".to_string(),
            format!("ConnectTimeout={}", timeout.as_secs().max(1)),
            "-o".to_string(),
            "NumberOfPasswordPrompts=1".to_string(),
        ];

        if !credential.has_password() {
            args.push("-o".to_string());
            args.push("BatchMode=yes".to_string());
        }

        for option in &self.settings.extra_options {
            args.push("-o".to_string());
            args.push(option.clone());
        }

        args.push("-p".to_string());
        args.push(target.port().to_string());
        args.push("-l".to_string());
        args.push(credential.username.clone());

        if let Some(key) = &credential.key_path {
            args.push("-i".to_string());
            args.push(key.display().to_string());
        }

        args.push(target.host().to_string());
        args
    }

    fn spawn(&self, target: &DeviceTarget, credential: &Credential, timeout: Duration) -> TransportResult<Child> {
        let mut cmd = match &credential.secret {
            Some(secret) if credential.has_password() => {
                let mut cmd = Command::new(&self.settings.sshpass_program);
                cmd.arg("-e").arg(&self.settings.program);
                cmd.env("SSHPASS", secret.expose_secret());
                cmd
            }
            _ => Command::new(&self.settings.program),
        };

        cmd.args(self.ssh_args(target, credential, timeout))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        cmd.spawn().map_err(|e| TransportError::Connect {
            host: target.host().to_string(),
            port: target.port(),
            reason: format!("Failed to spawn SSH client: {e}"),
        })
    }
}

#[async_trait]
impl Transport for SshTransport {
    async fn open(
        &self,
        target: &DeviceTarget,
        credential: &Credential,
        timeout: Duration,
    ) -> TransportResult<Box<dyn Session>> {
        if self.settings.pre_connect_check {
            check_port(target.host(), target.port(), timeout)
                .await
                .map_err(|e| TransportError::Connect {
                    host: target.host().to_string(),
                    port: target.port(),
                    reason: e.to_string(),
                })?;
        }

        let login = Login {
            host: target.host().to_string(),
            port: target.port(),
            username: credential.username.clone(),
            via_sshpass: credential.has_password(),
        };
        let child = self.spawn(target, credential, timeout)?;
        let session = SshSession::attach(child, login, timeout).await?;
        Ok(Box::new(session))
    }
}

/// Connection facts needed to classify failures
#[derive(Debug, Clone)]
struct Login {
    host: String,
    port: u16,
    username: String,
    via_sshpass: bool,
}

impl Login {
    fn connect_error(&self, reason: impl Into<String>) -> TransportError {
        TransportError::Connect {
            host: self.host.clone(),
            port: self.port,
            reason: reason.into(),
        }
    }

    fn auth_error(&self, reason: impl Into<String>) -> TransportError {
        TransportError::Auth {
            host: self.host.clone(),
            username: self.username.clone(),
            reason: reason.into(),
        }
    }

    /// Maps a client that exited before showing a prompt to an error
    fn classify_exit(&self, stderr: &str, stdout: &str, code: Option<i32>) -> TransportError {
        let reason = stderr
            .lines()
            .rev()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map_or_else(
                || format!("SSH client exited with status {}", code.map_or_else(|| "unknown".to_string(), |c| c.to_string())),
                str::to_string,
            );

        let rejected = AUTH_FAILURE.is_match(stderr)
            || AUTH_FAILURE.is_match(stdout)
            || (self.via_sshpass && code == Some(SSHPASS_WRONG_PASSWORD));
        if rejected {
            self.auth_error(reason)
        } else {
            self.connect_error(reason)
        }
    }
}

enum ReadError {
    Timeout,
    Eof(String),
    Io(std::io::Error),
}

/// Reads until the last line matches one of `patterns`, answering pager
/// prompts on the way. Returns the cleaned text and the matching index.
async fn read_until(
    stdout: &mut ChildStdout,
    stdin: &mut ChildStdin,
    patterns: &[&Regex],
    timeout: Duration,
) -> Result<(String, usize), ReadError> {
    let deadline = deadline_after(timeout);
    let mut raw = Vec::new();
    let mut chunk = [0u8; READ_CHUNK];
    let mut answered_line = None;

    loop {
        let n = match tokio::time::timeout_at(deadline, stdout.read(&mut chunk)).await {
            Err(_) => return Err(ReadError::Timeout),
            Ok(Err(e)) => return Err(ReadError::Io(e)),
            Ok(Ok(0)) => return Err(ReadError::Eof(text::clean_output(&String::from_utf8_lossy(&raw)))),
            Ok(Ok(n)) => n,
        };
        raw.extend_from_slice(&chunk[..n]);

        let cleaned = text::clean_output(&String::from_utf8_lossy(&raw));
        let tail = text::last_line(&cleaned);

        if text::ends_with_pager(&cleaned) {
            let line_no = cleaned.lines().count();
            if answered_line != Some(line_no) {
                answered_line = Some(line_no);
                let key: &[u8] = if tail.to_lowercase().contains("press any key") { b"\n" } else { b" " };
                stdin.write_all(key).await.map_err(ReadError::Io)?;
                stdin.flush().await.map_err(ReadError::Io)?;
            }
            continue;
        }

        if let Some(idx) = patterns.iter().position(|re| re.is_match(tail)) {
            return Ok((text::strip_pager_prompts(&cleaned), idx));
        }
    }
}

/// Interactive CLI session over an `ssh` child process
pub struct SshSession {
    child: Child,
    stdin: ChildStdin,
    stdout: ChildStdout,
    login: Login,
    banner: String,
    prompt: String,
    prompt_pattern: Regex,
}

impl SshSession {
    /// Waits for the first prompt on a freshly spawned client
    async fn attach(mut child: Child, login: Login, timeout: Duration) -> TransportResult<Self> {
        let (Some(mut stdin), Some(mut stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(TransportError::Io("SSH client stdio was not captured".to_string()));
        };

        let result = read_until(&mut stdout, &mut stdin, &[&DEFAULT_PROMPT, &PASSWORD_PROMPT], timeout).await;
        match result {
            Ok((output, 0)) => {
                let (banner, prompt) = text::split_response(&output, "");
                if AUTH_FAILURE.is_match(&banner) {
                    kill(&mut child).await;
                    return Err(login.auth_error("Device rejected the login"));
                }
                tracing::debug!(host = %login.host, prompt = %prompt, "SSH session established");
                Ok(Self {
                    child,
                    stdin,
                    stdout,
                    login,
                    banner,
                    prompt,
                    prompt_pattern: DEFAULT_PROMPT.clone(),
                })
            }
            Ok(_) => {
                kill(&mut child).await;
                Err(login.auth_error("Device prompted for a password again"))
            }
            Err(ReadError::Timeout) => {
                kill(&mut child).await;
                Err(login.connect_error(format!("No prompt within {}s", timeout.as_secs())))
            }
            Err(ReadError::Io(e)) => {
                kill(&mut child).await;
                Err(login.connect_error(e.to_string()))
            }
            Err(ReadError::Eof(output)) => {
                let code = match tokio::time::timeout(CLOSE_GRACE, child.wait()).await {
                    Ok(Ok(status)) => status.code(),
                    _ => {
                        kill(&mut child).await;
                        None
                    }
                };
                let mut stderr = String::new();
                if let Some(mut pipe) = child.stderr.take() {
                    let _ = tokio::time::timeout(CLOSE_GRACE, pipe.read_to_string(&mut stderr)).await;
                }
                Err(login.classify_exit(&stderr, &output, code))
            }
        }
    }

    async fn send_line(&mut self, line: &str) -> TransportResult<()> {
        let disconnected = |e: std::io::Error| TransportError::Disconnected(e.to_string());
        self.stdin.write_all(line.as_bytes()).await.map_err(disconnected)?;
        self.stdin.write_all(b"\n").await.map_err(disconnected)?;
        self.stdin.flush().await.map_err(disconnected)
    }

    async fn read_response(
        &mut self,
        patterns: &[&Regex],
        command: &str,
        timeout: Duration,
    ) -> TransportResult<(String, usize)> {
        read_until(&mut self.stdout, &mut self.stdin, patterns, timeout)
            .await
            .map_err(|e| match e {
                ReadError::Timeout => TransportError::CommandTimeout {
                    command: command.to_string(),
                    timeout,
                },
                ReadError::Eof(_) => TransportError::Disconnected(format!("End of stream while running '{command}'")),
                ReadError::Io(e) => TransportError::Disconnected(e.to_string()),
            })
    }
}

async fn kill(child: &mut Child) {
    if let Err(e) = child.kill().await {
        tracing::debug!(error = %e, "Failed to kill SSH client");
    }
}

#[async_trait]
impl Session for SshSession {
    fn banner(&self) -> &str {
        &self.banner
    }

    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn set_prompt_pattern(&mut self, pattern: Regex) {
        self.prompt_pattern = pattern;
    }

    async fn run(&mut self, command: &str, timeout: Duration) -> TransportResult<String> {
        self.send_line(command).await?;
        let prompt = self.prompt_pattern.clone();
        let (output, _) = self.read_response(&[&prompt], command, timeout).await?;
        let (body, prompt) = text::split_response(&output, command);
        self.prompt = prompt;
        Ok(body)
    }

    async fn enable(&mut self, command: &str, secret: &SecretString, timeout: Duration) -> TransportResult<()> {
        self.send_line(command).await?;
        let prompt = self.prompt_pattern.clone();
        let (mut output, idx) = self
            .read_response(&[&PASSWORD_PROMPT, &prompt], command, timeout)
            .await?;

        if idx == 0 {
            self.send_line(secret.expose_secret()).await?;
            let (after, idx) = self
                .read_response(&[&PASSWORD_PROMPT, &prompt], command, timeout)
                .await?;
            if idx == 0 {
                return Err(self.login.auth_error("Enable secret rejected"));
            }
            output = after;
        }

        let (_, new_prompt) = text::split_response(&output, command);
        self.prompt = new_prompt;
        if AUTH_FAILURE.is_match(&output) || !self.prompt.ends_with('#') {
            return Err(self.login.auth_error("Enable secret rejected"));
        }
        tracing::debug!(host = %self.login.host, "Entered privileged mode");
        Ok(())
    }

    async fn close(mut self: Box<Self>) {
        // The child may already be gone
        let _ = self.send_line("exit").await;
        if tokio::time::timeout(CLOSE_GRACE, self.child.wait()).await.is_err() {
            kill(&mut self.child).await;
        }
        tracing::debug!(host = %self.login.host, "SSH session closed");
    }
}

impl std::fmt::Debug for SshSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshSession")
            .field("host", &self.login.host)
            .field("port", &self.login.port)
            .field("prompt", &self.prompt)
            .finish_non_exhaustive()
    }
}

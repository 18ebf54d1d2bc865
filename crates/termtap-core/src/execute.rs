//! The execution engine: mark, send, poll until genuinely idle (or
//! matched, or out of time), slice the exact output.
//!
//! Commands within one pane are strictly serial — the pane's lock is held
//! from the health check through the completion hooks. Panes are
//! independent. Handler hooks run under that lock, so a hook must never
//! execute another command on the same pane.

use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use termtap_process::Readiness;
use termtap_tmux::{send_keys, send_via_paste_buffer};

use crate::error::TermtapError;
use crate::pane::Pane;
use crate::pattern::ReadyScanner;

/// Commands at or above this many bytes take the paste-buffer route even
/// without embedded newlines.
pub const PASTE_THRESHOLD: usize = 1000;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long after sending before a byte-less stream counts as a stale
/// pipe. The pane echoes the command line immediately, so a healthy
/// mirror always has bytes well before this.
const PIPE_GRACE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PastePreference {
    /// Paste route for multi-line or oversized commands, direct otherwise.
    #[default]
    Auto,
    Always,
    Never,
}

/// What to run and how long to wait for it.
#[derive(Debug, Clone)]
pub struct ExecuteRequest {
    pub command: String,
    pub wait: bool,
    pub timeout: Duration,
    /// Completion condition for services that never go idle: a regex
    /// matched against newly produced output.
    pub ready_pattern: Option<String>,
    pub paste: PastePreference,
}

impl ExecuteRequest {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            wait: true,
            timeout: Duration::from_secs(30),
            ready_pattern: None,
            paste: PastePreference::Auto,
        }
    }

    #[must_use]
    pub fn no_wait(mut self) -> Self {
        self.wait = false;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_ready_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.ready_pattern = Some(pattern.into());
        self
    }

    #[must_use]
    pub fn with_paste(mut self, paste: PastePreference) -> Self {
        self.paste = paste;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandStatus {
    /// The pane went idle again after the command.
    Completed,
    /// The ready pattern matched while the process kept running.
    Ready,
    Timeout,
    Aborted,
    /// Sent without waiting; the command is still running.
    Running,
}

impl CommandStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Ready => "ready",
            Self::Timeout => "timeout",
            Self::Aborted => "aborted",
            Self::Running => "running",
        }
    }
}

impl std::fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured result handed back to the driver.
#[derive(Debug, Clone, Serialize)]
pub struct CommandResult {
    pub cmd_id: String,
    pub status: CommandStatus,
    pub output: String,
    pub process: Option<String>,
    pub shell: Option<String>,
    pub pane_address: String,
    pub elapsed_seconds: f64,
}

pub(crate) async fn execute(
    pane: &Pane,
    request: ExecuteRequest,
    cancel: CancellationToken,
) -> Result<CommandResult, TermtapError> {
    let supervisor = pane.supervisor().clone();
    supervisor.ensure_not_current(pane.id())?;

    // Serialize against other commands on this pane for the whole of
    // mark → send → poll → slice.
    let pane_lock = supervisor.lock_for(pane.id());
    let _guard = pane_lock.lock().await;

    let address = pane.address()?;
    let stream = supervisor.streams().get_or_create(pane.id(), &address);
    stream.start(supervisor.runner())?;

    // Stale-pipe recovery: if the previous command never produced a byte,
    // the mirror is suspect. Re-attach before marking so this command's
    // output is captured.
    if !stream.is_healthy() {
        stream.restart_pipe(supervisor.runner())?;
    }

    let cmd_id = supervisor.mint_cmd_id();
    stream.mark_command(&cmd_id, &request.command)?;

    // Consume any interrupt flagged before this command started.
    supervisor.take_interrupt(pane.id());

    let procs = pane.refresh_processes()?;
    let handler = supervisor.handler_for(&procs);

    let command = match handler.before_send(&procs, &request.command, supervisor.confirmer()) {
        Ok(command) => command,
        Err(e) => {
            stream.mark_command_end(&cmd_id)?;
            return Err(e.into());
        }
    };

    let use_paste = match request.paste {
        PastePreference::Always => true,
        PastePreference::Never => false,
        PastePreference::Auto => command.contains('\n') || command.len() >= PASTE_THRESHOLD,
    };
    if use_paste {
        send_via_paste_buffer(supervisor.runner(), pane.id(), &command, true)?;
    } else {
        send_keys(supervisor.runner(), pane.id(), &command, true)?;
    }

    let started = tokio::time::Instant::now();

    if !request.wait {
        tracing::debug!(pane = %pane.id(), %cmd_id, "sent without waiting");
        return Ok(CommandResult {
            cmd_id,
            status: CommandStatus::Running,
            output: String::new(),
            process: procs.process_name().map(String::from),
            shell: procs.shell_name().map(String::from),
            pane_address: address,
            elapsed_seconds: started.elapsed().as_secs_f64(),
        });
    }

    let mut scanner = match request.ready_pattern.as_deref() {
        Some(pattern) => Some(ReadyScanner::new(pattern)?),
        None => None,
    };
    let mut scan_pos = stream.command_start(&cmd_id).unwrap_or(0);
    let deadline = started + request.timeout;
    let mut pipe_checked = false;

    let status = loop {
        if cancel.is_cancelled() || supervisor.take_interrupt(pane.id()) {
            break CommandStatus::Aborted;
        }
        if tokio::time::Instant::now() >= deadline {
            break CommandStatus::Timeout;
        }
        // A mirror that has not even delivered the command echo by now is
        // stale; re-attach so the rest of the output is captured.
        if !pipe_checked && started.elapsed() >= PIPE_GRACE {
            pipe_checked = true;
            if !stream.is_healthy() {
                stream.restart_pipe(supervisor.runner())?;
            }
        }
        if let Some(scanner) = scanner.as_mut() {
            let size = stream.size();
            if size > scan_pos {
                let chunk = stream.read_between(scan_pos, size)?;
                scan_pos = size;
                if scanner.push(&chunk) {
                    break CommandStatus::Ready;
                }
            }
        }
        // A vanished pane (killed session, dead server) surfaces here as
        // a tmux error on the leader-pid query.
        match pane.refresh_processes() {
            Ok(procs) => {
                let verdict = supervisor.handler_for(&procs).is_ready(&procs);
                match verdict.readiness {
                    Readiness::Ready => break CommandStatus::Completed,
                    Readiness::Busy | Readiness::Unknown => {
                        tracing::trace!(pane = %pane.id(), reason = %verdict.reason, "still waiting");
                    }
                }
            }
            Err(e) => {
                tracing::debug!(pane = %pane.id(), "pane unreachable during poll: {e}");
                break CommandStatus::Aborted;
            }
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    };

    stream.mark_command_end(&cmd_id)?;
    let raw = stream.read_command_output(&cmd_id)?;
    let output = trim_command_echo(&raw, &command);

    let final_procs = pane.processes().unwrap_or_default();
    supervisor.handler_for(&final_procs).after_complete(&final_procs);

    tracing::debug!(pane = %pane.id(), %cmd_id, status = %status, "command finished");
    Ok(CommandResult {
        cmd_id,
        status,
        output,
        process: final_procs.process_name().map(String::from),
        shell: final_procs.shell_name().map(String::from),
        pane_address: address,
        elapsed_seconds: started.elapsed().as_secs_f64(),
    })
}

/// Drop the leading echo line when it repeats the submitted command.
/// Heuristic: the pane echoes keystrokes back, so the slice usually opens
/// with the command text itself.
fn trim_command_echo(output: &str, command: &str) -> String {
    let Some((first, rest)) = output.split_once('\n') else {
        return if first_line_is_echo(output, command) {
            String::new()
        } else {
            output.to_string()
        };
    };
    if first_line_is_echo(first, command) {
        rest.to_string()
    } else {
        output.to_string()
    }
}

fn first_line_is_echo(line: &str, command: &str) -> bool {
    // Only the command's first line is echoed before any output appears;
    // paste-routed multi-line commands echo that line too.
    let echoed = command.lines().next().unwrap_or(command).trim();
    line.trim_end_matches('\r').trim() == echoed
}

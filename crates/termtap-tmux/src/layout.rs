//! Session, window and pane lifecycle operations.

use crate::error::TmuxError;
use crate::executor::TmuxCommandRunner;

/// One row of `list-sessions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub name: String,
    pub attached: bool,
}

pub fn session_exists(runner: &impl TmuxCommandRunner, name: &str) -> bool {
    runner.run(&["has-session", "-t", name]).is_ok()
}

pub fn list_sessions(runner: &impl TmuxCommandRunner) -> Result<Vec<SessionInfo>, TmuxError> {
    let out = match runner.run(&["list-sessions", "-F", "#{session_name}\t#{session_attached}"]) {
        Ok(out) => out,
        // No server running means no sessions, not a failure.
        Err(TmuxError::NoServer) => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    Ok(out
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|line| {
            let (name, attached) = line.split_once('\t').unwrap_or((line, "0"));
            SessionInfo {
                name: name.to_string(),
                attached: attached.trim() == "1",
            }
        })
        .collect())
}

/// Create a detached session, returning the id of its first pane.
pub fn create_session(
    runner: &impl TmuxCommandRunner,
    name: &str,
    cwd: Option<&str>,
    env: &[(String, String)],
    shell_command: Option<&str>,
) -> Result<String, TmuxError> {
    let mut args: Vec<String> = vec![
        "new-session".into(),
        "-d".into(),
        "-s".into(),
        name.into(),
        "-P".into(),
        "-F".into(),
        "#{pane_id}".into(),
    ];
    if let Some(dir) = cwd {
        args.push("-c".into());
        args.push(dir.into());
    }
    for (key, value) in env {
        args.push("-e".into());
        args.push(format!("{key}={value}"));
    }
    if let Some(cmd) = shell_command {
        args.push(cmd.into());
    }
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    let out = runner.run(&arg_refs)?;
    Ok(out.trim().to_string())
}

/// Create a window in an existing session, returning its first pane id.
pub fn create_window(
    runner: &impl TmuxCommandRunner,
    session: &str,
    name: &str,
    cwd: Option<&str>,
) -> Result<String, TmuxError> {
    let mut args: Vec<String> = vec![
        "new-window".into(),
        "-t".into(),
        session.into(),
        "-n".into(),
        name.into(),
        "-P".into(),
        "-F".into(),
        "#{pane_id}".into(),
    ];
    if let Some(dir) = cwd {
        args.push("-c".into());
        args.push(dir.into());
    }
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    let out = runner.run(&arg_refs)?;
    Ok(out.trim().to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitDirection {
    Horizontal,
    Vertical,
}

/// Split a pane, returning the new pane's id.
pub fn split_pane(
    runner: &impl TmuxCommandRunner,
    pane_id: &str,
    cwd: Option<&str>,
    direction: SplitDirection,
) -> Result<String, TmuxError> {
    let dir_flag = match direction {
        SplitDirection::Horizontal => "-h",
        SplitDirection::Vertical => "-v",
    };
    let mut args: Vec<String> = vec![
        "split-window".into(),
        dir_flag.into(),
        "-t".into(),
        pane_id.into(),
        "-P".into(),
        "-F".into(),
        "#{pane_id}".into(),
    ];
    if let Some(dir) = cwd {
        args.push("-c".into());
        args.push(dir.into());
    }
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    let out = runner.run(&arg_refs)?;
    Ok(out.trim().to_string())
}

pub fn kill_pane(runner: &impl TmuxCommandRunner, pane_id: &str) -> Result<(), TmuxError> {
    runner.run(&["kill-pane", "-t", pane_id])?;
    Ok(())
}

pub fn kill_session(runner: &impl TmuxCommandRunner, name: &str) -> Result<(), TmuxError> {
    runner.run(&["kill-session", "-t", name])?;
    Ok(())
}

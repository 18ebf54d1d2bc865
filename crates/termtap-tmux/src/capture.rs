//! Pane content capture from the tmux buffer.

use crate::error::TmuxError;
use crate::executor::TmuxCommandRunner;

/// Capture the currently visible content of a pane.
pub fn capture_visible(
    runner: &impl TmuxCommandRunner,
    pane_id: &str,
) -> Result<String, TmuxError> {
    runner.run(&["capture-pane", "-p", "-t", pane_id])
}

/// Capture the entire pane history including scrollback.
pub fn capture_all(runner: &impl TmuxCommandRunner, pane_id: &str) -> Result<String, TmuxError> {
    runner.run(&["capture-pane", "-p", "-S", "-", "-t", pane_id])
}

/// Capture the last `n` lines of a pane.
pub fn capture_last_n(
    runner: &impl TmuxCommandRunner,
    pane_id: &str,
    n: u32,
) -> Result<String, TmuxError> {
    let start_line = format!("-{n}");
    runner.run(&["capture-pane", "-p", "-S", &start_line, "-t", pane_id])
}

//! pipe-pane stream control: mirror a pane's output to a file on disk.
//!
//! The pipe appends (`cat >>`) so a restart after a stale pipe never
//! truncates previously captured bytes and existing mark offsets stay
//! valid.

use std::path::Path;

use crate::error::TmuxError;
use crate::executor::TmuxCommandRunner;

/// Whether the pane currently has an output pipe attached.
pub fn pipe_started(runner: &impl TmuxCommandRunner, pane_id: &str) -> Result<bool, TmuxError> {
    let out = runner.run(&["display-message", "-p", "-t", pane_id, "#{pane_pipe}"])?;
    Ok(out.trim() == "1")
}

/// Begin mirroring the pane's output to `path`. No-op when a pipe is
/// already attached.
pub fn start_pipe(
    runner: &impl TmuxCommandRunner,
    pane_id: &str,
    path: &Path,
) -> Result<(), TmuxError> {
    if pipe_started(runner, pane_id)? {
        return Ok(());
    }
    let shell_cmd = format!("cat >> '{}'", path.display().to_string().replace('\'', "'\\''"));
    // -o only opens a new pipe when none is attached, guarding the race
    // between the check above and this call.
    runner.run(&["pipe-pane", "-o", "-t", pane_id, &shell_cmd])?;
    Ok(())
}

/// Detach the pane's output pipe. No-op when none is attached.
pub fn stop_pipe(runner: &impl TmuxCommandRunner, pane_id: &str) -> Result<(), TmuxError> {
    // An empty command detaches; tmux tolerates detaching an unpiped pane.
    runner.run(&["pipe-pane", "-t", pane_id])?;
    Ok(())
}

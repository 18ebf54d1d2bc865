//! Keystroke and paste-buffer delivery.
//!
//! Single-line text goes through `send-keys -l` (literal, no key-name
//! interpretation). Multi-line or oversized text is routed through a named
//! paste buffer: one `set-buffer`, one `paste-buffer -d`, one logical paste
//! on the receiving side instead of tmux's per-line send amplification.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::error::TmuxError;
use crate::executor::TmuxCommandRunner;

/// Send literal text to a pane, optionally followed by Enter.
pub fn send_keys(
    runner: &impl TmuxCommandRunner,
    pane_id: &str,
    text: &str,
    press_enter: bool,
) -> Result<(), TmuxError> {
    runner.run(&["send-keys", "-t", pane_id, "-l", text])?;
    if press_enter {
        runner.run(&["send-keys", "-t", pane_id, "Enter"])?;
    }
    Ok(())
}

/// Send a symbolic key by tmux key name (`C-c`, `Up`, `Escape`, ...).
pub fn send_key(
    runner: &impl TmuxCommandRunner,
    pane_id: &str,
    key_name: &str,
) -> Result<(), TmuxError> {
    runner.run(&["send-keys", "-t", pane_id, key_name])?;
    Ok(())
}

/// Deterministic short buffer name derived from the content hash, so a
/// retry of the same text reuses (overwrites) the same buffer.
pub fn paste_buffer_name(text: &str) -> String {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    format!("termtap-{:08x}", hasher.finish() as u32)
}

/// Deliver text through a named paste buffer: create, paste, delete.
pub fn send_via_paste_buffer(
    runner: &impl TmuxCommandRunner,
    pane_id: &str,
    text: &str,
    press_enter: bool,
) -> Result<(), TmuxError> {
    let buffer = paste_buffer_name(text);
    runner.run(&["set-buffer", "-b", &buffer, text])?;
    // -d deletes the buffer after pasting, -p uses bracketed paste when the
    // receiving application asked for it.
    runner.run(&["paste-buffer", "-d", "-p", "-t", pane_id, "-b", &buffer])?;
    if press_enter {
        runner.run(&["send-keys", "-t", pane_id, "Enter"])?;
    }
    Ok(())
}

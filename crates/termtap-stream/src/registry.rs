//! Stream registry: one [`PaneStream`] per pane, owned by the supervisor.
//! No module-level state — the registry's lifetime is the supervisor's.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use termtap_tmux::TmuxCommandRunner;

use crate::stream::PaneStream;

/// Per-user stream directory: `$XDG_STATE_HOME/termtap/streams`, falling
/// back to `/tmp/termtap-$USER/streams`.
pub fn default_stream_dir() -> PathBuf {
    if let Ok(state) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(state).join("termtap").join("streams");
    }
    let user = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    PathBuf::from(format!("/tmp/termtap-{user}")).join("streams")
}

pub struct StreamRegistry {
    dir: PathBuf,
    panes: Mutex<HashMap<String, Arc<PaneStream>>>,
}

impl StreamRegistry {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            panes: Mutex::new(HashMap::new()),
        }
    }

    /// The stream for a pane, created (but not started) on first request.
    pub fn get_or_create(&self, pane_id: &str, address: &str) -> Arc<PaneStream> {
        let mut panes = self.lock();
        panes
            .entry(pane_id.to_string())
            .or_insert_with(|| Arc::new(PaneStream::new(&self.dir, pane_id, address)))
            .clone()
    }

    /// The stream for a pane if one was already created.
    pub fn get(&self, pane_id: &str) -> Option<Arc<PaneStream>> {
        self.lock().get(pane_id).cloned()
    }

    /// Stop every active stream. Failures are logged per pane; the sweep
    /// continues.
    pub fn stop_all(&self, runner: &impl TmuxCommandRunner) {
        let streams: Vec<Arc<PaneStream>> = self.lock().values().cloned().collect();
        for stream in streams {
            if let Err(e) = stream.stop(runner) {
                tracing::warn!(pane = %stream.pane_id(), "failed to stop stream: {e}");
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<PaneStream>>> {
        self.panes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

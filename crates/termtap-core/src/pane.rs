//! The Pane: a cheap handle composing the adapter, introspector and
//! stream for a single tmux pane.
//!
//! Derived attributes (address, leader pid, process chain, visible
//! content) are computed on first access and cached until `refresh()` or
//! until an operation that could have changed them completes. The pane id
//! itself never mutates; when the underlying pane dies, operations fail
//! with an address error rather than invalidating the handle.

use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;

use termtap_process::PaneProcesses;
use termtap_stream::LAST_READ;
use termtap_tmux::{capture_last_n, capture_visible, kill_pane, leader_pid, pane_address, send_key};

use crate::error::TermtapError;
use crate::execute::{self, CommandResult, ExecuteRequest};
use crate::supervisor::Supervisor;

/// Where `read_output` takes its bytes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// The multiplexer's own screen buffer.
    Direct,
    /// The durable stream mirror (and its read marks).
    Stream,
}

#[derive(Default)]
struct PaneCache {
    address: Option<String>,
    leader_pid: Option<u32>,
    processes: Option<PaneProcesses>,
    visible: Option<String>,
}

pub struct Pane {
    id: String,
    supervisor: Arc<Supervisor>,
    cache: Mutex<PaneCache>,
}

impl std::fmt::Debug for Pane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pane").field("id", &self.id).finish()
    }
}

impl Pane {
    pub(crate) fn new(supervisor: Arc<Supervisor>, id: String) -> Self {
        Self {
            id,
            supervisor,
            cache: Mutex::new(PaneCache::default()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn supervisor(&self) -> &Arc<Supervisor> {
        &self.supervisor
    }

    pub fn is_current(&self) -> bool {
        self.supervisor.is_current_pane(&self.id)
    }

    /// Drop every cached attribute.
    pub fn refresh(&self) {
        *self.lock() = PaneCache::default();
    }

    /// Canonical `session:window.pane` address.
    pub fn address(&self) -> Result<String, TermtapError> {
        if let Some(addr) = self.lock().address.clone() {
            return Ok(addr);
        }
        let addr = pane_address(self.supervisor.runner(), &self.id)?;
        self.lock().address = Some(addr.clone());
        Ok(addr)
    }

    /// PID of the pane's foreground process group leader.
    pub fn leader_pid(&self) -> Result<u32, TermtapError> {
        if let Some(pid) = self.lock().leader_pid {
            return Ok(pid);
        }
        let pid = leader_pid(self.supervisor.runner(), &self.id)?;
        self.lock().leader_pid = Some(pid);
        Ok(pid)
    }

    /// The pane's process chain (shell + interesting process), cached.
    pub fn processes(&self) -> Result<PaneProcesses, TermtapError> {
        if let Some(procs) = self.lock().processes.clone() {
            return Ok(procs);
        }
        self.refresh_processes()
    }

    /// Re-inspect the process tree, bypassing and replacing the cache.
    /// The leader pid is re-queried too: a respawned pane keeps its id
    /// but changes leaders.
    pub fn refresh_processes(&self) -> Result<PaneProcesses, TermtapError> {
        {
            let mut cache = self.lock();
            cache.leader_pid = None;
            cache.processes = None;
        }
        let pid = self.leader_pid()?;
        let procs = self.supervisor.introspector().inspect(pid);
        self.lock().processes = Some(procs.clone());
        Ok(procs)
    }

    /// Name of the pane's shell, if one was found.
    pub fn shell(&self) -> Result<Option<String>, TermtapError> {
        Ok(self.processes()?.shell_name().map(String::from))
    }

    /// Name of the pane's interesting process; `None` means at the shell.
    pub fn process(&self) -> Result<Option<String>, TermtapError> {
        Ok(self.processes()?.process_name().map(String::from))
    }

    /// The pane's visible content, cached.
    pub fn visible_content(&self) -> Result<String, TermtapError> {
        if let Some(content) = self.lock().visible.clone() {
            return Ok(content);
        }
        let content = capture_visible(self.supervisor.runner(), &self.id)?;
        self.lock().visible = Some(content.clone());
        Ok(content)
    }

    /// Execute a command in this pane. See [`ExecuteRequest`] for the
    /// wait/timeout/ready-pattern knobs.
    pub async fn execute(&self, request: ExecuteRequest) -> Result<CommandResult, TermtapError> {
        self.execute_with_cancel(request, CancellationToken::new())
            .await
    }

    /// Execute with an external cancellation signal; cancelled commands
    /// come back with an aborted status.
    pub async fn execute_with_cancel(
        &self,
        request: ExecuteRequest,
        cancel: CancellationToken,
    ) -> Result<CommandResult, TermtapError> {
        let result = execute::execute(self, request, cancel).await;
        self.refresh();
        result
    }

    /// Read pane output without sending anything.
    pub fn read_output(
        &self,
        lines: Option<u32>,
        mode: ReadMode,
    ) -> Result<String, TermtapError> {
        match mode {
            ReadMode::Direct => match lines {
                Some(n) => Ok(capture_last_n(self.supervisor.runner(), &self.id, n)?),
                None => Ok(capture_visible(self.supervisor.runner(), &self.id)?),
            },
            ReadMode::Stream => {
                let address = self.address()?;
                let stream = self.supervisor.streams().get_or_create(&self.id, &address);
                match lines {
                    Some(n) => Ok(stream.read_last_lines(n as usize)?),
                    None => {
                        // "since last read" semantics: return the unread
                        // tail and advance the mark.
                        let output = stream.read_since(LAST_READ)?;
                        stream.mark_read(LAST_READ)?;
                        Ok(output)
                    }
                }
            }
        }
    }

    /// Send the interrupt key. Deliberately takes no pane lock and writes
    /// no marks — interrupting a running command is the point; the running
    /// execute observes the transition and reports it as aborted.
    pub fn interrupt(&self) -> Result<(), TermtapError> {
        self.supervisor.ensure_not_current(&self.id)?;
        send_key(self.supervisor.runner(), &self.id, "C-c")?;
        self.supervisor.flag_interrupt(&self.id);
        self.refresh();
        Ok(())
    }

    /// Kill the underlying tmux pane. The handle stays valid; later
    /// operations fail with an address error.
    pub fn kill(&self) -> Result<(), TermtapError> {
        self.supervisor.ensure_not_current(&self.id)?;
        kill_pane(self.supervisor.runner(), &self.id)?;
        self.refresh();
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PaneCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use termtap_tmux::{TmuxCommandRunner, TmuxError};

    /// Counts display-message calls so caching is observable.
    struct CountingRunner {
        display_calls: AtomicUsize,
    }

    impl CountingRunner {
        fn new() -> Self {
            Self {
                display_calls: AtomicUsize::new(0),
            }
        }
    }

    impl TmuxCommandRunner for CountingRunner {
        fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
            if args.first() == Some(&"display-message") {
                self.display_calls.fetch_add(1, Ordering::SeqCst);
                if args.contains(&"#{pane_pid}") {
                    return Ok("4242\n".to_string());
                }
                return Ok("demo:0.0\n".to_string());
            }
            if args.first() == Some(&"capture-pane") {
                return Ok("$ \n".to_string());
            }
            Ok(String::new())
        }
    }

    fn pane_with(runner: Arc<CountingRunner>) -> Pane {
        let sup = Arc::new(Supervisor::new(runner).with_current_pane(None));
        sup.pane_by_id("%0")
    }

    #[test]
    fn address_is_cached_until_refresh() {
        let runner = Arc::new(CountingRunner::new());
        let pane = pane_with(runner.clone());

        assert_eq!(pane.address().expect("address"), "demo:0.0");
        assert_eq!(pane.address().expect("address"), "demo:0.0");
        assert_eq!(runner.display_calls.load(Ordering::SeqCst), 1);

        pane.refresh();
        assert_eq!(pane.address().expect("address"), "demo:0.0");
        assert_eq!(runner.display_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn leader_pid_parses_and_caches() {
        let runner = Arc::new(CountingRunner::new());
        let pane = pane_with(runner.clone());
        assert_eq!(pane.leader_pid().expect("pid"), 4242);
        assert_eq!(pane.leader_pid().expect("pid"), 4242);
        assert_eq!(runner.display_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn interrupt_refuses_current_pane() {
        let runner = Arc::new(CountingRunner::new());
        let sup = Arc::new(
            Supervisor::new(runner).with_current_pane(Some("%0".to_string())),
        );
        let pane = sup.pane_by_id("%0");
        let err = pane.interrupt().unwrap_err();
        assert!(matches!(err, TermtapError::CurrentPane(_)));
    }

    #[test]
    fn interrupt_flags_supervisor() {
        let runner = Arc::new(CountingRunner::new());
        let pane = pane_with(runner);
        pane.interrupt().expect("interrupt");
        assert!(pane.supervisor().take_interrupt("%0"));
    }

    #[test]
    fn read_output_direct_visible() {
        let runner = Arc::new(CountingRunner::new());
        let pane = pane_with(runner);
        let out = pane.read_output(None, ReadMode::Direct).expect("read");
        assert!(out.contains('$'));
    }
}

//! Ready-for-input classification handlers.
//!
//! A handler maps a process type to a readiness policy. Handlers are
//! consulted in registration order, first match wins, and the registry
//! always terminates with [`DefaultHandler`], whose `matches` is true for
//! everything — classification is total.
//!
//! Handler hooks must not send commands back into the pane they classify;
//! the execution engine holds the pane's lock while hooks run.

mod default;
mod python;
mod ssh;

pub use default::DefaultHandler;
pub use python::PythonHandler;
pub use ssh::SshHandler;

use thiserror::Error;

use crate::tree::{PaneProcesses, ProcessNode};

/// Three-state readiness verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    Busy,
    /// The handler cannot tell (e.g. no wait channels on this platform).
    /// Callers keep polling; a pane that stays unknown times out rather
    /// than reporting a false ready.
    Unknown,
}

/// Verdict plus a short human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub readiness: Readiness,
    pub reason: String,
}

impl Verdict {
    pub fn ready(reason: impl Into<String>) -> Self {
        Self {
            readiness: Readiness::Ready,
            reason: reason.into(),
        }
    }

    pub fn busy(reason: impl Into<String>) -> Self {
        Self {
            readiness: Readiness::Busy,
            reason: reason.into(),
        }
    }

    pub fn unknown(reason: impl Into<String>) -> Self {
        Self {
            readiness: Readiness::Unknown,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("aborted by user")]
    AbortedByUser,
}

/// Outcome of an interactive confirmation dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    Proceed,
    Abort,
    Edit(String),
}

/// Interface to the interactive confirmation collaborator (hover dialog,
/// terminal prompt, RPC round-trip — the handler does not care).
pub trait Confirmer: Send + Sync {
    fn confirm(&self, title: &str, body: &str) -> Confirmation;
}

/// Confirmer that always proceeds; the default for non-interactive use.
pub struct AutoConfirm;

impl Confirmer for AutoConfirm {
    fn confirm(&self, _title: &str, _body: &str) -> Confirmation {
        Confirmation::Proceed
    }
}

/// Per-process-type readiness policy with optional send hooks.
pub trait ProcessHandler: Send + Sync {
    fn name(&self) -> &'static str;

    /// Does this handler cover this process node?
    fn matches(&self, node: &ProcessNode) -> bool;

    /// Is the pane ready for input?
    fn is_ready(&self, procs: &PaneProcesses) -> Verdict;

    /// Hook invoked before a command is sent. Returns the command to
    /// actually send (possibly edited by the user).
    fn before_send(
        &self,
        _procs: &PaneProcesses,
        command: &str,
        _confirm: &dyn Confirmer,
    ) -> Result<String, HandlerError> {
        Ok(command.to_string())
    }

    /// Hook invoked after a command completes.
    fn after_complete(&self, _procs: &PaneProcesses) {}
}

/// Ordered handler list; the default handler is always last.
pub struct HandlerRegistry {
    handlers: Vec<Box<dyn ProcessHandler>>,
}

impl HandlerRegistry {
    /// Registry with the built-in handlers: python, ssh, then the default.
    pub fn new() -> Self {
        Self {
            handlers: vec![
                Box::new(PythonHandler),
                Box::new(SshHandler),
                Box::new(DefaultHandler),
            ],
        }
    }

    /// Insert a handler ahead of the default (and every built-in).
    pub fn register_front(&mut self, handler: Box<dyn ProcessHandler>) {
        self.handlers.insert(0, handler);
    }

    /// First handler matching the pane's interesting process; the default
    /// handler when there is none (pane at the shell).
    pub fn handler_for(&self, process: Option<&ProcessNode>) -> &dyn ProcessHandler {
        if let Some(node) = process {
            for handler in &self.handlers {
                if handler.matches(node) {
                    return handler.as_ref();
                }
            }
        }
        static FALLBACK: DefaultHandler = DefaultHandler;
        self.handlers
            .last()
            .map(|h| h.as_ref())
            .unwrap_or(&FALLBACK)
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

//! Error taxonomy for the supervisor.
//!
//! A timeout is not an error: it comes back as a command status. Errors
//! are for structural failures — unresolvable addresses, the multiplexer
//! refusing a command, stream IO, a user abort.

use thiserror::Error;

use termtap_process::HandlerError;
use termtap_stream::StreamError;
use termtap_tmux::{ResolveError, TmuxError};

#[derive(Debug, Error)]
pub enum TermtapError {
    #[error("no pane matches '{0}'")]
    AddressNotFound(String),

    #[error("'{address}' matches multiple panes: {}", panes.join(", "))]
    AddressAmbiguous {
        address: String,
        panes: Vec<String>,
    },

    #[error("no service '{service}' configured for session '{session}'")]
    ServiceNotFound { session: String, service: String },

    #[error("refusing to operate on the supervisor's own pane ({0})")]
    CurrentPane(String),

    #[error(transparent)]
    Tmux(#[from] TmuxError),

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error("aborted by user")]
    AbortedByUser,

    #[error("invalid ready pattern: {0}")]
    BadPattern(#[from] regex::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("init group error: {0}")]
    InitGroup(String),
}

impl From<ResolveError> for TermtapError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NotFound(address) => Self::AddressNotFound(address),
            ResolveError::Ambiguous { address, panes } => Self::AddressAmbiguous { address, panes },
            ResolveError::Tmux(e) => Self::Tmux(e),
        }
    }
}

impl From<HandlerError> for TermtapError {
    fn from(err: HandlerError) -> Self {
        match err {
            HandlerError::AbortedByUser => Self::AbortedByUser,
        }
    }
}

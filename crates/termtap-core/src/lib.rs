//! termtap-core: the process-aware pane supervisor.
//!
//! Composes the tmux adapter, the process introspector and the output
//! stream into [`Pane`] objects, runs commands through the execution
//! engine (send, poll until genuinely idle or matched, slice exact
//! output), and orchestrates multi-pane service groups with dependency
//! ordering.

pub mod config;
pub mod error;
pub mod execute;
pub mod init;
pub mod pane;
pub mod pattern;
pub mod supervisor;

pub use config::{ConfigStore, FileConfig, InitGroup, NullConfig, PaneConfig, ServiceSpec};
pub use error::TermtapError;
pub use execute::{
    CommandResult, CommandStatus, ExecuteRequest, PASTE_THRESHOLD, PastePreference,
};
pub use init::{ServiceReport, run_init_group};
pub use pane::{Pane, ReadMode};
pub use pattern::ReadyScanner;
pub use supervisor::Supervisor;

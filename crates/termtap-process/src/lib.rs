//! termtap-process: process-tree introspection and readiness classification.
//!
//! Builds a pane's descendant process tree from the OS process table,
//! extracts the shell / interesting-process chain, and classifies whether
//! the pane is ready for input via an ordered registry of per-process-type
//! handlers. Classification is total: every pane yields a verdict of
//! ready, busy, or unknown.

pub mod handlers;
pub mod table;
pub mod tree;

pub use handlers::{
    AutoConfirm, Confirmation, Confirmer, DefaultHandler, HandlerError, HandlerRegistry,
    ProcessHandler, PythonHandler, Readiness, SshHandler, Verdict,
};
pub use table::{ProcessRecord, ProcessStateCode, scan_process_table, scan_via_ps};
pub use tree::{
    DEFAULT_SKIP_WRAPPERS, Introspect, KNOWN_SHELLS, PaneProcesses, ProcessNode,
    SystemIntrospector, build_tree, extract_chain,
};

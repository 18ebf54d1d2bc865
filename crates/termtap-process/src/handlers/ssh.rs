//! SSH-family handler: remote proxies where the local process tree says
//! nothing about the far side. Sends are gated behind an interactive
//! confirmation so a driver cannot silently push commands at a remote
//! host.

use super::{Confirmation, Confirmer, HandlerError, ProcessHandler, Verdict};
use crate::tree::{PaneProcesses, ProcessNode};

const REMOTE_CLIENTS: &[&str] = &["ssh", "mosh", "telnet"];

pub struct SshHandler;

impl ProcessHandler for SshHandler {
    fn name(&self) -> &'static str {
        "ssh"
    }

    fn matches(&self, node: &ProcessNode) -> bool {
        REMOTE_CLIENTS.contains(&node.name.as_str())
    }

    fn is_ready(&self, procs: &PaneProcesses) -> Verdict {
        // The remote side is invisible; apply the no-children rule to the
        // local client process.
        match &procs.process {
            Some(process) if process.has_children() => Verdict::busy("has local subprocess"),
            Some(process) => Verdict::ready(format!("{} session idle", process.name)),
            None => Verdict::ready("at shell prompt"),
        }
    }

    fn before_send(
        &self,
        procs: &PaneProcesses,
        command: &str,
        confirm: &dyn Confirmer,
    ) -> Result<String, HandlerError> {
        let client = procs.process_name().unwrap_or("remote");
        match confirm.confirm(&format!("Send to {client} session?"), command) {
            Confirmation::Proceed => Ok(command.to_string()),
            Confirmation::Edit(edited) => Ok(edited),
            Confirmation::Abort => Err(HandlerError::AbortedByUser),
        }
    }
}

//! Fallback handler: no interesting process means the shell is at its
//! prompt; anything else counts as busy. Covers the large majority of
//! panes.

use super::{ProcessHandler, Verdict};
use crate::tree::{PaneProcesses, ProcessNode};

pub struct DefaultHandler;

impl ProcessHandler for DefaultHandler {
    fn name(&self) -> &'static str {
        "default"
    }

    fn matches(&self, _node: &ProcessNode) -> bool {
        true
    }

    fn is_ready(&self, procs: &PaneProcesses) -> Verdict {
        match &procs.process {
            None => match procs.shell_name() {
                Some(shell) => Verdict::ready(format!("{shell} idle")),
                None => Verdict::ready("at prompt"),
            },
            Some(process) => Verdict::busy(format!("{} running", process.name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::Readiness;

    fn node(name: &str) -> ProcessNode {
        ProcessNode {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn ready_at_shell_prompt() {
        let procs = PaneProcesses {
            chain: vec![node("bash")],
            shell: Some(node("bash")),
            process: None,
        };
        let verdict = DefaultHandler.is_ready(&procs);
        assert_eq!(verdict.readiness, Readiness::Ready);
        assert_eq!(verdict.reason, "bash idle");
    }

    #[test]
    fn busy_with_running_process() {
        let procs = PaneProcesses {
            chain: vec![node("bash"), node("sleep")],
            shell: Some(node("bash")),
            process: Some(node("sleep")),
        };
        let verdict = DefaultHandler.is_ready(&procs);
        assert_eq!(verdict.readiness, Readiness::Busy);
        assert_eq!(verdict.reason, "sleep running");
    }

    #[test]
    fn ready_with_empty_chain() {
        let verdict = DefaultHandler.is_ready(&PaneProcesses::default());
        assert_eq!(verdict.readiness, Readiness::Ready);
    }

    #[test]
    fn matches_everything() {
        assert!(DefaultHandler.matches(&node("anything")));
        assert!(DefaultHandler.matches(&node("")));
    }
}

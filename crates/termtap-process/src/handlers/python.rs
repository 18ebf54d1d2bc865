//! Python-family handler: REPLs and scripts.
//!
//! Wait channels observed on Linux 6.x with CPython 3.12 and IPython 9:
//! `do_select` and `do_sys_poll` are the interpreter blocked on stdin,
//! `do_epoll_wait` is IPython's prompt loop, `do_wait` is a running
//! subprocess, `hrtimer_nanosleep` is `time.sleep`. A spawned child always
//! means busy regardless of the channel.

use super::{ProcessHandler, Verdict};
use crate::tree::{PaneProcesses, ProcessNode};

/// Wait channels indicating the interpreter is blocked reading stdin.
const STDIN_WAIT_CHANNELS: &[&str] = &[
    "do_select",
    "do_sys_poll",
    "do_epoll_wait",
    "poll_schedule_timeout",
];

/// Wait channels indicating active work.
const WORKING_CHANNELS: &[&str] = &["do_wait", "hrtimer_nanosleep"];

pub struct PythonHandler;

impl ProcessHandler for PythonHandler {
    fn name(&self) -> &'static str {
        "python"
    }

    fn matches(&self, node: &ProcessNode) -> bool {
        node.name == "ipython" || node.name.starts_with("python")
    }

    fn is_ready(&self, procs: &PaneProcesses) -> Verdict {
        let Some(process) = &procs.process else {
            return Verdict::ready("at shell prompt");
        };
        if process.has_children() {
            return Verdict::busy("has subprocess");
        }
        let channel = process.wait_channel.as_str();
        if STDIN_WAIT_CHANNELS.contains(&channel) {
            return Verdict::ready("REPL waiting for input");
        }
        if WORKING_CHANNELS.contains(&channel) {
            return Verdict::busy(format!("working ({channel})"));
        }
        if channel.is_empty() {
            return Verdict::unknown("wait channel unavailable");
        }
        Verdict::unknown(format!("unrecognized wait channel: {channel}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::Readiness;

    fn python(wchan: &str, children: Vec<ProcessNode>) -> PaneProcesses {
        let process = ProcessNode {
            pid: 200,
            ppid: 100,
            name: "python3".to_string(),
            wait_channel: wchan.to_string(),
            children,
            ..Default::default()
        };
        PaneProcesses {
            chain: vec![process.clone()],
            shell: None,
            process: Some(process),
        }
    }

    #[test]
    fn matches_python_family() {
        for name in ["python", "python3", "python3.12", "ipython"] {
            let node = ProcessNode {
                name: name.to_string(),
                ..Default::default()
            };
            assert!(PythonHandler.matches(&node), "{name} should match");
        }
        let node = ProcessNode {
            name: "ruby".to_string(),
            ..Default::default()
        };
        assert!(!PythonHandler.matches(&node));
    }

    #[test]
    fn ready_on_stdin_wait() {
        for chan in ["do_select", "do_sys_poll", "do_epoll_wait"] {
            let verdict = PythonHandler.is_ready(&python(chan, vec![]));
            assert_eq!(verdict.readiness, Readiness::Ready, "{chan}");
        }
    }

    #[test]
    fn busy_with_subprocess_even_on_ready_channel() {
        let child = ProcessNode {
            pid: 300,
            ppid: 200,
            name: "sleep".to_string(),
            ..Default::default()
        };
        let verdict = PythonHandler.is_ready(&python("do_select", vec![child]));
        assert_eq!(verdict.readiness, Readiness::Busy);
        assert_eq!(verdict.reason, "has subprocess");
    }

    #[test]
    fn busy_during_sleep() {
        let verdict = PythonHandler.is_ready(&python("hrtimer_nanosleep", vec![]));
        assert_eq!(verdict.readiness, Readiness::Busy);
    }

    #[test]
    fn unknown_on_empty_channel() {
        let verdict = PythonHandler.is_ready(&python("", vec![]));
        assert_eq!(verdict.readiness, Readiness::Unknown);
        assert_eq!(verdict.reason, "wait channel unavailable");
    }

    #[test]
    fn unknown_on_unrecognized_channel() {
        let verdict = PythonHandler.is_ready(&python("futex_wait", vec![]));
        assert_eq!(verdict.readiness, Readiness::Unknown);
        assert!(verdict.reason.contains("futex_wait"));
    }

    #[test]
    fn ready_when_no_process() {
        let verdict = PythonHandler.is_ready(&PaneProcesses::default());
        assert_eq!(verdict.readiness, Readiness::Ready);
    }
}

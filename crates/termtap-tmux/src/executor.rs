//! TmuxCommandRunner trait and TmuxExecutor (sync subprocess wrapper).
//! The trait boundary enables mock injection for testing.
//!
//! The supervisor must address the tmux server that hosts its own pane,
//! not whatever server a scrubbed environment would default to — RPC
//! drivers routinely spawn termtap with a minimal environment. The
//! executor therefore resolves its socket explicitly: a driver override,
//! then `TERMTAP_TMUX_SOCKET`, then the socket path embedded in `$TMUX`,
//! then tmux's default.

use std::process::Command;

use crate::error::TmuxError;

/// Trait for executing tmux commands. Enables mock injection for testing.
pub trait TmuxCommandRunner: Send + Sync {
    fn run(&self, args: &[&str]) -> Result<String, TmuxError>;
}

impl<T: TmuxCommandRunner + ?Sized> TmuxCommandRunner for &T {
    fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
        (**self).run(args)
    }
}

impl<T: TmuxCommandRunner + ?Sized> TmuxCommandRunner for std::sync::Arc<T> {
    fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
        (**self).run(args)
    }
}

/// Which tmux server socket to address.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SocketTarget {
    /// tmux's own default socket for this user.
    #[default]
    Default,
    /// An explicit socket path (`tmux -S`).
    Path(String),
    /// A named socket in the default directory (`tmux -L`).
    Name(String),
}

/// Resolve the socket target from the process environment.
///
/// `TERMTAP_TMUX_SOCKET` names an explicit path; failing that, `$TMUX`
/// (set inside any tmux client, formatted `socket_path,pid,session`)
/// pins the server whose pane the supervisor runs in.
pub fn resolve_socket(
    termtap_socket: Option<&str>,
    tmux_env: Option<&str>,
) -> SocketTarget {
    if let Some(path) = termtap_socket.filter(|p| !p.is_empty()) {
        return SocketTarget::Path(path.to_string());
    }
    if let Some(env) = tmux_env {
        let path = env.split(',').next().unwrap_or("");
        if !path.is_empty() {
            return SocketTarget::Path(path.to_string());
        }
    }
    SocketTarget::Default
}

/// Real tmux executor using `std::process::Command`.
///
/// Each call spawns a new `tmux` process, so the executor itself is
/// `Send + Sync` (no interior mutability, no persistent child handle).
pub struct TmuxExecutor {
    tmux_bin: String,
    socket: SocketTarget,
}

impl TmuxExecutor {
    pub fn new(tmux_bin: impl Into<String>) -> Self {
        Self {
            tmux_bin: tmux_bin.into(),
            socket: SocketTarget::Default,
        }
    }

    /// Executor bound to the server this process is already inside of,
    /// via [`resolve_socket`] over the real environment.
    pub fn from_env() -> Self {
        let termtap_socket = std::env::var("TERMTAP_TMUX_SOCKET").ok();
        let tmux_env = std::env::var("TMUX").ok();
        Self::new("tmux").with_socket(resolve_socket(
            termtap_socket.as_deref(),
            tmux_env.as_deref(),
        ))
    }

    #[must_use]
    pub fn with_socket(mut self, socket: SocketTarget) -> Self {
        self.socket = socket;
        self
    }

    pub fn socket(&self) -> &SocketTarget {
        &self.socket
    }

    fn socket_args(&self) -> Option<[&str; 2]> {
        match &self.socket {
            SocketTarget::Default => None,
            SocketTarget::Path(path) => Some(["-S", path]),
            SocketTarget::Name(name) => Some(["-L", name]),
        }
    }
}

impl Default for TmuxExecutor {
    fn default() -> Self {
        Self::new("tmux")
    }
}

impl TmuxCommandRunner for TmuxExecutor {
    fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
        let mut cmd = Command::new(&self.tmux_bin);
        if let Some(socket_args) = self.socket_args() {
            cmd.args(socket_args);
        }
        cmd.args(args);
        let output = cmd.output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TmuxError::NotFound
            } else {
                TmuxError::Io(e)
            }
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure(
                args.first().copied().unwrap_or("tmux"),
                output.status.code().unwrap_or(-1),
                stderr.trim(),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Turn a non-zero tmux exit into the error the resolution layer needs.
/// "No server" is an ordinary state for a supervisor that may outlive
/// every session, so it gets its own kind; everything else keeps the
/// subcommand and stderr for the driver.
fn classify_failure(subcommand: &str, code: i32, stderr: &str) -> TmuxError {
    if stderr.starts_with("no server running") || stderr.contains("error connecting to") {
        return TmuxError::NoServer;
    }
    TmuxError::CommandFailed(format!("{subcommand}: exit code {code}: {stderr}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_executor_uses_default_socket() {
        let exec = TmuxExecutor::default();
        assert_eq!(exec.tmux_bin, "tmux");
        assert_eq!(exec.socket(), &SocketTarget::Default);
    }

    #[test]
    fn explicit_socket_path_flags() {
        let exec = TmuxExecutor::default().with_socket(SocketTarget::Path("/tmp/my.sock".into()));
        assert_eq!(exec.socket_args(), Some(["-S", "/tmp/my.sock"]));
    }

    #[test]
    fn named_socket_flags() {
        let exec = TmuxExecutor::default().with_socket(SocketTarget::Name("work".into()));
        assert_eq!(exec.socket_args(), Some(["-L", "work"]));
    }

    #[test]
    fn resolve_prefers_termtap_override() {
        let target = resolve_socket(
            Some("/run/termtap/tmux.sock"),
            Some("/tmp/tmux-1000/default,4242,0"),
        );
        assert_eq!(target, SocketTarget::Path("/run/termtap/tmux.sock".into()));
    }

    #[test]
    fn resolve_pins_server_from_tmux_env() {
        let target = resolve_socket(None, Some("/tmp/tmux-1000/default,4242,0"));
        assert_eq!(target, SocketTarget::Path("/tmp/tmux-1000/default".into()));
    }

    #[test]
    fn resolve_outside_tmux_is_default() {
        assert_eq!(resolve_socket(None, None), SocketTarget::Default);
        assert_eq!(resolve_socket(Some(""), Some("")), SocketTarget::Default);
    }

    #[test]
    fn not_found_binary() {
        let exec = TmuxExecutor::new("/nonexistent/tmux-binary");
        let err = exec.run(&["list-sessions"]).unwrap_err();
        assert!(
            matches!(err, TmuxError::NotFound),
            "expected NotFound, got: {err:?}"
        );
    }

    #[test]
    fn no_server_is_classified() {
        let err = classify_failure("list-sessions", 1, "no server running on /tmp/tmux-1000/default");
        assert!(matches!(err, TmuxError::NoServer));
    }

    #[test]
    fn other_failures_keep_subcommand_and_stderr() {
        let err = classify_failure("send-keys", 1, "can't find pane: %99");
        match err {
            TmuxError::CommandFailed(msg) => {
                assert!(msg.contains("send-keys"));
                assert!(msg.contains("can't find pane"));
            }
            other => panic!("expected CommandFailed, got {other:?}"),
        }
    }

    #[test]
    fn blanket_ref_impl() {
        struct Mock;
        impl TmuxCommandRunner for Mock {
            fn run(&self, _args: &[&str]) -> Result<String, TmuxError> {
                Ok("ok".to_string())
            }
        }
        let mock = Mock;
        let r: &Mock = &mock;
        assert_eq!(r.run(&[]).expect("ok"), "ok");
    }

    #[test]
    fn blanket_arc_impl() {
        struct Mock;
        impl TmuxCommandRunner for Mock {
            fn run(&self, _args: &[&str]) -> Result<String, TmuxError> {
                Ok("arc".to_string())
            }
        }
        let mock: std::sync::Arc<dyn TmuxCommandRunner> = std::sync::Arc::new(Mock);
        assert_eq!(mock.run(&[]).expect("ok"), "arc");
    }
}

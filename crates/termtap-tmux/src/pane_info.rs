//! TmuxPaneInfo, list_panes format string, parser, and per-pane queries.

use crate::error::TmuxError;
use crate::executor::TmuxCommandRunner;

/// Tab-delimited format string for `tmux list-panes -a -F`.
pub const LIST_PANES_FORMAT: &str = "#{pane_id}\t#{session_name}\t#{window_index}\t#{pane_index}\t#{window_name}\t#{pane_active}\t#{pane_pid}";

/// Metadata for one tmux pane as reported by `list-panes -a`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TmuxPaneInfo {
    pub pane_id: String,
    pub session_name: String,
    pub window_index: u32,
    pub pane_index: u32,
    pub window_name: String,
    pub active: bool,
    /// PID of the pane's foreground process group leader (tmux `#{pane_pid}`).
    pub pane_pid: Option<u32>,
}

impl TmuxPaneInfo {
    /// Canonical `session:window.pane` address for this pane.
    pub fn address(&self) -> String {
        format!(
            "{}:{}.{}",
            self.session_name, self.window_index, self.pane_index
        )
    }
}

/// Execute `tmux list-panes -a` and parse the output.
pub fn list_panes(runner: &impl TmuxCommandRunner) -> Result<Vec<TmuxPaneInfo>, TmuxError> {
    let output = runner.run(&["list-panes", "-a", "-F", LIST_PANES_FORMAT])?;
    parse_list_panes_output(&output)
}

/// Parse the raw output of `tmux list-panes -a -F <FORMAT>`.
pub fn parse_list_panes_output(output: &str) -> Result<Vec<TmuxPaneInfo>, TmuxError> {
    let mut panes = Vec::new();
    for (idx, line) in output.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        panes.push(parse_line(trimmed, idx + 1)?);
    }
    Ok(panes)
}

fn parse_line(line: &str, line_num: usize) -> Result<TmuxPaneInfo, TmuxError> {
    let parts: Vec<&str> = line.split('\t').collect();
    if parts.len() < 6 {
        return Err(TmuxError::ParseError {
            line_num,
            detail: format!(
                "expected at least 6 tab-separated fields, got {}",
                parts.len()
            ),
        });
    }

    let window_index = parts[2].parse::<u32>().unwrap_or(0);
    let pane_index = parts[3].parse::<u32>().unwrap_or(0);
    let active = matches!(parts[5].trim(), "1" | "true");
    let pane_pid: Option<u32> = parts.get(6).and_then(|s| s.trim().parse().ok());

    Ok(TmuxPaneInfo {
        pane_id: parts[0].to_string(),
        session_name: parts[1].to_string(),
        window_index,
        pane_index,
        window_name: parts[4].to_string(),
        active,
        pane_pid,
    })
}

/// Canonical `session:window.pane` address for a pane.
pub fn pane_address(runner: &impl TmuxCommandRunner, pane_id: &str) -> Result<String, TmuxError> {
    let out = runner.run(&[
        "display-message",
        "-p",
        "-t",
        pane_id,
        "#{session_name}:#{window_index}.#{pane_index}",
    ])?;
    Ok(out.trim().to_string())
}

/// PID of the pane's foreground process group leader.
pub fn leader_pid(runner: &impl TmuxCommandRunner, pane_id: &str) -> Result<u32, TmuxError> {
    let out = runner.run(&["display-message", "-p", "-t", pane_id, "#{pane_pid}"])?;
    out.trim()
        .parse()
        .map_err(|_| TmuxError::CommandFailed(format!("invalid pane pid: {}", out.trim())))
}

/// Pane id of the pane the caller itself runs in, if inside tmux.
///
/// Returns `Ok(None)` when `$TMUX` is unset. Queried once at supervisor
/// startup; send and kill operations against this pane are refused.
pub fn current_pane_id(runner: &impl TmuxCommandRunner) -> Result<Option<String>, TmuxError> {
    if std::env::var_os("TMUX").is_none() {
        return Ok(None);
    }
    let out = runner.run(&["display-message", "-p", "#{pane_id}"])?;
    Ok(Some(out.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_single_line() {
        let line = "%0\tmain\t0\t0\tdev\t1\t4242";
        let pane = parse_line(line, 1).expect("should parse");
        assert_eq!(pane.pane_id, "%0");
        assert_eq!(pane.session_name, "main");
        assert_eq!(pane.window_index, 0);
        assert_eq!(pane.pane_index, 0);
        assert_eq!(pane.window_name, "dev");
        assert!(pane.active);
        assert_eq!(pane.pane_pid, Some(4242));
        assert_eq!(pane.address(), "main:0.0");
    }

    #[test]
    fn parse_inactive_pane() {
        let line = "%1\twork\t1\t2\teditor\t0\t77";
        let pane = parse_line(line, 1).expect("should parse");
        assert!(!pane.active);
        assert_eq!(pane.address(), "work:1.2");
    }

    #[test]
    fn parse_multiple_panes() {
        let output = ["%0\tmain\t0\t0\tdev\t1\t10", "%1\tmain\t0\t1\tdev\t0\t11"].join("\n");
        let panes = parse_list_panes_output(&output).expect("should parse");
        assert_eq!(panes.len(), 2);
        assert_eq!(panes[0].pane_id, "%0");
        assert_eq!(panes[1].pane_id, "%1");
    }

    #[test]
    fn parse_empty_output() {
        let panes = parse_list_panes_output("").expect("should parse");
        assert!(panes.is_empty());
    }

    #[test]
    fn parse_too_few_fields_error() {
        let result = parse_line("%0\tmain\t0", 1);
        assert!(result.is_err());
    }

    #[test]
    fn parse_missing_pid_defaults_to_none() {
        let line = "%0\tmain\t0\t0\tdev\t1";
        let pane = parse_line(line, 1).expect("should parse");
        assert_eq!(pane.pane_pid, None);
    }

    #[test]
    fn parse_invalid_pid_defaults_to_none() {
        let line = "%0\tmain\t0\t0\tdev\t1\t";
        let pane = parse_line(line, 1).expect("should parse");
        assert_eq!(pane.pane_pid, None);
    }

    #[test]
    fn mock_runner_list_panes() {
        struct MockRunner;
        impl TmuxCommandRunner for MockRunner {
            fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
                assert!(args.contains(&"list-panes"));
                Ok("%0\tmain\t0\t0\tdev\t1\t4242\n".to_string())
            }
        }
        let panes = list_panes(&MockRunner).expect("should list");
        assert_eq!(panes.len(), 1);
        assert_eq!(panes[0].session_name, "main");
    }

    #[test]
    fn leader_pid_parses() {
        struct MockRunner;
        impl TmuxCommandRunner for MockRunner {
            fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
                assert!(args.contains(&"#{pane_pid}"));
                Ok("1234\n".to_string())
            }
        }
        assert_eq!(leader_pid(&MockRunner, "%0").expect("pid"), 1234);
    }

    #[test]
    fn leader_pid_invalid_errors() {
        struct MockRunner;
        impl TmuxCommandRunner for MockRunner {
            fn run(&self, _args: &[&str]) -> Result<String, TmuxError> {
                Ok("not-a-pid\n".to_string())
            }
        }
        assert!(leader_pid(&MockRunner, "%0").is_err());
    }
}

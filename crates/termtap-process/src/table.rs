//! OS process table scanning.
//!
//! The primary path walks `/proc` through the `procfs` crate: `stat` for
//! pid/ppid/name/state, `wchan` for the kernel wait channel. On systems
//! without a process filesystem the `ps` fallback supplies everything
//! except wait channels, which stay empty — valid, but it restricts
//! handlers to the no-children rule.

use std::process::Command;

/// One-letter process state code from the process table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessStateCode {
    Running,
    Sleeping,
    Stopped,
    Zombie,
    #[default]
    Unknown,
}

impl ProcessStateCode {
    pub fn from_code(c: char) -> Self {
        match c {
            'R' => Self::Running,
            // S = interruptible sleep, D = uninterruptible, I = idle kernel
            'S' | 'D' | 'I' => Self::Sleeping,
            'T' | 't' => Self::Stopped,
            'Z' => Self::Zombie,
            _ => Self::Unknown,
        }
    }

    pub fn is_sleeping(self) -> bool {
        matches!(self, Self::Sleeping)
    }

    pub fn is_stopped(self) -> bool {
        matches!(self, Self::Stopped)
    }
}

/// One entry of the process table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessRecord {
    pub pid: u32,
    pub ppid: u32,
    pub name: String,
    pub state: ProcessStateCode,
    /// Kernel symbol the process is blocked on; empty when running or when
    /// the platform does not expose wait channels.
    pub wait_channel: String,
}

/// Scan the full process table in one pass.
///
/// Entries that disappear or turn unreadable mid-scan are skipped; a
/// racing process table is normal, not an error.
#[cfg(target_os = "linux")]
pub fn scan_process_table() -> std::io::Result<Vec<ProcessRecord>> {
    let processes = procfs::process::all_processes().map_err(std::io::Error::other)?;
    let mut records = Vec::new();
    for process in processes {
        let Ok(process) = process else {
            continue;
        };
        let Ok(stat) = process.stat() else {
            continue;
        };
        // wchan reads "0" when the thread is not blocked
        let wait_channel = match process.wchan() {
            Ok(symbol) if symbol != "0" => symbol,
            _ => String::new(),
        };
        records.push(ProcessRecord {
            pid: stat.pid as u32,
            ppid: stat.ppid as u32,
            name: stat.comm,
            state: ProcessStateCode::from_code(stat.state),
            wait_channel,
        });
    }
    Ok(records)
}

/// Without a process filesystem the `ps` route is all there is.
#[cfg(not(target_os = "linux"))]
pub fn scan_process_table() -> std::io::Result<Vec<ProcessRecord>> {
    scan_via_ps()
}

/// Degraded fallback scan shelling out to `ps`. Wait channels are left
/// empty.
pub fn scan_via_ps() -> std::io::Result<Vec<ProcessRecord>> {
    let output = Command::new("ps")
        .args(["-axo", "pid=,ppid=,state=,comm="])
        .output()?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(parse_ps_output(&stdout))
}

fn parse_ps_output(output: &str) -> Vec<ProcessRecord> {
    output
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let pid = parts.next()?.parse().ok()?;
            let ppid = parts.next()?.parse().ok()?;
            let state = ProcessStateCode::from_code(parts.next()?.chars().next()?);
            let name = parts.next()?.rsplit('/').next()?.to_string();
            Some(ProcessRecord {
                pid,
                ppid,
                name,
                state,
                wait_channel: String::new(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_codes() {
        assert_eq!(ProcessStateCode::from_code('R'), ProcessStateCode::Running);
        assert_eq!(ProcessStateCode::from_code('S'), ProcessStateCode::Sleeping);
        assert_eq!(ProcessStateCode::from_code('D'), ProcessStateCode::Sleeping);
        assert_eq!(ProcessStateCode::from_code('T'), ProcessStateCode::Stopped);
        assert_eq!(ProcessStateCode::from_code('Z'), ProcessStateCode::Zombie);
        assert_eq!(ProcessStateCode::from_code('?'), ProcessStateCode::Unknown);
    }

    #[test]
    fn parse_ps_rows() {
        let out = "    1     0 S systemd\n 4242  4000 R python3\n  bad line\n";
        let records = parse_ps_output(out);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].pid, 4242);
        assert_eq!(records[1].ppid, 4000);
        assert_eq!(records[1].name, "python3");
        assert_eq!(records[1].state, ProcessStateCode::Running);
        assert!(records[1].wait_channel.is_empty());
    }

    #[test]
    fn parse_ps_strips_path_prefix() {
        let out = "  9  1 S /usr/bin/ssh\n";
        let records = parse_ps_output(out);
        assert_eq!(records[0].name, "ssh");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn scan_finds_self() {
        let records = scan_process_table().expect("scan should work on linux");
        let me = std::process::id();
        assert!(
            records.iter().any(|r| r.pid == me),
            "own pid should appear in the table"
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn scan_links_self_to_parent() {
        let records = scan_process_table().expect("scan");
        let me = std::process::id();
        let mine = records.iter().find(|r| r.pid == me).expect("own record");
        assert_ne!(mine.ppid, 0, "a test process always has a parent");
        assert!(!mine.name.is_empty());
    }
}

//! Process tree construction and shell/process chain extraction.

use std::collections::{HashMap, HashSet};

use crate::table::{ProcessRecord, ProcessStateCode, scan_process_table, scan_via_ps};

/// Shell names recognised when locating the pane's shell node.
pub const KNOWN_SHELLS: &[&str] = &["bash", "zsh", "fish", "sh", "dash", "ksh", "tcsh", "csh"];

/// Launcher wrappers skipped when picking the pane's interesting process.
/// Externally overridable through configuration.
pub const DEFAULT_SKIP_WRAPPERS: &[&str] = &[
    "uv", "npm", "npx", "yarn", "pnpm", "poetry", "pipenv", "cargo", "nix-shell",
];

/// One node of a pane's process tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessNode {
    pub pid: u32,
    pub ppid: u32,
    pub name: String,
    pub state: ProcessStateCode,
    pub wait_channel: String,
    pub children: Vec<ProcessNode>,
}

impl ProcessNode {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Build the descendant tree rooted at `root_pid` from a table scan.
pub fn build_tree(records: &[ProcessRecord], root_pid: u32) -> Option<ProcessNode> {
    let by_pid: HashMap<u32, &ProcessRecord> = records.iter().map(|r| (r.pid, r)).collect();
    let mut children: HashMap<u32, Vec<u32>> = HashMap::new();
    for record in records {
        children.entry(record.ppid).or_default().push(record.pid);
    }
    // Child order follows pid order, which tracks spawn order on the
    // platforms this runs on.
    for pids in children.values_mut() {
        pids.sort_unstable();
    }
    build_node(&by_pid, &children, root_pid)
}

fn build_node(
    by_pid: &HashMap<u32, &ProcessRecord>,
    children: &HashMap<u32, Vec<u32>>,
    pid: u32,
) -> Option<ProcessNode> {
    let record = by_pid.get(&pid)?;
    let child_nodes = children
        .get(&pid)
        .map(|pids| {
            pids.iter()
                .filter_map(|&c| build_node(by_pid, children, c))
                .collect()
        })
        .unwrap_or_default();
    Some(ProcessNode {
        pid: record.pid,
        ppid: record.ppid,
        name: record.name.clone(),
        state: record.state,
        wait_channel: record.wait_channel.clone(),
        children: child_nodes,
    })
}

/// The pane's shell and interesting process, plus the root-to-leaf chain
/// they were extracted from.
#[derive(Debug, Clone, Default)]
pub struct PaneProcesses {
    /// Path from the pane leader to the deepest followed descendant.
    pub chain: Vec<ProcessNode>,
    /// Shallowest known-shell node in the chain.
    pub shell: Option<ProcessNode>,
    /// First non-shell, non-wrapper descendant; `None` means the pane is
    /// at the shell prompt.
    pub process: Option<ProcessNode>,
}

impl PaneProcesses {
    pub fn shell_name(&self) -> Option<&str> {
        self.shell.as_ref().map(|n| n.name.as_str())
    }

    pub fn process_name(&self) -> Option<&str> {
        self.process.as_ref().map(|n| n.name.as_str())
    }
}

/// Extract the chain and its shell/process split from a tree.
///
/// The chain follows the first child at each level. A shell with several
/// child chains (job-control suspension followed by a new launch) keeps
/// only the first; selecting or merging sibling chains is a known
/// limitation.
pub fn extract_chain(
    root: &ProcessNode,
    shells: &HashSet<String>,
    skip: &HashSet<String>,
) -> PaneProcesses {
    let mut chain = Vec::new();
    let mut node = root;
    loop {
        // Chain nodes keep their subtree so handlers can apply the
        // no-children rule.
        chain.push(node.clone());
        match node.children.first() {
            Some(first) => node = first,
            None => break,
        }
    }

    let shell = chain.iter().find(|n| shells.contains(&n.name)).cloned();
    let process = chain
        .iter()
        .find(|n| !shells.contains(&n.name) && !skip.contains(&n.name))
        .cloned();

    PaneProcesses {
        chain,
        shell,
        process,
    }
}

/// Total introspection interface: real implementation scans the process
/// table; tests inject canned chains.
pub trait Introspect: Send + Sync {
    /// Inspect the tree under `root_pid`. Never fails: unreadable tables
    /// degrade to an empty result.
    fn inspect(&self, root_pid: u32) -> PaneProcesses;
}

/// Process-table-backed introspector.
pub struct SystemIntrospector {
    shells: HashSet<String>,
    skip: HashSet<String>,
}

impl SystemIntrospector {
    pub fn new(extra_skip: &[String]) -> Self {
        let mut skip: HashSet<String> = DEFAULT_SKIP_WRAPPERS
            .iter()
            .map(|s| s.to_string())
            .collect();
        skip.extend(extra_skip.iter().cloned());
        Self {
            shells: KNOWN_SHELLS.iter().map(|s| s.to_string()).collect(),
            skip,
        }
    }
}

impl Default for SystemIntrospector {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl Introspect for SystemIntrospector {
    fn inspect(&self, root_pid: u32) -> PaneProcesses {
        let records = match scan_process_table().or_else(|_| scan_via_ps()) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("process table scan failed: {e}");
                return PaneProcesses::default();
            }
        };
        match build_tree(&records, root_pid) {
            Some(root) => extract_chain(&root, &self.shells, &self.skip),
            None => {
                tracing::debug!("pid {root_pid} not found in process table");
                PaneProcesses::default()
            }
        }
    }
}

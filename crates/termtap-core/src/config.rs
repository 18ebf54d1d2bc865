//! Configuration contract.
//!
//! The supervisor consumes configuration through the [`ConfigStore`]
//! trait only: per-pane defaults, named init groups, and nothing else.
//! [`FileConfig`] is a JSON-file-backed implementation for the CLI;
//! embedding drivers supply their own store.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TermtapError;

/// Per-pane defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaneConfig {
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Command started in the pane when it is first created.
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub ready_pattern: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<f64>,
    /// Extra launcher wrappers ignored when picking the pane's process.
    #[serde(default)]
    pub skip_wrappers: Vec<String>,
}

/// One service of an init group, bound to a pane index of the group's
/// session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub pane: u32,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub ready_pattern: Option<String>,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub timeout_secs: Option<f64>,
}

/// A named multi-pane service layout, started as a unit. The session is
/// named after the group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitGroup {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_layout")]
    pub layout: String,
    pub services: Vec<ServiceSpec>,
}

fn default_layout() -> String {
    "tiled".to_string()
}

/// Configuration source consumed by the supervisor.
pub trait ConfigStore: Send + Sync {
    fn pane_config(&self, address: &str) -> Option<PaneConfig>;
    fn init_group(&self, name: &str) -> Option<InitGroup>;
    fn list_init_groups(&self) -> Vec<String>;
}

/// Empty configuration: no pane defaults, no groups.
pub struct NullConfig;

impl ConfigStore for NullConfig {
    fn pane_config(&self, _address: &str) -> Option<PaneConfig> {
        None
    }

    fn init_group(&self, _name: &str) -> Option<InitGroup> {
        None
    }

    fn list_init_groups(&self) -> Vec<String> {
        Vec::new()
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfigDoc {
    #[serde(default)]
    panes: BTreeMap<String, PaneConfig>,
    #[serde(default)]
    init_groups: BTreeMap<String, InitGroup>,
}

/// JSON-file-backed configuration store.
#[derive(Debug)]
pub struct FileConfig {
    panes: BTreeMap<String, PaneConfig>,
    init_groups: BTreeMap<String, InitGroup>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, TermtapError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| TermtapError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, TermtapError> {
        let mut doc: FileConfigDoc =
            serde_json::from_str(text).map_err(|e| TermtapError::Config(e.to_string()))?;
        // Group names live in the map keys; fill them into the values.
        for (key, group) in doc.init_groups.iter_mut() {
            if group.name.is_empty() {
                group.name = key.clone();
            }
        }
        Ok(Self {
            panes: doc.panes,
            init_groups: doc.init_groups,
        })
    }
}

impl ConfigStore for FileConfig {
    fn pane_config(&self, address: &str) -> Option<PaneConfig> {
        self.panes.get(address).cloned()
    }

    fn init_group(&self, name: &str) -> Option<InitGroup> {
        self.init_groups.get(name).cloned()
    }

    fn list_init_groups(&self) -> Vec<String> {
        self.init_groups.keys().cloned().collect()
    }
}

//! Stream sidecar metadata: command marks and read marks.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of the implicit read mark advanced after every completed command.
pub const LAST_READ: &str = "last_read";

/// Byte range in the stream file bracketing one command's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMark {
    pub command: String,
    /// Stream file size when the command was sent.
    pub start: u64,
    /// Stream file size when the command completed; open while running.
    pub end: Option<u64>,
    pub sent_at: DateTime<Utc>,
}

/// The JSON sidecar document, one per pane stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamMetadata {
    pub pane_id: String,
    pub address: String,
    pub stream_started: DateTime<Utc>,
    #[serde(default)]
    pub commands: BTreeMap<String, CommandMark>,
    #[serde(default)]
    pub read_marks: BTreeMap<String, u64>,
    pub last_activity: DateTime<Utc>,
}

impl StreamMetadata {
    pub fn new(pane_id: &str, address: &str) -> Self {
        let now = Utc::now();
        Self {
            pane_id: pane_id.to_string(),
            address: address.to_string(),
            stream_started: now,
            commands: BTreeMap::new(),
            read_marks: BTreeMap::new(),
            last_activity: now,
        }
    }

    /// Offset of the last command mark, if any. Used by the stale-pipe
    /// health check.
    pub fn last_mark_start(&self) -> Option<u64> {
        self.commands.values().map(|m| m.start).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trip() {
        let mut meta = StreamMetadata::new("%42", "demo:0.0");
        meta.commands.insert(
            "cmd_1".to_string(),
            CommandMark {
                command: "echo hello".to_string(),
                start: 0,
                end: Some(6),
                sent_at: Utc::now(),
            },
        );
        meta.read_marks.insert(LAST_READ.to_string(), 6);

        let json = serde_json::to_string_pretty(&meta).expect("serialize");
        let back: StreamMetadata = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, meta);
    }

    #[test]
    fn open_mark_serializes_null_end() {
        let mark = CommandMark {
            command: "sleep 5".to_string(),
            start: 10,
            end: None,
            sent_at: Utc::now(),
        };
        let json = serde_json::to_value(&mark).expect("serialize");
        assert!(json["end"].is_null());
    }

    #[test]
    fn missing_maps_default_empty() {
        let json = r#"{
            "pane_id": "%1",
            "address": "a:0.0",
            "stream_started": "2026-01-01T00:00:00Z",
            "last_activity": "2026-01-01T00:00:00Z"
        }"#;
        let meta: StreamMetadata = serde_json::from_str(json).expect("deserialize");
        assert!(meta.commands.is_empty());
        assert!(meta.read_marks.is_empty());
    }

    #[test]
    fn last_mark_start_is_max() {
        let mut meta = StreamMetadata::new("%1", "a:0.0");
        assert_eq!(meta.last_mark_start(), None);
        for (id, start) in [("cmd_a", 5u64), ("cmd_b", 42), ("cmd_c", 17)] {
            meta.commands.insert(
                id.to_string(),
                CommandMark {
                    command: String::new(),
                    start,
                    end: None,
                    sent_at: Utc::now(),
                },
            );
        }
        assert_eq!(meta.last_mark_start(), Some(42));
    }
}

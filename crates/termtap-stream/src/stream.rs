//! PaneStream: one pane's append-only byte mirror plus mark bookkeeping.
//!
//! The stream file is written by the multiplexer's pipe subprocess and
//! only read here; the sidecar is written only by this process. Readers
//! tolerate partial trailing writes — they may observe line fragments but
//! never seek past the current size.

use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use thiserror::Error;

use termtap_tmux::{TmuxCommandRunner, TmuxError, start_pipe, stop_pipe};

use crate::meta::{CommandMark, LAST_READ, StreamMetadata};

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("stream io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stream metadata error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Tmux(#[from] TmuxError),

    #[error("unknown command id: {0}")]
    UnknownCommand(String),
}

struct Inner {
    meta: StreamMetadata,
    /// Whether start() has seeded the metadata for this supervisor.
    initialized: bool,
}

/// Durable output mirror for a single pane.
pub struct PaneStream {
    pane_id: String,
    stream_path: PathBuf,
    meta_path: PathBuf,
    inner: Mutex<Inner>,
}

impl PaneStream {
    /// Create the handle. No files are touched until [`start`](Self::start).
    ///
    /// Files left over from a previous supervisor are treated as fresh:
    /// their bytes are kept (offsets stay valid) but marks are rebuilt
    /// only for commands issued by this process.
    pub fn new(dir: &Path, pane_id: &str, address: &str) -> Self {
        let safe_id = pane_id.replace('%', "").replace(':', "_");
        Self {
            pane_id: pane_id.to_string(),
            stream_path: dir.join(format!("{safe_id}.stream")),
            meta_path: dir.join(format!("{safe_id}.json")),
            inner: Mutex::new(Inner {
                meta: StreamMetadata::new(pane_id, address),
                initialized: false,
            }),
        }
    }

    pub fn pane_id(&self) -> &str {
        &self.pane_id
    }

    pub fn stream_path(&self) -> &Path {
        &self.stream_path
    }

    /// Current stream file size; zero when the file does not exist yet.
    pub fn size(&self) -> u64 {
        fs::metadata(&self.stream_path).map(|m| m.len()).unwrap_or(0)
    }

    /// Ensure the stream file exists, arrange the pane pipe, and seed the
    /// metadata. Idempotent: a second call changes nothing.
    pub fn start(&self, runner: &impl TmuxCommandRunner) -> Result<(), StreamError> {
        if let Some(parent) = self.stream_path.parent() {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.stream_path)?;
        start_pipe(runner, &self.pane_id, &self.stream_path)?;

        let mut inner = self.lock();
        if !inner.initialized {
            // Seed last_read at the current size so a surviving file's old
            // content never leaks into read_since; an empty stream seeds 0.
            let size = self.size();
            inner.meta.read_marks.insert(LAST_READ.to_string(), size);
            inner.initialized = true;
            self.persist(&inner.meta)?;
        }
        Ok(())
    }

    /// Stop the pane pipe and flush metadata. Files remain on disk.
    pub fn stop(&self, runner: &impl TmuxCommandRunner) -> Result<(), StreamError> {
        stop_pipe(runner, &self.pane_id)?;
        let inner = self.lock();
        self.persist(&inner.meta)?;
        Ok(())
    }

    /// Whether the pipe delivered any bytes after the most recent command
    /// mark. With no marks yet there is nothing to judge and the stream
    /// counts as healthy.
    pub fn is_healthy(&self) -> bool {
        let inner = self.lock();
        match inner.meta.last_mark_start() {
            Some(offset) => self.size() > offset,
            None => true,
        }
    }

    /// Recover from a stale pipe: detach and re-attach. Offsets stay valid
    /// because the pipe appends.
    pub fn restart_pipe(&self, runner: &impl TmuxCommandRunner) -> Result<(), StreamError> {
        tracing::warn!(pane = %self.pane_id, "stream pipe stale, restarting");
        stop_pipe(runner, &self.pane_id)?;
        start_pipe(runner, &self.pane_id, &self.stream_path)?;
        Ok(())
    }

    /// Record a command's starting offset.
    pub fn mark_command(&self, cmd_id: &str, command: &str) -> Result<u64, StreamError> {
        let size = self.size();
        let mut inner = self.lock();
        inner.meta.commands.insert(
            cmd_id.to_string(),
            CommandMark {
                command: command.to_string(),
                start: size,
                end: None,
                sent_at: Utc::now(),
            },
        );
        inner.meta.last_activity = Utc::now();
        self.persist(&inner.meta)?;
        Ok(size)
    }

    /// Close a command's mark at the current size and advance `last_read`.
    /// Idempotent: a closed mark is left untouched.
    pub fn mark_command_end(&self, cmd_id: &str) -> Result<(), StreamError> {
        let size = self.size();
        let mut inner = self.lock();
        let Some(mark) = inner.meta.commands.get_mut(cmd_id) else {
            return Err(StreamError::UnknownCommand(cmd_id.to_string()));
        };
        if mark.end.is_some() {
            return Ok(());
        }
        mark.end = Some(size);
        inner.meta.read_marks.insert(LAST_READ.to_string(), size);
        inner.meta.last_activity = Utc::now();
        self.persist(&inner.meta)?;
        Ok(())
    }

    /// Set a named read mark to the current size.
    pub fn mark_read(&self, name: &str) -> Result<(), StreamError> {
        let size = self.size();
        let mut inner = self.lock();
        inner.meta.read_marks.insert(name.to_string(), size);
        inner.meta.last_activity = Utc::now();
        self.persist(&inner.meta)?;
        Ok(())
    }

    /// The bytes a command produced, decoded lossily to UTF-8. An open
    /// mark reads up to the current size.
    pub fn read_command_output(&self, cmd_id: &str) -> Result<String, StreamError> {
        let (start, end) = {
            let inner = self.lock();
            let Some(mark) = inner.meta.commands.get(cmd_id) else {
                return Err(StreamError::UnknownCommand(cmd_id.to_string()));
            };
            (mark.start, mark.end)
        };
        let end = end.unwrap_or_else(|| self.size());
        self.read_range(start, end)
    }

    /// Everything appended since the named read mark (default
    /// [`LAST_READ`]); an unset mark reads from the beginning.
    pub fn read_since(&self, name: &str) -> Result<String, StreamError> {
        let start = {
            let inner = self.lock();
            inner.meta.read_marks.get(name).copied().unwrap_or(0)
        };
        self.read_range(start, self.size())
    }

    /// The whole stream.
    pub fn read_all(&self) -> Result<String, StreamError> {
        self.read_range(0, self.size())
    }

    /// An arbitrary byte range, decoded lossily. Used by pollers that
    /// track their own scan position.
    pub fn read_between(&self, start: u64, end: u64) -> Result<String, StreamError> {
        self.read_range(start, end.min(self.size()))
    }

    /// The last `n` lines of the stream.
    pub fn read_last_lines(&self, n: usize) -> Result<String, StreamError> {
        let all = self.read_all()?;
        let lines: Vec<&str> = all.lines().collect();
        let start = lines.len().saturating_sub(n);
        Ok(lines[start..].join("\n"))
    }

    /// The start offset of a command's mark, if the command is known.
    pub fn command_start(&self, cmd_id: &str) -> Option<u64> {
        self.lock().meta.commands.get(cmd_id).map(|m| m.start)
    }

    // ------------------------------------------------------------------
    // internal
    // ------------------------------------------------------------------

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_range(&self, start: u64, end: u64) -> Result<String, StreamError> {
        if end <= start || !self.stream_path.exists() {
            return Ok(String::new());
        }
        let mut file = fs::File::open(&self.stream_path)?;
        file.seek(SeekFrom::Start(start))?;
        let mut buf = vec![0u8; (end - start) as usize];
        let mut filled = 0;
        while filled < buf.len() {
            let n = file.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        buf.truncate(filled);
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Serialize through a temp file in the same directory and rename, so
    /// a concurrent reader never observes a torn sidecar.
    fn persist(&self, meta: &StreamMetadata) -> Result<(), StreamError> {
        let dir = self
            .meta_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&dir)?;
        let tmp = tempfile::NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&tmp, meta)?;
        tmp.persist(&self.meta_path)
            .map_err(|e| StreamError::Io(e.error))?;
        Ok(())
    }
}

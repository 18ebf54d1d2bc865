//! Ready-pattern matcher over newly appended stream bytes.
//!
//! A long-lived service never goes idle; its readiness shows up as a line
//! of output ("Listening on ..."). The scanner is fed each incremental
//! slice of the stream, scans complete lines once, keeps the partial
//! trailing line buffered for the next poll, and latches on first match.

use regex::Regex;

pub struct ReadyScanner {
    re: Regex,
    /// Partial trailing line carried over between polls.
    pending: String,
    matched: Option<String>,
}

impl ReadyScanner {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            re: Regex::new(pattern)?,
            pending: String::new(),
            matched: None,
        })
    }

    /// Feed newly appended text. Returns true once any line (or the
    /// current partial line, for prompts that never end in a newline) has
    /// matched; the match latches.
    pub fn push(&mut self, chunk: &str) -> bool {
        if self.matched.is_some() {
            return true;
        }
        self.pending.push_str(chunk);
        while let Some(pos) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=pos).collect();
            let line = line.trim_end_matches(['\n', '\r']);
            if self.re.is_match(line) {
                self.matched = Some(line.to_string());
                self.pending.clear();
                return true;
            }
        }
        if !self.pending.is_empty() && self.re.is_match(&self.pending) {
            self.matched = Some(self.pending.clone());
            self.pending.clear();
            return true;
        }
        false
    }

    pub fn is_matched(&self) -> bool {
        self.matched.is_some()
    }

    /// The line that matched, once one has.
    pub fn matched_line(&self) -> Option<&str> {
        self.matched.as_deref()
    }
}

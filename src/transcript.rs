//! Plain-text conversation transcripts
//!
//! One line per turn, alternating `User:` / `Bot:` prefixes. A peripheral
//! utility: every failure is logged and swallowed, a transcript problem
//! never interrupts a session.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::Result;

/// Which side of the conversation a line belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The human
    User,
    /// The assistant
    Bot,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "User"),
            Self::Bot => write!(f, "Bot"),
        }
    }
}

/// Appends conversation turns to a timestamped transcript file
pub struct TranscriptWriter {
    path: PathBuf,
    file: File,
}

impl TranscriptWriter {
    /// Create a transcript file named for the current time under `dir`
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file cannot be created
    pub fn create(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;

        let stamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
        let path = dir.join(format!("conversation_{stamp}.txt"));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        tracing::debug!(path = %path.display(), "transcript started");
        Ok(Self { path, file })
    }

    /// Append one turn; newlines in `text` are flattened to keep the
    /// one-line-per-turn format
    pub fn record(&mut self, role: Role, text: &str) {
        let line = text.replace('\n', " ");
        if let Err(e) = writeln!(self.file, "{role}: {line}") {
            tracing::warn!(error = %e, path = %self.path.display(), "transcript write failed");
        }
    }

    /// Path of the transcript file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_alternating_prefixed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = TranscriptWriter::create(dir.path()).unwrap();

        writer.record(Role::User, "hello");
        writer.record(Role::Bot, "hi\nthere");

        let content = std::fs::read_to_string(writer.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, ["User: hello", "Bot: hi there"]);
    }

    #[test]
    fn filename_is_timestamped() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TranscriptWriter::create(dir.path()).unwrap();

        let name = writer.path().file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("conversation_"));
        assert!(name.ends_with(".txt"));
    }
}

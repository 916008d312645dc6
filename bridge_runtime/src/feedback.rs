use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

/// Append-only text channel (feedback or world events).
pub trait FeedbackSink: Send + Sync {
    fn append(&self, message: &str) -> Result<(), ChannelError>;
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("failed to append to {path:?}: {source}")]
    Append {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Newline-delimited UTF-8 file. The file is opened per message so an
/// external reader may rotate or delete it between writes.
#[derive(Debug, Clone)]
pub struct FileChannel {
    path: PathBuf,
}

impl FileChannel {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_line(&self, message: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut line = String::with_capacity(message.len() + 1);
        line.push_str(message);
        line.push('\n');
        file.write_all(line.as_bytes())
    }
}

impl FeedbackSink for FileChannel {
    fn append(&self, message: &str) -> Result<(), ChannelError> {
        self.write_line(message)
            .map_err(|source| ChannelError::Append {
                path: self.path.clone(),
                source,
            })
    }
}

/// In-memory channel for tests and embedding hosts that consume feedback directly.
#[derive(Debug, Default)]
pub struct MemoryChannel {
    lines: Mutex<Vec<String>>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl FeedbackSink for MemoryChannel {
    fn append(&self, message: &str) -> Result<(), ChannelError> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_channel_appends_lines_and_creates_parents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("feedback.txt");
        let channel = FileChannel::new(&path);

        channel.append("first").expect("append first");
        channel.append("second").expect("append second");

        let contents = fs::read_to_string(&path).expect("read feedback");
        assert_eq!(contents, "first\nsecond\n");
    }

    #[test]
    fn file_channel_reports_unwritable_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        // A directory cannot be opened for appending.
        let channel = FileChannel::new(dir.path());
        let err = channel.append("lost").expect_err("directory is not a file");
        assert!(matches!(err, ChannelError::Append { .. }));
    }

    #[test]
    fn memory_channel_take_empties_buffer() {
        let channel = MemoryChannel::new();
        channel.append("a").unwrap();
        channel.append("b").unwrap();
        assert_eq!(channel.take(), vec!["a".to_string(), "b".to_string()]);
        assert!(channel.messages().is_empty());
    }
}

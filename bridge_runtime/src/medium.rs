//! The external queue medium: a newline-delimited command file shared with
//! an out-of-process controller.
//!
//! Both sides honour a lock file (`<queue>.lock`, created with exclusive
//! create semantics) before touching the queue file, so the bridge never
//! observes a half-written batch and never truncates lines appended after
//! its read. The drain is destructive and at-most-once: lines read and
//! truncated away are lost if the host dies before dispatching them.
//!
//! A stale lock is broken by renaming it to a unique tombstone, so only one
//! party can claim a given stale lock. The tombstone's age is checked again
//! after the rename; a lock refreshed in between is put back. Between that
//! rename and the restore, a third party can still create a fresh lock, in
//! which case the restored lock is dropped and its holder is not notified.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::{debug, warn};

const LOCK_EXTENSION: &str = ".lock";
const MAX_BACKOFF: Duration = Duration::from_millis(100);

static TOMBSTONE_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Error)]
pub enum MediumError {
    #[error("queue medium I/O failed at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("timed out after {waited:?} waiting for queue lock {path:?}")]
    LockTimeout { path: PathBuf, waited: Duration },
}

/// Result of a single destructive read of the medium.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainOutcome {
    /// No queue file exists yet.
    Absent,
    /// The controller holds the lock; try again later.
    Busy,
    /// Every non-empty line, in file order. The file is now empty.
    Drained(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct QueueMedium {
    path: PathBuf,
    lock_path: PathBuf,
    stale_after: Duration,
}

/// Exclusive ownership of the queue file. Released on drop.
#[derive(Debug)]
pub struct QueueLock {
    path: PathBuf,
}

impl Drop for QueueLock {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != ErrorKind::NotFound {
                warn!(
                    target: "state_bridge::source",
                    path = %self.path.display(),
                    error = %err,
                    "queue.lock_release_failed"
                );
            }
        }
    }
}

impl QueueMedium {
    pub fn new(path: impl Into<PathBuf>, stale_after: Duration) -> Self {
        let path = path.into();
        let lock_path = lock_path_for(&path);
        Self {
            path,
            lock_path,
            stale_after,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// Attempt to take the lock without waiting. `Ok(None)` means another
    /// party holds a lock that is not yet stale.
    pub fn try_lock(&self) -> Result<Option<QueueLock>, MediumError> {
        match self.create_lock() {
            Ok(lock) => Ok(Some(lock)),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                if !lock_is_stale(&self.lock_path, self.stale_after) || !self.break_stale_lock()? {
                    return Ok(None);
                }
                match self.create_lock() {
                    Ok(lock) => Ok(Some(lock)),
                    Err(err) if err.kind() == ErrorKind::AlreadyExists => Ok(None),
                    Err(err) => Err(self.lock_error(err)),
                }
            }
            Err(err) => Err(self.lock_error(err)),
        }
    }

    /// Move a stale lock out of the way. Returns `false` when the lock turned
    /// out to be live by the time it was claimed.
    fn break_stale_lock(&self) -> Result<bool, MediumError> {
        let tombstone = self.tombstone_path();
        match fs::rename(&self.lock_path, &tombstone) {
            Ok(()) => {}
            // Another party broke it first.
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(true),
            Err(err) => return Err(self.lock_error(err)),
        }

        let stale = lock_is_stale(&tombstone, self.stale_after);
        if stale {
            warn!(
                target: "state_bridge::source",
                path = %self.lock_path.display(),
                stale_after_ms = self.stale_after.as_millis() as u64,
                "queue.lock_broken=stale"
            );
        } else if let Err(err) = fs::hard_link(&tombstone, &self.lock_path) {
            warn!(
                target: "state_bridge::source",
                path = %self.lock_path.display(),
                error = %err,
                "queue.lock_restore_failed"
            );
        }
        if let Err(err) = fs::remove_file(&tombstone) {
            warn!(
                target: "state_bridge::source",
                path = %tombstone.display(),
                error = %err,
                "queue.tombstone_remove_failed"
            );
        }
        Ok(stale)
    }

    fn tombstone_path(&self) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let seq = TOMBSTONE_SEQ.fetch_add(1, Ordering::Relaxed);
        let mut name = self.lock_path.as_os_str().to_os_string();
        name.push(format!(".stale-{}-{nanos}-{seq}", std::process::id()));
        PathBuf::from(name)
    }

    /// Wait for the lock, sleeping with a capped exponential backoff.
    pub fn lock_blocking(&self, timeout: Duration) -> Result<QueueLock, MediumError> {
        let started = Instant::now();
        let mut backoff = Duration::from_millis(5);
        loop {
            if let Some(lock) = self.try_lock()? {
                return Ok(lock);
            }
            let waited = started.elapsed();
            if waited >= timeout {
                return Err(MediumError::LockTimeout {
                    path: self.lock_path.clone(),
                    waited,
                });
            }
            thread::sleep(backoff.min(timeout - waited));
            backoff = (backoff * 2).min(MAX_BACKOFF);
        }
    }

    /// Bridge side: read every queued line and truncate the file.
    pub fn drain(&self) -> Result<DrainOutcome, MediumError> {
        if !self.path.exists() {
            return Ok(DrainOutcome::Absent);
        }
        let Some(_lock) = self.try_lock()? else {
            debug!(
                target: "state_bridge::source",
                path = %self.lock_path.display(),
                "queue.drain_skipped=locked"
            );
            return Ok(DrainOutcome::Busy);
        };

        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(DrainOutcome::Absent),
            Err(err) => return Err(self.queue_error(err)),
        };
        if !bytes.is_empty() {
            File::create(&self.path).map_err(|err| self.queue_error(err))?;
        }
        Ok(DrainOutcome::Drained(split_commands(
            &String::from_utf8_lossy(&bytes),
        )))
    }

    /// Controller side: append complete lines under the lock. Returns the
    /// number of non-blank lines written.
    pub fn append<S: AsRef<str>>(&self, lines: &[S], timeout: Duration) -> Result<usize, MediumError> {
        let mut payload = String::new();
        let mut count = 0;
        for line in lines {
            let trimmed = line.as_ref().trim();
            if trimmed.is_empty() {
                continue;
            }
            payload.push_str(trimmed);
            payload.push('\n');
            count += 1;
        }
        if count == 0 {
            return Ok(0);
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| self.queue_error(err))?;
            }
        }
        let _lock = self.lock_blocking(timeout)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| self.queue_error(err))?;
        file.write_all(payload.as_bytes())
            .map_err(|err| self.queue_error(err))?;
        Ok(count)
    }

    fn create_lock(&self) -> io::Result<QueueLock> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.lock_path)?;
        let lock = QueueLock {
            path: self.lock_path.clone(),
        };
        writeln!(file, "{}", std::process::id())?;
        Ok(lock)
    }

    fn queue_error(&self, source: io::Error) -> MediumError {
        MediumError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn lock_error(&self, source: io::Error) -> MediumError {
        MediumError::Io {
            path: self.lock_path.clone(),
            source,
        }
    }
}

/// Split raw medium contents into trimmed, non-blank command lines.
pub fn split_commands(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn lock_is_stale(path: &Path, stale_after: Duration) -> bool {
    fs::metadata(path)
        .and_then(|metadata| metadata.modified())
        .ok()
        .map(|modified| {
            SystemTime::now()
                .duration_since(modified)
                .unwrap_or_default()
        })
        .map_or(false, |age| age >= stale_after)
}

fn lock_path_for(path: &Path) -> PathBuf {
    let mut name: OsString = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| OsString::from("commands_queue"));
    name.push(LOCK_EXTENSION);
    path.with_file_name(name)
}

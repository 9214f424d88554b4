//! File-backed [`Session`] persistence, advisory locking, and the
//! dismissal history log.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use fs2::FileExt;
use stet_session_models::{HistoryRecord, Session};

/// Oldest records are evicted once the log holds more than this many.
pub const HISTORY_ROTATION_CEILING: usize = 500;

const SESSION_FILE: &str = "session.json";
const LOCK_FILE: &str = "session.lock";
const HISTORY_FILE: &str = "history.jsonl";

const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(50);
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("failed to read {path}: {source}", path = .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}", path = .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("session state at {} is corrupt: {1}", .0.display())]
    Corrupt(PathBuf, serde_json::Error),

    #[error("session is already locked by another process (waited {0:?})")]
    AlreadyLocked(Duration),
}

/// Load/save layer for the session document, the advisory lock, and the
/// history log, all rooted at one state directory.
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Operate on state rooted at `dir` (typically `<repo>/.review`).
    /// Does not create the directory; that happens lazily on first save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn session_path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    fn lock_path(&self) -> PathBuf {
        self.dir.join(LOCK_FILE)
    }

    /// Load the session document, returning [`Session::empty`] if the file
    /// does not exist yet. Fails only on a read or parse error.
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError::Read`] on an I/O failure other than
    /// "not found", or [`SessionStoreError::Corrupt`] if the file exists
    /// but is not a valid `Session` document.
    pub fn load(&self) -> Result<Session, SessionStoreError> {
        let path = self.session_path();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Session::empty()),
            Err(source) => return Err(SessionStoreError::Read { path, source }),
        };
        serde_json::from_str(&text).map_err(|e| SessionStoreError::Corrupt(path, e))
    }

    /// Persist `session` via write-then-rename so a crash mid-write never
    /// leaves a partially-written `session.json`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError::Write`] if the directory cannot be
    /// created, the temporary file cannot be written, or the rename fails.
    pub fn save(&self, session: &Session) -> Result<(), SessionStoreError> {
        fs::create_dir_all(&self.dir).map_err(|source| SessionStoreError::Write {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.session_path();
        let tmp_path = self.dir.join(format!("{SESSION_FILE}.tmp"));
        let serialized =
            serde_json::to_vec_pretty(session).map_err(|e| SessionStoreError::Corrupt(path.clone(), e))?;

        {
            let mut tmp = File::create(&tmp_path).map_err(|source| SessionStoreError::Write {
                path: tmp_path.clone(),
                source,
            })?;
            tmp.write_all(&serialized)
                .map_err(|source| SessionStoreError::Write {
                    path: tmp_path.clone(),
                    source,
                })?;
            tmp.sync_all().map_err(|source| SessionStoreError::Write {
                path: tmp_path.clone(),
                source,
            })?;
        }

        fs::rename(&tmp_path, &path).map_err(|source| SessionStoreError::Write { path, source })
    }

    /// Remove the session document, if one exists. A no-op if the file is
    /// already absent.
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError::Write`] on any I/O failure other than
    /// "not found".
    pub fn delete(&self) -> Result<(), SessionStoreError> {
        match fs::remove_file(self.session_path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SessionStoreError::Write {
                path: self.session_path(),
                source,
            }),
        }
    }

    /// Acquire the advisory lock, blocking (polling) until it is free or
    /// [`LOCK_TIMEOUT`] elapses.
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError::AlreadyLocked`] if the timeout elapses
    /// while another process holds the lock, or a [`SessionStoreError::Write`]
    /// if the lock file itself cannot be created.
    pub fn acquire_lock(&self) -> Result<SessionLockGuard, SessionStoreError> {
        fs::create_dir_all(&self.dir).map_err(|source| SessionStoreError::Write {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|source| SessionStoreError::Write {
                path: path.clone(),
                source,
            })?;

        let start = Instant::now();
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(SessionLockGuard { file }),
                Err(_) if start.elapsed() >= LOCK_TIMEOUT => {
                    return Err(SessionStoreError::AlreadyLocked(start.elapsed()));
                }
                Err(_) => std::thread::sleep(LOCK_RETRY_INTERVAL),
            }
        }
    }
}

/// An acquired advisory lock. The lock is released when this guard drops,
/// on every exit path (normal return, error, or panic unwind).
pub struct SessionLockGuard {
    file: File,
}

impl Drop for SessionLockGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Append-only log of dismissal actions, rotated past
/// [`HISTORY_ROTATION_CEILING`] records.
pub struct HistoryLog {
    dir: PathBuf,
}

impl HistoryLog {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self) -> PathBuf {
        self.dir.join(HISTORY_FILE)
    }

    /// Load every record currently in the log, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError::Read`] on an I/O failure other than
    /// "not found", or [`SessionStoreError::Corrupt`] on the first
    /// unparseable line.
    pub fn load_all(&self) -> Result<Vec<HistoryRecord>, SessionStoreError> {
        let path = self.path();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(SessionStoreError::Read { path, source }),
        };
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line).map_err(|e| SessionStoreError::Corrupt(path.clone(), e))
            })
            .collect()
    }

    /// Append `record`, rotating the oldest entries out once the log
    /// exceeds [`HISTORY_ROTATION_CEILING`]. The whole file is rewritten
    /// via write-then-rename, so a crash mid-append never truncates it.
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError`] on any read, parse, or write failure.
    pub fn append(&self, record: &HistoryRecord) -> Result<(), SessionStoreError> {
        fs::create_dir_all(&self.dir).map_err(|source| SessionStoreError::Write {
            path: self.dir.clone(),
            source,
        })?;

        let mut records = self.load_all()?;
        records.push(record.clone());
        if records.len() > HISTORY_ROTATION_CEILING {
            let drop_count = records.len() - HISTORY_ROTATION_CEILING;
            records.drain(0..drop_count);
        }

        let path = self.path();
        let tmp_path = self.dir.join(format!("{HISTORY_FILE}.tmp"));
        let mut tmp = File::create(&tmp_path).map_err(|source| SessionStoreError::Write {
            path: tmp_path.clone(),
            source,
        })?;
        for record in &records {
            let line = serde_json::to_string(record)
                .map_err(|e| SessionStoreError::Corrupt(path.clone(), e))?;
            writeln!(tmp, "{line}").map_err(|source| SessionStoreError::Write {
                path: tmp_path.clone(),
                source,
            })?;
        }
        tmp.sync_all().map_err(|source| SessionStoreError::Write {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &path).map_err(|source| SessionStoreError::Write { path, source })
    }
}

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

pub const LOCK_FILE: &str = ".lock";

const RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Exclusive hold on a data directory for one load → mutate → save.
///
/// The `.lock` file is created once and never removed. Unlinking it on
/// release would let a waiter lock the orphaned inode while a newcomer
/// locks a fresh file at the same path.
pub struct DataDirLock {
    _file: File,
    path: PathBuf,
}

/// Error type for lock operations
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not open lock file {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("timed out waiting for {path}: another lu process is writing")]
    Timeout { path: PathBuf },
    #[error("lock error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataDirLock {
    /// Block up to `timeout` for the lock on `data_dir`, creating the
    /// directory if needed.
    pub fn acquire(data_dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        fs::create_dir_all(data_dir)?;
        let path = data_dir.join(LOCK_FILE);
        let deadline = Instant::now() + timeout;

        loop {
            let file = open_lock_file(&path)?;
            if flock_exclusive(&file).is_ok() {
                if still_at_path(&file, &path) {
                    tracing::debug!(path = %path.display(), "data dir locked");
                    return Ok(DataDirLock { _file: file, path });
                }
                // the file we locked was replaced under us; reopen and retry
            }
            drop(file);
            if Instant::now() >= deadline {
                return Err(LockError::Timeout { path });
            }
            std::thread::sleep(RETRY_INTERVAL);
        }
    }

    /// Acquire with the default 5 second timeout
    pub fn acquire_default(data_dir: &Path) -> Result<Self, LockError> {
        Self::acquire(data_dir, Duration::from_secs(5))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn open_lock_file(path: &Path) -> Result<File, LockError> {
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(path)
        .map_err(|e| LockError::Open {
            path: path.to_path_buf(),
            source: e,
        })
}

#[cfg(unix)]
fn flock_exclusive(file: &File) -> Result<(), std::io::Error> {
    use std::os::unix::io::AsRawFd;
    let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn flock_exclusive(_file: &File) -> Result<(), std::io::Error> {
    Ok(())
}

/// Whether the locked handle and the path still name the same inode.
#[cfg(unix)]
fn still_at_path(file: &File, path: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    match (file.metadata(), fs::metadata(path)) {
        (Ok(held), Ok(current)) => held.dev() == current.dev() && held.ino() == current.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn still_at_path(_file: &File, path: &Path) -> bool {
    path.exists()
}

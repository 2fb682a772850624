use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use tempfile::NamedTempFile;

use crate::model::state::ProgressState;

pub const STATE_FILE: &str = "state.json";

const BACKUP_STAMP: &str = "%Y%m%dT%H%M%S";

/// Error type for writing the state document
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error("{path} is unreadable and could not be backed up: {source}")]
    BackupFailed { path: PathBuf, source: io::Error },
    #[error("could not serialize state: {0}")]
    SerializeError(#[from] serde_json::Error),
    #[error("io error: {0}")]
    IoError(#[from] io::Error),
}

pub fn state_path(data_dir: &Path) -> PathBuf {
    data_dir.join(STATE_FILE)
}

/// `Ok(None)` when there is no state file yet.
fn read_state(path: &Path) -> Result<Option<ProgressState>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(path).map_err(|e| e.to_string())?;
    let state = serde_json::from_str(&text).map_err(|e| e.to_string())?;
    Ok(Some(state))
}

/// Load the state document for display.
///
/// A missing file yields the default state. An unreadable or corrupt file
/// also yields the default state, with a warning; the file is left alone.
pub fn load_state(data_dir: &Path) -> ProgressState {
    let path = state_path(data_dir);
    match read_state(&path) {
        Ok(Some(state)) => {
            tracing::debug!(path = %path.display(), days = state.history.len(), "state loaded");
            state
        }
        Ok(None) => {
            tracing::debug!(path = %path.display(), "no state file, starting fresh");
            ProgressState::default()
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "could not parse state, showing defaults"
            );
            ProgressState::default()
        }
    }
}

/// Load the state document ahead of a save.
///
/// Like [`load_state`], except a corrupt file is first copied to a
/// backup of its own (`state.json.<timestamp>.bak`). If that copy fails
/// the load fails too, so the caller never saves over the only copy.
pub fn load_state_for_write(data_dir: &Path) -> Result<ProgressState, StoreError> {
    let path = state_path(data_dir);
    match read_state(&path) {
        Ok(Some(state)) => Ok(state),
        Ok(None) => Ok(ProgressState::default()),
        Err(e) => {
            let stamp = Local::now().format(BACKUP_STAMP).to_string();
            let bak = backup_corrupt(&path, &stamp).map_err(|source| {
                tracing::warn!(
                    path = %path.display(),
                    error = %source,
                    "corrupt state could not be backed up, refusing to overwrite it"
                );
                StoreError::BackupFailed {
                    path: path.clone(),
                    source,
                }
            })?;
            tracing::warn!(
                path = %path.display(),
                backup = %bak.display(),
                error = %e,
                "could not parse state, starting from defaults"
            );
            Ok(ProgressState::default())
        }
    }
}

/// Copy `path` to the first free `<name>.<stamp>[-N].bak` beside it.
fn backup_corrupt(path: &Path, stamp: &str) -> io::Result<PathBuf> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| STATE_FILE.to_string());
    let mut n = 0u32;
    loop {
        let candidate = if n == 0 {
            format!("{name}.{stamp}.bak")
        } else {
            format!("{name}.{stamp}-{n}.bak")
        };
        let bak = path.with_file_name(candidate);
        if fs::symlink_metadata(&bak).is_err() {
            fs::copy(path, &bak)?;
            return Ok(bak);
        }
        n += 1;
    }
}

/// The exact text `save_state` writes.
pub fn render_state(state: &ProgressState) -> Result<String, StoreError> {
    let mut text = serde_json::to_string_pretty(state)?;
    text.push('\n');
    Ok(text)
}

/// Write the state document atomically, creating the data directory if needed.
pub fn save_state(data_dir: &Path, state: &ProgressState) -> Result<(), StoreError> {
    fs::create_dir_all(data_dir)?;
    let path = state_path(data_dir);
    let text = render_state(state)?;
    atomic_write(&path, text.as_bytes()).map_err(|e| StoreError::WriteError {
        path: path.clone(),
        source: e,
    })?;
    tracing::debug!(path = %path.display(), bytes = text.len(), "state saved");
    Ok(())
}

/// The persisted document as stored on disk, or the default document when
/// nothing has been saved yet.
pub fn export_bytes(data_dir: &Path) -> Result<Vec<u8>, StoreError> {
    let path = state_path(data_dir);
    if path.exists() {
        return Ok(fs::read(&path)?);
    }
    Ok(render_state(&ProgressState::default())?.into_bytes())
}

/// Copy the persisted document to `dest` unchanged.
pub fn export_state(data_dir: &Path, dest: &Path) -> Result<(), StoreError> {
    let bytes = export_bytes(data_dir)?;
    atomic_write(dest, &bytes).map_err(|e| StoreError::WriteError {
        path: dest.to_path_buf(),
        source: e,
    })
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

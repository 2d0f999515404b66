//! Durable scalars shared between passes
//!
//! - `position`: number of source lines already processed
//! - `alert_state`: fingerprint of the last alert that was delivered
//!
//! Both live in small plain-text files and are replaced atomically
//! (temp file + fsync + rename) so a crash never leaves a half-written value.

pub mod alert_state;
pub mod position;

pub use alert_state::{AlertStateStore, FileAlertStateStore};
pub use position::{FilePositionStore, PositionStore};

use crate::utils::AppError;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::error;

fn create_parent_dir(path: &Path) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            error!(error = %e, dir = %parent.display(), "Failed to create state directory");
            AppError::state_file(format!("Failed to create {}: {}", parent.display(), e))
        })?;
    }
    Ok(())
}

fn open_for_append(path: &Path, create: bool) -> Result<(), AppError> {
    OpenOptions::new()
        .create(create)
        .append(true)
        .open(path)
        .map(|_| ())
        .map_err(|e| {
            error!(error = %e, file = %path.display(), "Failed to open state file");
            AppError::state_file(format!("Failed to open {}: {}", path.display(), e))
        })
}

/// Create the parent directory and check the file can be opened for writing.
fn prepare_state_file(path: &Path) -> Result<(), AppError> {
    create_parent_dir(path)?;
    open_for_append(path, true)
}

/// Like [`prepare_state_file`] but leaves a missing file absent.
///
/// Writability is checked through the temp file the first store will use.
fn prepare_lazy_state_file(path: &Path) -> Result<(), AppError> {
    create_parent_dir(path)?;
    if path.exists() {
        return open_for_append(path, false);
    }

    let tmp = temp_path(path);
    open_for_append(&tmp, true)?;
    fs::remove_file(&tmp).map_err(|e| {
        error!(error = %e, file = %tmp.display(), "Failed to remove temp state file");
        AppError::state_file(format!("Failed to remove {}: {}", tmp.display(), e))
    })
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replace `path` with `contents` in one rename.
fn write_atomically(path: &Path, contents: &str) -> Result<(), AppError> {
    let tmp = temp_path(path);

    let mut file = File::create(&tmp).map_err(|e| {
        error!(error = %e, file = %tmp.display(), "Failed to create temp state file");
        AppError::storage(format!("Failed to create {}: {}", tmp.display(), e))
    })?;
    file.write_all(contents.as_bytes())
        .and_then(|_| file.sync_all())
        .map_err(|e| {
            error!(error = %e, file = %tmp.display(), "Failed to write temp state file");
            AppError::storage(format!("Failed to write {}: {}", tmp.display(), e))
        })?;

    fs::rename(&tmp, path).map_err(|e| {
        error!(error = %e, file = %path.display(), "Failed to replace state file");
        AppError::storage(format!("Failed to replace {}: {}", path.display(), e))
    })
}

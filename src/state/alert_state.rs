use super::{prepare_lazy_state_file, write_atomically};
use crate::utils::AppError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Durable fingerprint of the last delivered alert
pub trait AlertStateStore: Send + Sync {
    /// Last delivered fingerprint; empty when none was ever sent.
    fn load(&self) -> String;

    fn store(&self, fingerprint: &str) -> Result<(), AppError>;
}

/// Fingerprint kept as a plain-text hex digest
#[derive(Debug, Clone)]
pub struct FileAlertStateStore {
    path: PathBuf,
}

impl FileAlertStateStore {
    /// Check the fingerprint file can be written; it is not created before the first store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();
        prepare_lazy_state_file(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AlertStateStore for FileAlertStateStore {
    fn load(&self) -> String {
        match fs::read_to_string(&self.path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                debug!(error = %e, file = %self.path.display(), "No readable alert state");
                String::new()
            }
        }
    }

    fn store(&self, fingerprint: &str) -> Result<(), AppError> {
        write_atomically(&self.path, fingerprint)?;
        debug!(fingerprint = %fingerprint, "Saved last alert fingerprint");
        Ok(())
    }
}

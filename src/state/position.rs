use super::{prepare_state_file, write_atomically};
use crate::utils::AppError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Durable count of source lines already processed
pub trait PositionStore: Send + Sync {
    /// Last committed line count; 0 when absent or unreadable.
    fn load(&self) -> u64;

    /// Overwrite the committed line count.
    fn store(&self, position: u64) -> Result<(), AppError>;
}

/// Position marker kept as a plain-text integer
#[derive(Debug, Clone)]
pub struct FilePositionStore {
    path: PathBuf,
}

impl FilePositionStore {
    /// Open the marker file, creating it and its directory if needed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();
        prepare_state_file(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PositionStore for FilePositionStore {
    fn load(&self) -> u64 {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                debug!(error = %e, file = %self.path.display(), "No readable position marker, starting at 0");
                return 0;
            }
        };

        let trimmed = content.trim();
        if trimmed.is_empty() {
            return 0;
        }

        match trimmed.parse::<u64>() {
            Ok(position) => position,
            Err(e) => {
                warn!(
                    error = %e,
                    content = %trimmed,
                    file = %self.path.display(),
                    "Corrupt position marker, treating source as never ingested"
                );
                0
            }
        }
    }

    fn store(&self, position: u64) -> Result<(), AppError> {
        write_atomically(&self.path, &position.to_string())?;
        debug!(position = position, "Saved position marker");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::temp_dir;
    use uuid::Uuid;

    fn marker_path() -> PathBuf {
        temp_dir()
            .join(format!("test_position_{}", Uuid::new_v4()))
            .join("state")
            .join("logs.meta")
    }

    #[test]
    fn should_start_at_zero_for_new_marker() {
        // Arrange
        let store = FilePositionStore::open(marker_path()).expect("Failed to open store");

        // Act & Assert
        assert_eq!(store.load(), 0);
        assert!(store.path().exists());
    }

    #[test]
    fn should_store_and_reload_position() {
        // Arrange
        let path = marker_path();
        let store = FilePositionStore::open(&path).expect("Failed to open store");

        // Act
        store.store(17).expect("Failed to store");
        let reopened = FilePositionStore::open(&path).expect("Failed to reopen store");

        // Assert
        assert_eq!(reopened.load(), 17);
        assert_eq!(fs::read_to_string(&path).unwrap(), "17");
    }

    #[test]
    fn should_treat_corrupt_marker_as_zero() {
        // Arrange
        let path = marker_path();
        let store = FilePositionStore::open(&path).expect("Failed to open store");
        fs::write(&path, "not-a-number").unwrap();

        // Act & Assert
        assert_eq!(store.load(), 0);
    }

    #[test]
    fn should_treat_negative_marker_as_zero() {
        let path = marker_path();
        let store = FilePositionStore::open(&path).expect("Failed to open store");
        fs::write(&path, "-4").unwrap();

        assert_eq!(store.load(), 0);
    }

    #[test]
    fn should_tolerate_surrounding_whitespace() {
        let path = marker_path();
        let store = FilePositionStore::open(&path).expect("Failed to open store");
        fs::write(&path, " 42\n").unwrap();

        assert_eq!(store.load(), 42);
    }

    #[test]
    fn should_fail_to_open_when_parent_is_a_file() {
        // Arrange
        let base = temp_dir().join(format!("test_position_blocked_{}", Uuid::new_v4()));
        fs::create_dir_all(&base).unwrap();
        let blocker = base.join("blocker");
        fs::write(&blocker, "file").unwrap();

        // Act
        let result = FilePositionStore::open(blocker.join("logs.meta"));

        // Assert
        assert!(matches!(result, Err(AppError::StateFile(_))));
    }
}

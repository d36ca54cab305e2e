/// Backend selection
///
/// The active backend is chosen once, from configuration, when the process
/// starts. Everything downstream talks to `StorageBackend` through the
/// `HabitStorage` contract and cannot tell which variant it holds.

use std::sync::Arc;

use crate::config::{BackendKind, StorageConfig};
use crate::domain::{
    AuthResult, CheckInId, CheckInResult, Clock, DeleteResult, Habit, HabitId, HabitResult, User,
    UserId,
};
use crate::storage::{HabitStorage, LocalStorage, SqliteStorage, StorageError};

/// One of the two interchangeable storage backends
pub enum StorageBackend {
    /// Durable SQLite database
    Relational(SqliteStorage),
    /// Client-side key-value store
    Local(LocalStorage),
}

impl StorageBackend {
    /// Open the backend described by `config`
    pub fn open(config: &StorageConfig, clock: Arc<dyn Clock>) -> Result<Self, StorageError> {
        let backend = match config.backend {
            BackendKind::Relational => {
                StorageBackend::Relational(SqliteStorage::new(&config.database_path)?.with_clock(clock))
            }
            BackendKind::Local => {
                let storage = LocalStorage::open(&config.local_store_path).with_clock(clock);
                if config.seed_demo_user {
                    storage.seed_demo_user()?;
                }
                StorageBackend::Local(storage)
            }
        };

        tracing::info!("Using {} storage backend", backend.kind());
        Ok(backend)
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            StorageBackend::Relational(_) => BackendKind::Relational,
            StorageBackend::Local(_) => BackendKind::Local,
        }
    }

    fn inner(&self) -> &dyn HabitStorage {
        match self {
            StorageBackend::Relational(storage) => storage,
            StorageBackend::Local(storage) => storage,
        }
    }
}

impl HabitStorage for StorageBackend {
    fn find_habits_for_user(&self, user_id: UserId) -> Result<Vec<Habit>, StorageError> {
        self.inner().find_habits_for_user(user_id)
    }

    fn create_habit(&self, title: &str, user_id: UserId) -> Result<HabitResult, StorageError> {
        self.inner().create_habit(title, user_id)
    }

    fn delete_habit(&self, habit_id: HabitId, user_id: UserId) -> Result<DeleteResult, StorageError> {
        self.inner().delete_habit(habit_id, user_id)
    }

    fn create_check_in(&self, habit_id: HabitId, user_id: UserId) -> Result<CheckInResult, StorageError> {
        self.inner().create_check_in(habit_id, user_id)
    }

    fn delete_check_in(&self, check_in_id: CheckInId, user_id: UserId) -> Result<DeleteResult, StorageError> {
        self.inner().delete_check_in(check_in_id, user_id)
    }

    fn create_user(&self, username: &str, password: &str) -> Result<AuthResult, StorageError> {
        self.inner().create_user(username, password)
    }

    fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>, StorageError> {
        self.inner().authenticate(username, password)
    }

    fn delete_user(&self, user_id: UserId) -> Result<DeleteResult, StorageError> {
        self.inner().delete_user(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    use crate::domain::SystemClock;

    fn config(dir: &TempDir, backend: BackendKind) -> StorageConfig {
        StorageConfig {
            backend,
            database_path: dir.path().join("habits.db"),
            local_store_path: dir.path().join("local_store.json"),
            seed_demo_user: true,
        }
    }

    #[test]
    fn test_open_selects_configured_variant() {
        let dir = TempDir::new().unwrap();

        let relational = StorageBackend::open(&config(&dir, BackendKind::Relational), Arc::new(SystemClock)).unwrap();
        assert_eq!(relational.kind(), BackendKind::Relational);

        let local = StorageBackend::open(&config(&dir, BackendKind::Local), Arc::new(SystemClock)).unwrap();
        assert_eq!(local.kind(), BackendKind::Local);
        assert!(local.authenticate("demo", "password").unwrap().is_some());
    }
}

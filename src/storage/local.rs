/// Client-side key-value implementation of the storage adapter
///
/// Mirrors a browser `localStorage` deployment: the whole dataset lives as one
/// JSON document under a single key. Every mutation is a read-modify-write
/// through `KeyValueStore::modify`, which excludes every other writer of the
/// same store; that is what makes the one-check-in-per-day check inside
/// `insert_check_in` atomic here.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::domain::{
    AuthResult, CheckIn, CheckInId, CheckInResult, Clock, DeleteResult, DomainError, Habit,
    HabitId, HabitResult, Outcome, SystemClock, User, UserId,
};
use crate::service::{into_outcome, CompletionService, CredentialHasher, Sha256Hasher};
use crate::storage::{CheckInLedger, HabitStorage, StorageError};

/// Key the dataset is stored under
pub const DATA_KEY: &str = "quest_tracker_data";

/// Credentials of the optional demo account
pub const DEMO_USERNAME: &str = "demo";
pub const DEMO_PASSWORD: &str = "password";

/// Rewrites the value under one key; `Ok(None)` leaves the store untouched
pub type Modification<'a> = dyn FnMut(Option<String>) -> Result<Option<String>, StorageError> + 'a;

/// Minimal string key-value store, the shape of `window.localStorage`
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Read the value under `key` and write back what `f` returns
    ///
    /// No other writer of the same underlying store, in this process or any
    /// other, can interleave between the read and the write.
    fn modify(&self, key: &str, f: &mut Modification<'_>) -> Result<(), StorageError>;
}

/// Process-local key-value store; contents vanish when dropped
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.entries.lock().map_err(|_| StorageError::Poisoned)
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries()?.remove(key);
        Ok(())
    }

    fn modify(&self, key: &str, f: &mut Modification<'_>) -> Result<(), StorageError> {
        let mut entries = self.entries()?;
        if let Some(value) = f(entries.get(key).cloned())? {
            entries.insert(key.to_string(), value);
        }
        Ok(())
    }
}

/// Key-value store persisted as a single JSON object on disk
///
/// Writers hold an exclusive lock on a sibling `.lock` file from load to
/// save, so separate handles and separate processes on the same path never
/// lose each other's writes. The new contents are written to a fresh
/// temporary file in the same directory and persisted over the store, so
/// readers never see a half-written file.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Take the writer lock; released when the returned handle is dropped
    fn lock(&self) -> Result<File, StorageError> {
        fs::create_dir_all(self.dir())?;
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.path.with_extension("lock"))?;
        lock_file.lock_exclusive()?;
        Ok(lock_file)
    }

    fn load(&self) -> Result<HashMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(HashMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, entries: &HashMap<String, String>) -> Result<(), StorageError> {
        let mut temp = NamedTempFile::new_in(self.dir())?;
        temp.write_all(&serde_json::to_vec(entries)?)?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| StorageError::Io(e.error))?;
        Ok(())
    }

    /// Load, change, and save while holding the writer lock
    fn rewrite(
        &self,
        f: impl FnOnce(&mut HashMap<String, String>) -> Result<bool, StorageError>,
    ) -> Result<(), StorageError> {
        let _lock = self.lock()?;
        let mut entries = self.load()?;
        if f(&mut entries)? {
            self.save(&entries)?;
        }
        Ok(())
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        // persist is an atomic rename, so an unlocked read sees a whole document
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.rewrite(|entries| {
            entries.insert(key.to_string(), value.to_string());
            Ok(true)
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.rewrite(|entries| Ok(entries.remove(key).is_some()))
    }

    fn modify(&self, key: &str, f: &mut Modification<'_>) -> Result<(), StorageError> {
        self.rewrite(|entries| match f(entries.get(key).cloned())? {
            Some(value) => {
                entries.insert(key.to_string(), value);
                Ok(true)
            }
            None => Ok(false),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserRecord {
    id: UserId,
    username: String,
    password_digest: String,
    created_at: DateTime<Utc>,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        User::from_existing(record.id, record.username, record.password_digest, record.created_at)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct HabitRecord {
    id: HabitId,
    title: String,
    user_id: UserId,
    created_at: DateTime<Utc>,
}

/// Everything the backend stores, as one JSON document
#[derive(Debug, Default, Serialize, Deserialize)]
struct Dataset {
    #[serde(default)]
    users: Vec<UserRecord>,
    #[serde(default)]
    habits: Vec<HabitRecord>,
    #[serde(default)]
    check_ins: Vec<CheckIn>,
}

impl Dataset {
    fn user(&self, user_id: UserId) -> Option<User> {
        self.users
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
            .map(User::from)
    }

    fn owned_habit(&self, habit_id: HabitId, user_id: UserId) -> Option<Habit> {
        self.habits
            .iter()
            .find(|h| h.id == habit_id && h.user_id == user_id)
            .map(|h| Habit::from_existing(h.id, h.title.clone(), h.user_id, h.created_at, Vec::new()))
    }
}

/// Key-value backed storage
pub struct LocalStorage {
    store: Box<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    hasher: Arc<dyn CredentialHasher>,
}

impl LocalStorage {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            hasher: Arc::new(Sha256Hasher),
        }
    }

    /// Storage backed by a fresh in-memory key-value store
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryKeyValueStore::new()))
    }

    /// Storage backed by a JSON file at `path`
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let store = FileKeyValueStore::new(path);
        tracing::info!("Key-value storage initialized at: {}", store.path().display());
        Self::new(Box::new(store))
    }

    /// Replace the clock used for "now" and "today"
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the password hasher
    pub fn with_hasher(mut self, hasher: Arc<dyn CredentialHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    /// Create the demo account if it does not exist yet
    pub fn seed_demo_user(&self) -> Result<(), StorageError> {
        match self.create_user(DEMO_USERNAME, DEMO_PASSWORD)? {
            Outcome::Success { data } => tracing::info!("Seeded demo user ({})", data.id),
            Outcome::Failure { .. } => tracing::debug!("Demo user already present"),
        }
        Ok(())
    }

    /// Erase the whole dataset
    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(DATA_KEY)
    }

    fn parse(json: Option<&str>) -> Result<Dataset, StorageError> {
        match json {
            Some(json) => Ok(serde_json::from_str(json)?),
            None => Ok(Dataset::default()),
        }
    }

    /// Snapshot read of the dataset
    fn read<T>(&self, f: impl FnOnce(&Dataset) -> T) -> Result<T, StorageError> {
        let data = Self::parse(self.store.get(DATA_KEY)?.as_deref())?;
        Ok(f(&data))
    }

    /// Atomic read-modify-write; the closure decides whether anything changed
    fn update<T>(
        &self,
        f: impl FnOnce(&mut Dataset) -> Result<(T, bool), StorageError>,
    ) -> Result<T, StorageError> {
        let mut f = Some(f);
        let mut value = None;

        self.store.modify(DATA_KEY, &mut |current| {
            let f = f
                .take()
                .ok_or_else(|| StorageError::Corrupt("dataset update applied twice".to_string()))?;
            let mut data = Self::parse(current.as_deref())?;
            let (result, changed) = f(&mut data)?;
            value = Some(result);
            if changed {
                Ok(Some(serde_json::to_string(&data)?))
            } else {
                Ok(None)
            }
        })?;

        value.ok_or_else(|| StorageError::Corrupt("dataset update never ran".to_string()))
    }
}

impl CheckInLedger for LocalStorage {
    fn check_ins_for(&self, user_id: UserId, habit_id: HabitId) -> Result<Vec<CheckIn>, StorageError> {
        self.read(|data| {
            data.check_ins
                .iter()
                .filter(|c| c.user_id == user_id && c.habit_id == habit_id)
                .cloned()
                .collect()
        })
    }

    fn insert_check_in(&self, check_in: &CheckIn) -> Result<(), StorageError> {
        self.update(|data| {
            if data.check_ins.iter().any(|c| c.collides_with(check_in)) {
                return Err(StorageError::DuplicateCheckIn {
                    habit_id: check_in.habit_id.to_string(),
                    date: check_in.date().to_string(),
                });
            }
            data.check_ins.push(check_in.clone());
            Ok(((), true))
        })
    }

    fn find_check_in(&self, check_in_id: CheckInId) -> Result<Option<CheckIn>, StorageError> {
        self.read(|data| data.check_ins.iter().find(|c| c.id == check_in_id).cloned())
    }

    fn remove_check_in(&self, check_in_id: CheckInId) -> Result<bool, StorageError> {
        self.update(|data| {
            let before = data.check_ins.len();
            data.check_ins.retain(|c| c.id != check_in_id);
            let removed = data.check_ins.len() != before;
            Ok((removed, removed))
        })
    }
}

impl HabitStorage for LocalStorage {
    fn find_habits_for_user(&self, user_id: UserId) -> Result<Vec<Habit>, StorageError> {
        self.read(|data| {
            let mut habits: Vec<Habit> = data
                .habits
                .iter()
                .filter(|h| h.user_id == user_id)
                .map(|h| {
                    let mut check_ins: Vec<CheckIn> = data
                        .check_ins
                        .iter()
                        .filter(|c| c.habit_id == h.id)
                        .cloned()
                        .collect();
                    check_ins.sort_by_key(|c| c.checked_in_at);
                    Habit::from_existing(h.id, h.title.clone(), h.user_id, h.created_at, check_ins)
                })
                .collect();
            // newest first; among equal timestamps the later insert comes first
            habits.reverse();
            habits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            habits
        })
    }

    fn create_habit(&self, title: &str, user_id: UserId) -> Result<HabitResult, StorageError> {
        self.update(|data| {
            if data.user(user_id).is_none() {
                return Ok((DomainError::UserNotFound.into(), false));
            }
            let habit = match Habit::new(title, user_id, self.clock.as_ref()) {
                Ok(habit) => habit,
                Err(e) => return Ok((e.into(), false)),
            };

            data.habits.push(HabitRecord {
                id: habit.id,
                title: habit.title.clone(),
                user_id: habit.user_id,
                created_at: habit.created_at,
            });
            tracing::debug!("Created habit: {} ({})", habit.title, habit.id);
            Ok((Outcome::success(habit), true))
        })
    }

    fn delete_habit(&self, habit_id: HabitId, user_id: UserId) -> Result<DeleteResult, StorageError> {
        self.update(|data| {
            let before = data.habits.len();
            data.habits.retain(|h| !(h.id == habit_id && h.user_id == user_id));
            if data.habits.len() == before {
                return Ok((DomainError::HabitNotFound.into(), false));
            }

            data.check_ins.retain(|c| c.habit_id != habit_id);
            tracing::debug!("Deleted habit {} with its check-ins", habit_id);
            Ok((Outcome::success(()), true))
        })
    }

    fn create_check_in(&self, habit_id: HabitId, user_id: UserId) -> Result<CheckInResult, StorageError> {
        let (habit, user) = self.read(|data| (data.owned_habit(habit_id, user_id), data.user(user_id)))?;
        let Some(habit) = habit else {
            return Ok(DomainError::HabitNotFound.into());
        };

        let service = CompletionService::new(self, self.clock.as_ref());
        into_outcome(service.complete(user.as_ref(), Some(&habit)))
    }

    fn delete_check_in(&self, check_in_id: CheckInId, user_id: UserId) -> Result<DeleteResult, StorageError> {
        let service = CompletionService::new(self, self.clock.as_ref());
        into_outcome(service.uncomplete(user_id, check_in_id))
    }

    fn create_user(&self, username: &str, password: &str) -> Result<AuthResult, StorageError> {
        if let Err(e) = User::validate_password(password) {
            return Ok(e.into());
        }
        let user = match User::new(username, self.hasher.hash(password), self.clock.as_ref()) {
            Ok(user) => user,
            Err(e) => return Ok(e.into()),
        };

        self.update(|data| {
            if data.users.iter().any(|u| u.username == user.username) {
                return Ok((DomainError::UsernameTaken.into(), false));
            }
            data.users.push(UserRecord {
                id: user.id,
                username: user.username.clone(),
                password_digest: user.password_digest.clone(),
                created_at: user.created_at,
            });
            tracing::debug!("Created user: {} ({})", user.username, user.id);
            Ok((Outcome::success(user), true))
        })
    }

    fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>, StorageError> {
        let username = username.trim();
        let user = self
            .read(|data| data.users.iter().find(|u| u.username == username).cloned())?
            .map(User::from)
            .filter(|user| self.hasher.verify(password, &user.password_digest));

        if user.is_none() {
            tracing::warn!("Failed authentication for username '{}'", username);
        }
        Ok(user)
    }

    fn delete_user(&self, user_id: UserId) -> Result<DeleteResult, StorageError> {
        self.update(|data| {
            let before = data.users.len();
            data.users.retain(|u| u.id != user_id);
            if data.users.len() == before {
                return Ok((DomainError::UserNotFound.into(), false));
            }

            data.habits.retain(|h| h.user_id != user_id);
            data.check_ins.retain(|c| c.user_id != user_id);
            tracing::debug!("Deleted user {} and everything they owned", user_id);
            Ok((Outcome::success(()), true))
        })
    }
}

/// Storage layer for persisting users, habits, and check-ins
///
/// Two interchangeable backends implement the same contract: a relational
/// SQLite store and a client-side key-value store. Callers depend only on the
/// `HabitStorage` trait (or the `StorageBackend` enum chosen from
/// configuration), never on which backend is active.

pub mod backend;
pub mod local;
pub mod migrations;
pub mod sqlite;

// Re-export the main storage types
pub use backend::StorageBackend;
pub use local::{FileKeyValueStore, KeyValueStore, LocalStorage, MemoryKeyValueStore};
pub use sqlite::SqliteStorage;

use thiserror::Error;

use crate::domain::{AuthResult, CheckIn, CheckInId, CheckInResult, DeleteResult, Habit, HabitId, HabitResult, User, UserId};

/// Errors that can occur during storage operations
///
/// Everything except `DuplicateCheckIn` is an outage: it propagates to the
/// caller unchanged and no partial write is left behind.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Database query error: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// The (user, habit, day) uniqueness constraint rejected an insert
    #[error("Duplicate check-in: habit {habit_id} already checked in on {date}")]
    DuplicateCheckIn { habit_id: String, date: String },

    #[error("Storage lock poisoned")]
    Poisoned,

    #[error("Migration error: {0}")]
    Migration(String),
}

/// Persistence primitives the Completion Service runs against
///
/// Implementations must make `insert_check_in` atomic with respect to the
/// one-check-in-per-(user, habit, day) rule and report a violation as
/// `StorageError::DuplicateCheckIn`, so a racing duplicate is rejected even
/// after the service's pre-flight check passed.
pub trait CheckInLedger {
    /// All check-ins the user recorded for the habit
    fn check_ins_for(&self, user_id: UserId, habit_id: HabitId) -> Result<Vec<CheckIn>, StorageError>;

    /// Persist a new check-in
    fn insert_check_in(&self, check_in: &CheckIn) -> Result<(), StorageError>;

    /// Look up a single check-in by id
    fn find_check_in(&self, check_in_id: CheckInId) -> Result<Option<CheckIn>, StorageError>;

    /// Remove a check-in; returns whether a row was removed
    fn remove_check_in(&self, check_in_id: CheckInId) -> Result<bool, StorageError>;
}

/// The storage adapter contract shared by both backends
///
/// Domain failures (blank titles, missing or foreign records, duplicate
/// check-ins) come back as `Outcome::Failure`; the outer `Err` is reserved for
/// storage outages.
pub trait HabitStorage {
    /// Habits owned by the user, newest first, each with its check-ins loaded
    fn find_habits_for_user(&self, user_id: UserId) -> Result<Vec<Habit>, StorageError>;

    /// Create a habit owned by the user
    fn create_habit(&self, title: &str, user_id: UserId) -> Result<HabitResult, StorageError>;

    /// Delete a habit and all of its check-ins, if the user owns it
    fn delete_habit(&self, habit_id: HabitId, user_id: UserId) -> Result<DeleteResult, StorageError>;

    /// Record today's completion of a habit through the Completion Service
    fn create_check_in(&self, habit_id: HabitId, user_id: UserId) -> Result<CheckInResult, StorageError>;

    /// Undo a check-in, if the user owns it
    fn delete_check_in(&self, check_in_id: CheckInId, user_id: UserId) -> Result<DeleteResult, StorageError>;

    /// Register a new user
    fn create_user(&self, username: &str, password: &str) -> Result<AuthResult, StorageError>;

    /// The user matching these credentials, if any
    fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>, StorageError>;

    /// Remove a user together with all of their habits and check-ins
    fn delete_user(&self, user_id: UserId) -> Result<DeleteResult, StorageError>;
}

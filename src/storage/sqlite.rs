/// SQLite implementation of the storage adapter
///
/// The relational backend is the durable source of truth. Ownership is
/// enforced by scoping every query with the acting user's id, and the
/// one-check-in-per-day rule is backed by a unique index on
/// (user_id, habit_id, checked_in_on) so a racing duplicate insert fails
/// atomically.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::{
    AuthResult, CheckIn, CheckInId, CheckInResult, Clock, DeleteResult, DomainError, Habit,
    HabitId, HabitResult, Outcome, SystemClock, User, UserId,
};
use crate::service::{into_outcome, CompletionService, CredentialHasher, Sha256Hasher};
use crate::storage::{migrations, CheckInLedger, HabitStorage, StorageError};

const CHECK_IN_COLUMNS: &str = "id, user_id, habit_id, checked_in_at, created_at";

/// SQLite-based storage implementation
pub struct SqliteStorage {
    conn: Connection,
    clock: Arc<dyn Clock>,
    hasher: Arc<dyn CredentialHasher>,
}

impl SqliteStorage {
    /// Open (or create) the database file and bring its schema up to date
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db_path = db_path.as_ref();
        let conn = Connection::open(db_path)
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;

        let storage = Self::from_connection(conn)?;
        tracing::info!("SQLite storage initialized at: {}", db_path.display());
        Ok(storage)
    }

    /// A private in-memory database, mainly for tests
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| StorageError::Connection(format!("Failed to enable foreign keys: {}", e)))?;
        // other connections to the same file may hold the write lock briefly
        conn.busy_timeout(Duration::from_secs(5))?;

        migrations::initialize_database(&conn)?;

        Ok(Self {
            conn,
            clock: Arc::new(SystemClock),
            hasher: Arc::new(Sha256Hasher),
        })
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

    fn user_by_id(&self, user_id: UserId) -> Result<Option<User>, StorageError> {
        let user = self
            .conn
            .query_row(
                "SELECT id, username, password_digest, created_at FROM users WHERE id = ?1",
                params![user_id.to_string()],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    fn user_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        let user = self
            .conn
            .query_row(
                "SELECT id, username, password_digest, created_at FROM users WHERE username = ?1",
                params![username],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    /// A habit owned by `user_id`, without its check-ins
    fn owned_habit(&self, habit_id: HabitId, user_id: UserId) -> Result<Option<Habit>, StorageError> {
        let habit = self
            .conn
            .query_row(
                "SELECT id, title, user_id, created_at FROM habits WHERE id = ?1 AND user_id = ?2",
                params![habit_id.to_string(), user_id.to_string()],
                habit_from_row,
            )
            .optional()?;
        Ok(habit)
    }
}

impl CheckInLedger for SqliteStorage {
    fn check_ins_for(&self, user_id: UserId, habit_id: HabitId) -> Result<Vec<CheckIn>, StorageError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CHECK_IN_COLUMNS} FROM check_ins
             WHERE user_id = ?1 AND habit_id = ?2
             ORDER BY checked_in_at"
        ))?;

        let rows = stmt.query_map(params![user_id.to_string(), habit_id.to_string()], check_in_from_row)?;
        let check_ins = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(check_ins)
    }

    fn insert_check_in(&self, check_in: &CheckIn) -> Result<(), StorageError> {
        let result = self.conn.execute(
            "INSERT INTO check_ins (id, user_id, habit_id, checked_in_at, checked_in_on, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                check_in.id.to_string(),
                check_in.user_id.to_string(),
                check_in.habit_id.to_string(),
                check_in.checked_in_at,
                check_in.date(),
                check_in.created_at,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(StorageError::DuplicateCheckIn {
                habit_id: check_in.habit_id.to_string(),
                date: check_in.date().to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn find_check_in(&self, check_in_id: CheckInId) -> Result<Option<CheckIn>, StorageError> {
        let check_in = self
            .conn
            .query_row(
                &format!("SELECT {CHECK_IN_COLUMNS} FROM check_ins WHERE id = ?1"),
                params![check_in_id.to_string()],
                check_in_from_row,
            )
            .optional()?;
        Ok(check_in)
    }

    fn remove_check_in(&self, check_in_id: CheckInId) -> Result<bool, StorageError> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM check_ins WHERE id = ?1", params![check_in_id.to_string()])?;
        Ok(rows_affected > 0)
    }
}

impl HabitStorage for SqliteStorage {
    fn find_habits_for_user(&self, user_id: UserId) -> Result<Vec<Habit>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, user_id, created_at FROM habits
             WHERE user_id = ?1
             ORDER BY created_at DESC, rowid DESC",
        )?;
        let mut habits = stmt
            .query_map(params![user_id.to_string()], habit_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        // one query for every check-in of every habit, grouped in memory
        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.user_id, c.habit_id, c.checked_in_at, c.created_at
             FROM check_ins c
             JOIN habits h ON h.id = c.habit_id
             WHERE h.user_id = ?1
             ORDER BY c.checked_in_at",
        )?;
        let mut by_habit: HashMap<HabitId, Vec<CheckIn>> = HashMap::new();
        for check_in in stmt.query_map(params![user_id.to_string()], check_in_from_row)? {
            let check_in = check_in?;
            by_habit.entry(check_in.habit_id).or_default().push(check_in);
        }

        for habit in &mut habits {
            habit.check_ins = by_habit.remove(&habit.id).unwrap_or_default();
        }

        Ok(habits)
    }

    fn create_habit(&self, title: &str, user_id: UserId) -> Result<HabitResult, StorageError> {
        if self.user_by_id(user_id)?.is_none() {
            return Ok(DomainError::UserNotFound.into());
        }

        let habit = match Habit::new(title, user_id, self.clock.as_ref()) {
            Ok(habit) => habit,
            Err(e) => return Ok(e.into()),
        };

        self.conn.execute(
            "INSERT INTO habits (id, title, user_id, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                habit.id.to_string(),
                habit.title,
                habit.user_id.to_string(),
                habit.created_at,
            ],
        )?;

        tracing::debug!("Created habit: {} ({})", habit.title, habit.id);
        Ok(Outcome::success(habit))
    }

    fn delete_habit(&self, habit_id: HabitId, user_id: UserId) -> Result<DeleteResult, StorageError> {
        let rows_affected = self.conn.execute(
            "DELETE FROM habits WHERE id = ?1 AND user_id = ?2",
            params![habit_id.to_string(), user_id.to_string()],
        )?;

        if rows_affected == 0 {
            return Ok(DomainError::HabitNotFound.into());
        }

        tracing::debug!("Deleted habit {} with its check-ins", habit_id);
        Ok(Outcome::success(()))
    }

    fn create_check_in(&self, habit_id: HabitId, user_id: UserId) -> Result<CheckInResult, StorageError> {
        let Some(habit) = self.owned_habit(habit_id, user_id)? else {
            return Ok(DomainError::HabitNotFound.into());
        };
        let user = self.user_by_id(user_id)?;

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
        if self.user_by_username(&user.username)?.is_some() {
            return Ok(DomainError::UsernameTaken.into());
        }

        let result = self.conn.execute(
            "INSERT INTO users (id, username, password_digest, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                user.id.to_string(),
                user.username,
                user.password_digest,
                user.created_at,
            ],
        );

        match result {
            Ok(_) => {
                tracing::debug!("Created user: {} ({})", user.username, user.id);
                Ok(Outcome::success(user))
            }
            Err(e) if is_unique_violation(&e) => Ok(DomainError::UsernameTaken.into()),
            Err(e) => Err(e.into()),
        }
    }

    fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>, StorageError> {
        let user = self
            .user_by_username(username.trim())?
            .filter(|user| self.hasher.verify(password, &user.password_digest));

        if user.is_none() {
            tracing::warn!("Failed authentication for username '{}'", username.trim());
        }
        Ok(user)
    }

    fn delete_user(&self, user_id: UserId) -> Result<DeleteResult, StorageError> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM users WHERE id = ?1", params![user_id.to_string()])?;

        if rows_affected == 0 {
            return Ok(DomainError::UserNotFound.into());
        }

        tracing::debug!("Deleted user {} and everything they owned", user_id);
        Ok(Outcome::success(()))
    }
}

fn is_unique_violation(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

fn parse_uuid_column<T>(
    idx: usize,
    value: &str,
    parse: fn(&str) -> Result<T, uuid::Error>,
) -> rusqlite::Result<T> {
    parse(value).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let id: String = row.get(0)?;
    Ok(User::from_existing(
        parse_uuid_column(0, &id, UserId::from_string)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
    ))
}

fn habit_from_row(row: &Row<'_>) -> rusqlite::Result<Habit> {
    let id: String = row.get(0)?;
    let user_id: String = row.get(2)?;
    Ok(Habit::from_existing(
        parse_uuid_column(0, &id, HabitId::from_string)?,
        row.get(1)?,
        parse_uuid_column(2, &user_id, UserId::from_string)?,
        row.get(3)?,
        Vec::new(),
    ))
}

fn check_in_from_row(row: &Row<'_>) -> rusqlite::Result<CheckIn> {
    let id: String = row.get(0)?;
    let user_id: String = row.get(1)?;
    let habit_id: String = row.get(2)?;
    Ok(CheckIn::from_existing(
        parse_uuid_column(0, &id, CheckInId::from_string)?,
        parse_uuid_column(1, &user_id, UserId::from_string)?,
        parse_uuid_column(2, &habit_id, HabitId::from_string)?,
        row.get(3)?,
        row.get(4)?,
    ))
}

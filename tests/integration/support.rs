/// Shared fixtures for the integration tests

use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};
use quest_tracker_mcp::*;

/// A clock tests can move forward one day at a time
pub struct SteppingClock {
    today: Mutex<NaiveDate>,
}

impl SteppingClock {
    pub fn starting(date: NaiveDate) -> Arc<Self> {
        Arc::new(Self { today: Mutex::new(date) })
    }

    pub fn advance_days(&self, days: u64) {
        let mut today = self.today.lock().unwrap();
        *today = *today + chrono::Days::new(days);
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        FixedClock::on(*self.today.lock().unwrap()).now()
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A fresh, empty instance of the named backend
pub fn open_backend(kind: BackendKind, clock: Arc<SteppingClock>) -> Box<dyn HabitStorage> {
    match kind {
        BackendKind::Relational => Box::new(
            SqliteStorage::open_in_memory()
                .expect("Failed to open in-memory database")
                .with_clock(clock),
        ),
        BackendKind::Local => Box::new(LocalStorage::in_memory().with_clock(clock)),
    }
}

/// One fresh instance of each backend, sharing `clock`
pub fn backends(clock: Arc<SteppingClock>) -> Vec<(BackendKind, Box<dyn HabitStorage>)> {
    [BackendKind::Relational, BackendKind::Local]
        .into_iter()
        .map(|kind| (kind, open_backend(kind, clock.clone())))
        .collect()
}

pub fn register(storage: &dyn HabitStorage, username: &str) -> User {
    storage
        .create_user(username, "password")
        .expect("storage failure")
        .into_data()
        .expect("registration failed")
}

pub fn new_habit(storage: &dyn HabitStorage, user: &User, title: &str) -> Habit {
    storage
        .create_habit(title, user.id)
        .expect("storage failure")
        .into_data()
        .expect("habit creation failed")
}

pub fn only_habit(storage: &dyn HabitStorage, user: &User) -> Habit {
    let mut habits = storage.find_habits_for_user(user.id).expect("storage failure");
    assert_eq!(habits.len(), 1);
    habits.remove(0)
}

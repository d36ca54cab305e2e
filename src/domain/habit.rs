/// Habit entity and its derived statistics
///
/// A habit belongs to exactly one user and owns its check-ins. Statistics are
/// never stored on the habit; they are derived from `check_ins` on request.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{streak, CheckIn, Clock, DomainError, HabitId, Streak, UserId};

/// A recurring task tracked by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    /// Unique identifier for this habit
    pub id: HabitId,
    /// What the user is tracking (e.g., "Read 20 pages")
    pub title: String,
    /// The owning user
    pub user_id: UserId,
    /// When this habit was created
    pub created_at: DateTime<Utc>,
    /// Completion history, loaded together with the habit
    #[serde(default)]
    pub check_ins: Vec<CheckIn>,
}

impl Habit {
    /// Create a new habit with validation
    ///
    /// The title is trimmed; a blank title is rejected.
    pub fn new(title: &str, user_id: UserId, clock: &dyn Clock) -> Result<Self, DomainError> {
        let title = Self::validate_title(title)?;

        Ok(Self {
            id: HabitId::new(),
            title,
            user_id,
            created_at: clock.now(),
            check_ins: Vec::new(),
        })
    }

    /// Rebuild a habit from stored data
    pub fn from_existing(
        id: HabitId,
        title: String,
        user_id: UserId,
        created_at: DateTime<Utc>,
        check_ins: Vec<CheckIn>,
    ) -> Self {
        Self {
            id,
            title,
            user_id,
            created_at,
            check_ins,
        }
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    /// The calendar day the habit was created
    pub fn created_on(&self) -> NaiveDate {
        self.created_at.date_naive()
    }

    /// Distinct calendar dates with a check-in, ascending
    pub fn check_in_dates(&self) -> BTreeSet<NaiveDate> {
        self.check_ins.iter().map(CheckIn::date).collect()
    }

    pub fn checked_in_on(&self, date: NaiveDate) -> bool {
        self.check_ins.iter().any(|c| c.is_on(date))
    }

    /// The check-in recorded for `today`, if any
    pub fn todays_check_in(&self, today: NaiveDate) -> Option<&CheckIn> {
        self.check_ins.iter().find(|c| c.is_on(today))
    }

    pub fn is_completed_today(&self, clock: &dyn Clock) -> bool {
        self.checked_in_on(clock.today())
    }

    pub fn current_streak(&self, today: NaiveDate) -> u32 {
        streak::current_streak(self.check_in_dates(), today)
    }

    pub fn longest_streak(&self) -> u32 {
        streak::longest_streak(self.check_in_dates())
    }

    pub fn completion_rate(&self, today: NaiveDate) -> f64 {
        streak::completion_rate(self.check_in_dates(), self.created_on(), today)
    }

    /// All statistics at once
    pub fn stats(&self, today: NaiveDate) -> Streak {
        Streak::calculate(self.id, self.check_in_dates(), self.created_on(), today)
    }

    /// Validate and normalize a habit title
    pub fn validate_title(title: &str) -> Result<String, DomainError> {
        let trimmed = title.trim();

        if trimmed.is_empty() {
            return Err(DomainError::validation("Title can't be blank"));
        }

        Ok(trimmed.to_string())
    }
}

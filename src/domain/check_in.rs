/// CheckIn entity for recording habit completions
///
/// A check-in is an append-only fact: "this user completed this habit on this
/// day". It is never mutated after creation; undoing a completion deletes it.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{CheckInId, Clock, HabitId, UserId};

/// Number of days, including today, covered by [`recent`]
pub const RECENT_WINDOW_DAYS: i64 = 7;

/// A record of completing a habit on a specific calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckIn {
    pub id: CheckInId,
    /// The user who completed the habit
    pub user_id: UserId,
    /// Which habit this check-in is for
    pub habit_id: HabitId,
    /// When the completion happened; only its calendar date is meaningful
    pub checked_in_at: DateTime<Utc>,
    /// When this record was written
    pub created_at: DateTime<Utc>,
}

impl CheckIn {
    /// Build a new check-in stamped with the clock's current instant
    ///
    /// Only the Completion Service should call this; it is responsible for
    /// enforcing the one-per-day rule before persisting the result.
    pub fn new(user_id: UserId, habit_id: HabitId, clock: &dyn Clock) -> Self {
        let now = clock.now();
        Self {
            id: CheckInId::new(),
            user_id,
            habit_id,
            checked_in_at: now,
            created_at: now,
        }
    }

    /// Rebuild a check-in from stored data
    pub fn from_existing(
        id: CheckInId,
        user_id: UserId,
        habit_id: HabitId,
        checked_in_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            habit_id,
            checked_in_at,
            created_at,
        }
    }

    /// The calendar date this check-in counts for
    pub fn date(&self) -> NaiveDate {
        self.checked_in_at.date_naive()
    }

    /// Whether this check-in falls on the given calendar date
    pub fn is_on(&self, date: NaiveDate) -> bool {
        self.date() == date
    }

    pub fn is_completed_today(&self, clock: &dyn Clock) -> bool {
        self.is_on(clock.today())
    }

    /// Whether this check-in is the same (user, habit, day) as `other`
    pub fn collides_with(&self, other: &CheckIn) -> bool {
        self.user_id == other.user_id
            && self.habit_id == other.habit_id
            && self.date() == other.date()
    }
}

/// Check-ins that fall on the given calendar date
pub fn for_date(check_ins: &[CheckIn], date: NaiveDate) -> Vec<&CheckIn> {
    check_ins.iter().filter(|c| c.is_on(date)).collect()
}

/// Check-ins from the last week, today included
pub fn recent(check_ins: &[CheckIn], today: NaiveDate) -> Vec<&CheckIn> {
    let earliest = today - Duration::days(RECENT_WINDOW_DAYS - 1);
    check_ins
        .iter()
        .filter(|c| {
            let date = c.date();
            date >= earliest && date <= today
        })
        .collect()
}

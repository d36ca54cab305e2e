/// Tools for creating, listing, and deleting habits

use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{CheckIn, DeleteResult, DomainError, Habit, HabitId, HabitResult, Outcome, User};
use crate::storage::{HabitStorage, StorageError};

/// Parameters for `habit_create`
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateHabitParams {
    /// What to track, e.g. "Read 20 pages"
    pub title: String,
}

/// Parameters for `habit_delete`
#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteHabitParams {
    /// ID of the habit to delete, along with all of its check-ins
    pub habit_id: String,
}

/// Parameters for `habit_list`
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ListHabitsParams {
    /// Include every check-in in the response (default: false)
    #[serde(default)]
    pub include_check_ins: bool,
}

/// A habit with its statistics as of today
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitView {
    pub habit_id: HabitId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub completion_rate: f64,
    pub total_check_ins: u32,
    pub last_checked_in: Option<NaiveDate>,
    pub completed_today: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_ins: Option<Vec<CheckIn>>,
}

impl HabitView {
    /// Derive the view from a habit and its loaded check-ins
    pub fn from_habit(habit: Habit, today: NaiveDate, include_check_ins: bool) -> Self {
        let stats = habit.stats(today);
        Self {
            habit_id: habit.id,
            completed_today: habit.checked_in_on(today),
            title: habit.title,
            created_at: habit.created_at,
            current_streak: stats.current_streak,
            longest_streak: stats.longest_streak,
            completion_rate: stats.completion_rate,
            total_check_ins: stats.total_check_ins,
            last_checked_in: stats.last_checked_in,
            check_ins: include_check_ins.then_some(habit.check_ins),
        }
    }
}

/// Create a habit for the signed-in user
pub fn create_habit<S: HabitStorage + ?Sized>(
    storage: &S,
    user: &User,
    params: CreateHabitParams,
) -> Result<HabitResult, StorageError> {
    storage.create_habit(&params.title, user.id)
}

/// Delete one of the signed-in user's habits
pub fn delete_habit<S: HabitStorage + ?Sized>(
    storage: &S,
    user: &User,
    params: DeleteHabitParams,
) -> Result<DeleteResult, StorageError> {
    match HabitId::from_string(&params.habit_id) {
        Ok(habit_id) => storage.delete_habit(habit_id, user.id),
        // a malformed id cannot name an existing habit
        Err(_) => Ok(DomainError::HabitNotFound.into()),
    }
}

/// List the signed-in user's habits with statistics
pub fn list_habits<S: HabitStorage + ?Sized>(
    storage: &S,
    user: &User,
    today: NaiveDate,
    params: ListHabitsParams,
) -> Result<Outcome<Vec<HabitView>>, StorageError> {
    let views = storage
        .find_habits_for_user(user.id)?
        .into_iter()
        .map(|habit| HabitView::from_habit(habit, today, params.include_check_ins))
        .collect();

    Ok(Outcome::success(views))
}

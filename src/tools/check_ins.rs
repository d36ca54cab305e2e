/// Tools for checking habits in and undoing check-ins

use schemars::JsonSchema;
use serde::Deserialize;

use crate::domain::{CheckInId, CheckInResult, DeleteResult, DomainError, HabitId, User};
use crate::storage::{HabitStorage, StorageError};

/// Parameters for `habit_check_in`
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CheckInParams {
    /// ID of the habit completed today
    pub habit_id: String,
}

/// Parameters for `habit_undo_check_in`
#[derive(Debug, Deserialize, JsonSchema)]
pub struct UndoCheckInParams {
    /// ID of the check-in to remove
    pub check_in_id: String,
}

/// Record today's completion of a habit
pub fn check_in<S: HabitStorage + ?Sized>(
    storage: &S,
    user: &User,
    params: CheckInParams,
) -> Result<CheckInResult, StorageError> {
    match HabitId::from_string(&params.habit_id) {
        Ok(habit_id) => storage.create_check_in(habit_id, user.id),
        Err(_) => Ok(DomainError::HabitNotFound.into()),
    }
}

/// Remove one of the signed-in user's check-ins
pub fn undo_check_in<S: HabitStorage + ?Sized>(
    storage: &S,
    user: &User,
    params: UndoCheckInParams,
) -> Result<DeleteResult, StorageError> {
    match CheckInId::from_string(&params.check_in_id) {
        Ok(check_in_id) => storage.delete_check_in(check_in_id, user.id),
        Err(_) => Ok(DomainError::CheckInNotFound.into()),
    }
}

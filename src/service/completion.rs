/// Completion Service: creating and undoing check-ins
///
/// This is the only place a `CheckIn` is constructed for persistence. It
/// validates the acting user and habit, rejects a second check-in on the same
/// calendar day, and treats a uniqueness violation reported by storage exactly
/// like a duplicate found up front, so a race and a double-click look the same
/// to the caller.

use tracing::{debug, warn};

use crate::domain::{CheckIn, CheckInId, Clock, DomainError, Habit, User, UserId};
use crate::service::ServiceError;
use crate::storage::{CheckInLedger, StorageError};

/// Orchestrates check-in creation against a ledger and a clock
pub struct CompletionService<'a, L: CheckInLedger + ?Sized> {
    ledger: &'a L,
    clock: &'a dyn Clock,
}

impl<'a, L: CheckInLedger + ?Sized> CompletionService<'a, L> {
    pub fn new(ledger: &'a L, clock: &'a dyn Clock) -> Self {
        Self { ledger, clock }
    }

    /// Record that `user` completed `habit` today
    ///
    /// Fails with a validation error when either input is missing or the
    /// habit belongs to someone else, and with `DuplicateCheckIn` when a
    /// check-in for today already exists.
    pub fn complete(&self, user: Option<&User>, habit: Option<&Habit>) -> Result<CheckIn, ServiceError> {
        let user = user.ok_or_else(|| DomainError::validation("User is required"))?;
        let habit = habit.ok_or_else(|| DomainError::validation("Habit is required"))?;

        if !habit.is_owned_by(user.id) {
            return Err(DomainError::NotOwner.into());
        }

        let today = self.clock.today();
        let existing = self.ledger.check_ins_for(user.id, habit.id)?;
        if existing.iter().any(|c| c.is_on(today)) {
            warn!("Rejected second check-in for habit {} on {}", habit.id, today);
            return Err(DomainError::DuplicateCheckIn.into());
        }

        let check_in = CheckIn::new(user.id, habit.id, self.clock);
        match self.ledger.insert_check_in(&check_in) {
            Ok(()) => {
                debug!("Checked in habit {} for user {} ({})", habit.id, user.id, check_in.id);
                Ok(check_in)
            }
            Err(StorageError::DuplicateCheckIn { .. }) => {
                warn!("Concurrent check-in for habit {} on {} lost the race", habit.id, today);
                Err(DomainError::DuplicateCheckIn.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete one of the user's check-ins
    ///
    /// A check-in owned by someone else is reported as not found, the same as
    /// an id that never existed.
    pub fn uncomplete(&self, user_id: UserId, check_in_id: CheckInId) -> Result<(), ServiceError> {
        match self.ledger.find_check_in(check_in_id)? {
            Some(check_in) if check_in.user_id == user_id => {}
            _ => return Err(DomainError::CheckInNotFound.into()),
        }

        if !self.ledger.remove_check_in(check_in_id)? {
            // removed by a concurrent request between lookup and delete
            return Err(DomainError::CheckInNotFound.into());
        }

        debug!("Removed check-in {} for user {}", check_in_id, user_id);
        Ok(())
    }
}

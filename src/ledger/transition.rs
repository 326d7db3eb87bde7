use chrono::NaiveDateTime;

use super::clock;
use super::types::{Caller, HistoryOutcome, HistoryRecord, Role, Slot, SlotStatus};
use crate::error::ServiceError;

/// A lifecycle command against a single slot. The transition table lives
/// here instead of being scattered across request handlers: each variant
/// knows which source states it accepts and which caller relationship it
/// requires.
#[derive(Debug, Clone)]
pub enum Transition {
    /// Student books an available slot; captures the student's display name.
    Book { student_name: String },
    /// Owner alumni marks a booked slot as completed.
    Approve,
    /// Owner alumni turns down a booked slot, optionally with a reason.
    Reject { reason: Option<String> },
    /// Owner or occupant withdraws the slot.
    Cancel,
}

impl Transition {
    /// Source states this transition is legal from.
    pub fn allowed_from(&self) -> &'static [SlotStatus] {
        match self {
            Transition::Book { .. } => &[SlotStatus::Available],
            Transition::Approve | Transition::Reject { .. } => &[SlotStatus::Booked],
            Transition::Cancel => &[SlotStatus::Available, SlotStatus::Booked],
        }
    }

    /// Role/relationship gate, checked before any state guard.
    pub fn authorize(&self, slot: &Slot, caller: &Caller) -> Result<(), ServiceError> {
        let allowed = match self {
            Transition::Book { .. } => caller.role == Role::Student,
            Transition::Approve | Transition::Reject { .. } => {
                caller.role == Role::Alumni && caller.id == slot.owner_id
            }
            Transition::Cancel => {
                caller.id == slot.owner_id
                    || slot.occupant_id.as_deref() == Some(caller.id.as_str())
            }
        };
        if allowed {
            Ok(())
        } else {
            let message = match self {
                Transition::Book { .. } => "only students can book slots",
                Transition::Approve => "only the owning alumni can complete a slot",
                Transition::Reject { .. } => "only the owning alumni can reject a slot",
                Transition::Cancel => "only the owner or the booking student can cancel",
            };
            Err(ServiceError::Authorization(message.to_string()))
        }
    }
}

/// Validates and applies a transition to the slot, returning the history
/// record the terminal transition produced, if any. The caller (the store)
/// must append that record before treating the status change as committed.
///
/// On any error the slot is left untouched.
pub fn apply(
    slot: &mut Slot,
    caller: &Caller,
    transition: &Transition,
    now: NaiveDateTime,
) -> Result<Option<HistoryRecord>, ServiceError> {
    transition.authorize(slot, caller)?;

    if !transition.allowed_from().contains(&slot.status) {
        return Err(ServiceError::Conflict(format!(
            "slot not in expected state: currently {}",
            slot.status.as_str()
        )));
    }

    match transition {
        Transition::Book { student_name } => {
            // Time elapses between listing and booking, so the instant is
            // re-validated here.
            let instant = clock::slot_instant(slot.date, &slot.time_slot)?;
            if instant <= now {
                return Err(ServiceError::Validation(
                    "cannot book a slot whose time has passed".to_string(),
                ));
            }
            slot.occupant_id = Some(caller.id.clone());
            slot.occupant_name = Some(student_name.clone());
            slot.status = SlotStatus::Booked;
            Ok(None)
        }
        Transition::Approve => {
            let record = archive(slot, HistoryOutcome::Approved, now);
            slot.status = SlotStatus::Approved;
            Ok(record)
        }
        Transition::Reject { reason } => {
            let record = archive(slot, HistoryOutcome::Rejected, now);
            slot.status = SlotStatus::Rejected;
            slot.reject_reason = reason.clone();
            Ok(record)
        }
        Transition::Cancel => {
            // Cancelling a never-booked slot archives nothing.
            let record = archive(slot, HistoryOutcome::Cancelled, now);
            slot.status = SlotStatus::Cancelled;
            Ok(record)
        }
    }
}

fn archive(slot: &Slot, outcome: HistoryOutcome, now: NaiveDateTime) -> Option<HistoryRecord> {
    let occupant_id = slot.occupant_id.clone()?;
    Some(HistoryRecord {
        occupant_id,
        owner_id: slot.owner_id.clone(),
        slot_id: slot.id.clone(),
        date: slot.date,
        time_slot: slot.time_slot.clone(),
        outcome,
        completed_at: now,
    })
}

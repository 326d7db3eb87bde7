use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::clock;
use super::sweep;
use super::transition::{self, Transition};
use super::types::{Caller, HistoryRecord, Role, Slot, SlotStatus};
use crate::error::ServiceError;
use crate::ids;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LedgerState {
    slots: HashMap<String, Slot>,
    history: Vec<HistoryRecord>,
}

/// The slot ledger: every lifecycle operation is a single lock-scoped
/// read-modify-write, so two concurrent `book` calls on the same slot
/// serialize and exactly one wins.
///
/// With a snapshot path set, the full state is written to disk as JSON on
/// every mutation; the mutation only commits in memory once the write
/// succeeded, so a storage failure leaves no partial state behind.
pub struct SlotLedger {
    state: Mutex<LedgerState>,
    snapshot_path: Option<PathBuf>,
}

impl SlotLedger {
    pub fn new() -> Self {
        SlotLedger {
            state: Mutex::new(LedgerState::default()),
            snapshot_path: None,
        }
    }

    /// Opens a ledger backed by a JSON snapshot file, loading existing state
    /// if the file is present.
    pub fn with_snapshot(path: PathBuf) -> Result<Self, ServiceError> {
        let state = if path.exists() {
            let data = std::fs::read(&path)?;
            serde_json::from_slice(&data)?
        } else {
            LedgerState::default()
        };
        Ok(SlotLedger {
            state: Mutex::new(state),
            snapshot_path: Some(path),
        })
    }

    fn persist(&self, state: &LedgerState) -> Result<(), ServiceError> {
        if let Some(path) = &self.snapshot_path {
            let data = serde_json::to_vec_pretty(state)?;
            std::fs::write(path, data)?;
        }
        Ok(())
    }

    /// Creates a new available slot owned by the calling alumni. The slot's
    /// instant must be strictly in the future.
    pub fn create_slot(
        &self,
        caller: &Caller,
        date: NaiveDate,
        time_slot: &str,
        now: NaiveDateTime,
    ) -> Result<Slot, ServiceError> {
        if caller.role != Role::Alumni {
            return Err(ServiceError::Authorization(
                "only alumni can create slots".to_string(),
            ));
        }
        let time_slot = time_slot.trim().to_string();
        let instant = clock::slot_instant(date, &time_slot)?;
        if instant <= now {
            return Err(ServiceError::Validation(
                "cannot create a slot in the past".to_string(),
            ));
        }

        let slot = Slot {
            id: ids::new_id(),
            owner_id: caller.id.clone(),
            occupant_id: None,
            occupant_name: None,
            date,
            time_slot,
            status: SlotStatus::Available,
            reject_reason: None,
            created_at: now,
        };

        let mut state = self.state.lock().unwrap();
        let mut next = state.clone();
        next.slots.insert(slot.id.clone(), slot.clone());
        self.persist(&next)?;
        *state = next;
        log::info!("slot {} created by alumni {}", slot.id, slot.owner_id);
        Ok(slot)
    }

    /// Runs one lifecycle transition atomically. The history record, if the
    /// transition produces one, is appended before the new status is
    /// committed, so a terminal status is never observable without its
    /// archive entry.
    pub fn transition(
        &self,
        slot_id: &str,
        caller: &Caller,
        transition: &Transition,
        now: NaiveDateTime,
    ) -> Result<Slot, ServiceError> {
        let mut state = self.state.lock().unwrap();
        let current = state
            .slots
            .get(slot_id)
            .ok_or_else(|| ServiceError::NotFound("slot not found".to_string()))?;

        let mut updated = current.clone();
        let record = transition::apply(&mut updated, caller, transition, now)?;

        let mut next = state.clone();
        if let Some(record) = record {
            next.history.push(record);
        }
        next.slots.insert(slot_id.to_string(), updated.clone());
        self.persist(&next)?;
        *state = next;
        log::info!(
            "slot {} -> {} by {}",
            slot_id,
            updated.status.as_str(),
            caller.id
        );
        Ok(updated)
    }

    /// Deletes every expired `available` slot. Invoked by the listing
    /// queries as their pre-read step; global, not scoped to the query
    /// filter. Returns how many slots were removed.
    pub fn sweep_expired(&self, now: NaiveDateTime) -> Result<usize, ServiceError> {
        let mut state = self.state.lock().unwrap();
        let expired = sweep::expired_slot_ids(&state.slots, now);
        if expired.is_empty() {
            return Ok(0);
        }
        let mut next = state.clone();
        for id in &expired {
            next.slots.remove(id);
        }
        self.persist(&next)?;
        *state = next;
        log::info!("swept {} expired slots", expired.len());
        Ok(expired.len())
    }

    pub fn get(&self, slot_id: &str) -> Option<Slot> {
        self.state.lock().unwrap().slots.get(slot_id).cloned()
    }

    /// Public availability view: open slots for one alumni, soonest first.
    pub fn list_available(&self, owner_id: &str) -> Vec<Slot> {
        let mut slots: Vec<Slot> = self
            .state
            .lock()
            .unwrap()
            .slots
            .values()
            .filter(|s| s.owner_id == owner_id && s.status == SlotStatus::Available)
            .cloned()
            .collect();
        slots.sort_by_key(sort_instant);
        slots
    }

    /// Owner management view: every slot the alumni created, any status.
    pub fn list_owner_slots(&self, owner_id: &str) -> Vec<Slot> {
        let mut slots: Vec<Slot> = self
            .state
            .lock()
            .unwrap()
            .slots
            .values()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect();
        slots.sort_by_key(sort_instant);
        slots
    }

    /// Participant history view: slots involving the caller, most recent
    /// first. Students see everything they booked; alumni see their own
    /// slots that left the `available` state.
    pub fn list_participant_slots(&self, caller: &Caller) -> Vec<Slot> {
        let mut slots: Vec<Slot> = self
            .state
            .lock()
            .unwrap()
            .slots
            .values()
            .filter(|s| match caller.role {
                Role::Student => s.occupant_id.as_deref() == Some(caller.id.as_str()),
                Role::Alumni => {
                    s.owner_id == caller.id && s.status != SlotStatus::Available
                }
            })
            .cloned()
            .collect();
        slots.sort_by_key(sort_instant);
        slots.reverse();
        slots
    }

    /// Archive records involving the caller, newest first.
    pub fn list_history(&self, caller: &Caller) -> Vec<HistoryRecord> {
        let mut records: Vec<HistoryRecord> = self
            .state
            .lock()
            .unwrap()
            .history
            .iter()
            .filter(|r| match caller.role {
                Role::Student => r.occupant_id == caller.id,
                Role::Alumni => r.owner_id == caller.id,
            })
            .cloned()
            .collect();
        records.sort_by_key(|r| std::cmp::Reverse(r.completed_at));
        records
    }
}

impl Default for SlotLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn sort_instant(slot: &Slot) -> NaiveDateTime {
    clock::slot_instant(slot.date, &slot.time_slot)
        .unwrap_or_else(|_| slot.date.and_time(NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use super::*;
    use crate::ledger::types::HistoryOutcome;

    fn owner() -> Caller {
        Caller::new("alumni-1", Role::Alumni)
    }

    fn student(id: &str) -> Caller {
        Caller::new(id, Role::Student)
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn tomorrow() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn book(ledger: &SlotLedger, slot_id: &str, who: &Caller) -> Result<Slot, ServiceError> {
        ledger.transition(
            slot_id,
            who,
            &Transition::Book {
                student_name: "Asha".to_string(),
            },
            now(),
        )
    }

    #[test]
    fn full_lifecycle_available_booked_approved() {
        let ledger = SlotLedger::new();
        let slot = ledger
            .create_slot(&owner(), tomorrow(), "10:00", now())
            .unwrap();
        assert_eq!(slot.status, SlotStatus::Available);

        let slot = book(&ledger, &slot.id, &student("student-1")).unwrap();
        assert_eq!(slot.status, SlotStatus::Booked);
        assert_eq!(slot.occupant_id.as_deref(), Some("student-1"));

        let slot = ledger
            .transition(&slot.id, &owner(), &Transition::Approve, now())
            .unwrap();
        assert_eq!(slot.status, SlotStatus::Approved);

        let records = ledger.list_history(&owner());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].outcome, HistoryOutcome::Approved);
        assert_eq!(records[0].slot_id, slot.id);
        assert_eq!(records[0].occupant_id, "student-1");
    }

    #[test]
    fn creating_a_past_slot_fails_validation() {
        let ledger = SlotLedger::new();
        let yesterday = NaiveDate::from_ymd_opt(2026, 2, 28).unwrap();
        let err = ledger
            .create_slot(&owner(), yesterday, "10:00", now())
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn students_cannot_create_slots() {
        let ledger = SlotLedger::new();
        let err = ledger
            .create_slot(&student("student-1"), tomorrow(), "10:00", now())
            .unwrap_err();
        assert!(matches!(err, ServiceError::Authorization(_)));
    }

    #[test]
    fn transitions_on_unknown_slots_are_not_found() {
        let ledger = SlotLedger::new();
        let err = book(&ledger, "missing", &student("student-1")).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn concurrent_bookings_admit_exactly_one_winner() {
        let ledger = Arc::new(SlotLedger::new());
        let slot = ledger
            .create_slot(&owner(), tomorrow(), "10:00", now())
            .unwrap();

        let handles: Vec<_> = (0..2)
            .map(|i| {
                let ledger = Arc::clone(&ledger);
                let slot_id = slot.id.clone();
                std::thread::spawn(move || {
                    book(&ledger, &slot_id, &student(&format!("student-{}", i)))
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let wins = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(ServiceError::Conflict(_))))
            .count();
        assert_eq!(wins, 1);
        assert_eq!(conflicts, 1);
    }

    #[test]
    fn cancelled_from_booked_archives_cancelled_from_available_does_not() {
        let ledger = SlotLedger::new();
        let open = ledger
            .create_slot(&owner(), tomorrow(), "09:00", now())
            .unwrap();
        let booked = ledger
            .create_slot(&owner(), tomorrow(), "10:00", now())
            .unwrap();
        book(&ledger, &booked.id, &student("student-1")).unwrap();

        ledger
            .transition(&open.id, &owner(), &Transition::Cancel, now())
            .unwrap();
        ledger
            .transition(&booked.id, &student("student-1"), &Transition::Cancel, now())
            .unwrap();

        let records = ledger.list_history(&owner());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].outcome, HistoryOutcome::Cancelled);
        assert_eq!(records[0].slot_id, booked.id);
    }

    #[test]
    fn sweep_removes_only_expired_available_slots() {
        let ledger = SlotLedger::new();
        let expired = ledger
            .create_slot(&owner(), tomorrow(), "09:00", now())
            .unwrap();
        let upcoming = ledger
            .create_slot(&owner(), tomorrow(), "11:00", now())
            .unwrap();
        let booked = ledger
            .create_slot(&owner(), tomorrow(), "09:30", now())
            .unwrap();
        book(&ledger, &booked.id, &student("student-1")).unwrap();

        // A minute past the 09:00 and 09:30 instants.
        let later = tomorrow().and_hms_opt(9, 31, 0).unwrap();
        let removed = ledger.sweep_expired(later).unwrap();
        assert_eq!(removed, 1);
        assert!(ledger.get(&expired.id).is_none());
        assert!(ledger.get(&upcoming.id).is_some());
        assert!(ledger.get(&booked.id).is_some());
    }

    #[test]
    fn availability_view_hides_booked_slots() {
        let ledger = SlotLedger::new();
        let a = ledger
            .create_slot(&owner(), tomorrow(), "10:00", now())
            .unwrap();
        let b = ledger
            .create_slot(&owner(), tomorrow(), "09:00", now())
            .unwrap();
        book(&ledger, &a.id, &student("student-1")).unwrap();

        let open = ledger.list_available("alumni-1");
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, b.id);

        let all = ledger.list_owner_slots("alumni-1");
        assert_eq!(all.len(), 2);
        // Soonest first.
        assert_eq!(all[0].id, b.id);
    }

    #[test]
    fn participant_views_are_scoped_to_the_caller() {
        let ledger = SlotLedger::new();
        let mine = ledger
            .create_slot(&owner(), tomorrow(), "10:00", now())
            .unwrap();
        let other_owner = Caller::new("alumni-2", Role::Alumni);
        let theirs = ledger
            .create_slot(&other_owner, tomorrow(), "10:00", now())
            .unwrap();
        book(&ledger, &mine.id, &student("student-1")).unwrap();
        book(&ledger, &theirs.id, &student("student-2")).unwrap();

        let student_view = ledger.list_participant_slots(&student("student-1"));
        assert_eq!(student_view.len(), 1);
        assert_eq!(student_view[0].id, mine.id);

        // The alumni history view excludes slots still available.
        ledger
            .create_slot(&owner(), tomorrow(), "11:00", now())
            .unwrap();
        let alumni_view = ledger.list_participant_slots(&owner());
        assert_eq!(alumni_view.len(), 1);
        assert_eq!(alumni_view[0].id, mine.id);
    }

    #[test]
    fn history_is_ordered_newest_first() {
        let ledger = SlotLedger::new();
        let first = ledger
            .create_slot(&owner(), tomorrow(), "09:00", now())
            .unwrap();
        let second = ledger
            .create_slot(&owner(), tomorrow(), "10:00", now())
            .unwrap();
        book(&ledger, &first.id, &student("student-1")).unwrap();
        book(&ledger, &second.id, &student("student-1")).unwrap();

        ledger
            .transition(&first.id, &owner(), &Transition::Approve, now())
            .unwrap();
        ledger
            .transition(
                &second.id,
                &owner(),
                &Transition::Reject {
                    reason: Some("busy".to_string()),
                },
                now() + Duration::minutes(5),
            )
            .unwrap();

        let records = ledger.list_history(&student("student-1"));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].outcome, HistoryOutcome::Rejected);
        assert_eq!(records[1].outcome, HistoryOutcome::Approved);
    }

    #[test]
    fn occupancy_matches_status() {
        let ledger = SlotLedger::new();
        let slot = ledger
            .create_slot(&owner(), tomorrow(), "10:00", now())
            .unwrap();
        assert!(slot.occupant_id.is_none());
        let slot = book(&ledger, &slot.id, &student("student-1")).unwrap();
        assert!(slot.occupant_id.is_some());
        let slot = ledger
            .transition(&slot.id, &owner(), &Transition::Approve, now())
            .unwrap();
        assert!(slot.occupant_id.is_some());
    }

    #[test]
    fn snapshot_round_trips_slots_and_history() {
        let path = std::env::temp_dir().join(format!("mentor-slots-{}.json", ids::new_id()));
        {
            let ledger = SlotLedger::with_snapshot(path.clone()).unwrap();
            let slot = ledger
                .create_slot(&owner(), tomorrow(), "10:00", now())
                .unwrap();
            book(&ledger, &slot.id, &student("student-1")).unwrap();
            ledger
                .transition(&slot.id, &owner(), &Transition::Approve, now())
                .unwrap();
        }
        let reloaded = SlotLedger::with_snapshot(path.clone()).unwrap();
        assert_eq!(reloaded.list_owner_slots("alumni-1").len(), 1);
        assert_eq!(reloaded.list_history(&owner()).len(), 1);
        let _ = std::fs::remove_file(path);
    }
}

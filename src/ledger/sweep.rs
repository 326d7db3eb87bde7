use std::collections::HashMap;

use chrono::NaiveDateTime;

use super::clock;
use super::types::{Slot, SlotStatus};

/// An `available` slot whose instant has passed can never be booked again;
/// the sweep deletes it lazily on the read path instead of via a scheduler.
/// Booked and terminal slots are never swept, no matter how old.
pub fn is_expired(slot: &Slot, now: NaiveDateTime) -> bool {
    if slot.status != SlotStatus::Available {
        return false;
    }
    match clock::slot_instant(slot.date, &slot.time_slot) {
        Ok(instant) => instant < now,
        // An unparseable time slot cannot be ordered against now; leave it.
        Err(_) => false,
    }
}

/// Ids of every slot the sweep would remove. Pure so the predicate can be
/// tested apart from the listing queries that trigger it.
pub fn expired_slot_ids(slots: &HashMap<String, Slot>, now: NaiveDateTime) -> Vec<String> {
    slots
        .values()
        .filter(|slot| is_expired(slot, now))
        .map(|slot| slot.id.clone())
        .collect()
}

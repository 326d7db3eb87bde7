use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a slot. `Available` is the sole initial state;
/// `Approved`, `Rejected` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Available,
    Booked,
    Approved,
    Rejected,
    Cancelled,
}

impl SlotStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SlotStatus::Approved | SlotStatus::Rejected | SlotStatus::Cancelled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SlotStatus::Available => "available",
            SlotStatus::Booked => "booked",
            SlotStatus::Approved => "approved",
            SlotStatus::Rejected => "rejected",
            SlotStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Alumni,
}

/// Caller identity as resolved by the access gate. Every lifecycle operation
/// receives one of these; the ledger never sees raw credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: String,
    pub role: Role,
}

impl Caller {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Caller { id: id.into(), role }
    }
}

/// A single alumni-offered appointment opportunity at a fixed date/time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub id: String,
    /// The alumni who created the slot. Never changes after creation.
    pub owner_id: String,
    /// The student who booked the slot. Set only on booking.
    pub occupant_id: Option<String>,
    /// Display name captured at booking time.
    pub occupant_name: Option<String>,
    pub date: NaiveDate,
    /// Time of day as "HH:MM"; combined with `date` to form the full instant.
    pub time_slot: String,
    pub status: SlotStatus,
    /// Set only when the status becomes `Rejected`.
    pub reject_reason: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Terminal outcome mirrored into the history archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryOutcome {
    Approved,
    Rejected,
    Cancelled,
}

/// Append-only record of a terminal transition of an occupied slot. Written
/// exactly once per such transition; never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub occupant_id: String,
    pub owner_id: String,
    pub slot_id: String,
    pub date: NaiveDate,
    pub time_slot: String,
    pub outcome: HistoryOutcome,
    pub completed_at: NaiveDateTime,
}

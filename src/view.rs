//! Presentation-facing translation: client representations of slots, users
//! and history records. Credential fields never leave the directory; ids are
//! substituted with display names where the clients expect them.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::directory::{AlumniProfile, StudentProfile, UserDirectory};
use crate::ledger::{HistoryOutcome, HistoryRecord, Slot, SlotStatus};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotView {
    pub id: String,
    pub alumni_id: String,
    pub student_id: Option<String>,
    pub date: String,
    pub time: String,
    pub status: SlotStatus,
    pub booked_by_name: Option<String>,
    pub alumni_name: Option<String>,
    pub reject_reason: Option<String>,
    pub created_at: NaiveDateTime,
}

pub fn slot_view(slot: &Slot, directory: &UserDirectory) -> SlotView {
    SlotView {
        id: slot.id.clone(),
        alumni_id: slot.owner_id.clone(),
        student_id: slot.occupant_id.clone(),
        date: slot.date.format("%Y-%m-%d").to_string(),
        time: slot.time_slot.clone(),
        status: slot.status,
        booked_by_name: slot.occupant_name.clone(),
        alumni_name: directory.display_name(&slot.owner_id),
        reject_reason: slot.reject_reason.clone(),
        created_at: slot.created_at,
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryView {
    pub student_id: String,
    pub alumni_id: String,
    pub appointment_id: String,
    pub date: String,
    pub time_slot: String,
    pub outcome: HistoryOutcome,
    pub completed_at: NaiveDateTime,
}

pub fn history_view(record: &HistoryRecord) -> HistoryView {
    HistoryView {
        student_id: record.occupant_id.clone(),
        alumni_id: record.owner_id.clone(),
        appointment_id: record.slot_id.clone(),
        date: record.date.format("%Y-%m-%d").to_string(),
        time_slot: record.time_slot.clone(),
        outcome: record.outcome,
        completed_at: record.completed_at,
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub course: String,
    pub phone: String,
    pub role: &'static str,
}

pub fn student_view(profile: &StudentProfile) -> StudentView {
    StudentView {
        id: profile.id.clone(),
        name: profile.name.clone(),
        email: profile.email.clone(),
        course: profile.course.clone(),
        phone: profile.phone.clone(),
        role: "student",
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlumniView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub profession: String,
    pub company: String,
    pub total_experience: u32,
    pub phone: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub role: &'static str,
}

pub fn alumni_view(profile: &AlumniProfile) -> AlumniView {
    AlumniView {
        id: profile.id.clone(),
        name: profile.name.clone(),
        email: profile.email.clone(),
        profession: profile.profession.clone(),
        company: profile.company.clone(),
        total_experience: profile.total_experience,
        phone: profile.phone.clone(),
        location: profile.location.clone(),
        description: profile.description.clone(),
        role: "alumni",
    }
}

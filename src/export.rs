//! CSV export of history archive records, served as a download by the HTTP
//! layer.

use csv::WriterBuilder;

use crate::error::ServiceError;
use crate::ledger::{HistoryOutcome, HistoryRecord};

/// Renders the records to CSV, one row per archived outcome.
pub fn history_to_csv(records: &[HistoryRecord]) -> Result<Vec<u8>, ServiceError> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer.write_record([
        "appointment_id",
        "alumni_id",
        "student_id",
        "date",
        "time_slot",
        "outcome",
        "completed_at",
    ])?;
    for record in records {
        let date = record.date.format("%Y-%m-%d").to_string();
        let completed_at = record.completed_at.to_string();
        writer.write_record([
            record.slot_id.as_str(),
            record.owner_id.as_str(),
            record.occupant_id.as_str(),
            date.as_str(),
            record.time_slot.as_str(),
            outcome_label(record.outcome),
            completed_at.as_str(),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| ServiceError::Storage(e.to_string()))
}

fn outcome_label(outcome: HistoryOutcome) -> &'static str {
    match outcome {
        HistoryOutcome::Approved => "approved",
        HistoryOutcome::Rejected => "rejected",
        HistoryOutcome::Cancelled => "cancelled",
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn export_contains_header_and_rows() {
        let record = HistoryRecord {
            occupant_id: "student-1".to_string(),
            owner_id: "alumni-1".to_string(),
            slot_id: "slot-1".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            time_slot: "10:00".to_string(),
            outcome: HistoryOutcome::Rejected,
            completed_at: NaiveDate::from_ymd_opt(2026, 3, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        };
        let bytes = history_to_csv(&[record]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("appointment_id,"));
        let row = lines.next().unwrap();
        assert!(row.contains("slot-1"));
        assert!(row.contains("rejected"));
        assert!(row.contains("2026-03-02"));
    }

    #[test]
    fn empty_history_exports_just_the_header() {
        let text = String::from_utf8(history_to_csv(&[]).unwrap()).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::ServiceError;

/// Parses a "HH:MM" time-of-day string.
pub fn parse_time_slot(time_slot: &str) -> Result<NaiveTime, ServiceError> {
    NaiveTime::parse_from_str(time_slot.trim(), "%H:%M").map_err(|_| {
        ServiceError::Validation(format!(
            "invalid time slot '{}', expected HH:MM",
            time_slot
        ))
    })
}

/// Combines a slot's date and time-of-day into the full instant used for
/// future/past checks and for the expiry sweep.
pub fn slot_instant(date: NaiveDate, time_slot: &str) -> Result<NaiveDateTime, ServiceError> {
    Ok(date.and_time(parse_time_slot(time_slot)?))
}

/// Parses a "YYYY-MM-DD" calendar date.
pub fn parse_date(date: &str) -> Result<NaiveDate, ServiceError> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|_| {
        ServiceError::Validation(format!("invalid date '{}', expected YYYY-MM-DD", date))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_time_slots() {
        assert_eq!(
            parse_time_slot("09:30").unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap()
        );
        assert_eq!(
            parse_time_slot(" 23:59 ").unwrap(),
            NaiveTime::from_hms_opt(23, 59, 0).unwrap()
        );
    }

    #[test]
    fn rejects_malformed_time_slots() {
        for bad in ["", "9am", "25:00", "12:61", "12-30"] {
            assert!(
                matches!(parse_time_slot(bad), Err(ServiceError::Validation(_))),
                "expected validation error for {:?}",
                bad
            );
        }
    }

    #[test]
    fn combines_date_and_time_into_instant() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let instant = slot_instant(date, "10:00").unwrap();
        assert_eq!(instant.to_string(), "2026-03-14 10:00:00");
    }

    #[test]
    fn parses_valid_dates_and_rejects_garbage() {
        assert!(parse_date("2026-01-31").is_ok());
        assert!(matches!(
            parse_date("31/01/2026"),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            parse_date("2026-02-30"),
            Err(ServiceError::Validation(_))
        ));
    }
}

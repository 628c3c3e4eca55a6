use chrono::{Duration, NaiveDateTime, NaiveTime};
use rusqlite::Connection;

use crate::db::queries;
use crate::models::booking::SENTENCE_DATETIME_FORMAT;

pub const BOOKING_DURATION_MINUTES: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl BusinessHours {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// The whole booking, start to end, has to fit inside opening hours.
    pub fn contains_slot(&self, dt: &NaiveDateTime) -> bool {
        let end_dt = *dt + Duration::minutes(BOOKING_DURATION_MINUTES);
        let start_time = dt.time();
        start_time >= self.start && end_dt.date() == dt.date() && end_dt.time() <= self.end
    }

    pub fn to_human_readable(&self) -> String {
        format!(
            "{} to {}",
            self.start.format("%I:%M %p"),
            self.end.format("%I:%M %p")
        )
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SchedulingError {
    #[error("Bookings cannot be made in the past. Current time is {}.", .now.format(SENTENCE_DATETIME_FORMAT))]
    InPast { now: NaiveDateTime },

    #[error("That time is outside our business hours. We're available {hours}.")]
    OutsideBusinessHours { hours: String },

    #[error("Time slot {} is not available for {technician}. Each booking requires a 1-hour window.", .at.format(SENTENCE_DATETIME_FORMAT))]
    Conflict { technician: String, at: NaiveDateTime },

    #[error("could not check availability: {0}")]
    Store(String),
}

/// Checks a proposed one-hour slot for `technician`. `exclude_id` skips the
/// booking being moved so it does not conflict with itself.
pub fn validate_booking_time(
    conn: &Connection,
    technician: &str,
    dt: &NaiveDateTime,
    now: &NaiveDateTime,
    hours: &BusinessHours,
    exclude_id: Option<i64>,
) -> Result<(), SchedulingError> {
    if dt < now {
        return Err(SchedulingError::InPast { now: *now });
    }

    if !hours.contains_slot(dt) {
        return Err(SchedulingError::OutsideBusinessHours {
            hours: hours.to_human_readable(),
        });
    }

    let window = Duration::minutes(BOOKING_DURATION_MINUTES);
    let proposed_end = *dt + window;

    let bookings =
        queries::get_technician_bookings_in_range(conn, technician, &(*dt - window), &proposed_end, exclude_id)
            .map_err(|e| SchedulingError::Store(e.to_string()))?;

    for booking in &bookings {
        let booking_end = booking.booking_datetime + window;
        // Overlap: booking starts before proposed ends AND booking ends after proposed starts
        if booking.booking_datetime < proposed_end && booking_end > *dt {
            return Err(SchedulingError::Conflict {
                technician: technician.to_string(),
                at: *dt,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::NewBooking;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn hours() -> BusinessHours {
        BusinessHours::new(
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        )
    }

    fn book(conn: &Connection, technician: &str, when: &str) -> i64 {
        queries::create_booking(
            conn,
            &NewBooking {
                technician_name: technician.to_string(),
                service: "Plumber".to_string(),
                booking_datetime: dt(when),
            },
            None,
        )
        .unwrap()
        .id
    }

    #[test]
    fn test_valid_time_no_conflict() {
        let conn = setup_db();
        let result = validate_booking_time(&conn, "Ann", &dt("2030-06-17 10:00"), &dt("2030-06-16 12:00"), &hours(), None);
        assert!(result.is_ok());
    }

    #[test]
    fn test_in_past_rejected() {
        let conn = setup_db();
        let err = validate_booking_time(&conn, "Ann", &dt("2030-06-16 10:00"), &dt("2030-06-16 12:00"), &hours(), None)
            .unwrap_err();
        assert!(matches!(err, SchedulingError::InPast { .. }));
        assert_eq!(
            err.to_string(),
            "Bookings cannot be made in the past. Current time is 16/06/2030 12:00PM."
        );
    }

    #[test]
    fn test_outside_business_hours() {
        let conn = setup_db();
        let now = dt("2030-06-16 07:00");
        let early = validate_booking_time(&conn, "Ann", &dt("2030-06-17 08:00"), &now, &hours(), None);
        assert!(matches!(early, Err(SchedulingError::OutsideBusinessHours { .. })));

        // 16:30 + 60min = 17:30, past closing
        let late = validate_booking_time(&conn, "Ann", &dt("2030-06-17 16:30"), &now, &hours(), None);
        assert!(matches!(late, Err(SchedulingError::OutsideBusinessHours { .. })));

        let last_slot = validate_booking_time(&conn, "Ann", &dt("2030-06-17 16:00"), &now, &hours(), None);
        assert!(last_slot.is_ok());
    }

    #[test]
    fn test_conflict_with_existing_booking() {
        let conn = setup_db();
        book(&conn, "Ann", "2030-06-17 10:00");

        let now = dt("2030-06-16 07:00");
        let result = validate_booking_time(&conn, "Ann", &dt("2030-06-17 10:30"), &now, &hours(), None);
        assert!(matches!(result, Err(SchedulingError::Conflict { .. })));

        let before = validate_booking_time(&conn, "Ann", &dt("2030-06-17 09:30"), &now, &hours(), None);
        assert!(matches!(before, Err(SchedulingError::Conflict { .. })));
    }

    #[test]
    fn test_no_conflict_adjacent_or_other_technician() {
        let conn = setup_db();
        book(&conn, "Ann", "2030-06-17 10:00");

        let now = dt("2030-06-16 07:00");
        // 11:00 starts exactly when previous ends
        assert!(validate_booking_time(&conn, "Ann", &dt("2030-06-17 11:00"), &now, &hours(), None).is_ok());
        assert!(validate_booking_time(&conn, "Ann", &dt("2030-06-17 09:00"), &now, &hours(), None).is_ok());
        assert!(validate_booking_time(&conn, "Bob", &dt("2030-06-17 10:00"), &now, &hours(), None).is_ok());
    }

    #[test]
    fn test_moving_booking_does_not_conflict_with_itself() {
        let conn = setup_db();
        let id = book(&conn, "Ann", "2030-06-17 10:00");

        let now = dt("2030-06-16 07:00");
        let result = validate_booking_time(&conn, "Ann", &dt("2030-06-17 10:30"), &now, &hours(), Some(id));
        assert!(result.is_ok());
    }

    #[test]
    fn test_human_readable_hours() {
        assert_eq!(hours().to_human_readable(), "09:00 AM to 05:00 PM");
    }
}

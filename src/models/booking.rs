use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::chat::BookingDetails;

/// Display format used for booking date/times inside chat replies.
pub const DETAILS_DATETIME_FORMAT: &str = "%Y-%m-%d %I:%M%p";

/// Format used in user-facing sentences ("Booking 4 updated to 20/10/2022 05:00PM").
pub const SENTENCE_DATETIME_FORMAT: &str = "%d/%m/%Y %I:%M%p";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: i64,
    pub service: String,
    pub technician_name: String,
    pub booking_datetime: NaiveDateTime,
    #[serde(default, skip_serializing)]
    pub user_id: Option<i64>,
}

impl Booking {
    pub fn to_details(&self) -> BookingDetails {
        BookingDetails {
            id: Some(self.id),
            service: Some(self.service.clone()),
            technician: Some(self.technician_name.clone()),
            datetime: Some(self.booking_datetime.format(DETAILS_DATETIME_FORMAT).to_string()),
        }
    }
}

/// A booking that has not been stored yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBooking {
    pub technician_name: String,
    pub service: String,
    pub booking_datetime: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details_projection() {
        let booking = Booking {
            id: 7,
            service: "Plumber".to_string(),
            technician_name: "Nicolas Woollett".to_string(),
            booking_datetime: NaiveDateTime::parse_from_str("2022-10-15 10:00:00", "%Y-%m-%d %H:%M:%S")
                .unwrap(),
            user_id: Some(1),
        };

        let details = booking.to_details();
        assert_eq!(details.id, Some(7));
        assert_eq!(details.technician.as_deref(), Some("Nicolas Woollett"));
        assert_eq!(details.datetime.as_deref(), Some("2022-10-15 10:00AM"));
    }

    #[test]
    fn test_owner_not_serialized() {
        let booking = Booking {
            id: 1,
            service: "Welder".to_string(),
            technician_name: "Griselda Dickson".to_string(),
            booking_datetime: NaiveDateTime::parse_from_str("2022-10-18 11:00:00", "%Y-%m-%d %H:%M:%S")
                .unwrap(),
            user_id: Some(3),
        };

        let json = serde_json::to_value(&booking).unwrap();
        assert!(json.get("user_id").is_none());
        assert_eq!(json["booking_datetime"], "2022-10-18T11:00:00");

        let back: Booking = serde_json::from_value(json).unwrap();
        assert_eq!(back.user_id, None);
    }
}

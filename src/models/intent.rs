use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    NewBooking,
    CancelBooking,
    GetBookingId,
    EditBooking,
    ListBookings,
}

/// Structured action extracted from a free-text message. Every slot is
/// optional; a missing `action_type` means the message is not a booking action.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingAction {
    #[serde(default)]
    pub action_type: Option<ActionType>,
    #[serde(default)]
    pub booking_id: Option<i64>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub booking_datetime: Option<String>,
    #[serde(default)]
    pub technician_name: Option<String>,
}

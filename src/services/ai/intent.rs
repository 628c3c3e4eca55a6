use chrono::{DateTime, NaiveDateTime};

use crate::models::BookingAction;
use crate::services::ai::{LlmProvider, Message};

const SYSTEM_PROMPT: &str = r#"You are a booking action processor for a technical services company.
Your ONLY job is to identify and extract booking-related actions when they clearly match one of the patterns below.

Return ONLY valid JSON (no markdown, no explanation) with this exact structure:
{
  "action_type": "new_booking|cancel_booking|get_booking_id|edit_booking|list_bookings|null",
  "booking_id": 123 or null,
  "service": "plumber, electrician, ... or null",
  "booking_datetime": "2025-01-15T14:00:00 or null",
  "technician_name": "name or null"
}

Action types and required parameters:
- "new_booking": service AND booking_datetime. Example: "book a plumber for tomorrow at 2pm"
- "cancel_booking": booking_id. Example: "cancel booking 123"
- "edit_booking": booking_id AND booking_datetime. Example: "move booking 123 to Monday at 3pm"
- "get_booking_id": booking_id if given. Example: "show booking 123", "what is my booking id"
- "list_bookings": no parameters. Example: "list my bookings"

Rules:
- Resolve relative dates ("tomorrow", "next Monday") against the current date and time given in the context.
- If only a time is given, use today when that time is still ahead, otherwise tomorrow.
- Each booking lasts one hour and must fall within the business hours given in the context.
- If the request does not match any pattern, set "action_type" to null and every other field to null.
"#;

pub async fn extract_action(
    llm: &dyn LlmProvider,
    context: &str,
    message: &str,
) -> anyhow::Result<Option<BookingAction>> {
    let system = format!("{SYSTEM_PROMPT}\nContext:\n{context}");
    let response = llm.chat(&system, &[Message::user(message)]).await?;

    Ok(parse_action_response(&response).filter(|action| action.action_type.is_some()))
}

fn parse_action_response(response: &str) -> Option<BookingAction> {
    if let Ok(action) = serde_json::from_str::<BookingAction>(response) {
        return Some(action);
    }

    // Strip markdown code fences
    let trimmed = response.trim();
    let cleaned = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let cleaned = cleaned.strip_suffix("```").unwrap_or(cleaned).trim();

    if let Ok(action) = serde_json::from_str::<BookingAction>(cleaned) {
        return Some(action);
    }

    // Outermost object embedded in prose
    if let (Some(start), Some(end)) = (cleaned.find('{'), cleaned.rfind('}')) {
        if start < end {
            if let Ok(action) = serde_json::from_str::<BookingAction>(&cleaned[start..=end]) {
                return Some(action);
            }
        }
    }

    tracing::warn!("failed to parse LLM response as booking action JSON");
    None
}

/// Parses the date/time slot as produced by the model. Offsets are dropped;
/// the wall-clock time is kept as given.
pub fn parse_requested_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }

    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

use serde::{Deserialize, Serialize};

/// Display-only projection of a booking, sent inline in chat replies.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BookingDetails {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub technician: Option<String>,
    #[serde(default)]
    pub datetime: Option<String>,
}

impl BookingDetails {
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.service.is_none()
            && self.technician.is_none()
            && self.datetime.is_none()
    }
}

/// Content of one chat message, tagged on the wire by `message_type`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "message_type", rename_all = "snake_case")]
pub enum MessageContent {
    Text {
        text: String,
    },
    Markdown {
        text: String,
    },
    BookingDetails {
        #[serde(default)]
        text: Option<String>,
        details: BookingDetails,
    },
    Error {
        text: String,
    },
}

impl MessageContent {
    pub fn text(text: impl Into<String>) -> Self {
        MessageContent::Text { text: text.into() }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        MessageContent::Markdown { text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        MessageContent::Error { text: text.into() }
    }

    pub fn booking(text: Option<String>, details: BookingDetails) -> Self {
        MessageContent::BookingDetails { text, details }
    }

    pub fn message_type(&self) -> &'static str {
        match self {
            MessageContent::Text { .. } => "text",
            MessageContent::Markdown { .. } => "markdown",
            MessageContent::BookingDetails { .. } => "booking_details",
            MessageContent::Error { .. } => "error",
        }
    }

    /// A booking_details reply must carry at least one populated field.
    pub fn is_well_formed(&self) -> bool {
        match self {
            MessageContent::BookingDetails { details, .. } => !details.is_empty(),
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: MessageContent,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    System,
}

/// One entry of the conversation log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub sender: Sender,
    pub content: MessageContent,
}

impl Message {
    pub fn from_user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            content: MessageContent::text(text),
        }
    }

    pub fn from_system(content: MessageContent) -> Self {
        Self {
            sender: Sender::System,
            content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_details_wire_shape() {
        let json = r#"{"response":{"text":"Booking confirmed:","message_type":"booking_details","details":{"id":1,"service":"Gardener","technician":"John Doe","datetime":"2022-10-20T17:00:00"}}}"#;
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        match parsed.response {
            MessageContent::BookingDetails { text, details } => {
                assert_eq!(text.as_deref(), Some("Booking confirmed:"));
                assert_eq!(details.id, Some(1));
                assert_eq!(details.technician.as_deref(), Some("John Doe"));
            }
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[test]
    fn test_booking_details_null_text() {
        let json = r#"{"message_type":"booking_details","text":null,"details":{"id":3}}"#;
        let parsed: MessageContent = serde_json::from_str(json).unwrap();
        assert!(parsed.is_well_formed());
        assert_eq!(parsed.message_type(), "booking_details");
    }

    #[test]
    fn test_booking_details_requires_details() {
        let json = r#"{"message_type":"booking_details","text":"hi"}"#;
        assert!(serde_json::from_str::<MessageContent>(json).is_err());

        let empty = r#"{"message_type":"booking_details","details":{}}"#;
        let parsed: MessageContent = serde_json::from_str(empty).unwrap();
        assert!(!parsed.is_well_formed());
    }

    #[test]
    fn test_unknown_message_type_rejected() {
        let json = r#"{"message_type":"video","text":"hi"}"#;
        assert!(serde_json::from_str::<MessageContent>(json).is_err());
    }

    #[test]
    fn test_serialize_tag() {
        let value = serde_json::to_value(MessageContent::error("boom")).unwrap();
        assert_eq!(value["message_type"], "error");
        assert_eq!(value["text"], "boom");
        assert!(value.get("details").is_none());
    }
}

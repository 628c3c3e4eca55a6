use std::sync::Arc;

use super::api::BookingApi;
use super::render;
use super::session::SessionStore;
use crate::models::{Message, MessageContent};

/// Reply appended when the request fails for any reason.
pub const PROCESSING_ERROR: &str = "Error processing request.";

/// Per-deployment switches for the chat component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatFeatures {
    pub supports_markdown: bool,
    pub supports_token_auth: bool,
    pub restores_input_on_error: bool,
}

impl Default for ChatFeatures {
    fn default() -> Self {
        Self {
            supports_markdown: true,
            supports_token_auth: true,
            restores_input_on_error: false,
        }
    }
}

/// Append-only, in-memory. Lives as long as the component.
#[derive(Debug, Default, Clone)]
pub struct ConversationLog {
    messages: Vec<Message>,
}

impl ConversationLog {
    fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Input was empty or whitespace; nothing happened.
    Ignored,
    Replied,
    Failed,
    /// The server rejected the session token. The token has been cleared and
    /// the caller should navigate to the login view.
    SessionExpired,
}

pub struct Conversation {
    api: Arc<dyn BookingApi>,
    session: Arc<dyn SessionStore>,
    features: ChatFeatures,
    log: ConversationLog,
    input: String,
}

impl Conversation {
    pub fn new(
        api: Arc<dyn BookingApi>,
        session: Arc<dyn SessionStore>,
        features: ChatFeatures,
    ) -> Self {
        Self {
            api,
            session,
            features,
            log: ConversationLog::default(),
            input: String::new(),
        }
    }

    pub fn features(&self) -> ChatFeatures {
        self.features
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    /// Sends the current input. A non-empty submit always grows the log by
    /// exactly two entries: the user's text and one system reply.
    pub async fn submit(&mut self) -> SubmitOutcome {
        if self.input.trim().is_empty() {
            return SubmitOutcome::Ignored;
        }

        let text = std::mem::take(&mut self.input);
        self.log.push(Message::from_user(text.clone()));

        let token = if self.features.supports_token_auth {
            self.session.get_token()
        } else {
            None
        };

        match self.api.send_message(&text, token.as_ref()).await {
            Ok(reply) => {
                self.log.push(Message::from_system(reply));
                SubmitOutcome::Replied
            }
            Err(e) => {
                tracing::warn!(error = %e, "chat request failed");
                self.log
                    .push(Message::from_system(MessageContent::error(PROCESSING_ERROR)));
                if self.features.restores_input_on_error {
                    self.input = text;
                }
                if e.is_unauthorized() && self.features.supports_token_auth {
                    self.session.clear_token();
                    return SubmitOutcome::SessionExpired;
                }
                SubmitOutcome::Failed
            }
        }
    }

    /// The whole log as HTML fragments, in order.
    pub fn render_html(&self) -> Vec<String> {
        self.log
            .messages()
            .iter()
            .map(|m| render::render_html(m, self.features.supports_markdown))
            .collect()
    }
}

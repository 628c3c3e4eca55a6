use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use super::session::Token;
use crate::models::{Booking, ChatRequest, ChatResponse, Credentials, MessageContent, TokenResponse};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{detail}")]
    Unauthorized { detail: String },

    #[error("{detail}")]
    Status { status: u16, detail: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ClientError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized { .. })
    }
}

/// Everything the chat client needs from the booking service.
#[async_trait]
pub trait BookingApi: Send + Sync {
    async fn send_message(
        &self,
        message: &str,
        token: Option<&Token>,
    ) -> Result<MessageContent, ClientError>;

    async fn login(&self, credentials: &Credentials) -> Result<Token, ClientError>;

    async fn signup(&self, credentials: &Credentials) -> Result<(), ClientError>;

    async fn my_bookings(&self, token: &Token) -> Result<Vec<Booking>, ClientError>;
}

pub struct HttpBookingApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBookingApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let detail = error_detail(status, &body);
            return Err(if status == StatusCode::UNAUTHORIZED {
                ClientError::Unauthorized { detail }
            } else {
                ClientError::Status {
                    status: status.as_u16(),
                    detail,
                }
            });
        }

        serde_json::from_str(&body).map_err(|e| ClientError::Malformed(e.to_string()))
    }
}

/// Pulls `detail` out of an error body. Validation errors carry a list of
/// objects there; their `msg` fields are joined.
fn error_detail(status: StatusCode, body: &str) -> String {
    let fallback = || {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    };

    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return fallback();
    };

    match &value["detail"] {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => {
            let msgs: Vec<&str> = items.iter().filter_map(|i| i["msg"].as_str()).collect();
            if msgs.is_empty() {
                fallback()
            } else {
                msgs.join("; ")
            }
        }
        _ => fallback(),
    }
}

#[async_trait]
impl BookingApi for HttpBookingApi {
    async fn send_message(
        &self,
        message: &str,
        token: Option<&Token>,
    ) -> Result<MessageContent, ClientError> {
        let mut req = self.client.post(self.url("/chat")).json(&ChatRequest {
            message: message.to_string(),
        });
        if let Some(token) = token {
            req = req.bearer_auth(token.as_str());
        }

        let resp: ChatResponse = Self::read(req.send().await?).await?;
        if !resp.response.is_well_formed() {
            return Err(ClientError::Malformed(
                "booking_details reply without details".to_string(),
            ));
        }
        Ok(resp.response)
    }

    async fn login(&self, credentials: &Credentials) -> Result<Token, ClientError> {
        let resp = self
            .client
            .post(self.url("/login"))
            .form(credentials)
            .send()
            .await?;
        let token: TokenResponse = Self::read(resp).await?;
        Ok(Token::new(token.access_token))
    }

    async fn signup(&self, credentials: &Credentials) -> Result<(), ClientError> {
        let resp = self
            .client
            .post(self.url("/signup"))
            .json(credentials)
            .send()
            .await?;
        let _: serde_json::Value = Self::read(resp).await?;
        Ok(())
    }

    async fn my_bookings(&self, token: &Token) -> Result<Vec<Booking>, ClientError> {
        let resp = self
            .client
            .get(self.url("/my-bookings"))
            .bearer_auth(token.as_str())
            .send()
            .await?;
        Self::read(resp).await
    }
}

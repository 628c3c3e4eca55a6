//! Terminal front end. Drives the same conversation component as the web
//! client, but calls the booking services in-process instead of over HTTP.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::client::{
    AuthGate, BookingApi, ChatFeatures, ClientError, Conversation, MemorySession, SessionStore,
    SubmitOutcome, Token,
};
use crate::client::render::render_plain;
use crate::db::queries;
use crate::models::{Booking, Credentials, MessageContent};
use crate::services::{auth, chat};
use crate::state::AppState;

pub const CONSOLE_USER: &str = "console";

/// Local-only account; unrelated to the token signing secret.
pub const CONSOLE_PASSWORD: &str = "console-local";

fn unauthorized(detail: &str) -> ClientError {
    ClientError::Unauthorized {
        detail: detail.to_string(),
    }
}

fn internal(e: anyhow::Error) -> ClientError {
    ClientError::Status {
        status: 500,
        detail: e.to_string(),
    }
}

/// `BookingApi` served straight from `AppState`.
pub struct LocalBookingApi {
    state: Arc<AppState>,
}

impl LocalBookingApi {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    fn owner(&self, token: &Token) -> Result<i64, ClientError> {
        auth::verify_token(&self.state.config.secret_key, token.as_str())
            .map(|claims| claims.uid)
            .map_err(|_| unauthorized("Could not validate credentials"))
    }
}

#[async_trait]
impl BookingApi for LocalBookingApi {
    async fn send_message(
        &self,
        message: &str,
        token: Option<&Token>,
    ) -> Result<MessageContent, ClientError> {
        let owner = token.map(|t| self.owner(t)).transpose()?;
        Ok(chat::process_message(&self.state, owner, message).await)
    }

    async fn login(&self, credentials: &Credentials) -> Result<Token, ClientError> {
        let user = {
            let conn = self.state.conn().map_err(internal)?;
            queries::get_user_by_username(&conn, &credentials.username).map_err(internal)?
        };

        match user {
            Some(u) if auth::verify_password(&credentials.password, &u.hashed_password) => {
                auth::issue_token(
                    &self.state.config.secret_key,
                    u.id,
                    &u.username,
                    self.state.config.access_token_expire_minutes,
                )
                .map(Token::new)
                .map_err(internal)
            }
            _ => Err(unauthorized("Incorrect username or password")),
        }
    }

    async fn signup(&self, credentials: &Credentials) -> Result<(), ClientError> {
        let hashed = auth::hash_password(&credentials.password).map_err(internal)?;
        let conn = self.state.conn().map_err(internal)?;
        if queries::get_user_by_username(&conn, &credentials.username)
            .map_err(internal)?
            .is_some()
        {
            return Err(ClientError::Status {
                status: 400,
                detail: "Username already registered".to_string(),
            });
        }
        queries::create_user(&conn, &credentials.username, &hashed).map_err(internal)?;
        Ok(())
    }

    async fn my_bookings(&self, token: &Token) -> Result<Vec<Booking>, ClientError> {
        let owner = self.owner(token)?;
        let conn = self.state.conn().map_err(internal)?;
        queries::get_bookings_for_owner(&conn, Some(owner)).map_err(internal)
    }
}

/// Logs in as the local console user, creating it on first use.
async fn sign_in(gate: &AuthGate) -> anyhow::Result<()> {
    if gate.login(CONSOLE_USER, CONSOLE_PASSWORD).await.is_ok() {
        return Ok(());
    }

    gate.signup(CONSOLE_USER, CONSOLE_PASSWORD)
        .await
        .map_err(|n| anyhow::anyhow!("could not create console user: {}", n.0))?;
    gate.login(CONSOLE_USER, CONSOLE_PASSWORD)
        .await
        .map_err(|n| anyhow::anyhow!("could not log in as console user: {}", n.0))?;
    Ok(())
}

pub async fn run(state: Arc<AppState>) -> anyhow::Result<()> {
    let api: Arc<dyn BookingApi> = Arc::new(LocalBookingApi::new(state.clone()));
    let session: Arc<dyn SessionStore> = Arc::new(MemorySession::new());

    let gate = AuthGate::new(api.clone(), session.clone());
    sign_in(&gate).await?;
    tracing::info!(user = CONSOLE_USER, "console session started");

    let features = ChatFeatures {
        supports_markdown: false,
        ..ChatFeatures::default()
    };
    let mut conversation = Conversation::new(api, session, features);

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout
        .write_all(b"How can I help you with your booking? (type 'quit' to exit)\n> ")
        .await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await? {
        if line.trim().eq_ignore_ascii_case("quit") {
            break;
        }

        conversation.set_input(line);
        let outcome = conversation.submit().await;
        if outcome != SubmitOutcome::Ignored {
            if let Some(reply) = conversation.log().last() {
                stdout
                    .write_all(format!("{}\n", render_plain(&reply.content)).as_bytes())
                    .await?;
            }
        }
        if outcome == SubmitOutcome::SessionExpired {
            sign_in(&gate).await?;
        }

        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
    }

    Ok(())
}

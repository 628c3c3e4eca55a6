use std::sync::Arc;

use super::api::{BookingApi, ClientError};
use super::conversation::PROCESSING_ERROR;
use super::session::SessionStore;
use crate::models::{Booking, Credentials};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Signup,
    Chat,
    Bookings,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Signup => "/signup",
            Route::Chat => "/chat",
            Route::Bookings => "/bookings",
        }
    }

    pub fn from_path(path: &str) -> Option<Route> {
        match path.trim_end_matches('/') {
            "/login" => Some(Route::Login),
            "/signup" => Some(Route::Signup),
            "" | "/chat" => Some(Route::Chat),
            "/bookings" => Some(Route::Bookings),
            _ => None,
        }
    }

    pub fn is_protected(self) -> bool {
        matches!(self, Route::Chat | Route::Bookings)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Render(Route),
    Redirect(Route),
}

/// A blocking message shown to the user (alert-style).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice(pub String);

impl From<ClientError> for Notice {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Unauthorized { detail } | ClientError::Status { detail, .. } => Notice(detail),
            other => {
                tracing::warn!(error = %other, "auth request failed");
                Notice(PROCESSING_ERROR.to_string())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BookingsView {
    List(Vec<Booking>),
    Redirect(Route),
    Failed(Notice),
}

/// Decides which views need a session and drives login, signup and logout.
pub struct AuthGate {
    api: Arc<dyn BookingApi>,
    session: Arc<dyn SessionStore>,
}

impl AuthGate {
    pub fn new(api: Arc<dyn BookingApi>, session: Arc<dyn SessionStore>) -> Self {
        Self { api, session }
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.get_token().is_some()
    }

    /// Protected views redirect to login when no token is present. The
    /// token is not validated here; the server answers 401 for stale ones.
    pub fn guard(&self, route: Route) -> Navigation {
        if route.is_protected() && !self.is_logged_in() {
            Navigation::Redirect(Route::Login)
        } else {
            Navigation::Render(route)
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Navigation, Notice> {
        let token = self
            .api
            .login(&Credentials {
                username: username.to_string(),
                password: password.to_string(),
            })
            .await?;
        self.session.set_token(token);
        tracing::info!(username, "logged in");
        Ok(Navigation::Redirect(Route::Chat))
    }

    pub async fn signup(&self, username: &str, password: &str) -> Result<Navigation, Notice> {
        self.api
            .signup(&Credentials {
                username: username.to_string(),
                password: password.to_string(),
            })
            .await?;
        Ok(Navigation::Redirect(Route::Login))
    }

    pub fn logout(&self) -> Navigation {
        self.session.clear_token();
        Navigation::Redirect(Route::Login)
    }

    pub async fn my_bookings(&self) -> BookingsView {
        let Some(token) = self.session.get_token() else {
            return BookingsView::Redirect(Route::Login);
        };

        match self.api.my_bookings(&token).await {
            Ok(bookings) => BookingsView::List(bookings),
            Err(e) if e.is_unauthorized() => {
                self.session.clear_token();
                BookingsView::Redirect(Route::Login)
            }
            Err(e) => BookingsView::Failed(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::session::{CookieSession, Token};
    use crate::models::MessageContent;
    use async_trait::async_trait;

    struct MockApi;

    #[async_trait]
    impl BookingApi for MockApi {
        async fn send_message(
            &self,
            _message: &str,
            _token: Option<&Token>,
        ) -> Result<MessageContent, ClientError> {
            unimplemented!()
        }

        async fn login(&self, credentials: &Credentials) -> Result<Token, ClientError> {
            if credentials.password == "secret" {
                Ok(Token::new("abc.def"))
            } else {
                Err(ClientError::Unauthorized {
                    detail: "Incorrect username or password".to_string(),
                })
            }
        }

        async fn signup(&self, credentials: &Credentials) -> Result<(), ClientError> {
            if credentials.username == "taken" {
                Err(ClientError::Status {
                    status: 400,
                    detail: "Username already registered".to_string(),
                })
            } else {
                Ok(())
            }
        }

        async fn my_bookings(&self, token: &Token) -> Result<Vec<Booking>, ClientError> {
            if token.as_str() == "abc.def" {
                Ok(vec![])
            } else {
                Err(ClientError::Unauthorized {
                    detail: "Could not validate credentials".to_string(),
                })
            }
        }
    }

    fn gate() -> (AuthGate, Arc<CookieSession>) {
        let session = Arc::new(CookieSession::new());
        (AuthGate::new(Arc::new(MockApi), session.clone()), session)
    }

    #[test]
    fn test_guard_redirects_without_token() {
        let (gate, session) = gate();
        assert_eq!(gate.guard(Route::Chat), Navigation::Redirect(Route::Login));
        assert_eq!(gate.guard(Route::Bookings), Navigation::Redirect(Route::Login));
        assert_eq!(gate.guard(Route::Signup), Navigation::Render(Route::Signup));

        session.set_token(Token::new("anything"));
        assert_eq!(gate.guard(Route::Chat), Navigation::Render(Route::Chat));
    }

    #[tokio::test]
    async fn test_login_stores_token() {
        let (gate, session) = gate();
        assert_eq!(
            gate.login("ann", "secret").await,
            Ok(Navigation::Redirect(Route::Chat))
        );
        assert_eq!(session.cookie_header("/"), "token=abc.def");
    }

    #[tokio::test]
    async fn test_login_failure_shows_detail() {
        let (gate, session) = gate();
        assert_eq!(
            gate.login("ann", "wrong").await,
            Err(Notice("Incorrect username or password".to_string()))
        );
        assert!(session.get_token().is_none());
    }

    #[tokio::test]
    async fn test_signup_flow() {
        let (gate, _) = gate();
        assert_eq!(gate.signup("ann", "pw").await, Ok(Navigation::Redirect(Route::Login)));
        assert_eq!(
            gate.signup("taken", "pw").await,
            Err(Notice("Username already registered".to_string()))
        );
    }

    #[test]
    fn test_logout_clears_cookie() {
        let (gate, session) = gate();
        session.set_token(Token::new("abc.def"));
        assert_eq!(gate.logout(), Navigation::Redirect(Route::Login));
        assert!(session.get_token().is_none());
        assert_eq!(gate.guard(Route::Chat), Navigation::Redirect(Route::Login));
    }

    #[tokio::test]
    async fn test_stale_token_on_bookings_page() {
        let (gate, session) = gate();
        session.set_token(Token::new("stale"));
        assert_eq!(gate.my_bookings().await, BookingsView::Redirect(Route::Login));
        assert!(session.get_token().is_none());

        gate.login("ann", "secret").await.unwrap();
        assert_eq!(gate.my_bookings().await, BookingsView::List(vec![]));
    }

    #[test]
    fn test_route_paths() {
        assert_eq!(Route::from_path("/"), Some(Route::Chat));
        assert_eq!(Route::from_path("/bookings/"), Some(Route::Bookings));
        assert_eq!(Route::from_path("/nope"), None);
        assert_eq!(Route::Login.path(), "/login");
    }
}

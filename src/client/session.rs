use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

pub const TOKEN_COOKIE: &str = "token";

const EXPIRED_DATE: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// Opaque bearer credential. Never inspected client-side.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

/// Where the session token lives. Call sites only ever see these three operations.
pub trait SessionStore: Send + Sync {
    fn get_token(&self) -> Option<Token>;
    fn set_token(&self, token: Token);
    fn clear_token(&self);
}

#[derive(Debug, Default)]
pub struct MemorySession {
    token: Mutex<Option<Token>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: Token) -> Self {
        Self {
            token: Mutex::new(Some(token)),
        }
    }
}

impl SessionStore for MemorySession {
    fn get_token(&self) -> Option<Token> {
        self.token.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn set_token(&self, token: Token) {
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = Some(token);
    }

    fn clear_token(&self) {
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

#[derive(Debug, Clone)]
struct Cookie {
    value: String,
    path: String,
    expires: Option<DateTime<Utc>>,
}

impl Cookie {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires.map_or(true, |exp| exp > now)
    }
}

/// Cookie-jar backed session. Writes go through `Set-Cookie` style strings and
/// reads through a `Cookie` header style string, the way a browser exposes
/// `document.cookie`.
#[derive(Debug, Default)]
pub struct CookieSession {
    jar: Mutex<HashMap<String, Cookie>>,
}

impl CookieSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the jar from a request `Cookie` header (`a=1; token=xyz`).
    pub fn from_cookie_header(header: &str) -> Self {
        let session = Self::new();
        for pair in header.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                session.apply_set_cookie(&format!("{}={}; path=/", name.trim(), value.trim()));
            }
        }
        session
    }

    /// Applies one `Set-Cookie` directive. Expired cookies are dropped.
    pub fn apply_set_cookie(&self, directive: &str) {
        let mut parts = directive.split(';');
        let Some((name, value)) = parts.next().and_then(|p| p.trim().split_once('=')) else {
            return;
        };

        let mut cookie = Cookie {
            value: value.trim().to_string(),
            path: "/".to_string(),
            expires: None,
        };

        for attr in parts {
            let (key, val) = attr.trim().split_once('=').unwrap_or((attr.trim(), ""));
            match key.to_ascii_lowercase().as_str() {
                "path" => cookie.path = val.to_string(),
                "expires" => {
                    cookie.expires = DateTime::parse_from_rfc2822(val)
                        .ok()
                        .map(|dt| dt.with_timezone(&Utc));
                }
                "max-age" => {
                    if let Ok(secs) = val.parse::<i64>() {
                        cookie.expires = Some(Utc::now() + Duration::seconds(secs));
                    }
                }
                _ => {}
            }
        }

        let mut jar = self.jar.lock().unwrap_or_else(|e| e.into_inner());
        if cookie.is_live(Utc::now()) {
            jar.insert(name.trim().to_string(), cookie);
        } else {
            jar.remove(name.trim());
        }
    }

    /// Live cookies visible at `path`, formatted like a `Cookie` header.
    pub fn cookie_header(&self, path: &str) -> String {
        let now = Utc::now();
        let jar = self.jar.lock().unwrap_or_else(|e| e.into_inner());
        let mut pairs: Vec<String> = jar
            .iter()
            .filter(|(_, c)| c.is_live(now) && path.starts_with(&c.path))
            .map(|(name, c)| format!("{name}={}", c.value))
            .collect();
        pairs.sort();
        pairs.join("; ")
    }
}

impl SessionStore for CookieSession {
    fn get_token(&self) -> Option<Token> {
        self.cookie_header("/")
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == TOKEN_COOKIE)
            .map(|(_, value)| value)
            .filter(|value| !value.is_empty())
            .map(Token::new)
    }

    fn set_token(&self, token: Token) {
        self.apply_set_cookie(&format!("{TOKEN_COOKIE}={}; path=/", token.as_str()));
    }

    fn clear_token(&self) {
        self.apply_set_cookie(&format!("{TOKEN_COOKIE}=; path=/; expires={EXPIRED_DATE}"));
    }
}

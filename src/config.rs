use std::env;

use chrono::NaiveTime;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub secret_key: String,
    pub access_token_expire_minutes: i64,
    pub llm_provider: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub business_hours_start: NaiveTime,
    pub business_hours_end: NaiveTime,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "bookings.db".to_string()),
            secret_key: secret_key(env::var("SECRET_KEY").ok()),
            // 30 days
            access_token_expire_minutes: env::var("ACCESS_TOKEN_EXPIRE_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60 * 24 * 30),
            llm_provider: env::var("LLM_PROVIDER").unwrap_or_else(|_| "openai".to_string()),
            openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            ollama_url: env::var("OLLAMA_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            ollama_model: env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string()),
            business_hours_start: time_var("BUSINESS_HOURS_START", 9),
            business_hours_end: time_var("BUSINESS_HOURS_END", 17),
            cors_origins: env::var("CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_else(|_| vec!["*".to_string()]),
        }
    }
}

pub const DEFAULT_SECRET_KEY: &str = "your-secret-key";

/// Falls back to the built-in development key, with a warning.
fn secret_key(value: Option<String>) -> String {
    match value.filter(|v| !v.trim().is_empty()) {
        Some(v) => v,
        None => {
            tracing::warn!(
                "SECRET_KEY is not set; signing tokens with the built-in development key"
            );
            DEFAULT_SECRET_KEY.to_string()
        }
    }
}

fn time_var(name: &str, default_hour: u32) -> NaiveTime {
    env::var(name)
        .ok()
        .and_then(|v| NaiveTime::parse_from_str(v.trim(), "%H:%M").ok())
        .unwrap_or_else(|| NaiveTime::from_hms_opt(default_hour, 0, 0).unwrap_or(NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_key_fallback() {
        assert_eq!(secret_key(None), DEFAULT_SECRET_KEY);
        assert_eq!(secret_key(Some("   ".to_string())), DEFAULT_SECRET_KEY);
        assert_eq!(secret_key(Some("s3cr3t".to_string())), "s3cr3t");
    }
}

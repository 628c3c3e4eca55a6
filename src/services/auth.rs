//! Password hashing and bearer token issuing.
//!
//! Passwords are stored as `pbkdf2-sha256$<iterations>$<salt>$<hash>`, derived
//! with PBKDF2-HMAC-SHA256. Tokens are `<claims>.<signature>`, both base64url without
//! padding, the signature being HMAC-SHA256 of the encoded claims under the
//! server secret.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

const HASH_SCHEME: &str = "pbkdf2-sha256";
const HASH_ITERATIONS: u32 = 10_000;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("invalid token signature")]
    BadSignature,
    #[error("token expired")]
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: String,
    pub uid: i64,
    pub exp: i64,
}

fn new_mac(key: &[u8]) -> anyhow::Result<HmacSha256> {
    HmacSha256::new_from_slice(key).map_err(|e| anyhow::anyhow!("invalid HMAC key: {e}"))
}

fn derive_key(password: &str, salt: &[u8], iterations: u32) -> [u8; 32] {
    let mut key = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key);
    key
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = uuid::Uuid::new_v4();
    let key = derive_key(password, salt.as_bytes(), HASH_ITERATIONS);
    Ok(format!(
        "{HASH_SCHEME}${HASH_ITERATIONS}${}${}",
        URL_SAFE_NO_PAD.encode(salt.as_bytes()),
        URL_SAFE_NO_PAD.encode(key)
    ))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let parts: Vec<&str> = stored.split('$').collect();
    let [scheme, iterations, salt, hash] = parts.as_slice() else {
        return false;
    };
    if *scheme != HASH_SCHEME {
        return false;
    }
    let (Ok(iterations), Ok(salt), Ok(hash)) = (
        iterations.parse::<u32>(),
        URL_SAFE_NO_PAD.decode(salt),
        URL_SAFE_NO_PAD.decode(hash),
    ) else {
        return false;
    };
    if iterations == 0 {
        return false;
    }

    let key = derive_key(password, &salt, iterations);
    key[..].ct_eq(&hash[..]).into()
}

pub fn issue_token(secret: &str, user_id: i64, username: &str, ttl_minutes: i64) -> anyhow::Result<String> {
    let claims = Claims {
        sub: username.to_string(),
        uid: user_id,
        exp: (Utc::now() + Duration::minutes(ttl_minutes)).timestamp(),
    };
    encode_claims(secret, &claims)
}

fn encode_claims(secret: &str, claims: &Claims) -> anyhow::Result<String> {
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
    let mut mac = new_mac(secret.as_bytes())?;
    mac.update(payload.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    Ok(format!("{payload}.{signature}"))
}

pub fn verify_token(secret: &str, token: &str) -> Result<Claims, TokenError> {
    let (payload, signature) = token.split_once('.').ok_or(TokenError::Malformed)?;
    let signature = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| TokenError::Malformed)?;

    let mut mac = new_mac(secret.as_bytes()).map_err(|_| TokenError::BadSignature)?;
    mac.update(payload.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| TokenError::BadSignature)?;

    let raw = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| TokenError::Malformed)?;
    let claims: Claims = serde_json::from_slice(&raw).map_err(|_| TokenError::Malformed)?;

    if claims.exp <= Utc::now().timestamp() {
        return Err(TokenError::Expired);
    }
    Ok(claims)
}

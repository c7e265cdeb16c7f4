use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{AppError, AppResult};

/// Identity claims carried by a signed token. `exp` is only present when a
/// token lifetime is configured; tokens without it never expire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
    pub iat: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

pub fn create_token(
    username: &str,
    is_admin: bool,
    secret: &str,
    token_hours: Option<u64>,
) -> AppResult<String> {
    let iat = unix_now()?;
    let claims = Claims {
        username: username.to_string(),
        is_admin,
        iat,
        exp: token_hours.map(|hours| iat + hours as i64 * 3600),
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token encoding failed: {e}")))
}

pub fn decode_token(token: &str, secret: &str) -> AppResult<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    // Tokens without an exp claim are valid indefinitely; exp is still
    // checked when present.
    validation.required_spec_claims.clear();

    jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized("Invalid token".into()))
}

fn unix_now() -> AppResult<i64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .map_err(|e| AppError::Internal(format!("System clock error: {e}")))
}

use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::header;
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use crate::auth::token;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// The authenticated caller, as asserted by their bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
    pub is_admin: bool,
}

/// Extractor that requires a valid bearer token in the `authorization`
/// header. Returns 401 when the header is missing or the token is invalid.
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| {
            AppError::Unauthorized("Unauthorized".into())
        })?;

        let claims = token::decode_token(token, state.config.jwt_secret())?;

        Ok(AuthUser {
            username: claims.username,
            is_admin: claims.is_admin,
        })
    }
}

/// Caller must be an admin.
pub fn require_admin(user: &AuthUser) -> AppResult<()> {
    if user.is_admin {
        Ok(())
    } else {
        Err(AppError::Unauthorized("Unauthorized".into()))
    }
}

/// Caller must be exactly `username`.
pub fn require_user(user: &AuthUser, username: &str) -> AppResult<()> {
    if user.username == username {
        Ok(())
    } else {
        Err(AppError::Unauthorized("Unauthorized".into()))
    }
}

/// Caller must be `username` or an admin.
pub fn require_user_or_admin(user: &AuthUser, username: &str) -> AppResult<()> {
    if user.is_admin || user.username == username {
        Ok(())
    } else {
        Err(AppError::Unauthorized("Unauthorized".into()))
    }
}

/// JSON body extractor that reports deserialization failures as 400s in
/// the standard error envelope instead of axum's plain-text rejection.
#[derive(Debug)]
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
        }
    }
}

/// Query-string counterpart of [`AppJson`].
pub struct AppQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for AppQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") {
        Some(token.trim())
    } else {
        None
    }
}

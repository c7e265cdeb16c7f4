//! Token issuance: login and self-registration.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::auth::token::create_token;
use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::state::AppState;
use crate::store;
use crate::store::users::NewUser;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/token", post(login))
        .route("/auth/register", post(register))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct TokenRequest {
    username: String,
    password: String,
}

impl TokenRequest {
    fn validate(&self) -> AppResult<()> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            return Err(AppError::BadRequest(
                "username and password are required".into(),
            ));
        }
        Ok(())
    }
}

/// Self-registration never grants the admin flag.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RegisterRequest {
    username: String,
    password: String,
    first_name: String,
    last_name: String,
    email: String,
}

impl RegisterRequest {
    fn into_new_user(self) -> NewUser {
        NewUser {
            username: self.username,
            password: self.password,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            is_admin: false,
        }
    }
}

/// POST /auth/token {username, password} => {token}
async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<TokenRequest>,
) -> AppResult<impl IntoResponse> {
    req.validate()?;
    let user = store::users::authenticate(&state.db, &req.username, &req.password)?;
    let token = create_token(
        &user.username,
        user.is_admin,
        state.config.jwt_secret(),
        state.config.auth.token_hours,
    )?;
    Ok(Json(json!({ "token": token })))
}

/// POST /auth/register {username, password, firstName, lastName, email} => {token}
async fn register(
    State(state): State<AppState>,
    AppJson(req): AppJson<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    let new_user = req.into_new_user();
    new_user.validate()?;
    let user = store::users::register(&state.db, new_user, state.config.auth.bcrypt_cost)?;
    let token = create_token(
        &user.username,
        user.is_admin,
        state.config.jwt_secret(),
        state.config.auth.token_hours,
    )?;
    Ok((StatusCode::CREATED, Json(json!({ "token": token }))))
}

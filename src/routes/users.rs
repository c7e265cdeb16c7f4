//! User CRUD plus the like/invite relation routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::auth::token::create_token;
use crate::error::AppResult;
use crate::extract::{require_admin, require_user, require_user_or_admin, AppJson, AuthUser};
use crate::state::AppState;
use crate::store;
use crate::store::users::{NewUser, UserUpdate};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user).get(list_users))
        .route(
            "/users/{username}",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route("/users/{username}/email", get(get_email))
        .route(
            "/users/{username}/like/{id}",
            post(like_post).delete(unlike_post),
        )
        .route(
            "/users/{username}/invite/{id}",
            post(invite_post).delete(uninvite_post),
        )
}

/// A same-user PATCH body: like `UserUpdate` but with no way to touch the
/// admin flag.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct UserUpdateRequest {
    first_name: Option<String>,
    last_name: Option<String>,
    password: Option<String>,
    email: Option<String>,
}

impl UserUpdateRequest {
    fn into_update(self) -> UserUpdate {
        UserUpdate {
            first_name: self.first_name,
            last_name: self.last_name,
            password: self.password,
            email: self.email,
            is_admin: None,
        }
    }
}

/// POST /users => 201 {user, token}
///
/// Admin-only way to add users; unlike self-registration the new user may
/// be an admin.
async fn create_user(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(req): AppJson<NewUser>,
) -> AppResult<impl IntoResponse> {
    require_admin(&user)?;
    req.validate()?;
    let created = store::users::register(&state.db, req, state.config.auth.bcrypt_cost)?;
    let token = create_token(
        &created.username,
        created.is_admin,
        state.config.jwt_secret(),
        state.config.auth.token_hours,
    )?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "user": created, "token": token })),
    ))
}

/// GET /users => {users} (admin only)
async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<impl IntoResponse> {
    require_admin(&user)?;
    let users = store::users::find_all(&state.db)?;
    Ok(Json(json!({ "users": users })))
}

/// GET /users/{username} => {user} with posts, likedPosts, and invites
async fn get_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(username): Path<String>,
) -> AppResult<impl IntoResponse> {
    require_user_or_admin(&user, &username)?;
    let detail = store::users::get(&state.db, &username)?;
    Ok(Json(json!({ "user": detail })))
}

/// PATCH /users/{username} {fields} => {user}
async fn update_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(username): Path<String>,
    AppJson(req): AppJson<UserUpdateRequest>,
) -> AppResult<impl IntoResponse> {
    require_user_or_admin(&user, &username)?;
    let update = req.into_update();
    update.validate()?;
    let updated = store::users::update(
        &state.db,
        &username,
        update,
        state.config.auth.bcrypt_cost,
    )?;
    Ok(Json(json!({ "user": updated })))
}

/// DELETE /users/{username} => {deleted: username}
async fn delete_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(username): Path<String>,
) -> AppResult<impl IntoResponse> {
    require_user_or_admin(&user, &username)?;
    store::users::remove(&state.db, &username)?;
    Ok(Json(json!({ "deleted": username })))
}

/// GET /users/{username}/email => {email} (any logged-in user)
async fn get_email(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(username): Path<String>,
) -> AppResult<impl IntoResponse> {
    let email = store::users::get_email(&state.db, &username)?;
    Ok(Json(json!({ "email": email })))
}

/// POST /users/{username}/like/{id} => {liked: id}
async fn like_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path((username, post_id)): Path<(String, i64)>,
) -> AppResult<impl IntoResponse> {
    require_user(&user, &username)?;
    store::users::like_post(&state.db, &username, post_id)?;
    Ok(Json(json!({ "liked": post_id })))
}

/// DELETE /users/{username}/like/{id} => {unliked: id}
async fn unlike_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path((username, post_id)): Path<(String, i64)>,
) -> AppResult<impl IntoResponse> {
    require_user(&user, &username)?;
    store::users::unlike_post(&state.db, &username, post_id)?;
    Ok(Json(json!({ "unliked": post_id })))
}

/// POST /users/{username}/invite/{id} => {invited: id}
async fn invite_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path((username, post_id)): Path<(String, i64)>,
) -> AppResult<impl IntoResponse> {
    require_user(&user, &username)?;
    store::users::invite_post(&state.db, &username, post_id)?;
    Ok(Json(json!({ "invited": post_id })))
}

/// DELETE /users/{username}/invite/{id} => {uninvited: id}
async fn uninvite_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path((username, post_id)): Path<(String, i64)>,
) -> AppResult<impl IntoResponse> {
    require_user(&user, &username)?;
    store::users::uninvite_post(&state.db, &username, post_id)?;
    Ok(Json(json!({ "uninvited": post_id })))
}

//! Post CRUD and comments. Listing and single-post lookups are public;
//! everything else needs a token, and mutations are owner-only.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppQuery, AuthUser};
use crate::state::AppState;
use crate::store;
use crate::store::posts::{NewPost, PostUpdate};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/{id}",
            get(get_post).patch(update_post).delete(delete_post),
        )
        .route("/posts/{id}/comments", post(add_comment))
        .route(
            "/posts/{id}/comments/{comment_id}",
            delete(delete_comment),
        )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct PostSearch {
    item_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct NewPostRequest {
    item_name: String,
    city: Option<String>,
    img_url: Option<String>,
    description: Option<String>,
    category: Option<String>,
    age_group: Option<String>,
}

impl NewPostRequest {
    fn validate(&self) -> AppResult<()> {
        if self.item_name.trim().is_empty() {
            return Err(AppError::BadRequest("itemName must not be empty".into()));
        }
        Ok(())
    }

    /// The owner always comes from the token, never the body.
    fn into_new_post(self, username: String) -> NewPost {
        NewPost {
            item_name: self.item_name,
            username,
            city: self.city,
            img_url: self.img_url,
            description: self.description,
            category: self.category,
            age_group: self.age_group,
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct NewCommentRequest {
    text: String,
}

impl NewCommentRequest {
    fn validate(&self) -> AppResult<()> {
        if self.text.trim().is_empty() {
            return Err(AppError::BadRequest("text must not be empty".into()));
        }
        Ok(())
    }
}

/// GET /posts?itemName= => {posts}
async fn list_posts(
    State(state): State<AppState>,
    AppQuery(search): AppQuery<PostSearch>,
) -> AppResult<impl IntoResponse> {
    let posts = store::posts::find_all(&state.db, search.item_name.as_deref())?;
    Ok(Json(json!({ "posts": posts })))
}

/// GET /posts/{id} => {post} with comments
async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let post = store::posts::get(&state.db, id)?;
    Ok(Json(json!({ "post": post })))
}

/// POST /posts {data} => 201 {post}
async fn create_post(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(req): AppJson<NewPostRequest>,
) -> AppResult<impl IntoResponse> {
    req.validate()?;
    let post = store::posts::create(&state.db, req.into_new_post(user.username))?;
    Ok((StatusCode::CREATED, Json(json!({ "post": post }))))
}

/// PATCH /posts/{id} {fields} => {post} (owner only)
async fn update_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    AppJson(req): AppJson<PostUpdate>,
) -> AppResult<impl IntoResponse> {
    let existing = store::posts::get(&state.db, id)?;
    if existing.post.username != user.username {
        return Err(AppError::Unauthorized("Unauthorized".into()));
    }
    req.validate()?;
    let updated = store::posts::update(&state.db, id, req)?;
    Ok(Json(json!({ "post": updated })))
}

/// DELETE /posts/{id} => {deleted: id} (owner only)
async fn delete_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let existing = store::posts::get(&state.db, id)?;
    if existing.post.username != user.username {
        return Err(AppError::Unauthorized("Unauthorized".into()));
    }
    store::posts::remove(&state.db, id)?;
    Ok(Json(json!({ "deleted": id })))
}

/// POST /posts/{id}/comments {text} => 201 {comment}
async fn add_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    AppJson(req): AppJson<NewCommentRequest>,
) -> AppResult<impl IntoResponse> {
    req.validate()?;
    let comment = store::posts::add_comment(&state.db, &user.username, id, &req.text)?;
    Ok((StatusCode::CREATED, Json(json!({ "comment": comment }))))
}

/// DELETE /posts/{id}/comments/{comment_id} => {deleted: comment_id}
/// (comment author only)
async fn delete_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path((_post_id, comment_id)): Path<(i64, i64)>,
) -> AppResult<impl IntoResponse> {
    let comment = store::posts::get_comment(&state.db, comment_id)?;
    if comment.username != user.username {
        return Err(AppError::Unauthorized("Unauthorized".into()));
    }
    store::posts::remove_comment(&state.db, comment_id)?;
    Ok(Json(json!({ "deleted": comment_id })))
}

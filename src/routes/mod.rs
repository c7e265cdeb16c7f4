pub mod auth;
pub mod posts;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// The full API surface.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(users::router())
        .merge(posts::router())
}

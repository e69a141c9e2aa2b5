use axum::extract::DefaultBodyLimit;
use axum::{routing::get, routing::post, Router};

use crate::http::handlers;
use crate::AppState;

// Multipart framing on top of the raw image bytes.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn auth() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/me", get(handlers::current_user))
}

pub fn posts() -> Router<AppState> {
    Router::new()
        .route("/posts", post(handlers::create_post).get(handlers::list_posts))
        .route(
            "/posts/:id",
            get(handlers::get_post)
                .put(handlers::update_post)
                .delete(handlers::delete_post),
        )
        .route(
            "/posts/:id/comments",
            get(handlers::list_comments).post(handlers::add_comment),
        )
        .route("/posts/:id/like", post(handlers::toggle_like))
        .route("/posts/:id/likes", get(handlers::like_status))
}

pub fn images(upload_max_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/images", post(handlers::upload_image))
        .layer(DefaultBodyLimit::max(
            upload_max_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
        ))
}

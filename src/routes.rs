use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{
    handlers::{auth as auth_handlers, relations as relation_handlers},
    openapi::openapi_json,
    state::AppState,
};

pub fn app_router(state: Arc<AppState>) -> Router {
    let users = Router::new()
        .route("/register", post(auth_handlers::register))
        .route("/login", post(auth_handlers::login))
        .route("/refresh-token", post(auth_handlers::refresh))
        .route("/logout", post(auth_handlers::logout))
        .route("/current-user", get(auth_handlers::current_user));

    let likes = Router::new()
        .route("/toggle/v/{video_id}", post(relation_handlers::toggle_video_like))
        .route("/toggle/c/{comment_id}", post(relation_handlers::toggle_comment_like))
        .route("/toggle/t/{tweet_id}", post(relation_handlers::toggle_tweet_like))
        .route("/count/v/{video_id}", get(relation_handlers::video_likes))
        .route("/videos", get(relation_handlers::liked_videos));

    let subscriptions = Router::new().route(
        "/c/{channel_id}",
        post(relation_handlers::toggle_subscription).get(relation_handlers::channel_subscribers),
    );

    Router::new()
        .nest("/api/v1/users", users)
        .nest("/api/v1/likes", likes)
        .nest("/api/v1/subscriptions", subscriptions)
        .route("/api-docs/openapi.json", get(openapi_json))
        .with_state(state)
}

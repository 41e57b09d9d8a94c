use axum::{
    extract::{Path, State},
    Json,
};
use mongodb::bson::oid::ObjectId;
use std::sync::Arc;

use crate::{
    auth::CurrentUser,
    dto::relation::{LikedVideosResponse, RelationSummary, ToggleResponse},
    errors::AppError,
    models::relation::RelationKind,
    services::relations,
    state::AppState,
};

fn parse_id(raw: &str, what: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw.trim()).map_err(|_| AppError::Validation(format!("invalid {what} id")))
}

async fn toggle(
    state: &AppState,
    user: &CurrentUser,
    raw_target: &str,
    kind: RelationKind,
    what: &str,
) -> Result<Json<ToggleResponse>, AppError> {
    let target_id = parse_id(raw_target, what)?;
    let outcome = relations::toggle(state, user.id()?, target_id, kind).await?;

    Ok(Json(ToggleResponse {
        kind,
        target_id: target_id.to_hex(),
        outcome,
        active: outcome.is_active(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/likes/toggle/v/{video_id}",
    params(("video_id" = String, Path, description = "Video ObjectId")),
    responses((status = 200, description = "OK", body = ToggleResponse), (status = 401, description = "Not authenticated")),
    tag = "likes"
)]
pub async fn toggle_video_like(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(video_id): Path<String>,
) -> Result<Json<ToggleResponse>, AppError> {
    toggle(&state, &user, &video_id, RelationKind::VideoLike, "video").await
}

#[utoipa::path(
    post,
    path = "/api/v1/likes/toggle/c/{comment_id}",
    params(("comment_id" = String, Path, description = "Comment ObjectId")),
    responses((status = 200, description = "OK", body = ToggleResponse), (status = 401, description = "Not authenticated")),
    tag = "likes"
)]
pub async fn toggle_comment_like(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(comment_id): Path<String>,
) -> Result<Json<ToggleResponse>, AppError> {
    toggle(&state, &user, &comment_id, RelationKind::CommentLike, "comment").await
}

#[utoipa::path(
    post,
    path = "/api/v1/likes/toggle/t/{tweet_id}",
    params(("tweet_id" = String, Path, description = "Tweet ObjectId")),
    responses((status = 200, description = "OK", body = ToggleResponse), (status = 401, description = "Not authenticated")),
    tag = "likes"
)]
pub async fn toggle_tweet_like(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(tweet_id): Path<String>,
) -> Result<Json<ToggleResponse>, AppError> {
    toggle(&state, &user, &tweet_id, RelationKind::TweetLike, "tweet").await
}

#[utoipa::path(
    post,
    path = "/api/v1/subscriptions/c/{channel_id}",
    params(("channel_id" = String, Path, description = "Channel (user) ObjectId")),
    responses((status = 200, description = "OK", body = ToggleResponse), (status = 400, description = "Own channel")),
    tag = "subscriptions"
)]
pub async fn toggle_subscription(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(channel_id): Path<String>,
) -> Result<Json<ToggleResponse>, AppError> {
    toggle(&state, &user, &channel_id, RelationKind::Subscription, "channel").await
}

async fn summary(
    state: &AppState,
    user: &CurrentUser,
    raw_target: &str,
    kind: RelationKind,
    what: &str,
) -> Result<Json<RelationSummary>, AppError> {
    let target_id = parse_id(raw_target, what)?;
    let (count, active) = relations::summary(state, user.id()?, target_id, kind).await?;

    Ok(Json(RelationSummary {
        kind,
        target_id: target_id.to_hex(),
        count,
        active,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/likes/count/v/{video_id}",
    params(("video_id" = String, Path, description = "Video ObjectId")),
    responses((status = 200, description = "OK", body = RelationSummary)),
    tag = "likes"
)]
pub async fn video_likes(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(video_id): Path<String>,
) -> Result<Json<RelationSummary>, AppError> {
    summary(&state, &user, &video_id, RelationKind::VideoLike, "video").await
}

#[utoipa::path(
    get,
    path = "/api/v1/subscriptions/c/{channel_id}",
    params(("channel_id" = String, Path, description = "Channel (user) ObjectId")),
    responses((status = 200, description = "OK", body = RelationSummary)),
    tag = "subscriptions"
)]
pub async fn channel_subscribers(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(channel_id): Path<String>,
) -> Result<Json<RelationSummary>, AppError> {
    summary(&state, &user, &channel_id, RelationKind::Subscription, "channel").await
}

#[utoipa::path(
    get,
    path = "/api/v1/likes/videos",
    responses((status = 200, description = "OK", body = LikedVideosResponse)),
    tag = "likes"
)]
pub async fn liked_videos(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<LikedVideosResponse>, AppError> {
    let ids = relations::targets_of(&state, user.id()?, RelationKind::VideoLike).await?;
    Ok(Json(LikedVideosResponse {
        video_ids: ids.into_iter().map(|id| id.to_hex()).collect(),
    }))
}

use axum::Json;
use utoipa::OpenApi;

use crate::{
    dto::{auth as auth_dto, relation as relation_dto},
    handlers::{auth, relations},
    models::{relation as relation_model, user::UserPublic},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register,
        auth::login,
        auth::refresh,
        auth::logout,
        auth::current_user,
        relations::toggle_video_like,
        relations::toggle_comment_like,
        relations::toggle_tweet_like,
        relations::toggle_subscription,
        relations::video_likes,
        relations::channel_subscribers,
        relations::liked_videos,
    ),
    components(schemas(
        UserPublic,
        auth_dto::RegisterRequest,
        auth_dto::LoginRequest,
        auth_dto::LoginResponse,
        auth_dto::RefreshRequest,
        auth_dto::RefreshResponse,
        auth_dto::StatusResponse,
        relation_dto::ToggleResponse,
        relation_dto::RelationSummary,
        relation_dto::LikedVideosResponse,
        relation_model::RelationKind,
        relation_model::Toggled,
    )),
    tags(
        (name = "users", description = "Registration and session lifecycle"),
        (name = "likes", description = "Like toggles and counts"),
        (name = "subscriptions", description = "Channel subscriptions"),
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

use crate::{
    auth::{
        cookies::{clear_session_cookies, cookie_value, set_session_cookies, REFRESH_COOKIE},
        CurrentUser,
    },
    dto::auth::{
        LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, RegisterRequest,
        StatusResponse,
    },
    errors::AppError,
    models::user::UserPublic,
    services::session,
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/api/v1/users/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = UserPublic),
        (status = 409, description = "Username or email taken")
    ),
    tag = "users"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserPublic>), AppError> {
    let new_user = req.validate()?;
    let user = session::register(&state, new_user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; session cookies set", body = LoginResponse),
        (status = 401, description = "Wrong password"),
        (status = 404, description = "Unknown username or email")
    ),
    tag = "users"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let identifier = req.identifier()?;
    let out = session::login(&state, &identifier, &req.password).await?;

    let jar = set_session_cookies(jar, &out.tokens, state.cfg.cookie_secure);
    Ok((jar, Json(LoginResponse::new(out.user, out.tokens))))
}

fn refresh_token_from_body(body: &[u8]) -> Result<Option<String>, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let req: RefreshRequest = serde_json::from_slice(body)
        .map_err(|_| AppError::Validation("body must be JSON with refreshToken".into()))?;
    Ok(req.refresh_token)
}

#[utoipa::path(
    post,
    path = "/api/v1/users/refresh-token",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New token pair; session cookies set", body = RefreshResponse),
        (status = 401, description = "Missing, invalid, expired or reused refresh token")
    ),
    tag = "users"
)]
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: Bytes,
) -> Result<(CookieJar, Json<RefreshResponse>), AppError> {
    // cookie first, then body
    let presented = match cookie_value(&jar, REFRESH_COOKIE) {
        Some(token) => Some(token),
        None => refresh_token_from_body(&body)?,
    };

    let tokens = session::refresh(&state, presented.as_deref()).await?;

    let jar = set_session_cookies(jar, &tokens, state.cfg.cookie_secure);
    Ok((jar, Json(RefreshResponse::from(tokens))))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/logout",
    responses(
        (status = 200, description = "Refresh token revoked; cookies cleared", body = StatusResponse),
        (status = 401, description = "Not authenticated")
    ),
    tag = "users"
)]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    jar: CookieJar,
) -> Result<(CookieJar, Json<StatusResponse>), AppError> {
    session::logout(&state, user.id()?).await?;
    let jar = clear_session_cookies(jar, state.cfg.cookie_secure);
    Ok((jar, Json(StatusResponse::ok())))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/current-user",
    responses(
        (status = 200, description = "Authenticated user", body = UserPublic),
        (status = 401, description = "Not authenticated")
    ),
    tag = "users"
)]
pub async fn current_user(CurrentUser(user): CurrentUser) -> Json<UserPublic> {
    Json(user)
}

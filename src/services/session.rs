//! Login, refresh, logout and access-token authentication.
//!
//! Session state lives entirely in the identity's stored refresh token:
//! present and matching means the session can be refreshed, cleared or
//! rotated away means it is revoked. Access tokens are never stored.

use chrono::Utc;
use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use tracing::instrument;

use crate::{
    auth::{
        jwt::{sha256_hex, TokenKind},
        tokens::{issue_pair, IssuedTokens},
    },
    dto::auth::NewUser,
    errors::AppError,
    models::user::{UserDoc, UserPublic},
    password::{hash_password, verify_password},
    state::AppState,
};

pub struct LoginOutput {
    pub user: UserPublic,
    pub tokens: IssuedTokens,
}

/// Why a refresh was refused. Callers only ever see `Unauthorized`; the
/// distinction is for the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshRejection {
    Missing,
    InvalidToken,
    UnknownIdentity,
    /// Signature and expiry are fine but the token is not the stored one:
    /// it was rotated away, revoked by logout, or superseded by a newer login.
    Reused,
}

impl RefreshRejection {
    fn reject(self, user_id: Option<ObjectId>) -> AppError {
        match self {
            RefreshRejection::Reused => tracing::warn!(
                target: "audit",
                user_id = ?user_id.map(|id| id.to_hex()),
                "refresh token does not match stored token; possible reuse"
            ),
            other => tracing::debug!(reason = ?other, "refresh rejected"),
        }
        AppError::Unauthorized
    }
}

#[instrument(skip_all, fields(username = %new_user.username))]
pub async fn register(state: &AppState, new_user: NewUser) -> Result<UserPublic, AppError> {
    if state
        .bounded(
            "users.taken",
            state
                .users
                .username_or_email_taken(&new_user.username, &new_user.email),
        )
        .await?
    {
        return Err(AppError::Conflict("username or email already exists".into()));
    }

    let password_hash = hash_password(&new_user.password)?;

    let user = UserDoc {
        id: ObjectId::new(),
        username: new_user.username,
        email: new_user.email,
        full_name: new_user.full_name,
        avatar: new_user.avatar,
        cover_image: new_user.cover_image,
        password_hash,
        refresh_token_hash: None,
        created_at: BsonDateTime::now(),
    };

    state.bounded("users.insert", state.users.insert(&user)).await?;
    tracing::info!(user_id = %user.id, "user registered");

    Ok(user.into())
}

#[instrument(skip_all)]
pub async fn login(state: &AppState, identifier: &str, password: &str) -> Result<LoginOutput, AppError> {
    let identifier = identifier.trim().to_lowercase();
    let user = state
        .bounded("users.find_by_login", state.users.find_by_login(&identifier))
        .await?
        .ok_or(AppError::NotFound)?;

    if !verify_password(password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "password mismatch");
        return Err(AppError::BadCredentials);
    }

    let tokens = issue_pair(&state.codec, user.id, Utc::now())?;

    // Overwrites any previous refresh token: one live session per identity.
    let stored = state
        .bounded(
            "users.set_refresh_token",
            state.users.set_refresh_token(user.id, &tokens.refresh_token_hash()),
        )
        .await?;
    if !stored {
        return Err(AppError::NotFound);
    }

    tracing::info!(user_id = %user.id, "logged in");
    Ok(LoginOutput {
        user: user.into(),
        tokens,
    })
}

#[instrument(skip_all)]
pub async fn refresh(state: &AppState, presented: Option<&str>) -> Result<IssuedTokens, AppError> {
    let presented = match presented.map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => return Err(RefreshRejection::Missing.reject(None)),
    };

    let now = Utc::now();
    let user_id = state
        .codec
        .verify(TokenKind::Refresh, presented, now)
        .map_err(|_| RefreshRejection::InvalidToken.reject(None))?;

    let user = state
        .bounded("users.find_by_id", state.users.find_by_id(user_id))
        .await?
        .ok_or_else(|| RefreshRejection::UnknownIdentity.reject(Some(user_id)))?;

    let presented_hash = sha256_hex(presented);
    if user.refresh_token_hash.as_deref() != Some(presented_hash.as_str()) {
        return Err(RefreshRejection::Reused.reject(Some(user_id)));
    }

    let tokens = issue_pair(&state.codec, user_id, now)?;

    // The swap is the real check: a concurrent refresh with the same token
    // that got here first has already replaced the stored value.
    let rotated = state
        .bounded(
            "users.swap_refresh_token",
            state
                .users
                .swap_refresh_token(user_id, &presented_hash, &tokens.refresh_token_hash()),
        )
        .await?;
    if !rotated {
        return Err(RefreshRejection::Reused.reject(Some(user_id)));
    }

    tracing::info!(user_id = %user_id, "refresh token rotated");
    Ok(tokens)
}

#[instrument(skip_all, fields(user_id = %user_id))]
pub async fn logout(state: &AppState, user_id: ObjectId) -> Result<(), AppError> {
    state
        .bounded("users.clear_refresh_token", state.users.clear_refresh_token(user_id))
        .await?;
    tracing::info!("logged out");
    Ok(())
}

/// Resolves an access token to the sanitized identity it is bound to.
/// Read-only: never touches the stored refresh token.
pub async fn authenticate(state: &AppState, access_token: &str) -> Result<UserPublic, AppError> {
    let user_id = state
        .codec
        .verify(TokenKind::Access, access_token, Utc::now())
        .map_err(|e| {
            tracing::debug!(error = %e, "access token rejected");
            AppError::Unauthorized
        })?;

    let profile = state
        .bounded("users.find_profile", state.users.find_profile(user_id))
        .await?
        .ok_or_else(|| {
            tracing::debug!(user_id = %user_id, "access token for missing identity");
            AppError::Unauthorized
        })?;

    Ok(profile.into())
}

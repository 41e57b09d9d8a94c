use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{auth::tokens::IssuedTokens, errors::AppError, models::user::UserPublic};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
}

/// Validated registration input: trimmed, lower-cased where it is a key.
#[derive(Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub avatar: Option<String>,
    pub cover_image: Option<String>,
}

impl RegisterRequest {
    pub fn validate(self) -> Result<NewUser, AppError> {
        let username = self.username.trim().to_lowercase();
        let email = self.email.trim().to_lowercase();
        let full_name = self.full_name.trim().to_string();

        if [&username, &email, &full_name].iter().any(|f| f.is_empty()) || self.password.trim().is_empty() {
            return Err(AppError::Validation("all fields are required".into()));
        }
        if !email.contains('@') {
            return Err(AppError::Validation("email is not valid".into()));
        }

        Ok(NewUser {
            username,
            email,
            full_name,
            password: self.password,
            avatar: non_empty(self.avatar),
            cover_image: non_empty(self.cover_image),
        })
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub password: String,
}

impl LoginRequest {
    /// Username wins when both are sent. Matching is case-insensitive.
    pub fn identifier(&self) -> Result<String, AppError> {
        [&self.username, &self.email]
            .into_iter()
            .flatten()
            .map(|s| s.trim().to_lowercase())
            .find(|s| !s.is_empty())
            .ok_or_else(|| AppError::Validation("username or email is required".into()))
    }
}

#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserPublic,
    #[serde(flatten)]
    pub tokens: RefreshResponse,
}

impl LoginResponse {
    pub fn new(user: UserPublic, tokens: IssuedTokens) -> Self {
        Self {
            user,
            tokens: tokens.into(),
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// RFC 3339
    pub access_token_expires_at: String,
    /// RFC 3339
    pub refresh_token_expires_at: String,
}

impl From<IssuedTokens> for RefreshResponse {
    fn from(t: IssuedTokens) -> Self {
        Self {
            access_token_expires_at: t.access_expires_at.to_rfc3339(),
            refresh_token_expires_at: t.refresh_expires_at.to_rfc3339(),
            access_token: t.access_token,
            refresh_token: t.refresh_token,
            token_type: t.token_type,
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".into(),
        }
    }
}

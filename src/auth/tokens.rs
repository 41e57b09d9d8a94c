use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;

use crate::{
    auth::jwt::{sha256_hex, TokenCodec},
    errors::AppError,
};

#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

impl IssuedTokens {
    /// Value persisted on the identity for the refresh half of the pair.
    pub fn refresh_token_hash(&self) -> String {
        sha256_hex(&self.refresh_token)
    }
}

pub fn issue_pair(
    codec: &TokenCodec,
    user_id: ObjectId,
    now: DateTime<Utc>,
) -> Result<IssuedTokens, AppError> {
    let access = codec.issue_access(user_id, now)?;
    let refresh = codec.issue_refresh(user_id, now)?;

    Ok(IssuedTokens {
        access_token: access.token,
        refresh_token: refresh.token,
        token_type: "Bearer".to_string(),
        access_expires_at: access.expires_at,
        refresh_expires_at: refresh.expires_at,
    })
}

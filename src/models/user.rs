use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Full identity record as stored. Never leaves the crate boundary; callers
/// get [`UserPublic`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: Option<String>,
    pub cover_image: Option<String>,

    pub password_hash: String,
    // sha256 hex of the single live refresh token
    pub refresh_token_hash: Option<String>,

    pub created_at: BsonDateTime,
}

/// Projection of [`UserDoc`] without credentials. Loaded by the request
/// authenticator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfileDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: Option<String>,
    pub cover_image: Option<String>,
    pub created_at: BsonDateTime,
}

impl From<UserDoc> for UserProfileDoc {
    fn from(u: UserDoc) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            full_name: u.full_name,
            avatar: u.avatar,
            cover_image: u.cover_image,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserPublic {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: Option<String>,
    pub cover_image: Option<String>,
    pub created_at: String,
}

impl From<UserProfileDoc> for UserPublic {
    fn from(u: UserProfileDoc) -> Self {
        Self {
            id: u.id.to_hex(),
            username: u.username,
            email: u.email,
            full_name: u.full_name,
            avatar: u.avatar,
            cover_image: u.cover_image,
            created_at: u.created_at.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}

impl From<UserDoc> for UserPublic {
    fn from(u: UserDoc) -> Self {
        UserProfileDoc::from(u).into()
    }
}

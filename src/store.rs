//! Persistence seams. Everything that touches the database goes through
//! [`UserStore`] or [`RelationStore`]; the session and relation services only
//! see these traits.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::{
    errors::AppError,
    models::{
        relation::{RelationKey, RelationKind, Toggled},
        user::{UserDoc, UserProfileDoc},
    },
};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the username or email is taken.
    async fn insert(&self, user: &UserDoc) -> Result<(), AppError>;

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<UserDoc>, AppError>;

    /// Profile projection, without password hash or refresh token.
    async fn find_profile(&self, id: ObjectId) -> Result<Option<UserProfileDoc>, AppError>;

    /// `identifier` is matched against username or email, both stored
    /// lower-cased.
    async fn find_by_login(&self, identifier: &str) -> Result<Option<UserDoc>, AppError>;

    async fn username_or_email_taken(&self, username: &str, email: &str) -> Result<bool, AppError>;

    /// Unconditional overwrite. Returns false if the identity does not exist.
    async fn set_refresh_token(&self, id: ObjectId, token_hash: &str) -> Result<bool, AppError>;

    /// Atomic compare-and-swap of the stored refresh token. Returns true only
    /// if the stored value was `expected` and is now `replacement`.
    async fn swap_refresh_token(
        &self,
        id: ObjectId,
        expected: &str,
        replacement: &str,
    ) -> Result<bool, AppError>;

    async fn clear_refresh_token(&self, id: ObjectId) -> Result<(), AppError>;
}

#[async_trait]
pub trait RelationStore: Send + Sync {
    /// Atomic: removes the edge if present, creates it otherwise.
    async fn toggle(&self, key: &RelationKey) -> Result<Toggled, AppError>;

    async fn exists(&self, key: &RelationKey) -> Result<bool, AppError>;

    async fn count_for_target(&self, target_id: ObjectId, kind: RelationKind) -> Result<u64, AppError>;

    async fn targets_of(&self, actor_id: ObjectId, kind: RelationKind) -> Result<Vec<ObjectId>, AppError>;
}

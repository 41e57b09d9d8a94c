use std::fmt;

use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime, Document};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    VideoLike,
    CommentLike,
    TweetLike,
    Subscription,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::VideoLike => "video_like",
            RelationKind::CommentLike => "comment_like",
            RelationKind::TweetLike => "tweet_like",
            RelationKind::Subscription => "subscription",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of one directed edge. At most one stored edge per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelationKey {
    pub actor_id: ObjectId,
    pub target_id: ObjectId,
    pub kind: RelationKind,
}

impl RelationKey {
    pub fn new(actor_id: ObjectId, target_id: ObjectId, kind: RelationKind) -> Self {
        Self {
            actor_id,
            target_id,
            kind,
        }
    }

    pub fn filter(&self) -> Document {
        doc! {
            "actor_id": self.actor_id,
            "target_id": self.target_id,
            "kind": self.kind.as_str(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub actor_id: ObjectId,
    pub target_id: ObjectId,
    pub kind: RelationKind,

    pub created_at: BsonDateTime,
}

impl From<&RelationKey> for RelationDoc {
    fn from(key: &RelationKey) -> Self {
        Self {
            id: ObjectId::new(),
            actor_id: key.actor_id,
            target_id: key.target_id,
            kind: key.kind,
            created_at: BsonDateTime::now(),
        }
    }
}

/// Outcome of a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Toggled {
    Created,
    Removed,
}

impl Toggled {
    pub fn is_active(&self) -> bool {
        matches!(self, Toggled::Created)
    }
}

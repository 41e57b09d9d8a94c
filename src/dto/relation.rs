use serde::Serialize;
use utoipa::ToSchema;

use crate::models::relation::{RelationKind, Toggled};

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    pub kind: RelationKind,
    pub target_id: String,
    pub outcome: Toggled,
    pub active: bool,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelationSummary {
    pub kind: RelationKind,
    pub target_id: String,
    pub count: u64,
    /// Whether the caller holds this relation.
    pub active: bool,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikedVideosResponse {
    pub video_ids: Vec<String>,
}

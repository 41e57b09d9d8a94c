use mongodb::bson::oid::ObjectId;
use tracing::instrument;

use crate::{
    errors::AppError,
    models::relation::{RelationKey, RelationKind, Toggled},
    state::AppState,
};

#[instrument(skip(state))]
pub async fn toggle(
    state: &AppState,
    actor_id: ObjectId,
    target_id: ObjectId,
    kind: RelationKind,
) -> Result<Toggled, AppError> {
    if kind == RelationKind::Subscription && actor_id == target_id {
        return Err(AppError::Validation("cannot subscribe to your own channel".into()));
    }

    let key = RelationKey::new(actor_id, target_id, kind);
    // an InvariantViolation is surfaced as-is, never retried here
    let outcome = state
        .bounded("relations.toggle", state.relations.toggle(&key))
        .await?;

    tracing::debug!(?outcome, "relation toggled");
    Ok(outcome)
}

/// Edge count on a target plus whether `viewer` holds one of them.
pub async fn summary(
    state: &AppState,
    viewer: ObjectId,
    target_id: ObjectId,
    kind: RelationKind,
) -> Result<(u64, bool), AppError> {
    let count = state
        .bounded("relations.count", state.relations.count_for_target(target_id, kind))
        .await?;
    let active = state
        .bounded(
            "relations.exists",
            state.relations.exists(&RelationKey::new(viewer, target_id, kind)),
        )
        .await?;
    Ok((count, active))
}

pub async fn targets_of(
    state: &AppState,
    actor_id: ObjectId,
    kind: RelationKind,
) -> Result<Vec<ObjectId>, AppError> {
    state
        .bounded("relations.targets_of", state.relations.targets_of(actor_id, kind))
        .await
}

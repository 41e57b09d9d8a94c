use std::future::Future;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId},
    options::{ClientOptions, IndexOptions},
    Client, Collection, IndexModel,
};

use crate::{
    config::Config,
    errors::{is_duplicate_key, AppError},
    models::{
        relation::{RelationDoc, RelationKey, RelationKind, Toggled},
        user::{UserDoc, UserProfileDoc},
    },
    store::{RelationStore, UserStore},
};

// Insert-after-delete can lose to a concurrent insert of the same key; each
// lost round re-runs the toggle against the new state.
const TOGGLE_ATTEMPTS: usize = 3;

pub struct MongoUserStore {
    users: Collection<UserDoc>,
}

pub struct MongoRelationStore {
    relations: Collection<RelationDoc>,
}

pub async fn connect(cfg: &Config) -> mongodb::error::Result<(MongoUserStore, MongoRelationStore)> {
    let uri = cfg.mongodb_uri.as_deref().unwrap_or("mongodb://localhost:27017");
    let mut opts = ClientOptions::parse(uri).await?;
    opts.app_name = Some("vidtube-session".to_string());
    let client = Client::with_options(opts)?;
    let db = client.database(&cfg.db_name);

    let users: Collection<UserDoc> = db.collection("users");
    let relations: Collection<RelationDoc> = db.collection("relations");

    for field in ["email", "username"] {
        let index = IndexModel::builder()
            .keys(doc! { field: 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        users.create_index(index).await?;
    }

    // the at-most-one-edge invariant lives here
    let edge_index = IndexModel::builder()
        .keys(doc! { "actor_id": 1, "target_id": 1, "kind": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();
    relations.create_index(edge_index).await?;

    let target_index = IndexModel::builder()
        .keys(doc! { "target_id": 1, "kind": 1 })
        .build();
    relations.create_index(target_index).await?;

    tracing::info!(db = %cfg.db_name, "mongodb stores ready");

    Ok((MongoUserStore { users }, MongoRelationStore { relations }))
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn insert(&self, user: &UserDoc) -> Result<(), AppError> {
        match self.users.insert_one(user).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => {
                Err(AppError::Conflict("username or email already exists".into()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<UserDoc>, AppError> {
        Ok(self.users.find_one(doc! { "_id": id }).await?)
    }

    async fn find_profile(&self, id: ObjectId) -> Result<Option<UserProfileDoc>, AppError> {
        Ok(self
            .users
            .clone_with_type::<UserProfileDoc>()
            .find_one(doc! { "_id": id })
            .projection(doc! { "password_hash": 0, "refresh_token_hash": 0 })
            .await?)
    }

    async fn find_by_login(&self, identifier: &str) -> Result<Option<UserDoc>, AppError> {
        Ok(self
            .users
            .find_one(doc! { "$or": [ { "username": identifier }, { "email": identifier } ] })
            .await?)
    }

    async fn username_or_email_taken(&self, username: &str, email: &str) -> Result<bool, AppError> {
        Ok(self
            .users
            .find_one(doc! { "$or": [ { "username": username }, { "email": email } ] })
            .await?
            .is_some())
    }

    async fn set_refresh_token(&self, id: ObjectId, token_hash: &str) -> Result<bool, AppError> {
        let res = self
            .users
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "refresh_token_hash": token_hash } },
            )
            .await?;
        Ok(res.matched_count == 1)
    }

    async fn swap_refresh_token(
        &self,
        id: ObjectId,
        expected: &str,
        replacement: &str,
    ) -> Result<bool, AppError> {
        // single-document conditional update; the filter is the comparison
        let res = self
            .users
            .update_one(
                doc! { "_id": id, "refresh_token_hash": expected },
                doc! { "$set": { "refresh_token_hash": replacement } },
            )
            .await?;
        Ok(res.modified_count == 1)
    }

    async fn clear_refresh_token(&self, id: ObjectId) -> Result<(), AppError> {
        self.users
            .update_one(
                doc! { "_id": id },
                doc! { "$unset": { "refresh_token_hash": "" } },
            )
            .await?;
        Ok(())
    }
}

/// Result of one insert attempt inside a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InsertAttempt {
    Inserted,
    /// A concurrent toggle inserted the same edge first.
    Duplicate,
}

/// Delete-else-insert over the unique edge index. `delete` returns how many
/// edges it removed; more than one means the index is missing and nothing
/// further is attempted.
async fn run_toggle<D, DF, I, IF>(
    key: &RelationKey,
    mut delete: D,
    mut insert: I,
) -> Result<Toggled, AppError>
where
    D: FnMut() -> DF,
    DF: Future<Output = Result<u64, AppError>>,
    I: FnMut() -> IF,
    IF: Future<Output = Result<InsertAttempt, AppError>>,
{
    for _ in 0..TOGGLE_ATTEMPTS {
        match delete().await? {
            0 => {}
            1 => return Ok(Toggled::Removed),
            n => {
                return Err(AppError::InvariantViolation(format!(
                    "{n} {} edges for actor {} target {}",
                    key.kind, key.actor_id, key.target_id
                )))
            }
        }

        match insert().await? {
            InsertAttempt::Inserted => return Ok(Toggled::Created),
            InsertAttempt::Duplicate => {
                tracing::debug!(kind = %key.kind, "toggle lost insert race, retrying");
            }
        }
    }

    Err(AppError::Retryable("relation toggle contended".into()))
}

#[async_trait]
impl RelationStore for MongoRelationStore {
    async fn toggle(&self, key: &RelationKey) -> Result<Toggled, AppError> {
        let relations = &self.relations;
        run_toggle(
            key,
            move || async move {
                let res = relations.delete_many(key.filter()).await?;
                Ok::<_, AppError>(res.deleted_count)
            },
            move || async move {
                match relations.insert_one(RelationDoc::from(key)).await {
                    Ok(_) => Ok::<_, AppError>(InsertAttempt::Inserted),
                    Err(e) if is_duplicate_key(&e) => Ok(InsertAttempt::Duplicate),
                    Err(e) => Err(AppError::from(e)),
                }
            },
        )
        .await
    }

    async fn exists(&self, key: &RelationKey) -> Result<bool, AppError> {
        Ok(self.relations.count_documents(key.filter()).await? > 0)
    }

    async fn count_for_target(&self, target_id: ObjectId, kind: RelationKind) -> Result<u64, AppError> {
        Ok(self
            .relations
            .count_documents(doc! { "target_id": target_id, "kind": kind.as_str() })
            .await?)
    }

    async fn targets_of(&self, actor_id: ObjectId, kind: RelationKind) -> Result<Vec<ObjectId>, AppError> {
        let docs: Vec<RelationDoc> = self
            .relations
            .find(doc! { "actor_id": actor_id, "kind": kind.as_str() })
            .sort(doc! { "target_id": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(docs.into_iter().map(|d| d.target_id).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        future::ready,
        sync::atomic::{AtomicU64, AtomicUsize, Ordering},
    };

    use super::*;

    fn key() -> RelationKey {
        RelationKey::new(ObjectId::new(), ObjectId::new(), RelationKind::VideoLike)
    }

    #[tokio::test]
    async fn single_deletion_removes_without_inserting() {
        let inserts = AtomicUsize::new(0);
        let outcome = run_toggle(
            &key(),
            || ready(Ok(1)),
            || {
                inserts.fetch_add(1, Ordering::SeqCst);
                ready(Ok(InsertAttempt::Inserted))
            },
        )
        .await
        .unwrap();

        assert_eq!(outcome, Toggled::Removed);
        assert_eq!(inserts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn nothing_deleted_inserts() {
        let outcome = run_toggle(&key(), || ready(Ok(0)), || ready(Ok(InsertAttempt::Inserted)))
            .await
            .unwrap();
        assert_eq!(outcome, Toggled::Created);
    }

    #[tokio::test]
    async fn duplicate_edges_abort_at_once() {
        let (deletes, inserts) = (AtomicUsize::new(0), AtomicUsize::new(0));
        let err = run_toggle(
            &key(),
            || {
                deletes.fetch_add(1, Ordering::SeqCst);
                ready(Ok(2))
            },
            || {
                inserts.fetch_add(1, Ordering::SeqCst);
                ready(Ok(InsertAttempt::Inserted))
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::InvariantViolation(_)));
        assert_eq!(deletes.load(Ordering::SeqCst), 1);
        assert_eq!(inserts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn lost_insert_reruns_against_new_state() {
        // first round: nothing to delete, insert loses; second round: the
        // winner's edge is there and gets deleted
        let round = AtomicU64::new(0);
        let outcome = run_toggle(
            &key(),
            || ready(Ok(round.fetch_add(1, Ordering::SeqCst))),
            || ready(Ok(InsertAttempt::Duplicate)),
        )
        .await
        .unwrap();

        assert_eq!(outcome, Toggled::Removed);
        assert_eq!(round.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn persistent_contention_is_retryable() {
        let inserts = AtomicUsize::new(0);
        let err = run_toggle(
            &key(),
            || ready(Ok(0)),
            || {
                inserts.fetch_add(1, Ordering::SeqCst);
                ready(Ok(InsertAttempt::Duplicate))
            },
        )
        .await
        .unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(inserts.load(Ordering::SeqCst), TOGGLE_ATTEMPTS);
    }

    #[tokio::test]
    async fn store_errors_propagate() {
        let err = run_toggle(
            &key(),
            || ready(Err(AppError::Db("boom".into()))),
            || ready(Ok(InsertAttempt::Inserted)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Db(_)));
    }
}

//! In-process stores used by `STORE_BACKEND=memory` and the test suite.
//! A single mutex per store makes every operation linearizable, which is
//! what the Mongo implementation gets from single-document atomicity.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use parking_lot::Mutex;

use crate::{
    errors::AppError,
    models::{
        relation::{RelationKey, RelationKind, Toggled},
        user::{UserDoc, UserProfileDoc},
    },
    store::{RelationStore, UserStore},
};

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<ObjectId, UserDoc>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes an identity outright (account deletion is not an API
    /// operation; tests use this to simulate it).
    pub fn remove(&self, id: ObjectId) -> Option<UserDoc> {
        self.users.lock().remove(&id)
    }

    pub fn stored_refresh_token(&self, id: ObjectId) -> Option<String> {
        self.users
            .lock()
            .get(&id)
            .and_then(|u| u.refresh_token_hash.clone())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: &UserDoc) -> Result<(), AppError> {
        let mut users = self.users.lock();
        if users
            .values()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(AppError::Conflict("username or email already exists".into()));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<UserDoc>, AppError> {
        Ok(self.users.lock().get(&id).cloned())
    }

    async fn find_profile(&self, id: ObjectId) -> Result<Option<UserProfileDoc>, AppError> {
        Ok(self.users.lock().get(&id).cloned().map(UserProfileDoc::from))
    }

    async fn find_by_login(&self, identifier: &str) -> Result<Option<UserDoc>, AppError> {
        Ok(self
            .users
            .lock()
            .values()
            .find(|u| u.username == identifier || u.email == identifier)
            .cloned())
    }

    async fn username_or_email_taken(&self, username: &str, email: &str) -> Result<bool, AppError> {
        Ok(self
            .users
            .lock()
            .values()
            .any(|u| u.username == username || u.email == email))
    }

    async fn set_refresh_token(&self, id: ObjectId, token_hash: &str) -> Result<bool, AppError> {
        match self.users.lock().get_mut(&id) {
            Some(u) => {
                u.refresh_token_hash = Some(token_hash.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn swap_refresh_token(
        &self,
        id: ObjectId,
        expected: &str,
        replacement: &str,
    ) -> Result<bool, AppError> {
        let mut users = self.users.lock();
        match users.get_mut(&id) {
            Some(u) if u.refresh_token_hash.as_deref() == Some(expected) => {
                u.refresh_token_hash = Some(replacement.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn clear_refresh_token(&self, id: ObjectId) -> Result<(), AppError> {
        if let Some(u) = self.users.lock().get_mut(&id) {
            u.refresh_token_hash = None;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryRelationStore {
    edges: Mutex<HashSet<RelationKey>>,
}

impl MemoryRelationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.edges.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RelationStore for MemoryRelationStore {
    async fn toggle(&self, key: &RelationKey) -> Result<Toggled, AppError> {
        let mut edges = self.edges.lock();
        if edges.remove(key) {
            Ok(Toggled::Removed)
        } else {
            edges.insert(*key);
            Ok(Toggled::Created)
        }
    }

    async fn exists(&self, key: &RelationKey) -> Result<bool, AppError> {
        Ok(self.edges.lock().contains(key))
    }

    async fn count_for_target(&self, target_id: ObjectId, kind: RelationKind) -> Result<u64, AppError> {
        Ok(self
            .edges
            .lock()
            .iter()
            .filter(|k| k.target_id == target_id && k.kind == kind)
            .count() as u64)
    }

    async fn targets_of(&self, actor_id: ObjectId, kind: RelationKind) -> Result<Vec<ObjectId>, AppError> {
        let mut targets: Vec<ObjectId> = self
            .edges
            .lock()
            .iter()
            .filter(|k| k.actor_id == actor_id && k.kind == kind)
            .map(|k| k.target_id)
            .collect();
        targets.sort();
        Ok(targets)
    }
}

use std::{future::Future, sync::Arc};

use crate::{
    auth::jwt::TokenCodec,
    config::{Config, StoreBackend},
    errors::AppError,
    store::{
        memory::{MemoryRelationStore, MemoryUserStore},
        mongo, RelationStore, UserStore,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub relations: Arc<dyn RelationStore>,
    pub codec: Arc<TokenCodec>,
    pub cfg: Arc<Config>,
}

impl AppState {
    pub async fn new(cfg: &Config) -> Result<Self, AppError> {
        match cfg.store_backend {
            StoreBackend::Mongo => {
                let (users, relations) = mongo::connect(cfg).await?;
                Ok(Self::with_stores(cfg, Arc::new(users), Arc::new(relations)))
            }
            StoreBackend::Memory => {
                tracing::warn!("using in-memory stores; data is lost on restart");
                Ok(Self::with_stores(
                    cfg,
                    Arc::new(MemoryUserStore::new()),
                    Arc::new(MemoryRelationStore::new()),
                ))
            }
        }
    }

    pub fn with_stores(
        cfg: &Config,
        users: Arc<dyn UserStore>,
        relations: Arc<dyn RelationStore>,
    ) -> Self {
        Self {
            users,
            relations,
            codec: Arc::new(TokenCodec::new(cfg)),
            cfg: Arc::new(cfg.clone()),
        }
    }

    /// Runs one store call under the configured timeout. Elapsed calls turn
    /// into `Retryable`, never into an authentication failure.
    pub async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        match tokio::time::timeout(self.cfg.store_timeout, fut).await {
            Ok(res) => res,
            Err(_) => {
                tracing::warn!(op, timeout_ms = self.cfg.store_timeout.as_millis() as u64, "store call timed out");
                Err(AppError::Retryable(format!("{op} timed out")))
            }
        }
    }
}

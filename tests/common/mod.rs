#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use vidtube_session::{
    config::{Config, StoreBackend},
    dto::auth::RegisterRequest,
    models::user::UserPublic,
    services::session,
    store::memory::{MemoryRelationStore, MemoryUserStore},
    AppState,
};

pub const PASSWORD: &str = "correct";

pub fn test_config() -> Config {
    Config {
        store_backend: StoreBackend::Memory,
        mongodb_uri: None,
        db_name: "videotube_test".into(),
        access_token_secret: "test-access-secret".into(),
        refresh_token_secret: "test-refresh-secret".into(),
        jwt_access_ttl_seconds: 15 * 60,
        jwt_refresh_ttl_seconds: 10 * 24 * 60 * 60,
        store_timeout: Duration::from_secs(2),
        bind_addr: "127.0.0.1:0".into(),
        cors_origin: None,
        cookie_secure: true,
    }
}

pub struct Harness {
    pub state: Arc<AppState>,
    pub users: Arc<MemoryUserStore>,
    pub relations: Arc<MemoryRelationStore>,
}

pub fn harness() -> Harness {
    let users = Arc::new(MemoryUserStore::new());
    let relations = Arc::new(MemoryRelationStore::new());
    let state = Arc::new(AppState::with_stores(
        &test_config(),
        users.clone(),
        relations.clone(),
    ));
    Harness {
        state,
        users,
        relations,
    }
}

pub async fn register(state: &AppState, username: &str, password: &str) -> UserPublic {
    let req = RegisterRequest {
        username: username.into(),
        email: format!("{username}@example.com"),
        full_name: format!("{username} tester"),
        password: password.into(),
        avatar: None,
        cover_image: None,
    };
    session::register(state, req.validate().expect("valid registration"))
        .await
        .expect("registration succeeds")
}

use std::sync::Arc;

use axum::{extract::FromRef, response::Response};
use time::Duration;
use uuid::Uuid;

use crate::{
    auth::jwt::JwtKeys,
    config::GuardConfig,
    state::AppState,
    users::repo_types::{NewUser, User},
};

/// Fake state with the access guard switched off.
pub fn bypassed() -> AppState {
    let fake = AppState::fake();
    let mut config = (*fake.config).clone();
    config.guard = GuardConfig { bypass: true };
    AppState::from_parts(fake.users, Arc::new(config))
}

pub async fn seed_user(state: &AppState, username: &str, is_admin: bool) -> User {
    let record = NewUser {
        username: username.into(),
        email: format!("{username}@example.com"),
        name: username.into(),
        password: "foobarbaz".into(),
        is_admin,
        image_url: None,
    }
    .hash_credentials()
    .await
    .expect("hash");
    state.users.create(record).await.expect("seed user")
}

pub fn token_for(state: &AppState, user_id: Uuid, ttl: Duration) -> String {
    JwtKeys::from_ref(state).sign(user_id, ttl).expect("sign")
}

pub async fn read_json(res: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

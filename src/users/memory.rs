use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    repo::{StoreError, UniqueField, UserStore},
    repo_types::{NewUserRecord, User, UserChanges},
};

/// Process-local store used by tests and when no database is configured.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_unique(
    users: &HashMap<Uuid, User>,
    skip: Option<Uuid>,
    username: Option<&str>,
    email: Option<&str>,
) -> Result<(), StoreError> {
    let mut others = users.values().filter(|u| Some(u.id) != skip);
    // Email is reported first whatever the map order.
    if let Some(email) = email {
        if others.clone().any(|u| u.email == email) {
            return Err(StoreError::Conflict(UniqueField::Email));
        }
    }
    if let Some(username) = username {
        if others.any(|u| u.username == username) {
            return Err(StoreError::Conflict(UniqueField::Username));
        }
    }
    Ok(())
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: NewUserRecord) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        check_unique(&users, None, Some(&user.username), Some(&user.email))?;

        let user = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            name: user.name,
            password_hash: user.password_hash,
            is_admin: user.is_admin,
            image_url: user.image_url,
            created_at: user.created_at,
            updated_at: user.created_at,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let mut all: Vec<User> = self.users.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(all)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;
        if !users.contains_key(&id) {
            return Ok(None);
        }
        check_unique(
            &users,
            Some(id),
            changes.username.as_deref(),
            changes.email.as_deref(),
        )?;

        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply(user);
        Ok(Some(user.clone()))
    }

    async fn remove(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.users.write().await.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;
    use crate::users::repo_types::NewUser;

    async fn record(username: &str, email: &str) -> NewUserRecord {
        NewUser {
            username: username.into(),
            email: email.into(),
            name: "foo".into(),
            password: "foobarbaz".into(),
            is_admin: false,
            image_url: None,
        }
        .hash_credentials()
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn create_assigns_id_and_keeps_hash() {
        let store = MemoryUserStore::new();
        let user = store.create(record("123", "foo@example.com").await).await.unwrap();
        assert_ne!(user.password_hash, "foobarbaz");
        assert_eq!(user.created_at, user.updated_at);
        let found = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(found.username, "123");
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = MemoryUserStore::new();
        store.create(record("a", "same@example.com").await).await.unwrap();
        let err = store
            .create(record("b", "same@example.com").await)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(UniqueField::Email)));
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let store = MemoryUserStore::new();
        store.create(record("dup", "a@example.com").await).await.unwrap();
        let err = store
            .create(record("dup", "b@example.com").await)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(UniqueField::Username)));
    }

    #[tokio::test]
    async fn email_conflict_wins_over_username_conflict() {
        let store = MemoryUserStore::new();
        store.create(record("taken", "a@example.com").await).await.unwrap();
        store.create(record("other", "b@example.com").await).await.unwrap();
        let err = store
            .create(record("taken", "b@example.com").await)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(UniqueField::Email)));
    }

    #[tokio::test]
    async fn list_is_sorted_by_username() {
        let store = MemoryUserStore::new();
        for (name, email) in [("carol", "c@x.io"), ("alice", "a@x.io"), ("bob", "b@x.io")] {
            store.create(record(name, email).await).await.unwrap();
        }
        let names: Vec<_> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, ["alice", "bob", "carol"]);
    }

    #[tokio::test]
    async fn update_checks_uniqueness_against_others_only() {
        let store = MemoryUserStore::new();
        let a = store.create(record("a", "a@x.io").await).await.unwrap();
        store.create(record("b", "b@x.io").await).await.unwrap();

        // Re-submitting its own email is fine.
        let same = UserChanges {
            email: Some("a@x.io".into()),
            ..UserChanges::new(OffsetDateTime::now_utc())
        };
        assert!(store.update(a.id, same).await.unwrap().is_some());

        let taken = UserChanges {
            email: Some("b@x.io".into()),
            ..UserChanges::new(OffsetDateTime::now_utc())
        };
        let err = store.update(a.id, taken).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(UniqueField::Email)));
    }

    #[tokio::test]
    async fn update_missing_user_is_none() {
        let store = MemoryUserStore::new();
        let changes = UserChanges::new(OffsetDateTime::now_utc());
        assert!(store.update(Uuid::new_v4(), changes).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn remove_is_irreversible() {
        let store = MemoryUserStore::new();
        let user = store.create(record("gone", "gone@x.io").await).await.unwrap();
        assert!(store.remove(user.id).await.unwrap());
        assert!(store.find_by_id(user.id).await.unwrap().is_none());
        assert!(!store.remove(user.id).await.unwrap());
    }
}

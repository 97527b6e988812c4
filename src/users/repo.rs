use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use super::repo_types::{NewUserRecord, User, UserChanges};

/// Columns that must be unique across all users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
}

impl UniqueField {
    pub fn key(self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Email => "email",
        }
    }

    pub fn taken_message(self) -> &'static str {
        match self {
            Self::Username => "This username is already taken.",
            Self::Email => "This email is already taken.",
        }
    }

    fn from_constraint(name: &str) -> Option<Self> {
        match name {
            "users_username_key" => Some(Self::Username),
            "users_email_key" => Some(Self::Email),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{} is already taken", .0.key())]
    Conflict(UniqueField),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Persistence for user records. Every write replaces a single record atomically.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: NewUserRecord) -> Result<User, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    /// All users ordered by username.
    async fn list(&self) -> Result<Vec<User>, StoreError>;
    /// `Ok(None)` when no user has `id`.
    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, StoreError>;
    /// `Ok(false)` when no user has `id`.
    async fn remove(&self, id: Uuid) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_write_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            if let Some(field) = db_err.constraint().and_then(UniqueField::from_constraint) {
                return StoreError::Conflict(field);
            }
        }
    }
    StoreError::Database(e)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUserRecord) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, name, password_hash, is_admin, image_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING id, username, email, name, password_hash, is_admin, image_url, created_at, updated_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.is_admin)
        .bind(&user.image_url)
        .bind(user.created_at)
        .fetch_one(&self.db)
        .await
        .map_err(map_write_error)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, name, password_hash, is_admin, image_url, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, name, password_hash, is_admin, image_url, created_at, updated_at
            FROM users
            ORDER BY username ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(users)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                username = COALESCE($2, username),
                email = COALESCE($3, email),
                name = COALESCE($4, name),
                is_admin = COALESCE($5, is_admin),
                image_url = COALESCE($6, image_url),
                password_hash = COALESCE($7, password_hash),
                updated_at = $8
            WHERE id = $1
            RETURNING id, username, email, name, password_hash, is_admin, image_url, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.username)
        .bind(changes.email)
        .bind(changes.name)
        .bind(changes.is_admin)
        .bind(changes.image_url)
        .bind(changes.password_hash)
        .bind(changes.updated_at)
        .fetch_optional(&self.db)
        .await
        .map_err(map_write_error)
    }

    async fn remove(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_names_map_to_fields() {
        assert_eq!(
            UniqueField::from_constraint("users_email_key"),
            Some(UniqueField::Email)
        );
        assert_eq!(
            UniqueField::from_constraint("users_username_key"),
            Some(UniqueField::Username)
        );
        assert_eq!(UniqueField::from_constraint("users_pkey"), None);
    }

    #[test]
    fn non_database_errors_stay_database_errors() {
        let err = map_write_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Database(sqlx::Error::RowNotFound)));
    }
}

use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::password::{compare_password, hash_password_async};

/// User record in the store.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub is_admin: bool,
    pub image_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl User {
    pub async fn compare_password(&self, candidate: &str) -> anyhow::Result<bool> {
        compare_password(candidate.to_owned(), self.password_hash.clone()).await
    }

    /// Account age in words, e.g. "3 days ago".
    pub fn created_from_now(&self) -> String {
        relative_time(self.created_at, OffsetDateTime::now_utc())
    }
}

/// Humanized distance between `then` and `now`, rounded the way calendar
/// libraries usually phrase it ("a few seconds ago", "2 months ago", "in an hour").
pub fn relative_time(then: OffsetDateTime, now: OffsetDateTime) -> String {
    let delta = now - then;
    let future = delta.is_negative();
    let secs = delta.abs().as_seconds_f64();

    let round = |v: f64| v.round() as i64;
    let minutes = round(secs / 60.0);
    let hours = round(secs / 3_600.0);
    let days = round(secs / 86_400.0);
    let months = round(secs / 86_400.0 * 12.0 / 365.2425);
    let years = round(secs / 86_400.0 / 365.2425);

    let phrase = if secs < 45.0 {
        "a few seconds".to_owned()
    } else if minutes <= 1 {
        "a minute".to_owned()
    } else if minutes < 45 {
        format!("{minutes} minutes")
    } else if hours <= 1 {
        "an hour".to_owned()
    } else if hours < 22 {
        format!("{hours} hours")
    } else if days <= 1 {
        "a day".to_owned()
    } else if days < 26 {
        format!("{days} days")
    } else if months <= 1 {
        "a month".to_owned()
    } else if months < 11 {
        format!("{months} months")
    } else if years <= 1 {
        "a year".to_owned()
    } else {
        format!("{years} years")
    };

    if future {
        format!("in {phrase}")
    } else {
        format!("{phrase} ago")
    }
}

/// Validated signup input. Still holds the plaintext password.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub name: String,
    pub password: String,
    pub is_admin: bool,
    pub image_url: Option<String>,
}

impl NewUser {
    /// Hashes the password and stamps the creation time. The resulting
    /// record is the only thing a [`UserStore`](super::repo::UserStore) can insert.
    pub async fn hash_credentials(self) -> anyhow::Result<NewUserRecord> {
        let password_hash = hash_password_async(self.password).await?;
        let now = OffsetDateTime::now_utc();
        Ok(NewUserRecord {
            username: self.username,
            email: self.email,
            name: self.name,
            password_hash,
            is_admin: self.is_admin,
            image_url: self.image_url,
            created_at: now,
        })
    }
}

/// A user ready to insert; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub(in crate::users) username: String,
    pub(in crate::users) email: String,
    pub(in crate::users) name: String,
    pub(in crate::users) password_hash: String,
    pub(in crate::users) is_admin: bool,
    pub(in crate::users) image_url: Option<String>,
    pub(in crate::users) created_at: OffsetDateTime,
}

/// Partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub is_admin: Option<bool>,
    pub image_url: Option<String>,
    pub(in crate::users) password_hash: Option<String>,
    pub updated_at: OffsetDateTime,
}

impl UserChanges {
    pub fn new(updated_at: OffsetDateTime) -> Self {
        Self {
            username: None,
            email: None,
            name: None,
            is_admin: None,
            image_url: None,
            password_hash: None,
            updated_at,
        }
    }

    pub async fn with_password(mut self, plain: String) -> anyhow::Result<Self> {
        self.password_hash = Some(hash_password_async(plain).await?);
        Ok(self)
    }

    pub(in crate::users) fn apply(self, user: &mut User) {
        if let Some(username) = self.username {
            user.username = username;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(is_admin) = self.is_admin {
            user.is_admin = is_admin;
        }
        if let Some(image_url) = self.image_url {
            user.image_url = Some(image_url);
        }
        if let Some(password_hash) = self.password_hash {
            user.password_hash = password_hash;
        }
        user.updated_at = self.updated_at;
    }
}

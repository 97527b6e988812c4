use serde::{de::IgnoredAny, Deserialize, Deserializer};
use time::OffsetDateTime;

use super::repo_types::UserChanges;

#[derive(Deserialize)]
#[serde(untagged)]
enum MaybeString {
    Text(String),
    Other(IgnoredAny),
}

/// Keeps string values and turns any other JSON type into `None`, so one
/// mistyped field does not discard the rest of the form.
fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<MaybeString>::deserialize(deserializer)? {
        Some(MaybeString::Text(s)) => Some(s),
        Some(MaybeString::Other(_)) | None => None,
    })
}

/// Body of `POST /users/new`. Fields that are missing or not strings are
/// `None` and surface as keyed validation errors instead of a decode failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[serde(default, deserialize_with = "string_or_none")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub image_url: Option<String>,
}

/// Body of `POST /users/:id/edit`. Absent fields are left unchanged.
/// `is_admin` is honoured for owners as well as admins; the guard grants
/// owners full edit rights over their own record.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditUserRequest {
    pub username: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_admin: Option<bool>,
    pub image_url: Option<String>,
}

impl EditUserRequest {
    /// Builds the store update, hashing a submitted password.
    pub async fn into_changes(self, updated_at: OffsetDateTime) -> anyhow::Result<UserChanges> {
        let changes = UserChanges {
            username: self.username.map(|s| s.trim().to_owned()),
            email: self.email.map(|s| s.trim().to_owned()),
            name: self.name.map(|s| s.trim().to_owned()),
            is_admin: self.is_admin,
            image_url: self.image_url,
            ..UserChanges::new(updated_at)
        };
        match self.password {
            Some(plain) => changes.with_password(plain).await,
            None => Ok(changes),
        }
    }
}

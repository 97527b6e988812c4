//! Request guards for mutating user routes.
//!
//! Both extractors run the same pipeline: optional bypass, bearer token,
//! JWT verification, subject lookup, then a role rule. The resolved [`User`]
//! is handed to the handler; it is `None` only when the bypass is enabled.

use std::collections::HashMap;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Path, Query},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::jwt::JwtKeys;
use crate::{error::ApiError, state::AppState, users::repo_types::User};

pub const NO_ACCESS: &str = "You do not have access.";
pub const ADMIN_REQUIRED: &str = "You need to be an Admin to perform this action on the API.";
pub const OWNER_OR_ADMIN_REQUIRED: &str =
    "You need to be the owner or an Admin to perform this action on the API.";

/// Admits admins only.
pub struct AdminRequired(pub Option<User>);

/// Admits admins and the user named by the `:id` path segment.
pub struct AdminOrOwnerRequired(pub Option<User>);

#[derive(Debug, Clone, Copy)]
enum Rule {
    Admin,
    AdminOrOwner,
}

/// Token from `Authorization: Bearer <token>`, else the `access_token` query parameter.
fn bearer_token(parts: &Parts) -> Option<String> {
    let from_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer ").or_else(|| h.strip_prefix("bearer ")))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = from_header {
        return Some(token.to_owned());
    }

    Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(mut q)| q.remove("access_token"))
        .filter(|t| !t.is_empty())
}

async fn path_names_user(parts: &mut Parts, state: &AppState, user_id: Uuid) -> bool {
    match Path::<HashMap<String, String>>::from_request_parts(parts, state).await {
        Ok(Path(params)) => params
            .get("id")
            .and_then(|id| id.parse::<Uuid>().ok())
            .is_some_and(|id| id == user_id),
        Err(_) => false,
    }
}

async fn authorize(
    parts: &mut Parts,
    state: &AppState,
    rule: Rule,
) -> Result<Option<User>, ApiError> {
    if state.config.guard.bypass {
        debug!(?rule, "access guard bypassed");
        return Ok(None);
    }

    let Some(token) = bearer_token(parts) else {
        debug!(?rule, "no bearer token");
        return Err(ApiError::Unauthorized(NO_ACCESS));
    };

    let claims = JwtKeys::from_ref(state).verify(&token).map_err(|e| {
        warn!(error = %e, "token verification failed");
        ApiError::Unauthorized(NO_ACCESS)
    })?;

    let user = match state.users.find_by_id(claims.sub).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!(user_id = %claims.sub, "token subject not found");
            return Err(ApiError::Unauthorized(NO_ACCESS));
        }
        Err(e) => {
            error!(error = %e, user_id = %claims.sub, "token subject lookup failed");
            return Err(ApiError::Unauthorized(NO_ACCESS));
        }
    };

    if user.is_admin {
        return Ok(Some(user));
    }

    match rule {
        Rule::Admin => {
            warn!(user_id = %user.id, "admin required");
            Err(ApiError::Unauthorized(ADMIN_REQUIRED))
        }
        Rule::AdminOrOwner => {
            // Owners may edit anything on their own record, `isAdmin` included.
            if path_names_user(parts, state, user.id).await {
                Ok(Some(user))
            } else {
                warn!(user_id = %user.id, "owner or admin required");
                Err(ApiError::Unauthorized(OWNER_OR_ADMIN_REQUIRED))
            }
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminRequired {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        authorize(parts, state, Rule::Admin).await.map(AdminRequired)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminOrOwnerRequired {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        authorize(parts, state, Rule::AdminOrOwner)
            .await
            .map(AdminOrOwnerRequired)
    }
}

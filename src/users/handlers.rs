use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{EditUserRequest, SignupRequest},
    repo::StoreError,
    repo_types::User,
    validate,
};
use crate::{
    auth::guard::{AdminOrOwnerRequired, AdminRequired},
    error::ApiError,
    response::ApiResponse,
    state::AppState,
};

const SIGNED_UP: &str = "You have successfully signed up! Now you should be able to log in.";
const RECORD_RETRIEVED: &str = "The record was successfully retrieved.";
const RECORD_NOT_FOUND: &str = "The record could not be found.";
const RECORD_RETRIEVE_PROBLEM: &str = "There was a problem with retrieving the record.";
const RECORDS_RETRIEVED: &str = "The records were successfully retrieved.";
const RECORDS_RETRIEVE_PROBLEM: &str = "There was a problem with retrieving the records.";
const RECORD_SAVED: &str = "The updated record was successfully saved.";
const RECORD_SAVE_PROBLEM: &str = "There was a problem saving the updated record.";
const RECORD_REMOVED: &str = "The record was successfully removed.";
const RECORD_REMOVE_PROBLEM: &str = "There was a problem removing the record.";

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/new", post(create_user))
        .route("/users/:id", get(get_user))
        .route("/users/:id/edit", post(edit_user))
        .route("/users/:id/remove", post(remove_user))
}

#[instrument(skip(state, actor, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    AdminRequired(actor): AdminRequired,
    payload: Option<Json<SignupRequest>>,
) -> Result<ApiResponse<User>, ApiError> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let new_user = validate::signup(payload).map_err(|errors| {
        warn!(fields = ?errors.keys().collect::<Vec<_>>(), "signup form rejected");
        ApiError::Validation(errors)
    })?;

    let record = new_user.hash_credentials().await.map_err(|e| {
        error!(error = %e, "hash_credentials failed");
        ApiError::Unprocessable(e.to_string())
    })?;

    let user = state.users.create(record).await.map_err(|e| match e {
        StoreError::Conflict(field) => {
            warn!(field = field.key(), "signup conflicts with existing user");
            ApiError::Conflict(field)
        }
        StoreError::Database(e) => {
            error!(error = %e, "create user failed");
            ApiError::Unprocessable(e.to_string())
        }
    })?;

    info!(
        user_id = %user.id,
        username = %user.username,
        actor = ?actor.as_ref().map(|a| a.id),
        "user created"
    );
    Ok(ApiResponse::ok(SIGNED_UP, user))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> ApiResponse<Vec<User>> {
    match state.users.list().await {
        Ok(users) => ApiResponse::ok(RECORDS_RETRIEVED, users),
        Err(e) => {
            error!(error = %e, "list users failed");
            ApiResponse::failure_with(RECORDS_RETRIEVE_PROBLEM, Vec::new())
        }
    }
}

#[instrument(skip(state))]
pub async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> ApiResponse<User> {
    let Ok(id) = id.parse::<Uuid>() else {
        return ApiResponse::failure(RECORD_NOT_FOUND);
    };
    match state.users.find_by_id(id).await {
        Ok(Some(user)) => ApiResponse::ok(RECORD_RETRIEVED, user),
        Ok(None) => ApiResponse::failure(RECORD_NOT_FOUND),
        Err(e) => {
            error!(error = %e, %id, "get user failed");
            ApiResponse::failure(RECORD_RETRIEVE_PROBLEM)
        }
    }
}

#[instrument(skip(state, actor, payload))]
pub async fn edit_user(
    State(state): State<AppState>,
    AdminOrOwnerRequired(actor): AdminOrOwnerRequired,
    Path(id): Path<String>,
    payload: Result<Json<EditUserRequest>, JsonRejection>,
) -> Result<ApiResponse<User>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        warn!(error = %rejection, "edit body rejected");
        ApiError::MalformedBody(rejection.body_text())
    })?;
    validate::edit(&payload).map_err(|errors| {
        warn!(fields = ?errors.keys().collect::<Vec<_>>(), "edit form rejected");
        ApiError::Validation(errors)
    })?;

    let Ok(id) = id.parse::<Uuid>() else {
        return Ok(ApiResponse::failure(RECORD_NOT_FOUND));
    };

    let changes = payload
        .into_changes(OffsetDateTime::now_utc())
        .await
        .map_err(|e| {
            error!(error = %e, "hashing edited password failed");
            ApiError::Unprocessable(e.to_string())
        })?;

    match state.users.update(id, changes).await {
        Ok(Some(user)) => {
            info!(user_id = %user.id, actor = ?actor.as_ref().map(|a| a.id), "user updated");
            Ok(ApiResponse::ok(RECORD_SAVED, user))
        }
        Ok(None) => Ok(ApiResponse::failure(RECORD_NOT_FOUND)),
        Err(StoreError::Conflict(field)) => {
            warn!(field = field.key(), %id, "edit conflicts with existing user");
            Err(ApiError::Conflict(field))
        }
        Err(StoreError::Database(e)) => {
            error!(error = %e, %id, "update user failed");
            Ok(ApiResponse::failure(RECORD_SAVE_PROBLEM))
        }
    }
}

#[instrument(skip(state, actor))]
pub async fn remove_user(
    State(state): State<AppState>,
    AdminOrOwnerRequired(actor): AdminOrOwnerRequired,
    Path(id): Path<String>,
) -> ApiResponse<()> {
    let Ok(id) = id.parse::<Uuid>() else {
        return ApiResponse::failure(RECORD_REMOVE_PROBLEM);
    };
    match state.users.remove(id).await {
        Ok(true) => {
            info!(user_id = %id, actor = ?actor.as_ref().map(|a| a.id), "user removed");
            ApiResponse::message(RECORD_REMOVED)
        }
        Ok(false) => {
            warn!(user_id = %id, "remove of unknown user");
            ApiResponse::failure(RECORD_REMOVE_PROBLEM)
        }
        Err(e) => {
            error!(error = %e, user_id = %id, "remove user failed");
            ApiResponse::failure(RECORD_REMOVE_PROBLEM)
        }
    }
}

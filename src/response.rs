use std::collections::BTreeMap;

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Field name -> human readable problem, as returned in `errors`.
pub type FieldErrors = BTreeMap<&'static str, &'static str>;

/// Envelope shared by every route: `{ success, message, data?, errors? }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: &'static str, data: T) -> Self {
        Self {
            success: true,
            message,
            data: Some(data),
            errors: None,
        }
    }

    /// Request-scoped failure reported in-band; still rendered with status 200.
    pub fn failure(message: &'static str) -> Self {
        Self {
            success: false,
            message,
            data: None,
            errors: None,
        }
    }

    pub fn failure_with(message: &'static str, data: T) -> Self {
        Self {
            data: Some(data),
            ..Self::failure(message)
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: &'static str) -> Self {
        Self {
            success: true,
            message,
            data: None,
            errors: None,
        }
    }

    pub fn rejected(message: &'static str, errors: FieldErrors) -> Self {
        Self {
            errors: Some(errors),
            ..Self::failure(message)
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

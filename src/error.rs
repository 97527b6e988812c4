use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    response::{ApiResponse, FieldErrors},
    users::repo::UniqueField,
};

pub const FORM_ERRORS: &str = "Check the form for errors.";
pub const FORM_UNPROCESSABLE: &str = "Could not process the form.";
pub const BODY_UNREADABLE: &str = "The request body must be a JSON object with correctly typed fields.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed on {} field(s)", .0.len())]
    Validation(FieldErrors),
    #[error("malformed request body: {0}")]
    MalformedBody(String),
    #[error("{} is already taken", .0.key())]
    Conflict(UniqueField),
    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),
    #[error("could not process the form: {0}")]
    Unprocessable(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::MalformedBody(_) | Self::Unprocessable(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::Validation(errors) => ApiResponse::rejected(FORM_ERRORS, errors),
            Self::MalformedBody(_) => {
                let mut errors = FieldErrors::new();
                errors.insert("body", BODY_UNREADABLE);
                ApiResponse::rejected(FORM_ERRORS, errors)
            }
            Self::Conflict(field) => {
                let mut errors = FieldErrors::new();
                errors.insert(field.key(), field.taken_message());
                ApiResponse::rejected(FORM_ERRORS, errors)
            }
            Self::Unauthorized(message) => ApiResponse::failure(message),
            Self::Unprocessable(_) => ApiResponse::failure(FORM_UNPROCESSABLE),
        };
        (status, body).into_response()
    }
}

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use storage::error::{StorageError, WaitlistError};
use validator::ValidationErrors;

/// Web layer errors
#[derive(Debug)]
pub enum WebError {
    Waitlist(WaitlistError),
    Validation(ValidationErrors),
    BadRequest(String),
    Unauthorized,
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waitlist(e) => write!(f, "Waitlist error: {}", e),
            Self::Validation(e) => write!(f, "Validation error: {}", e),
            Self::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            Self::Unauthorized => write!(f, "Unauthorized"),
        }
    }
}

fn storage_response(error: &StorageError) -> (StatusCode, serde_json::Value) {
    match error {
        StorageError::NotFound => (
            StatusCode::NOT_FOUND,
            json!({
                "error": "Resource not found",
                "code": "not_found"
            }),
        ),
        StorageError::ConstraintViolation(msg) => (
            StatusCode::CONFLICT,
            json!({
                "error": msg,
                "code": "constraint_violation"
            }),
        ),
        e => {
            tracing::error!("Storage error: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": "An internal error occurred",
                    "code": "storage_error"
                }),
            )
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status_code, body) = match &self {
            Self::Waitlist(WaitlistError::Storage(e)) => storage_response(e),
            Self::Waitlist(e) => {
                let status_code = match e {
                    WaitlistError::NotFound => StatusCode::NOT_FOUND,
                    WaitlistError::Forbidden => StatusCode::FORBIDDEN,
                    WaitlistError::AlreadyOnWaitlist
                    | WaitlistError::WaitlistEmpty
                    | WaitlistError::NotWaiting
                    | WaitlistError::NotOffered => StatusCode::CONFLICT,
                    WaitlistError::OfferExpired => StatusCode::GONE,
                    WaitlistError::InvalidOfferWindow(_) => StatusCode::BAD_REQUEST,
                    WaitlistError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };

                (
                    status_code,
                    json!({
                        "error": e.to_string(),
                        "code": e.code()
                    }),
                )
            }
            Self::Validation(errors) => {
                let field_errors: Vec<String> = errors
                    .field_errors()
                    .iter()
                    .flat_map(|(field, errors)| {
                        errors.iter().map(move |e| {
                            format!(
                                "{}: {}",
                                field,
                                e.message
                                    .as_ref()
                                    .map(|m| m.to_string())
                                    .unwrap_or_else(|| e.code.to_string())
                            )
                        })
                    })
                    .collect();

                (
                    StatusCode::BAD_REQUEST,
                    json!({
                        "error": "Validation failed",
                        "code": "validation_failed",
                        "details": field_errors
                    }),
                )
            }
            Self::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": msg,
                    "code": "bad_request"
                }),
            ),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({
                    "error": "Unauthorized",
                    "code": "unauthorized"
                }),
            ),
        };

        (status_code, Json(body)).into_response()
    }
}

impl From<WaitlistError> for WebError {
    fn from(error: WaitlistError) -> Self {
        Self::Waitlist(error)
    }
}

impl From<ValidationErrors> for WebError {
    fn from(error: ValidationErrors) -> Self {
        Self::Validation(error)
    }
}

pub type WebResult<T> = Result<T, WebError>;

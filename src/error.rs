/// Error types for the HTTP layer.
/// Every failure leaves the server as `{"error": "<reason>"}` with a matching status.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    MissingFields(&'static str),

    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("This {0} is banned")]
    Banned(&'static str),

    #[error("Users are not friends")]
    NotFriends,

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Database error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingFields(_) | ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Banned(_) | ApiError::NotFriends => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let reason = match self {
            ApiError::Storage(e) => {
                log::error!("Storage fault: {}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({ "error": reason }))
    }
}

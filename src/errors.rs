use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::schema::ApiResponse;

#[derive(Debug, Error)]
pub enum AppError{
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Cant bind to the Socket")]
    SocketBind,
    #[error("Cant connect to the DB")]
    DbConnect,
    #[error("Cant run the DB migrations")]
    Migrate,
    #[error("Cant start the server")]
    ServerStart,
}

/// Failure of a single request-level operation.
///
/// Every variant is rendered as the uniform `{status: "error", message}` body,
/// the message being the `Display` output.
#[derive(Debug, Error)]
pub enum ActionError{
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("You've been blocked due to rate limiting")]
    RateLimited,
    #[error("Decision denied")]
    Denied,
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    ExternalService(String),
    #[error("{0}")]
    Unknown(String),
    #[error("Internal Server Error")]
    Database(#[from] sqlx::Error),
}

impl ActionError {
    pub fn not_found(message: impl Into<String>) -> Self {
        ActionError::NotFound(message.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        ActionError::InvalidInput(message.into())
    }

    /// Swaps a raw database failure for an operation-specific message, logging the cause.
    pub fn or_message(self, message: &str) -> Self {
        match self {
            ActionError::Database(e) => {
                tracing::error!(error = %e, "{}", message);
                ActionError::Unknown(message.to_string())
            }
            other => other,
        }
    }
}

impl From<validator::ValidationErrors> for ActionError {
    fn from(errors: validator::ValidationErrors) -> Self {
        tracing::debug!(%errors, "payload rejected");
        ActionError::InvalidInput("Invalid data".to_string())
    }
}

impl ResponseError for ActionError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ApiResponse::error(self.to_string()))
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            ActionError::NotFound(_) => StatusCode::NOT_FOUND,
            ActionError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ActionError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ActionError::Denied => StatusCode::FORBIDDEN,
            ActionError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ActionError::Forbidden(_) => StatusCode::FORBIDDEN,
            ActionError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            ActionError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ActionError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Postgres `unique_violation`.
pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .and_then(|e| e.code())
        .is_some_and(|code| code == "23505")
}

#[cfg(test)]
mod tests{
    use super::*;

    #[test]
    fn test_status_codes_follow_taxonomy(){
        assert_eq!(ActionError::not_found("Course not found").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ActionError::invalid("No chapters provided").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ActionError::RateLimited.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(ActionError::ExternalService("down".into()).status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_database_error_is_replaced_by_operation_message(){
        let err = ActionError::from(sqlx::Error::PoolTimedOut).or_message("Failed to delete chapter");
        assert_eq!(err.to_string(), "Failed to delete chapter");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = ActionError::not_found("Chapter not found").or_message("Failed to delete chapter");
        assert_eq!(err.to_string(), "Chapter not found");
    }
}

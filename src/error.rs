use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use sqlx::error::ErrorKind;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ForgeError {
    #[error("{message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("No LLM configured")]
    LlmUnavailable,

    #[error("LLM upstream error with status: {0}")]
    LlmStatus(StatusCode),

    #[error("Failed to parse LLM response: {0}")]
    LlmParse(String),
}

impl ForgeError {
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        ForgeError::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ForgeError::NotFound(message.into())
    }
}

impl IntoResponse for ForgeError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            ForgeError::Validation { message, field } => {
                (StatusCode::BAD_REQUEST, ApiErrorBody { message, field })
            }
            ForgeError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ApiErrorBody::message("Unauthorized"),
            ),
            ForgeError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ApiErrorBody::message("Invalid email or password"),
            ),
            ForgeError::NotFound(message) => (StatusCode::NOT_FOUND, ApiErrorBody { message, field: None }),
            ForgeError::Database(e) => translate_db_error(&e),
            ForgeError::Json(_) | ForgeError::UrlParse(_) | ForgeError::PasswordHash(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorBody::message("An internal server error occurred."),
            ),
            ForgeError::Reqwest(_) => (
                StatusCode::BAD_GATEWAY,
                ApiErrorBody::message("Upstream service is unavailable."),
            ),
            ForgeError::LlmUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                ApiErrorBody::message("No LLM configured to process the request."),
            ),
            ForgeError::LlmStatus(code) => {
                let message = match code {
                    StatusCode::TOO_MANY_REQUESTS => "Upstream rate limit exceeded.",
                    StatusCode::UNAUTHORIZED => "Upstream authentication failed.",
                    StatusCode::FORBIDDEN => "Upstream permission denied.",
                    StatusCode::NOT_FOUND => "Upstream resource not found.",
                    _ => "An upstream error occurred.",
                };
                (code, ApiErrorBody::message(message))
            }
            ForgeError::LlmParse(detail) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorBody {
                    message: format!("Failed to generate plan: {detail}"),
                    field: None,
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}

/// Best-effort translation of database driver errors into user-facing
/// messages and statuses.
fn translate_db_error(e: &SqlxError) -> (StatusCode, ApiErrorBody) {
    if let SqlxError::Database(db_err) = e {
        match db_err.kind() {
            ErrorKind::UniqueViolation => {
                return (
                    StatusCode::CONFLICT,
                    ApiErrorBody::message("A record with this information already exists."),
                );
            }
            ErrorKind::ForeignKeyViolation => {
                return (
                    StatusCode::BAD_REQUEST,
                    ApiErrorBody::message("Invalid reference. The related record does not exist."),
                );
            }
            _ => {}
        }
        if db_err.message().contains("no such table") {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorBody::message(
                    "Database tables not found. The schema is created at startup; check DATABASE_URL.",
                ),
            );
        }
    }
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        ApiErrorBody::message("An internal server error occurred."),
    )
}

/// Standardized API error response body. Validation errors carry the
/// offending field name.
#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ApiErrorBody {
    fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn validation_error_maps_to_400_with_field() {
        let resp = ForgeError::validation("Title is required", "title").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn llm_unavailable_maps_to_503() {
        let resp = ForgeError::LlmUnavailable.into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn llm_status_passes_through_code() {
        let resp = ForgeError::LlmStatus(StatusCode::TOO_MANY_REQUESTS).into_response();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}

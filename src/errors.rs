use std::collections::BTreeMap;
use std::fmt;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error; // Use thiserror for cleaner error definitions

// --- Domain/Infrastructure Errors ---

/// Kinds of stored records, used to tag lookups that came back empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Template,
    Meme,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::User => "User",
            Entity::Template => "Meme template",
            Entity::Meme => "Meme",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum RepoError {
    #[error("{0} not found with ID: {1}")]
    NotFound(Entity, i64),

    /// A storage-level unique constraint rejected the write.
    #[error("Unique constraint violated on field: {field}")]
    Conflict { field: String },

    #[error("Stored data could not be decoded: {0}")]
    DataCorruption(String),

    #[error("Database backend error: {0}")]
    BackendError(#[from] anyhow::Error), // Wrap Anyhow errors from DB layer
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("Token or user_id missing")]
    MissingCredentials,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token does not match the user_id")]
    TokenUserMismatch,
    #[error("Invalid credentials")]
    InvalidCredentials,
}

impl AuthError {
    fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingCredentials => StatusCode::BAD_REQUEST,
            AuthError::InvalidToken | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::TokenUserMismatch => StatusCode::FORBIDDEN,
        }
    }
}

/// Validation messages keyed by the offending request field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Ok when nothing was recorded, otherwise a validation error carrying every message.
    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.keys().map(String::as_str).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

// --- Web Layer Error ---

#[derive(Error, Debug)]
pub enum AppError {
    // Input validation / request parsing errors
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),
    #[error("Conflict on {field}: {message}")]
    Conflict { field: String, message: String },

    // Lookups that came back empty
    #[error("Meme not found with ID: {0}")]
    MemeNotFound(i64),
    #[error("User not found: {0}")]
    UserNotFound(String),
    #[error("Token not found for user: {0}")]
    TokenNotFound(String),
    #[error("No memes found")]
    NoMemesFound,
    #[error("Invalid page")]
    InvalidPage,

    #[error("Could not complete database operation")]
    RepositoryError(#[source] RepoError), // Source allows seeing underlying RepoError

    // Configuration / Startup errors
    #[error("Configuration error: {0}")]
    ConfigError(String), // Keep simple string for now
    #[error("Initialization error: {0}")]
    InitError(String),

    // Generic Internal Server Error
    #[error("Internal server error: {0}")]
    InternalServerError(String), // Catch-all or specific internal issues
}

// --- Conversions from Domain Errors to AppError ---

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(Entity::Meme, id) => AppError::MemeNotFound(id),
            RepoError::NotFound(Entity::Template, _) => AppError::Validation(FieldErrors::single(
                "template",
                "Invalid template - object does not exist.",
            )),
            RepoError::Conflict { field } => {
                let message = format!("A user with this {} already exists.", field);
                AppError::Conflict { field, message }
            }
            e => AppError::RepositoryError(e),
        }
    }
}

impl From<crate::config::ConfigError> for AppError {
    fn from(err: crate::config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        AppError::InvalidInput(err.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(err: PathRejection) -> Self {
        AppError::InvalidInput(err.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(err: QueryRejection) -> Self {
        AppError::InvalidInput(err.body_text())
    }
}

// --- Axum Response Implementation ---

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            // 4xx Client Errors
            AppError::Validation(errors) => (StatusCode::BAD_REQUEST, json!(errors.0)),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::Auth(e) => (e.status(), json!({ "non_field_errors": [e.to_string()] })),
            AppError::Conflict { field, message } => {
                (StatusCode::BAD_REQUEST, json!({ field.as_str(): [message] }))
            }
            AppError::MemeNotFound(_) => (StatusCode::NOT_FOUND, json!({ "error": "Meme not found." })),
            AppError::UserNotFound(_) => {
                (StatusCode::NOT_FOUND, json!({ "username": ["User not found."] }))
            }
            AppError::TokenNotFound(_) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Token not found for this user." }),
            ),
            AppError::NoMemesFound => (StatusCode::NOT_FOUND, json!({ "message": "No memes found." })),
            AppError::InvalidPage => (StatusCode::NOT_FOUND, json!({ "detail": "Invalid page." })),

            // 5xx Server Errors
            AppError::RepositoryError(e) => {
                tracing::error!(error.source = ?e, "Repository error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Database operation failed" }))
            }
            AppError::ConfigError(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Server configuration error" }))
            }
            AppError::InitError(msg) => {
                tracing::error!("Initialization error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Server initialization error" }))
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal server error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "An internal server error occurred" }),
                )
            }
        };

        if status.is_server_error() {
            tracing::error!(error.status = %status, error.detail = %self, "Responding with error");
        } else {
            tracing::warn!(error.status = %status, error.detail = %self, "Rejecting request");
        }

        (status, Json(body)).into_response()
    }
}

// Helper macro for creating internal server errors with context
macro_rules! internal_error {
    ($err:expr) => {
        AppError::InternalServerError(format!("{}: {}", std::line!(), $err))
    };
    ($fmt:literal, $($arg:tt)*) => {
        AppError::InternalServerError(format!(concat!("{}: ", $fmt), std::line!(), $($arg)*))
    };
}
// Make macro available in other modules
pub(crate) use internal_error;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn render(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn field_errors_render_per_field() {
        let mut errors = FieldErrors::new();
        errors.add("email", "This field is required.");
        errors.add("password", "This field is required.");
        let (status, body) = render(AppError::Validation(errors)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["email"][0], "This field is required.");
        assert_eq!(body["password"][0], "This field is required.");
    }

    #[tokio::test]
    async fn auth_errors_map_to_distinct_statuses() {
        let (status, body) = render(AuthError::MissingCredentials.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["non_field_errors"][0], "Token or user_id missing");

        let (status, _) = render(AuthError::InvalidToken.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = render(AuthError::TokenUserMismatch.into()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn repo_conflict_becomes_field_error() {
        let err: AppError = RepoError::Conflict { field: "email".into() }.into();
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["email"][0], "A user with this email already exists.");
    }

    #[tokio::test]
    async fn backend_failures_hide_details() {
        let err: AppError = RepoError::BackendError(anyhow::anyhow!("disk I/O error")).into();
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Database operation failed");
    }
}

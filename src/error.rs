/// Application Error Handling
///
/// Every failure in the service maps to `AppError`. Domain failures are
/// grouped in small enums so callers can match on what went wrong, and the
/// HTTP layer turns each of them into the JSON response envelope with a
/// status code and a machine-readable code.
///
/// Authentication failures are deliberately coarse: the client learns the
/// category (no token, rejected token, bad credentials) but never the reason.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

use crate::configuration::Environment;

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Validation errors for input data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyField(String),
    TooShort(String, usize),
    TooLong(String, usize),
    InvalidFormat(String),
    /// Field lacks a required character class ("uppercase letter", "digit", ...)
    MissingCharacter(String, &'static str),
    SuspiciousContent(String),
    /// Body could not be parsed as the expected JSON document
    MalformedBody(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is required", field),
            ValidationError::TooShort(field, min) => {
                write!(f, "{} is too short (minimum {} characters)", field, min)
            }
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {} characters)", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "{} has invalid format", field),
            ValidationError::MissingCharacter(field, class) => {
                write!(f, "{} must contain at least one {}", field, class)
            }
            ValidationError::SuspiciousContent(field) => {
                write!(f, "{} contains suspicious content", field)
            }
            ValidationError::MalformedBody(reason) => {
                write!(f, "malformed request body: {}", reason)
            }
        }
    }
}

impl StdError for ValidationError {}

/// User store errors
#[derive(Debug)]
pub enum DatabaseError {
    UniqueConstraintViolation(String),
    QueryExecution(String),
    ConnectionPool(String),
    UnexpectedError(String),
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseError::UniqueConstraintViolation(msg) => {
                write!(f, "Duplicate entry: {}", msg)
            }
            DatabaseError::QueryExecution(msg) => write!(f, "Query error: {}", msg),
            DatabaseError::ConnectionPool(msg) => write!(f, "Database connection error: {}", msg),
            DatabaseError::UnexpectedError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl StdError for DatabaseError {}

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    MissingRequired(String),
    InvalidValue(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRequired(msg) => write!(f, "Missing required config: {}", msg),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config value: {}", msg),
        }
    }
}

impl StdError for ConfigError {}

/// Authentication and authorization errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown email or wrong password; never says which
    InvalidCredentials,
    /// No bearer credential, or a malformed Authorization header
    NoToken,
    /// Access token presented but rejected
    InvalidToken,
    /// Refresh token failed verification or is no longer registered
    InvalidRefreshToken,
    InsufficientPermissions,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Invalid email or password"),
            AuthError::NoToken => write!(f, "Access token required"),
            AuthError::InvalidToken => write!(f, "Invalid or expired token"),
            AuthError::InvalidRefreshToken => write!(f, "Invalid refresh token"),
            AuthError::InsufficientPermissions => write!(f, "Insufficient permissions"),
        }
    }
}

impl StdError for AuthError {}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

/// Central error type that all application errors map to
#[derive(Debug)]
pub enum AppError {
    /// One or more input violations; all of them are reported to the client
    Validation(Vec<ValidationError>),
    Database(DatabaseError),
    Auth(AuthError),
    Config(ConfigError),
    NotFound(String),
    Internal(String),
}

impl AppError {
    pub fn duplicate_email() -> Self {
        AppError::Database(DatabaseError::UniqueConstraintViolation(
            "Email already registered".to_string(),
        ))
    }

    pub fn user_not_found() -> Self {
        AppError::NotFound("User not found".to_string())
    }

    pub fn is_duplicate_email(&self) -> bool {
        matches!(
            self,
            AppError::Database(DatabaseError::UniqueConstraintViolation(_))
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(errors) => {
                let joined = errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; ");
                write!(f, "Validation failed: {}", joined)
            }
            AppError::Database(e) => write!(f, "{}", e),
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Config(e) => write!(f, "{}", e),
            AppError::NotFound(msg) => write!(f, "{}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

// ============================================================================
// FROM IMPLEMENTATIONS
// ============================================================================

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(vec![err])
    }
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        AppError::Database(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                AppError::duplicate_email()
            }
            sqlx::Error::RowNotFound => AppError::user_not_found(),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                AppError::Database(DatabaseError::ConnectionPool(err.to_string()))
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::ColumnNotFound(_) => {
                AppError::Database(DatabaseError::QueryExecution(err.to_string()))
            }
            other => AppError::Database(DatabaseError::UnexpectedError(other.to_string())),
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("Blocking task failed: {}", err))
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Error body; mirrors the success envelope with `success: false`
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    /// Human-readable error message
    pub message: String,
    /// Error code for client-side handling
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    /// Unique error ID for correlating with server logs
    pub error_id: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, errors: Option<Vec<String>>) -> Self {
        Self {
            success: false,
            message,
            code,
            errors,
            error_id,
        }
    }
}

/// Trait for converting errors to HTTP responses with proper logging
pub trait ErrorHandler {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse);
    fn log_error(&self, request_id: &str);
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Database(DatabaseError::UniqueConstraintViolation(_)) => {
                (StatusCode::CONFLICT, "DUPLICATE_EMAIL")
            }
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            AppError::Auth(e) => match e {
                AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
                AuthError::NoToken => (StatusCode::UNAUTHORIZED, "NO_TOKEN"),
                AuthError::InvalidToken => (StatusCode::FORBIDDEN, "INVALID_TOKEN"),
                AuthError::InvalidRefreshToken => {
                    (StatusCode::UNAUTHORIZED, "INVALID_REFRESH_TOKEN")
                }
                AuthError::InsufficientPermissions => {
                    (StatusCode::FORBIDDEN, "INSUFFICIENT_PERMISSIONS")
                }
            },
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl ErrorHandler for AppError {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse) {
        let (status, code) = self.status_and_code();

        let (message, errors) = match self {
            AppError::Validation(violations) => (
                "Validation failed".to_string(),
                Some(violations.iter().map(|v| v.to_string()).collect()),
            ),
            AppError::Database(DatabaseError::UniqueConstraintViolation(msg)) => {
                (msg.clone(), None)
            }
            AppError::Auth(e) => (e.to_string(), None),
            AppError::NotFound(msg) => (msg.clone(), None),
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => {
                let detail = Environment::current()
                    .is_development()
                    .then(|| vec![self.to_string()]);
                ("Internal server error".to_string(), detail)
            }
        };

        (
            status,
            ErrorResponse::new(request_id.to_string(), message, code.to_string(), errors),
        )
    }

    fn log_error(&self, request_id: &str) {
        match self {
            AppError::Validation(_) => {
                tracing::info!(request_id = request_id, error = %self, "Validation error");
            }
            AppError::Database(DatabaseError::UniqueConstraintViolation(_)) => {
                tracing::warn!(request_id = request_id, error = %self, "Duplicate entry attempt");
            }
            AppError::Auth(e) => {
                tracing::warn!(request_id = request_id, error = %e, "Authentication error");
            }
            AppError::NotFound(msg) => {
                tracing::info!(request_id = request_id, error = %msg, "Resource not found");
            }
            AppError::Database(e) => {
                tracing::error!(request_id = request_id, error = %e, "Database error");
            }
            AppError::Config(e) => {
                tracing::error!(request_id = request_id, error = %e, "Configuration error");
            }
            AppError::Internal(msg) => {
                tracing::error!(request_id = request_id, error = %msg, "Internal error");
            }
        }
    }
}

/// Implement ResponseError for Actix-web integration
impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let request_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&request_id);

        let (status, error_response) = <Self as ErrorHandler>::error_response(self, &request_id);

        HttpResponse::build(status).json(error_response)
    }

    fn status_code(&self) -> StatusCode {
        self.status_and_code().0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::EmptyField("email".to_string());
        assert_eq!(err.to_string(), "email is required");

        let err = ValidationError::MissingCharacter("password".to_string(), "digit");
        assert_eq!(err.to_string(), "password must contain at least one digit");
    }

    #[test]
    fn test_single_validation_error_conversion() {
        let app_err: AppError = ValidationError::InvalidFormat("email".to_string()).into();
        match app_err {
            AppError::Validation(errors) => assert_eq!(errors.len(), 1),
            _ => panic!("Expected Validation error"),
        }
    }

    #[test]
    fn test_status_mapping() {
        let cases = vec![
            (AppError::from(ValidationError::EmptyField("name".to_string())), 400),
            (AppError::duplicate_email(), 409),
            (AppError::Auth(AuthError::InvalidCredentials), 401),
            (AppError::Auth(AuthError::NoToken), 401),
            (AppError::Auth(AuthError::InvalidToken), 403),
            (AppError::Auth(AuthError::InvalidRefreshToken), 401),
            (AppError::Auth(AuthError::InsufficientPermissions), 403),
            (AppError::user_not_found(), 404),
            (AppError::Internal("boom".to_string()), 500),
            (
                AppError::Database(DatabaseError::ConnectionPool("down".to_string())),
                500,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ResponseError::status_code(&err).as_u16(), expected, "{}", err);
        }
    }

    #[test]
    fn test_validation_response_lists_every_violation() {
        let err = AppError::Validation(vec![
            ValidationError::EmptyField("name".to_string()),
            ValidationError::TooShort("password".to_string(), 8),
        ]);
        let (status, body) = ErrorHandler::error_response(&err, "req-1");

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body.success);
        assert_eq!(body.errors.as_ref().map(Vec::len), Some(2));
        assert_eq!(body.error_id, "req-1");
    }

    #[test]
    fn test_internal_detail_hidden_outside_development() {
        // Environment is never installed in unit tests, so production applies.
        let err = AppError::Internal("connection string leaked".to_string());
        let (_, body) = ErrorHandler::error_response(&err, "req-2");

        assert_eq!(body.message, "Internal server error");
        assert!(body.errors.is_none());
    }

    #[test]
    fn test_auth_messages_do_not_leak_reason() {
        let (_, body) = ErrorHandler::error_response(&AppError::Auth(AuthError::InvalidToken), "r");
        assert_eq!(body.message, "Invalid or expired token");
        assert_eq!(body.code, "INVALID_TOKEN");
    }
}

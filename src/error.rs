//! Error handling

use std::path::PathBuf;

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

/// Core error. Every failure reaches the immediate caller as one of these.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or out-of-range field at the boundary
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("failed to load model artifact from {}: {reason}", path.display())]
    ModelLoad { path: PathBuf, reason: String },

    /// Storage backend unreachable
    #[error("storage unavailable: {0}")]
    Connectivity(String),

    /// No pooled connection became free before the acquire timeout
    #[error("timed out waiting for a pooled database connection")]
    PoolExhausted,

    #[error("constraint violation: {0}")]
    Constraint(String),

    /// Missing label or feature column in a training table
    #[error("dataset has the wrong shape: {0}")]
    DataShape(String),

    /// Dataset source could not be fetched or parsed
    #[error("dataset source error: {0}")]
    Dataset(String),

    #[error("database error: {0}")]
    Database(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut => Error::PoolExhausted,
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Error::Connectivity(err.to_string()),
            sqlx::Error::Database(db) => {
                // SQLSTATE 22xxx data exception, 23xxx integrity constraint
                let is_constraint = db
                    .code()
                    .map_or(false, |code| code.starts_with("22") || code.starts_with("23"));
                if is_constraint {
                    Error::Constraint(db.message().to_string())
                } else {
                    Error::Database(err.to_string())
                }
            }
            _ => Error::Database(err.to_string()),
        }
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Dataset(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Dataset(err.to_string())
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;

/// HTTP-facing error
#[derive(Debug)]
pub enum AppError {
    // Validation errors
    ValidationError(String),
    ConstraintViolation(String),

    // Storage errors
    ServiceUnavailable(String),
    DatabaseError(String),

    // Generic errors
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::ConstraintViolation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.as_str()),
            AppError::ServiceUnavailable(msg) => {
                tracing::error!("Storage unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, "Storage temporarily unavailable")
            }
            AppError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error occurred")
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(msg) => AppError::ValidationError(msg),
            Error::Constraint(msg) => AppError::ConstraintViolation(msg),
            Error::PoolExhausted | Error::Connectivity(_) => {
                AppError::ServiceUnavailable(err.to_string())
            }
            Error::Database(msg) => AppError::DatabaseError(msg),
            other => AppError::InternalError(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::ValidationError(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    use sqlx::error::{DatabaseError, ErrorKind};

    /// Driver error carrying only a SQLSTATE code.
    #[derive(Debug)]
    struct StateError(&'static str);

    impl fmt::Display for StateError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "sqlstate {}", self.0)
        }
    }

    impl StdError for StateError {}

    impl DatabaseError for StateError {
        fn message(&self) -> &str {
            "rejected by database"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.0))
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    fn status_of(err: Error) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn test_pool_timeout_is_exhaustion() {
        let err = Error::from(sqlx::Error::PoolTimedOut);

        assert!(matches!(err, Error::PoolExhausted));
        assert_eq!(status_of(err), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_unreachable_backend_is_connectivity() {
        let io = sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        for err in [io, sqlx::Error::PoolClosed] {
            let err = Error::from(err);
            assert!(matches!(err, Error::Connectivity(_)));
            assert_eq!(status_of(err), StatusCode::SERVICE_UNAVAILABLE);
        }
    }

    #[test]
    fn test_data_and_integrity_states_are_constraint() {
        // 22P02 invalid text representation, 23505 unique, 23514 check
        for code in ["22P02", "23505", "23514"] {
            let err = Error::from(sqlx::Error::from(StateError(code)));
            assert!(matches!(err, Error::Constraint(_)), "{}", code);
            assert_eq!(status_of(err), StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    #[test]
    fn test_other_database_states_are_internal() {
        // 40P01 deadlock detected
        let err = Error::from(sqlx::Error::from(StateError("40P01")));

        assert!(matches!(err, Error::Database(_)));
        assert_eq!(status_of(err), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validation_and_internal_statuses() {
        assert_eq!(
            status_of(Error::Validation("Age out of range".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(Error::DataShape("missing column".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

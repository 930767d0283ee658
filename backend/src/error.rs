use actix_web::{HttpResponse, ResponseError};
use safari_booking_shared::BookingStatus;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Only {remaining} spots remain for this date (requested {requested})")]
    InsufficientCapacity { requested: i32, remaining: i32 },

    #[error("Cannot {action} a booking in status '{from}'")]
    InvalidTransition {
        from: BookingStatus,
        action: &'static str,
    },

    #[error("Transient failure: {0}")]
    Transient(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Postgres error codes the booking service retries: serialization failure,
/// deadlock detected, lock not available.
const TRANSIENT_SQLSTATE: [&str; 3] = ["40001", "40P01", "55P03"];

/// Whether a database error is a transient contention failure worth a
/// bounded retry rather than an immediate 500.
pub fn is_transient_db_error(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db) => db
            .code()
            .map(|code| TRANSIENT_SQLSTATE.contains(&code.as_ref()))
            .unwrap_or(false),
        sqlx::Error::PoolTimedOut => true,
        _ => false,
    }
}

/// Whether a database error is a unique-constraint violation (used for
/// booking-reference collision retry).
pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db) => db.code().map(|code| code == "23505").unwrap_or(false),
        _ => false,
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Validation(msg) => HttpResponse::BadRequest().json(ErrorResponse {
                error: "validation_error".to_string(),
                message: msg.clone(),
            }),
            AppError::Authentication(msg) => HttpResponse::Unauthorized().json(ErrorResponse {
                error: "authentication_error".to_string(),
                message: msg.clone(),
            }),
            AppError::Authorization(msg) => HttpResponse::Forbidden().json(ErrorResponse {
                error: "authorization_error".to_string(),
                message: msg.clone(),
            }),
            AppError::NotFound(msg) => HttpResponse::NotFound().json(ErrorResponse {
                error: "not_found".to_string(),
                message: msg.clone(),
            }),
            AppError::InsufficientCapacity { .. } => HttpResponse::Conflict().json(ErrorResponse {
                error: "insufficient_capacity".to_string(),
                message: self.to_string(),
            }),
            AppError::InvalidTransition { .. } => HttpResponse::Conflict().json(ErrorResponse {
                error: "invalid_transition".to_string(),
                message: self.to_string(),
            }),
            AppError::Transient(_) => HttpResponse::ServiceUnavailable().json(ErrorResponse {
                error: "transient_failure".to_string(),
                message: "The service is busy, please try again".to_string(),
            }),
            _ => HttpResponse::InternalServerError().json(ErrorResponse {
                error: "internal_server_error".to_string(),
                message: "An internal server error occurred".to_string(),
            }),
        }
    }
}

#[derive(serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn capacity_error_maps_to_conflict() {
        let err = AppError::InsufficientCapacity {
            requested: 7,
            remaining: 2,
        };
        assert_eq!(err.error_response().status(), StatusCode::CONFLICT);
        assert!(err.to_string().contains("2 spots remain"));
    }

    #[test]
    fn transition_error_maps_to_conflict() {
        let err = AppError::InvalidTransition {
            from: BookingStatus::Cancelled,
            action: "cancel",
        };
        assert_eq!(err.error_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn transient_error_hides_detail() {
        let err = AppError::Transient("lock timeout on tour_availability".to_string());
        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn pool_timeout_is_transient() {
        assert!(is_transient_db_error(&sqlx::Error::PoolTimedOut));
        assert!(!is_transient_db_error(&sqlx::Error::RowNotFound));
    }
}

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::model::payroll::BillingPeriod;

/// Errors raised by the data-access layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique key (one session per day, one open session per employee)
    /// rejected the write.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("invalid stored value: {0}")]
    Decode(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return StoreError::UniqueViolation(db_err.message().to_string());
            }
        }
        StoreError::Database(e)
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or out-of-range input, or a clock event the current
    /// attendance state does not allow.
    #[error("{0}")]
    Validation(String),

    /// Illegal leave transition for the acting role and current status.
    #[error("{0}")]
    Authorization(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// The row changed between read and write.
    #[error("{0}")]
    Conflict(String),

    #[error("No attendance data for employee {employee_id} in {period}")]
    NoAttendanceData {
        employee_id: u64,
        period: BillingPeriod,
    },

    #[error("{0}")]
    External(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn authorization(msg: impl Into<String>) -> Self {
        AppError::Authorization(msg.into())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Authorization(_) | AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) | AppError::NoAttendanceData { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::External(_) => StatusCode::BAD_GATEWAY,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::Store(e) => {
                tracing::error!(error = %e, "Store operation failed");
                json!({ "message": "Internal Server Error" })
            }
            AppError::NoAttendanceData { employee_id, period } => json!({
                "message": self.to_string(),
                "code": "no_attendance_data",
                "employee_id": employee_id,
                "period": period.to_string(),
            }),
            other => json!({ "message": other.to_string() }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let err = AppError::validation("Latitude and longitude are required");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn no_attendance_data_is_distinct_from_other_not_found() {
        let err = AppError::NoAttendanceData {
            employee_id: 7,
            period: BillingPeriod::new(2026, 2).unwrap(),
        };
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            err.to_string(),
            "No attendance data for employee 7 in 2026-02"
        );
    }

    #[derive(Debug)]
    struct DbError {
        code: &'static str,
        duplicate_key: bool,
    }

    impl std::fmt::Display for DbError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "db error {}", self.code)
        }
    }

    impl std::error::Error for DbError {}

    impl sqlx::error::DatabaseError for DbError {
        fn message(&self) -> &str {
            "db error"
        }

        fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
            Some(self.code.into())
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            if self.duplicate_key {
                sqlx::error::ErrorKind::UniqueViolation
            } else {
                sqlx::error::ErrorKind::ForeignKeyViolation
            }
        }
    }

    fn db(code: &'static str, duplicate_key: bool) -> sqlx::Error {
        sqlx::Error::Database(Box::new(DbError { code, duplicate_key }))
    }

    #[test]
    fn only_duplicate_keys_become_unique_violations() {
        let dup = StoreError::from(db("23000", true));
        assert!(matches!(dup, StoreError::UniqueViolation(_)));

        // same SQLSTATE, different integrity failure
        let fk = StoreError::from(db("23000", false));
        assert!(matches!(fk, StoreError::Database(_)));
    }
}


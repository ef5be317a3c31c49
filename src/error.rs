use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::{Display, Error};
use serde_json::json;

/// Every failure a handler can report. Validation variants carry the stable
/// client-facing message; `Store` wraps infrastructure failures, which are
/// logged and surfaced as a generic 500 without internal detail.
#[derive(Debug, Display, Error)]
pub enum ApiError {
    #[display(fmt = "{}", _0)]
    Unauthenticated(#[error(not(source))] &'static str),

    #[display(fmt = "{}", _0)]
    Unauthorized(#[error(not(source))] &'static str),

    #[display(fmt = "Already clocked in today")]
    AlreadyClockedIn,

    #[display(fmt = "Already clocked out today")]
    AlreadyClockedOut,

    #[display(fmt = "No clock in record found for today")]
    NoClockInFound,

    #[display(fmt = "End date must be after start date")]
    InvalidDateRange,

    #[display(fmt = "Cannot request leave for past dates")]
    PastDateLeave,

    #[display(fmt = "You have overlapping leave requests")]
    OverlappingLeaveRequest,

    #[display(fmt = "Leave request not found")]
    RequestNotFound,

    #[display(fmt = "Leave request already processed")]
    RequestAlreadyProcessed,

    #[display(fmt = "Clock-in conflict, please retry")]
    ConcurrentClockInConflict,

    #[display(fmt = "{}", _0)]
    Validation(#[error(not(source))] String),

    #[display(fmt = "{}", _0)]
    Conflict(#[error(not(source))] &'static str),

    #[display(fmt = "Internal server error")]
    Internal,

    #[display(fmt = "Internal server error")]
    Store(#[error(source)] sqlx::Error),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Unauthorized(_) => StatusCode::FORBIDDEN,
            ApiError::RequestNotFound => StatusCode::NOT_FOUND,
            ApiError::ConcurrentClockInConflict | ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal | ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Store(e) = self {
            tracing::error!(error = %e, "database failure");
        }
        HttpResponse::build(self.status_code()).json(json!({ "message": self.to_string() }))
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Store(e)
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        tracing::error!(error = %e, "token encoding failure");
        ApiError::Internal
    }
}

/// MySQL reports unique-key violations as SQLSTATE 23000. Clock-in relies on
/// this to detect a racing insert on (user_id, date); signup uses it for the
/// email / employee code uniqueness constraints.
pub fn is_duplicate_key(e: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = e {
        return db_err.code().as_deref() == Some("23000");
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            ApiError::Unauthenticated("Authorization token required").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Unauthorized("Admin access required").status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(ApiError::AlreadyClockedIn.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::RequestNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::ConcurrentClockInConflict.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Store(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn store_failures_never_leak_detail() {
        let err = ApiError::Store(sqlx::Error::PoolTimedOut);
        assert_eq!(err.to_string(), "Internal server error");
    }

    #[test]
    fn messages_are_stable() {
        assert_eq!(ApiError::AlreadyClockedIn.to_string(), "Already clocked in today");
        assert_eq!(
            ApiError::OverlappingLeaveRequest.to_string(),
            "You have overlapping leave requests"
        );
        assert_eq!(
            ApiError::RequestAlreadyProcessed.to_string(),
            "Leave request already processed"
        );
    }
}

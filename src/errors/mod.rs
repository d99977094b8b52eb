//! Error handling module for the developer portal backend.
//!
//! Every service returns [`AppError`]; the HTTP layer only maps kinds to status codes and the
//! error envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const OUTAGE_CALL_NOT_FOUND: &str = "OUTAGE_CALL_NOT_FOUND";
    pub const MEMBER_NOT_FOUND: &str = "MEMBER_NOT_FOUND";
    pub const TEAM_NOT_FOUND: &str = "TEAM_NOT_FOUND";
    pub const COMPONENT_NOT_FOUND: &str = "COMPONENT_NOT_FOUND";
    pub const MEMBER_ALREADY_ASSIGNED: &str = "MEMBER_ALREADY_ASSIGNED";
    pub const MEMBER_NOT_ASSIGNED: &str = "MEMBER_NOT_ASSIGNED";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const STORE_ERROR: &str = "STORE_ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Application error type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppError {
    #[error("outage call {0} not found")]
    OutageCallNotFound(Uuid),
    #[error("member {0} not found")]
    MemberNotFound(Uuid),
    #[error("team {0} not found")]
    TeamNotFound(Uuid),
    #[error("component {0} not found")]
    ComponentNotFound(Uuid),
    #[error("member {member_id} is already assigned to outage call {outage_call_id}")]
    MemberAlreadyAssigned { outage_call_id: Uuid, member_id: Uuid },
    #[error("member {member_id} is not assigned to outage call {outage_call_id}")]
    MemberNotAssigned { outage_call_id: Uuid, member_id: Uuid },
    /// Malformed or missing input fields
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    BadRequest(String),
    /// Any persistence failure that is not classified more precisely
    #[error("store failure: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::OutageCallNotFound(_)
            | AppError::MemberNotFound(_)
            | AppError::TeamNotFound(_)
            | AppError::ComponentNotFound(_)
            | AppError::MemberNotAssigned { .. } => StatusCode::NOT_FOUND,
            AppError::MemberAlreadyAssigned { .. } => StatusCode::CONFLICT,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::OutageCallNotFound(_) => codes::OUTAGE_CALL_NOT_FOUND,
            AppError::MemberNotFound(_) => codes::MEMBER_NOT_FOUND,
            AppError::TeamNotFound(_) => codes::TEAM_NOT_FOUND,
            AppError::ComponentNotFound(_) => codes::COMPONENT_NOT_FOUND,
            AppError::MemberAlreadyAssigned { .. } => codes::MEMBER_ALREADY_ASSIGNED,
            AppError::MemberNotAssigned { .. } => codes::MEMBER_NOT_ASSIGNED,
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::Unauthorized(_) => codes::UNAUTHORIZED,
            AppError::BadRequest(_) => codes::BAD_REQUEST,
            AppError::Store(_) => codes::STORE_ERROR,
            AppError::Internal(_) => codes::INTERNAL_ERROR,
        }
    }

    pub fn details(&self) -> ErrorDetails {
        ErrorDetails {
            code: self.error_code().to_string(),
            message: self.to_string(),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        AppError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        AppError::BadRequest(format!("JSON error: {}", err))
    }
}

/// Error details in the response envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        Self {
            success: false,
            error: error.details(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(ErrorResponse::new(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_kinds_map_to_404() {
        let id = Uuid::new_v4();
        for err in [
            AppError::OutageCallNotFound(id),
            AppError::MemberNotFound(id),
            AppError::TeamNotFound(id),
            AppError::ComponentNotFound(id),
            AppError::MemberNotAssigned {
                outage_call_id: id,
                member_id: id,
            },
        ] {
            assert_eq!(err.status_code(), StatusCode::NOT_FOUND, "{err}");
        }
    }

    #[test]
    fn test_conflict_and_validation_codes() {
        let err = AppError::MemberAlreadyAssigned {
            outage_call_id: Uuid::nil(),
            member_id: Uuid::nil(),
        };
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.error_code(), codes::MEMBER_ALREADY_ASSIGNED);

        let err = AppError::Validation("name is required".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.details().message, "name is required");
    }

    #[test]
    fn test_store_failure_is_500() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), codes::STORE_ERROR);
    }
}

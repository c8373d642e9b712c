//! Error types shared by the stores, services and handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::auth::session::Flash;

/// Failures surfaced by the credential and appointment stores.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A unique column (user email) already holds this value.
    #[error("record already exists")]
    Uniqueness,

    #[error("record not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Classify a raw insert failure, lifting constraint violations.
    pub fn from_insert(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Uniqueness,
            _ => StoreError::Database(e),
        }
    }
}

/// Errors a request can end in.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed or missing form input.
    #[error("{0}")]
    Validation(String),

    #[error("Email already registered")]
    EmailTaken,

    /// Unknown email and wrong password share this variant.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Not found")]
    NotFound,

    #[error("Access denied")]
    AccessDenied,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Uniqueness => AppError::EmailTaken,
            StoreError::NotFound => AppError::NotFound,
            StoreError::Database(e) => AppError::Internal(e.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::EmailTaken => StatusCode::CONFLICT,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::NotFound => {
                return (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
                    .into_response();
            }
            AppError::AccessDenied => return Redirect::to("/").into_response(),
            AppError::Internal(e) => {
                error!(error = %e, "request failed");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response();
            }
        };

        let body = Json(json!({ "flashes": [Flash::danger(self.to_string())] }));
        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_request_errors() {
        assert!(matches!(AppError::from(StoreError::Uniqueness), AppError::EmailTaken));
        assert!(matches!(AppError::from(StoreError::NotFound), AppError::NotFound));
        assert!(matches!(
            AppError::from(StoreError::Database(sqlx::Error::RowNotFound)),
            AppError::Internal(_)
        ));
    }

    #[test]
    fn status_codes_follow_error_kind() {
        let cases = [
            (AppError::Validation("bad date".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (AppError::EmailTaken, StatusCode::CONFLICT),
            (AppError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AppError::NotFound, StatusCode::NOT_FOUND),
            (AppError::AccessDenied, StatusCode::SEE_OTHER),
            (AppError::Internal(anyhow::anyhow!("boom")), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}

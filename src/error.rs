use actix_web::{http::StatusCode, HttpResponse, ResponseError};

use crate::jsonwebtoken::errors::Error as JsonWebTokenError;
use crate::thiserror::Error as ThisError;

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("database error: {0}")]
    DatabaseError(sqlx::Error),

    #[error("{0}")]
    Duplicate(String),

    #[error("invalid configuration: {0}")]
    ConfigError(String),

    #[error("jwt error")]
    JWTError(#[from] JsonWebTokenError),

    #[error("bussiness error: {0}")]
    BusinessError(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("record not found".into()),
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => Error::Duplicate(duplicate_message(db_err.message())),
            err => Error::DatabaseError(err),
        }
    }
}

/// Turns a unique-constraint violation into something a person can act on.
pub fn duplicate_message(backend_message: &str) -> String {
    if backend_message.to_lowercase().contains("receipt") {
        "a record with this receipt number already exists".into()
    } else {
        "a record with the same values already exists".into()
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Duplicate(_) => StatusCode::CONFLICT,
            Error::BusinessError(_) => StatusCode::BAD_REQUEST,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Unauthorized | Error::JWTError(_) => StatusCode::UNAUTHORIZED,
            Error::DatabaseError(_) | Error::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_server_error() {
            log::error!("{}", self);
            "internal server error".to_owned()
        } else {
            log::debug!("request rejected: {}", self);
            self.to_string()
        };
        HttpResponse::build(status).json(serde_json::json!({ "error": message }))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_duplicate_receipt_message() {
        let msg = duplicate_message(r#"duplicate key value violates unique constraint "income_receipt_number_key""#);
        assert_eq!(msg, "a record with this receipt number already exists");
    }

    #[test]
    fn test_duplicate_generic_message() {
        let msg = duplicate_message(r#"duplicate key value violates unique constraint "user_branches_pkey""#);
        assert_eq!(msg, "a record with the same values already exists");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::Duplicate("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(Error::BusinessError("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::Forbidden("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(Error::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(Error::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_row_not_found_becomes_not_found() {
        let err: Error = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, Error::NotFound(_)));
    }
}

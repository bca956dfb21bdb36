//! Use cases sitting between the HTTP handlers and the query layer.
//!
//! Every operation that depends on who is asking takes an explicit
//! `Identity`; nothing here reads cookies or request state.

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

pub mod account_service;
pub mod auth_service;
pub mod pagination;
pub mod portfolio_service;
pub mod tag_reconciler;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Password hashing failed: {0}")]
    PasswordHashing(String),
    #[error("Token creation failed: {0}")]
    TokenCreation(String),
    #[error("Database error: {0}")]
    Db(#[from] DbErr),
}

/// Maps a unique constraint violation to `Conflict` with `message`; any
/// other database error passes through.
pub(crate) fn conflict_on_unique(err: DbErr, message: &str) -> ServiceError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => ServiceError::Conflict(message.to_string()),
        _ => ServiceError::Db(err),
    }
}

/// Trims a form field and turns an empty result into `None`.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trims a required form field, rejecting it when blank.
pub(crate) fn required(value: &str, field: &str) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::InvalidInput(format!("{field} is required.")));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_drops_blank_values() {
        assert_eq!(non_empty(Some("  ".into())), None);
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some(" x ".into())), Some("x".to_string()));
    }

    #[test]
    fn test_other_db_errors_are_not_conflicts() {
        let err = conflict_on_unique(DbErr::Custom("boom".into()), "taken");
        assert!(matches!(err, ServiceError::Db(DbErr::Custom(_))));
    }

    #[test]
    fn test_required_rejects_blank() {
        assert!(matches!(required(" ", "Title"), Err(ServiceError::InvalidInput(_))));
        assert_eq!(required(" Title ", "Title").unwrap(), "Title");
    }
}

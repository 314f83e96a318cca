//! Use-case orchestration between forms, the engine and the repository.

use thiserror::Error;

use crate::forms::FormError;
use crate::repository::errors::RepositoryError;

pub mod search;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Offending inbound fields, by wire name.
    #[error("validation failed for: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("type constraint violated: {0}")]
    TypeConstraint(String),

    #[error("not found")]
    NotFound,

    #[error("repository error: {0}")]
    Repository(RepositoryError),

    #[error("deadline exceeded")]
    Timeout,

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ServiceError::NotFound,
            other => ServiceError::Repository(other),
        }
    }
}

impl From<FormError> for ServiceError {
    fn from(err: FormError) -> Self {
        match err {
            FormError::InvalidFields(fields) => ServiceError::Validation(fields),
        }
    }
}

//! Model error types.

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Invalid role: {0}")]
    InvalidRole(String),
}

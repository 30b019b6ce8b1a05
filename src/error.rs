//! Error types for todo-api

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A required field was missing or the input could not be accepted.
    #[error("{0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Error::Store(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

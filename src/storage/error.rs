//! Storage-layer errors.

use thiserror::Error;

use crate::error::{ErrorKind, MemoryError};

#[derive(Debug, Error, Clone)]
pub enum StorageError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("category name already exists in scope: {0}")]
    DuplicateCategoryName(String),

    #[error("scope mismatch: {0}")]
    ScopeMismatch(String),

    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<StorageError> for MemoryError {
    fn from(e: StorageError) -> Self {
        let kind = match &e {
            StorageError::InvalidFilter(_) => ErrorKind::InvalidFilter,
            StorageError::BackendUnavailable(_) => ErrorKind::BackendUnavailable,
            StorageError::NotFound(_)
            | StorageError::DimensionMismatch { .. }
            | StorageError::DuplicateCategoryName(_)
            | StorageError::ScopeMismatch(_)
            | StorageError::Serialization(_) => ErrorKind::InvalidInput,
        };
        MemoryError::new(kind, e.to_string())
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::BackendUnavailable(e.to_string())
    }
}

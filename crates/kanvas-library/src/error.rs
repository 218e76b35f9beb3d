//! Error types for kanvas-library

use kanvas_core::BookId;
use thiserror::Error;

/// Library error type
#[derive(Debug, Error)]
pub enum Error {
    /// Book not found
    #[error("Book not found: {0}")]
    BookNotFound(BookId),

    /// Import data rejected before anything was applied
    #[error("Invalid import data: {0}")]
    InvalidImport(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Core error
    #[error("core error: {0}")]
    Core(#[from] kanvas_core::Error),
}

/// Result type for library operations
pub type Result<T> = std::result::Result<T, Error>;

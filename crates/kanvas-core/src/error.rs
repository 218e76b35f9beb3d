//! Error types for kanvas-core

use crate::AssetId;
use thiserror::Error;

/// Core error type
///
/// Low-level store mutations never produce these: an unknown id there is a
/// no-op. Errors come from the validated tree operations, image intake and
/// configuration loading.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Asset not found: {0}")]
    AssetNotFound(AssetId),

    #[error("Invalid target parent: {0} does not exist")]
    InvalidTarget(AssetId),

    #[error("Cannot move asset {asset} to {target}: would create circular reference")]
    CircularReference { asset: AssetId, target: AssetId },

    #[error("Unsupported image type: {0}")]
    UnsupportedImageType(String),

    #[error("Image too large: {size} bytes (max {max})")]
    ImageTooLarge { size: usize, max: usize },

    #[error("Invalid image data: {0}")]
    InvalidImageData(String),

    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

//! RON configuration for kanvas
//!
//! Every section has defaults, so a config file only needs the keys it
//! overrides:
//!
//! ```
//! use kanvas_core::KanvasConfig;
//!
//! let config = KanvasConfig::from_ron_str("(images: (max_bytes: 1024))").unwrap();
//! assert_eq!(config.images.max_bytes, 1024);
//! assert_eq!(config.assets.min_width, 100.0);
//! ```

use crate::geometry::Point;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct KanvasConfig {
    /// Asset creation defaults and size limits
    #[serde(default)]
    pub assets: AssetDefaults,
    /// Image upload limits
    #[serde(default)]
    pub images: ImageLimits,
    /// Save queue behaviour
    #[serde(default)]
    pub autosave: AutosaveConfig,
    /// Initial canvas view of an empty world
    #[serde(default)]
    pub canvas: CanvasDefaults,
}

/// Asset size defaults
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AssetDefaults {
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
    /// Resize floor for width
    #[serde(default = "default_min_width")]
    pub min_width: f64,
    /// Resize floor for height
    #[serde(default = "default_min_height")]
    pub min_height: f64,
    #[serde(default = "default_grid_size")]
    pub grid_size: f64,
}

fn default_width() -> f64 {
    200.0
}

fn default_height() -> f64 {
    150.0
}

fn default_min_width() -> f64 {
    100.0
}

fn default_min_height() -> f64 {
    80.0
}

fn default_grid_size() -> f64 {
    40.0
}

impl Default for AssetDefaults {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            min_width: default_min_width(),
            min_height: default_min_height(),
            grid_size: default_grid_size(),
        }
    }
}

/// Accepted image uploads
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ImageLimits {
    /// Maximum payload size in bytes
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
    /// Accepted MIME types
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
}

fn default_max_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_allowed_types() -> Vec<String> {
    ["image/jpeg", "image/png", "image/gif", "image/webp"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ImageLimits {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
            allowed_types: default_allowed_types(),
        }
    }
}

impl ImageLimits {
    /// Check whether a MIME type is accepted (case-insensitive)
    pub fn allows(&self, mime: &str) -> bool {
        self.allowed_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(mime))
    }
}

/// Save queue configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AutosaveConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Quiet period after the last change before a flush is due
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_debounce_ms() -> u64 {
    500
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// Canvas view of a freshly created or cleared world
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CanvasDefaults {
    #[serde(default = "default_offset")]
    pub offset: Point,
    #[serde(default = "default_scale")]
    pub scale: f64,
}

fn default_offset() -> Point {
    Point::new(-45.0, -20.0)
}

fn default_scale() -> f64 {
    1.0
}

impl Default for CanvasDefaults {
    fn default() -> Self {
        Self {
            offset: default_offset(),
            scale: default_scale(),
        }
    }
}

impl KanvasConfig {
    /// Load configuration from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_ron_str(&content)
    }

    /// Parse configuration from a RON string
    pub fn from_ron_str(content: &str) -> Result<Self> {
        let config: KanvasConfig =
            ron::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.assets.min_width <= 0.0 || self.assets.min_height <= 0.0 {
            return Err(Error::Config(
                "minimum asset size must be positive".to_string(),
            ));
        }
        if self.canvas.scale <= 0.0 {
            return Err(Error::Config("canvas scale must be positive".to_string()));
        }
        Ok(())
    }
}

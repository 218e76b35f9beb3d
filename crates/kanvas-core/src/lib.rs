//! Kanvas Core - Data model of the nested canvas
//!
//! This crate holds everything a single world is made of:
//! - Assets arranged in a parent/child tree (`AssetRegistry`)
//! - Coordinate conversions between global, local and screen space
//! - Custom fields, both per asset and world-wide
//! - Tags and the tag filter (`TagStore`)
//! - Tree views and entered-viewport navigation
//!
//! Stores never persist themselves. Each one exposes a `revision()` counter
//! that a host compares against its last save to decide when to write.
//!
//! ```
//! use kanvas_core::{AssetKind, AssetRegistry, NewAsset};
//!
//! let mut registry = AssetRegistry::new();
//! let castle = registry.create(NewAsset::new("Castle", AssetKind::Other), None);
//! let hall = registry.create(NewAsset::new("Great Hall", AssetKind::Other), Some(&castle));
//!
//! assert_eq!(registry.get(&castle).unwrap().children(), &[hall.clone()]);
//! assert_eq!(registry.get(&hall).unwrap().parent_id(), Some(&castle));
//! ```

mod asset;
pub mod config;
mod error;
mod field;
pub mod geometry;
mod identity;
mod image;
mod navigator;
mod registry;
mod tag;
pub mod time;
pub mod tree;

pub use asset::{
    Asset, AssetKind, AssetPatch, BackgroundConfig, BorderShape, DisplaySettingsPatch, NewAsset,
    ViewportDisplaySettings,
};
pub use config::{AssetDefaults, AutosaveConfig, CanvasDefaults, ImageLimits, KanvasConfig};
pub use error::{Error, Result};
pub use field::{
    CustomField, CustomFieldType, CustomFieldValue, FieldPatch, FieldValue, GlobalCustomField,
    NewField,
};
pub use geometry::{Point, Size, ViewportConfig};
pub use identity::{AssetId, BookId, FieldId, TagId};
pub use image::ImageData;
pub use navigator::Navigator;
pub use registry::{AssetRegistry, CanvasView, IntegrityIssue};
pub use tag::{Tag, TagPatch, TagStore, TAG_COLORS};
pub use time::{now_millis, Timestamp};
pub use tree::{flatten, AssetNode, AssetTree};

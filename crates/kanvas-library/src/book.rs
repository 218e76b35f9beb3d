//! Books and their world snapshots
//!
//! A book is one world: display metadata plus a `worldData` snapshot of the
//! asset registry and tag store. The snapshot is the persisted form; the live
//! stores only hold the world of the current book.

use indexmap::IndexMap;
use kanvas_core::{
    now_millis, Asset, AssetId, AssetRegistry, BookId, CanvasDefaults, CanvasView,
    GlobalCustomField, Point, Tag, TagId, TagStore, Timestamp,
};
use serde::{Deserialize, Serialize};

/// Full snapshot of one world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldData {
    #[serde(default)]
    pub assets: IndexMap<AssetId, Asset>,
    #[serde(default)]
    pub tags: IndexMap<TagId, Tag>,
    /// Asset to tag associations
    #[serde(default)]
    pub asset_tags: IndexMap<AssetId, Vec<TagId>>,
    #[serde(default)]
    pub global_custom_fields: Vec<GlobalCustomField>,
    #[serde(default = "default_offset")]
    pub viewport_offset: Point,
    #[serde(default = "default_scale")]
    pub viewport_scale: f64,
}

fn default_offset() -> Point {
    CanvasDefaults::default().offset
}

fn default_scale() -> f64 {
    CanvasDefaults::default().scale
}

impl Default for WorldData {
    fn default() -> Self {
        Self::empty(&CanvasDefaults::default())
    }
}

impl WorldData {
    /// An empty world with the given canvas view
    pub fn empty(canvas: &CanvasDefaults) -> Self {
        Self {
            assets: IndexMap::new(),
            tags: IndexMap::new(),
            asset_tags: IndexMap::new(),
            global_custom_fields: Vec::new(),
            viewport_offset: canvas.offset,
            viewport_scale: canvas.scale,
        }
    }

    /// Snapshot the live stores
    pub fn capture(registry: &AssetRegistry, tags: &TagStore) -> Self {
        let view = registry.view();
        Self {
            assets: registry.assets().clone(),
            tags: tags.tags().clone(),
            asset_tags: tags.asset_tags().clone(),
            global_custom_fields: registry.global_fields().to_vec(),
            viewport_offset: view.offset,
            viewport_scale: view.scale,
        }
    }

    /// Replace the live stores' content with this snapshot
    pub fn load_into(self, registry: &mut AssetRegistry, tags: &mut TagStore) {
        registry.restore(
            self.assets,
            self.global_custom_fields,
            CanvasView {
                offset: self.viewport_offset,
                scale: self.viewport_scale,
            },
        );
        tags.restore(self.tags, self.asset_tags);
    }
}

/// Shallow-merge update of a world snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldDataPatch {
    pub assets: Option<IndexMap<AssetId, Asset>>,
    pub tags: Option<IndexMap<TagId, Tag>>,
    pub asset_tags: Option<IndexMap<AssetId, Vec<TagId>>>,
    pub global_custom_fields: Option<Vec<GlobalCustomField>>,
    pub viewport_offset: Option<Point>,
    pub viewport_scale: Option<f64>,
}

impl WorldDataPatch {
    pub(crate) fn apply_to(self, world: &mut WorldData) {
        if let Some(v) = self.assets {
            world.assets = v;
        }
        if let Some(v) = self.tags {
            world.tags = v;
        }
        if let Some(v) = self.asset_tags {
            world.asset_tags = v;
        }
        if let Some(v) = self.global_custom_fields {
            world.global_custom_fields = v;
        }
        if let Some(v) = self.viewport_offset {
            world.viewport_offset = v;
        }
        if let Some(v) = self.viewport_scale {
            world.viewport_scale = v;
        }
    }
}

/// A patch that replaces every part of the snapshot
impl From<WorldData> for WorldDataPatch {
    fn from(world: WorldData) -> Self {
        Self {
            assets: Some(world.assets),
            tags: Some(world.tags),
            asset_tags: Some(world.asset_tags),
            global_custom_fields: Some(world.global_custom_fields),
            viewport_offset: Some(world.viewport_offset),
            viewport_scale: Some(world.viewport_scale),
        }
    }
}

/// A world with its cover metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Image URL or data URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    pub color: String,
    /// CSS gradient for the cover
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(default)]
    pub world_data: WorldData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
}

impl Book {
    pub fn asset_count(&self) -> usize {
        self.world_data.assets.len()
    }

    pub fn tag_count(&self) -> usize {
        self.world_data.tags.len()
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = now_millis();
    }
}

/// Input for [`BookStore::create_book`](crate::BookStore::create_book)
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub color: String,
    pub gradient: Option<String>,
    /// `None` starts an empty world
    pub world_data: Option<WorldData>,
    pub is_default: Option<bool>,
}

impl NewBook {
    /// A book with the first cover preset
    pub fn new(title: impl Into<String>) -> Self {
        let preset = &default_cover_presets()[0];
        Self {
            title: title.into(),
            description: None,
            cover_image: None,
            color: preset.color.clone(),
            gradient: preset.gradient.clone(),
            world_data: None,
            is_default: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Take colour and gradient from a cover preset
    pub fn with_preset(mut self, preset: &BookCoverPreset) -> Self {
        self.color = preset.color.clone();
        self.gradient = preset.gradient.clone();
        self
    }

    pub fn with_world(mut self, world: WorldData) -> Self {
        self.world_data = Some(world);
        self
    }
}

/// Shallow-merge update of a book's metadata
///
/// Nested options clear a value with `Some(None)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub cover_image: Option<Option<String>>,
    pub color: Option<String>,
    pub gradient: Option<Option<String>>,
    pub world_data: Option<WorldData>,
    pub is_default: Option<Option<bool>>,
}

impl BookPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub(crate) fn apply_to(self, book: &mut Book) {
        if let Some(v) = self.title {
            book.title = v;
        }
        if let Some(v) = self.description {
            book.description = v;
        }
        if let Some(v) = self.cover_image {
            book.cover_image = v;
        }
        if let Some(v) = self.color {
            book.color = v;
        }
        if let Some(v) = self.gradient {
            book.gradient = v;
        }
        if let Some(v) = self.world_data {
            book.world_data = v;
        }
        if let Some(v) = self.is_default {
            book.is_default = v;
        }
    }
}

/// A named cover style
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookCoverPreset {
    pub id: String,
    pub name: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl BookCoverPreset {
    fn new(id: &str, name: &str, from: &str, to: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            color: from.to_string(),
            gradient: Some(format!("linear-gradient(135deg, {}, {})", from, to)),
            pattern: None,
        }
    }
}

/// The built-in cover styles
pub fn default_cover_presets() -> Vec<BookCoverPreset> {
    vec![
        BookCoverPreset::new("cosmic-blue", "Cosmic Blue", "#3b82f6", "#8b5cf6"),
        BookCoverPreset::new("emerald-green", "Emerald Green", "#10b981", "#06b6d4"),
        BookCoverPreset::new("royal-purple", "Royal Purple", "#8b5cf6", "#ec4899"),
        BookCoverPreset::new("sunset-orange", "Sunset Orange", "#f97316", "#ef4444"),
        BookCoverPreset::new("midnight-dark", "Midnight Dark", "#1f2937", "#374151"),
        BookCoverPreset::new("rose-pink", "Rose Pink", "#f43f5e", "#ec4899"),
    ]
}

/// How the library shows its books
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookViewMode {
    #[default]
    Carousel,
    Grid,
}

/// Library-wide preferences, exported with the books
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibrarySettings {
    pub default_view_mode: BookViewMode,
    pub auto_save: bool,
    pub show_book_descriptions: bool,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            default_view_mode: BookViewMode::Carousel,
            auto_save: true,
            show_book_descriptions: true,
        }
    }
}

/// Shallow-merge update of [`LibrarySettings`]; also the shape settings are
/// read in on import
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default)]
    pub default_view_mode: Option<BookViewMode>,
    #[serde(default)]
    pub auto_save: Option<bool>,
    #[serde(default)]
    pub show_book_descriptions: Option<bool>,
}

impl SettingsPatch {
    pub(crate) fn apply_to(self, settings: &mut LibrarySettings) {
        if let Some(v) = self.default_view_mode {
            settings.default_view_mode = v;
        }
        if let Some(v) = self.auto_save {
            settings.auto_save = v;
        }
        if let Some(v) = self.show_book_descriptions {
            settings.show_book_descriptions = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanvas_core::{AssetKind, NewAsset};

    #[test]
    fn test_empty_world_wire_format() {
        let json = serde_json::to_value(WorldData::default()).unwrap();
        assert_eq!(json["viewportOffset"], serde_json::json!({"x": -45.0, "y": -20.0}));
        assert_eq!(json["viewportScale"], 1.0);
        assert!(json["assets"].as_object().unwrap().is_empty());
        assert!(json["globalCustomFields"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_world_without_asset_tags_parses() {
        let world: WorldData = serde_json::from_str(
            r#"{"assets":{},"tags":{},"globalCustomFields":[],"viewportOffset":{"x":1,"y":2},"viewportScale":2}"#,
        )
        .unwrap();
        assert!(world.asset_tags.is_empty());
        assert_eq!(world.viewport_offset, Point::new(1.0, 2.0));
        assert_eq!(world.viewport_scale, 2.0);
    }

    #[test]
    fn test_capture_and_load() {
        let mut registry = AssetRegistry::new();
        let mut tags = TagStore::new();
        let castle = registry.create(NewAsset::new("Castle", AssetKind::Other), None);
        registry.create(NewAsset::new("Hall", AssetKind::Other), Some(&castle));
        registry.set_viewport_scale(2.0);
        let tag = tags.create_tag("Place", None);
        tags.add_tag_to_asset(&castle, &tag);

        let world = WorldData::capture(&registry, &tags);
        assert_eq!(world.assets.len(), 2);
        assert_eq!(world.viewport_scale, 2.0);

        let mut registry2 = AssetRegistry::new();
        let mut tags2 = TagStore::new();
        world.load_into(&mut registry2, &mut tags2);
        assert_eq!(registry2.assets(), registry.assets());
        assert_eq!(registry2.view(), registry.view());
        assert_eq!(tags2.tag_ids_for_asset(&castle), &[tag]);
    }

    #[test]
    fn test_world_patch_is_shallow() {
        let mut world = WorldData::default();
        WorldDataPatch {
            viewport_scale: Some(3.0),
            ..Default::default()
        }
        .apply_to(&mut world);
        assert_eq!(world.viewport_scale, 3.0);
        assert_eq!(world.viewport_offset, Point::new(-45.0, -20.0));
    }

    #[test]
    fn test_cover_presets() {
        let presets = default_cover_presets();
        assert_eq!(presets.len(), 6);
        assert_eq!(presets[0].id, "cosmic-blue");
        assert_eq!(
            presets[0].gradient.as_deref(),
            Some("linear-gradient(135deg, #3b82f6, #8b5cf6)")
        );
    }

    #[test]
    fn test_settings_patch() {
        let mut settings = LibrarySettings::default();
        let patch: SettingsPatch = serde_json::from_str(r#"{"defaultViewMode":"grid"}"#).unwrap();
        patch.apply_to(&mut settings);
        assert_eq!(settings.default_view_mode, BookViewMode::Grid);
        assert!(settings.auto_save);
    }

    #[test]
    fn test_book_patch_clears_description() {
        let mut book = Book {
            id: BookId::new("b"),
            title: "Old".into(),
            description: Some("desc".into()),
            cover_image: None,
            color: "#000".into(),
            gradient: None,
            created_at: 0,
            updated_at: 0,
            world_data: WorldData::default(),
            is_default: None,
        };
        BookPatch {
            title: Some("New".into()),
            description: Some(None),
            ..Default::default()
        }
        .apply_to(&mut book);
        assert_eq!(book.title, "New");
        assert!(book.description.is_none());
    }
}

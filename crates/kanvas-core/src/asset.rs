//! Asset records
//!
//! An asset is a positioned, typed node of the canvas tree. The structural
//! fields (`id`, `parentId`, `children`) are owned by the
//! [`AssetRegistry`](crate::AssetRegistry) and read-only from outside the
//! crate; everything else is plain data.

use crate::field::{CustomField, CustomFieldValue};
use crate::geometry::{Point, Size, ViewportConfig};
use crate::image::ImageData;
use crate::time::Timestamp;
use crate::AssetId;
use serde::{Deserialize, Deserializer, Serialize};

/// What an asset represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Image,
    Document,
    Video,
    Audio,
    Code,
    #[default]
    Other,
}

/// Outline of the asset card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderShape {
    #[default]
    Square,
    Round,
}

/// Background of the viewport an asset opens into
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageData>,
    #[serde(default = "default_grid_size")]
    pub grid_size: f64,
}

fn default_grid_size() -> f64 {
    40.0
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            color: None,
            image: None,
            grid_size: default_grid_size(),
        }
    }
}

/// Which built-in fields show when the asset is drawn in its parent viewport
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportDisplaySettings {
    pub name: bool,
    pub description: bool,
    pub thumbnail: bool,
    /// 0 = no blur, 1 = full blur
    #[serde(deserialize_with = "deserialize_blur")]
    pub portrait_blur: f64,
}

impl ViewportDisplaySettings {
    /// The same settings with `portrait_blur` forced into `[0, 1]`
    pub fn clamped(mut self) -> Self {
        self.portrait_blur = clamp_blur(self.portrait_blur);
        self
    }
}

/// NaN counts as no blur
fn clamp_blur(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn deserialize_blur<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    f64::deserialize(deserializer).map(clamp_blur)
}

impl Default for ViewportDisplaySettings {
    fn default() -> Self {
        Self {
            name: true,
            description: false,
            thumbnail: true,
            portrait_blur: 0.2,
        }
    }
}

/// Partial update of [`ViewportDisplaySettings`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DisplaySettingsPatch {
    pub name: Option<bool>,
    pub description: Option<bool>,
    pub thumbnail: Option<bool>,
    pub portrait_blur: Option<f64>,
}

impl DisplaySettingsPatch {
    pub(crate) fn apply_to(&self, settings: &mut ViewportDisplaySettings) {
        if let Some(v) = self.name {
            settings.name = v;
        }
        if let Some(v) = self.description {
            settings.description = v;
        }
        if let Some(v) = self.thumbnail {
            settings.thumbnail = v;
        }
        if let Some(v) = self.portrait_blur {
            settings.portrait_blur = clamp_blur(v);
        }
    }
}

/// A node of the canvas tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub(crate) id: AssetId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: AssetKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) parent_id: Option<AssetId>,
    #[serde(default)]
    pub(crate) children: Vec<AssetId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<ImageData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<ImageData>,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
    #[serde(default)]
    pub custom_field_values: Vec<CustomFieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport_config: Option<ViewportConfig>,
    #[serde(default)]
    pub background_config: BackgroundConfig,
    #[serde(default)]
    pub viewport_display_settings: ViewportDisplaySettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub border_shape: BorderShape,
}

impl Asset {
    /// A detached asset at the origin with no size.
    ///
    /// Registry-created assets go through [`NewAsset`] instead, which applies
    /// the configured defaults.
    pub fn new(id: AssetId, name: impl Into<String>, kind: AssetKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            parent_id: None,
            children: Vec::new(),
            description: None,
            thumbnail: None,
            background: None,
            custom_fields: Vec::new(),
            custom_field_values: Vec::new(),
            viewport_config: None,
            background_config: BackgroundConfig::default(),
            viewport_display_settings: ViewportDisplaySettings::default(),
            created_at: None,
            updated_at: None,
            is_locked: false,
            border_shape: BorderShape::default(),
        }
    }

    pub fn id(&self) -> &AssetId {
        &self.id
    }

    /// Owning parent, `None` for root-level assets
    pub fn parent_id(&self) -> Option<&AssetId> {
        self.parent_id.as_ref()
    }

    /// Child ids in display order
    pub fn children(&self) -> &[AssetId] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Find a field definition by id
    pub fn field(&self, field_id: &crate::FieldId) -> Option<&CustomField> {
        self.custom_fields.iter().find(|f| &f.id == field_id)
    }

    /// Find a field value by field id
    pub fn field_value(&self, field_id: &crate::FieldId) -> Option<&crate::FieldValue> {
        self.custom_field_values
            .iter()
            .find(|v| &v.field_id == field_id)
            .map(|v| &v.value)
    }
}

/// Input for [`AssetRegistry::create`](crate::AssetRegistry::create)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewAsset {
    pub name: String,
    pub kind: AssetKind,
    pub x: f64,
    pub y: f64,
    /// `None` or `0` picks the configured default
    pub width: Option<f64>,
    /// `None` or `0` picks the configured default
    pub height: Option<f64>,
    pub description: Option<String>,
    pub thumbnail: Option<ImageData>,
    pub background: Option<ImageData>,
    pub custom_fields: Vec<CustomField>,
    pub custom_field_values: Vec<CustomFieldValue>,
    pub viewport_config: Option<ViewportConfig>,
    pub background_config: Option<BackgroundConfig>,
    pub viewport_display_settings: Option<ViewportDisplaySettings>,
    pub is_locked: bool,
    pub border_shape: BorderShape,
}

impl NewAsset {
    pub fn new(name: impl Into<String>, kind: AssetKind) -> Self {
        Self {
            name: name.into(),
            kind,
            ..Default::default()
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Shallow-merge update for [`AssetRegistry::update`](crate::AssetRegistry::update)
///
/// Structural fields are deliberately absent: use `reparent` for those.
/// Nested options clear a value with `Some(None)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetPatch {
    pub name: Option<String>,
    pub kind: Option<AssetKind>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub description: Option<Option<String>>,
    pub thumbnail: Option<Option<ImageData>>,
    pub background: Option<Option<ImageData>>,
    pub custom_fields: Option<Vec<CustomField>>,
    pub custom_field_values: Option<Vec<CustomFieldValue>>,
    pub viewport_config: Option<Option<ViewportConfig>>,
    pub background_config: Option<BackgroundConfig>,
    pub viewport_display_settings: Option<ViewportDisplaySettings>,
    pub is_locked: Option<bool>,
    pub border_shape: Option<BorderShape>,
}

impl AssetPatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub(crate) fn apply_to(self, asset: &mut Asset) {
        if let Some(v) = self.name {
            asset.name = v;
        }
        if let Some(v) = self.kind {
            asset.kind = v;
        }
        if let Some(v) = self.x.filter(|v| v.is_finite()) {
            asset.x = v;
        }
        if let Some(v) = self.y.filter(|v| v.is_finite()) {
            asset.y = v;
        }
        if let Some(v) = self.width {
            asset.width = v;
        }
        if let Some(v) = self.height {
            asset.height = v;
        }
        if let Some(v) = self.description {
            asset.description = v;
        }
        if let Some(v) = self.thumbnail {
            asset.thumbnail = v;
        }
        if let Some(v) = self.background {
            asset.background = v;
        }
        if let Some(v) = self.custom_fields {
            asset.custom_fields = v;
        }
        if let Some(v) = self.custom_field_values {
            asset.custom_field_values = v;
        }
        if let Some(v) = self.viewport_config {
            asset.viewport_config = v;
        }
        if let Some(v) = self.background_config {
            asset.background_config = v;
        }
        if let Some(v) = self.viewport_display_settings {
            asset.viewport_display_settings = v.clamped();
        }
        if let Some(v) = self.is_locked {
            asset.is_locked = v;
        }
        if let Some(v) = self.border_shape {
            asset.border_shape = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_wire_names() {
        let mut asset = Asset::new(AssetId::new("a"), "Castle", AssetKind::Document);
        asset.parent_id = Some(AssetId::new("p"));
        let json = serde_json::to_value(&asset).unwrap();

        assert_eq!(json["type"], "document");
        assert_eq!(json["parentId"], "p");
        assert_eq!(json["borderShape"], "square");
        assert_eq!(json["viewportDisplaySettings"]["portraitBlur"], 0.2);
        assert!(json.get("description").is_none());
    }

    #[test]
    fn test_minimal_asset_deserializes() {
        let asset: Asset = serde_json::from_str(
            r#"{"id":"a","name":"Hero","x":1,"y":2,"width":200,"height":150}"#,
        )
        .unwrap();
        assert_eq!(asset.kind, AssetKind::Other);
        assert!(asset.is_root());
        assert!(asset.children().is_empty());
        assert_eq!(asset.background_config.grid_size, 40.0);
    }

    #[test]
    fn test_patch_merges_shallowly() {
        let mut asset = Asset::new(AssetId::new("a"), "Old", AssetKind::Other);
        asset.description = Some("keep?".into());

        AssetPatch {
            name: Some("New".into()),
            description: Some(None),
            is_locked: Some(true),
            ..Default::default()
        }
        .apply_to(&mut asset);

        assert_eq!(asset.name, "New");
        assert_eq!(asset.description, None);
        assert!(asset.is_locked);
        assert_eq!(asset.kind, AssetKind::Other);
    }

    #[test]
    fn test_portrait_blur_is_clamped() {
        let mut settings = ViewportDisplaySettings::default();
        DisplaySettingsPatch {
            portrait_blur: Some(3.0),
            ..Default::default()
        }
        .apply_to(&mut settings);
        assert_eq!(settings.portrait_blur, 1.0);

        DisplaySettingsPatch {
            portrait_blur: Some(-1.0),
            ..Default::default()
        }
        .apply_to(&mut settings);
        assert_eq!(settings.portrait_blur, 0.0);
    }

    #[test]
    fn test_patch_clamps_display_settings() {
        let mut asset = Asset::new(AssetId::new("a"), "Hero", AssetKind::Other);
        AssetPatch {
            viewport_display_settings: Some(ViewportDisplaySettings {
                portrait_blur: -3.0,
                ..Default::default()
            }),
            ..Default::default()
        }
        .apply_to(&mut asset);
        assert_eq!(asset.viewport_display_settings.portrait_blur, 0.0);
    }

    #[test]
    fn test_patch_ignores_non_finite_position() {
        let mut asset = Asset::new(AssetId::new("a"), "Hero", AssetKind::Other);
        AssetPatch {
            x: Some(f64::NAN),
            y: Some(12.0),
            ..Default::default()
        }
        .apply_to(&mut asset);
        assert_eq!(asset.x, 0.0);
        assert_eq!(asset.y, 12.0);
    }

    #[test]
    fn test_blur_clamped_on_deserialize() {
        let asset: Asset = serde_json::from_str(
            r#"{"id":"a","name":"Hero","x":0,"y":0,"width":200,"height":150,
                "viewportDisplaySettings":{"name":true,"description":false,
                "thumbnail":true,"portraitBlur":42}}"#,
        )
        .unwrap();
        assert_eq!(asset.viewport_display_settings.portrait_blur, 1.0);
    }
}

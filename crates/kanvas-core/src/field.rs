//! Custom fields attached to assets
//!
//! A field definition lives on the asset (`customFields`); its value is kept
//! separately (`customFieldValues`) keyed by field id. Global fields are
//! registry-wide templates copied onto assets under the same id.

use crate::image::ImageData;
use crate::time::Timestamp;
use crate::{Error, FieldId};
use serde::{Deserialize, Serialize};

/// Kind of content a field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomFieldType {
    #[default]
    Text,
    Image,
}

/// Field definition on a single asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomField {
    pub id: FieldId,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: CustomFieldType,
    /// Show this field when the asset is drawn inside its parent's viewport
    #[serde(default)]
    pub display_in_viewport: bool,
    /// Copied from a global template
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_global: bool,
}

/// Registry-wide field template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalCustomField {
    pub id: FieldId,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: CustomFieldType,
    #[serde(default)]
    pub display_in_viewport: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl GlobalCustomField {
    /// The per-asset copy of this template
    pub fn to_asset_field(&self) -> CustomField {
        CustomField {
            id: self.id.clone(),
            label: self.label.clone(),
            kind: self.kind,
            display_in_viewport: self.display_in_viewport,
            is_global: true,
        }
    }
}

/// Input for a new field definition (local or global)
#[derive(Debug, Clone, PartialEq)]
pub struct NewField {
    pub label: String,
    pub kind: CustomFieldType,
    pub display_in_viewport: bool,
}

impl NewField {
    pub fn text(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: CustomFieldType::Text,
            display_in_viewport: false,
        }
    }

    pub fn image(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: CustomFieldType::Image,
            display_in_viewport: false,
        }
    }

    pub fn displayed(mut self) -> Self {
        self.display_in_viewport = true;
        self
    }
}

/// Partial update of a field definition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldPatch {
    pub label: Option<String>,
    pub kind: Option<CustomFieldType>,
    pub display_in_viewport: Option<bool>,
}

impl FieldPatch {
    pub(crate) fn apply_to(&self, field: &mut CustomField) {
        if let Some(label) = &self.label {
            field.label = label.clone();
        }
        if let Some(kind) = self.kind {
            field.kind = kind;
        }
        if let Some(display) = self.display_in_viewport {
            field.display_in_viewport = display;
        }
    }

    pub(crate) fn apply_to_global(&self, field: &mut GlobalCustomField) {
        if let Some(label) = &self.label {
            field.label = label.clone();
        }
        if let Some(kind) = self.kind {
            field.kind = kind;
        }
        if let Some(display) = self.display_in_viewport {
            field.display_in_viewport = display;
        }
    }
}

/// Content of a field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Image(ImageData),
}

impl FieldValue {
    pub fn kind(&self) -> CustomFieldType {
        match self {
            FieldValue::Text(_) => CustomFieldType::Text,
            FieldValue::Image(_) => CustomFieldType::Image,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Image(_) => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageData> {
        match self {
            FieldValue::Image(image) => Some(image),
            FieldValue::Text(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<ImageData> for FieldValue {
    fn from(image: ImageData) -> Self {
        FieldValue::Image(image)
    }
}

/// Value of one field on one asset
///
/// On the wire: `{ "fieldId", "type", "value" }` where `value` is a string.
/// `type` may be missing in older data; a `data:image/` prefix then marks an
/// image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFieldValue", into = "RawFieldValue")]
pub struct CustomFieldValue {
    pub field_id: FieldId,
    pub value: FieldValue,
}

impl CustomFieldValue {
    pub fn new(field_id: FieldId, value: impl Into<FieldValue>) -> Self {
        Self {
            field_id,
            value: value.into(),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFieldValue {
    field_id: FieldId,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<CustomFieldType>,
    value: String,
}

impl TryFrom<RawFieldValue> for CustomFieldValue {
    type Error = Error;

    fn try_from(raw: RawFieldValue) -> Result<Self, Self::Error> {
        let kind = raw.kind.unwrap_or(if raw.value.starts_with("data:image/") {
            CustomFieldType::Image
        } else {
            CustomFieldType::Text
        });

        let value = match kind {
            CustomFieldType::Text => FieldValue::Text(raw.value),
            // An empty image value means "not set yet"
            CustomFieldType::Image if raw.value.is_empty() => {
                FieldValue::Image(ImageData::new(None, Vec::new()))
            }
            CustomFieldType::Image => FieldValue::Image(ImageData::parse(&raw.value)?),
        };

        Ok(Self {
            field_id: raw.field_id,
            value,
        })
    }
}

impl From<CustomFieldValue> for RawFieldValue {
    fn from(v: CustomFieldValue) -> Self {
        let (kind, value) = match v.value {
            FieldValue::Text(s) => (CustomFieldType::Text, s),
            FieldValue::Image(image) => (CustomFieldType::Image, image.encode()),
        };
        Self {
            field_id: v.field_id,
            kind: Some(kind),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_value_wire_format() {
        let value = CustomFieldValue::new(FieldId::new("f1"), "Brave knight");
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"fieldId":"f1","type":"text","value":"Brave knight"}"#);
    }

    #[test]
    fn test_image_value_wire_format() {
        let image = ImageData::new(Some("image/png".into()), b"hello".to_vec());
        let value = CustomFieldValue::new(FieldId::new("portrait"), image.clone());
        let json = serde_json::to_string(&value).unwrap();
        assert!(json.contains(r#""type":"image""#));

        let back: CustomFieldValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back.value.as_image(), Some(&image));
    }

    #[test]
    fn test_untyped_value_is_inferred() {
        let text: CustomFieldValue =
            serde_json::from_str(r#"{"fieldId":"a","value":"plain words"}"#).unwrap();
        assert_eq!(text.value.as_text(), Some("plain words"));

        let image: CustomFieldValue = serde_json::from_str(
            r#"{"fieldId":"b","value":"data:image/png;base64,aGVsbG8="}"#,
        )
        .unwrap();
        assert_eq!(image.value.kind(), CustomFieldType::Image);
    }

    #[test]
    fn test_bad_image_value_is_rejected() {
        let result: Result<CustomFieldValue, _> =
            serde_json::from_str(r#"{"fieldId":"b","type":"image","value":"%%%"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_copy_keeps_id() {
        let global = GlobalCustomField {
            id: FieldId::new("g1"),
            label: "Age".into(),
            kind: CustomFieldType::Text,
            display_in_viewport: true,
            created_at: 0,
            updated_at: 0,
        };
        let field = global.to_asset_field();
        assert_eq!(field.id, global.id);
        assert!(field.is_global);
        assert!(field.display_in_viewport);
    }

    #[test]
    fn test_field_patch() {
        let mut field = CustomField {
            id: FieldId::new("f"),
            label: "Old".into(),
            kind: CustomFieldType::Text,
            display_in_viewport: false,
            is_global: false,
        };
        FieldPatch {
            label: Some("New".into()),
            display_in_viewport: Some(true),
            ..Default::default()
        }
        .apply_to(&mut field);
        assert_eq!(field.label, "New");
        assert!(field.display_in_viewport);
        assert_eq!(field.kind, CustomFieldType::Text);
    }
}

//! Tags and the asset/tag association map
//!
//! The association map (`assetTags`) is the only record of which asset
//! carries which tag; asset records hold no tag list of their own. Use
//! [`TagStore::tags_for_asset`] to read an asset's tags.

use crate::{AssetId, TagId};
use indexmap::{IndexMap, IndexSet};
use log::debug;
use serde::{Deserialize, Serialize};

/// Colours handed out to tags created without one
pub const TAG_COLORS: [&str; 8] = [
    "hsl(0, 70%, 50%)",
    "hsl(30, 70%, 50%)",
    "hsl(60, 70%, 45%)",
    "hsl(120, 50%, 40%)",
    "hsl(200, 70%, 50%)",
    "hsl(270, 60%, 55%)",
    "hsl(330, 60%, 50%)",
    "hsl(180, 50%, 45%)",
];

/// A named, coloured label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub color: String,
}

/// Partial update of a tag
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagPatch {
    pub name: Option<String>,
    pub color: Option<String>,
}

/// Tags, their asset associations and the active filter selection
#[derive(Debug, Clone, Default)]
pub struct TagStore {
    tags: IndexMap<TagId, Tag>,
    asset_tags: IndexMap<AssetId, Vec<TagId>>,
    selected: IndexSet<TagId>,
    revision: u64,
}

impl TagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bumped on every change to tags or associations; selection changes do
    /// not count
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    /// Create a tag. Without a colour one is picked from [`TAG_COLORS`].
    pub fn create_tag(&mut self, name: impl Into<String>, color: Option<String>) -> TagId {
        let id = TagId::generate();
        let color =
            color.unwrap_or_else(|| TAG_COLORS[self.tags.len() % TAG_COLORS.len()].to_string());
        let tag = Tag {
            id: id.clone(),
            name: name.into(),
            color,
        };
        debug!("create tag {} ({:?})", id, tag.name);
        self.tags.insert(id.clone(), tag);
        self.touch();
        id
    }

    /// Delete a tag, dropping it from every asset and from the selection
    pub fn delete_tag(&mut self, tag_id: &TagId) -> bool {
        if self.tags.shift_remove(tag_id).is_none() {
            return false;
        }
        for tags in self.asset_tags.values_mut() {
            tags.retain(|t| t != tag_id);
        }
        self.selected.shift_remove(tag_id);
        debug!("delete tag {}", tag_id);
        self.touch();
        true
    }

    /// Rename or recolour a tag
    pub fn update_tag(&mut self, tag_id: &TagId, patch: TagPatch) -> bool {
        let Some(tag) = self.tags.get_mut(tag_id) else {
            return false;
        };
        if let Some(name) = patch.name {
            tag.name = name;
        }
        if let Some(color) = patch.color {
            tag.color = color;
        }
        self.touch();
        true
    }

    pub fn get(&self, tag_id: &TagId) -> Option<&Tag> {
        self.tags.get(tag_id)
    }

    pub fn tags(&self) -> &IndexMap<TagId, Tag> {
        &self.tags
    }

    /// The raw association map
    pub fn asset_tags(&self) -> &IndexMap<AssetId, Vec<TagId>> {
        &self.asset_tags
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Associate a tag with an asset. Adding a present tag changes nothing.
    pub fn add_tag_to_asset(&mut self, asset_id: &AssetId, tag_id: &TagId) -> bool {
        let tags = self.asset_tags.entry(asset_id.clone()).or_default();
        if tags.contains(tag_id) {
            return false;
        }
        tags.push(tag_id.clone());
        self.touch();
        true
    }

    pub fn remove_tag_from_asset(&mut self, asset_id: &AssetId, tag_id: &TagId) -> bool {
        let Some(tags) = self.asset_tags.get_mut(asset_id) else {
            return false;
        };
        let before = tags.len();
        tags.retain(|t| t != tag_id);
        if tags.len() == before {
            return false;
        }
        self.touch();
        true
    }

    /// Tag ids associated with an asset, in the order they were added
    pub fn tag_ids_for_asset(&self, asset_id: &AssetId) -> &[TagId] {
        self.asset_tags
            .get(asset_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Tags of an asset; associations to deleted tags are skipped
    pub fn tags_for_asset(&self, asset_id: &AssetId) -> Vec<&Tag> {
        self.tag_ids_for_asset(asset_id)
            .iter()
            .filter_map(|id| self.tags.get(id))
            .collect()
    }

    /// Drop every association of the given (deleted) assets
    pub fn forget_assets(&mut self, asset_ids: &[AssetId]) {
        let before = self.asset_tags.len();
        self.asset_tags.retain(|id, _| !asset_ids.contains(id));
        if self.asset_tags.len() != before {
            self.touch();
        }
    }

    // ------------------------------------------------------------------
    // Selection / filtering
    // ------------------------------------------------------------------

    pub fn toggle_selection(&mut self, tag_id: &TagId) {
        if !self.selected.shift_remove(tag_id) {
            self.selected.insert(tag_id.clone());
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn set_selection(&mut self, tag_ids: impl IntoIterator<Item = TagId>) {
        self.selected = tag_ids.into_iter().collect();
    }

    pub fn selected_ids(&self) -> impl Iterator<Item = &TagId> {
        self.selected.iter()
    }

    /// Selected tags that still exist
    pub fn selected_tags(&self) -> Vec<&Tag> {
        self.selected
            .iter()
            .filter_map(|id| self.tags.get(id))
            .collect()
    }

    /// Whether an asset passes the current filter.
    ///
    /// An empty selection lets everything through; otherwise the asset needs
    /// at least one selected tag.
    pub fn is_asset_filtered(&self, asset_id: &AssetId) -> bool {
        if self.selected.is_empty() {
            return true;
        }
        self.tag_ids_for_asset(asset_id)
            .iter()
            .any(|t| self.selected.contains(t))
    }

    /// Assets with associations that pass the current filter
    pub fn filtered_asset_ids(&self) -> Vec<&AssetId> {
        self.asset_tags
            .keys()
            .filter(|id| self.is_asset_filtered(id))
            .collect()
    }

    /// Replace the whole store with a loaded world snapshot; clears the
    /// selection
    pub fn restore(
        &mut self,
        tags: IndexMap<TagId, Tag>,
        asset_tags: IndexMap<AssetId, Vec<TagId>>,
    ) {
        self.tags = tags;
        self.asset_tags = asset_tags;
        self.selected.clear();
        self.touch();
    }

    pub fn clear(&mut self) {
        self.restore(IndexMap::new(), IndexMap::new());
    }
}

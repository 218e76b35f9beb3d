//! Flat asset registry
//!
//! Assets live in an id-keyed arena. `parentId` and `children` are ids into
//! that arena and are kept as exact inverses of each other by every
//! structural operation here.
//!
//! Mutations on an unknown id are no-ops: they return `false`/`None` and
//! leave the registry untouched. Cycle checks are not done at this level;
//! use the validated wrappers in [`crate::tree`] for user-driven moves.

use crate::asset::{Asset, AssetPatch, DisplaySettingsPatch, NewAsset};
use crate::config::{AssetDefaults, CanvasDefaults, KanvasConfig};
use crate::field::{
    CustomField, CustomFieldValue, FieldPatch, FieldValue, GlobalCustomField, NewField,
};
use crate::geometry::{Point, ViewportConfig};
use crate::time::now_millis;
use crate::{AssetId, FieldId};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Pan offset and zoom of the top-level canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasView {
    pub offset: Point,
    pub scale: f64,
}

impl From<&CanvasDefaults> for CanvasView {
    fn from(defaults: &CanvasDefaults) -> Self {
        Self {
            offset: defaults.offset,
            scale: defaults.scale,
        }
    }
}

impl Default for CanvasView {
    fn default() -> Self {
        Self::from(&CanvasDefaults::default())
    }
}

/// A broken structural invariant found by [`AssetRegistry::check_integrity`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityIssue {
    /// `parentId` names an asset that does not exist
    MissingParent { asset: AssetId, parent: AssetId },
    /// The parent does not list the asset among its children
    NotInParentChildren { asset: AssetId, parent: AssetId },
    /// A children list names an asset that does not exist
    DanglingChild { parent: AssetId, child: AssetId },
    /// A children list names an asset whose `parentId` differs
    ChildParentMismatch { parent: AssetId, child: AssetId },
    /// A child id appears more than once in one children list
    DuplicateChild { parent: AssetId, child: AssetId },
    /// Following `parentId` from this asset loops
    Cycle { asset: AssetId },
}

/// Storage for all assets of the current world
#[derive(Debug, Clone)]
pub struct AssetRegistry {
    assets: IndexMap<AssetId, Asset>,
    active_id: Option<AssetId>,
    current_viewport_id: Option<AssetId>,
    global_fields: Vec<GlobalCustomField>,
    view: CanvasView,
    revision: u64,
    defaults: AssetDefaults,
    canvas_defaults: CanvasDefaults,
}

impl AssetRegistry {
    /// Create an empty registry with default settings
    pub fn new() -> Self {
        Self::with_config(&KanvasConfig::default())
    }

    /// Create an empty registry using the given configuration
    pub fn with_config(config: &KanvasConfig) -> Self {
        Self {
            assets: IndexMap::new(),
            active_id: None,
            current_viewport_id: None,
            global_fields: Vec::new(),
            view: CanvasView::from(&config.canvas),
            revision: 0,
            defaults: config.assets.clone(),
            canvas_defaults: config.canvas.clone(),
        }
    }

    /// Bumped on every change to persisted state (assets, global fields,
    /// canvas view). Selection changes do not count.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    /// Create an asset and return its id.
    ///
    /// If `parent_id` names an existing asset the new id is appended to its
    /// children; an unknown parent leaves the asset at root level.
    pub fn create(&mut self, data: NewAsset, parent_id: Option<&AssetId>) -> AssetId {
        let id = AssetId::generate();
        let now = now_millis();
        let parent_id = parent_id.filter(|p| self.assets.contains_key(*p)).cloned();

        let width = data.width.filter(|w| *w != 0.0).unwrap_or(self.defaults.width);
        let height = data.height.filter(|h| *h != 0.0).unwrap_or(self.defaults.height);
        let grid_size = self.defaults.grid_size;

        let asset = Asset {
            id: id.clone(),
            name: data.name,
            kind: data.kind,
            x: data.x,
            y: data.y,
            width,
            height,
            parent_id: parent_id.clone(),
            children: Vec::new(),
            description: data.description,
            thumbnail: data.thumbnail,
            background: data.background,
            custom_fields: data.custom_fields,
            custom_field_values: data.custom_field_values,
            viewport_config: Some(data.viewport_config.unwrap_or_default()),
            background_config: data.background_config.unwrap_or_else(|| {
                crate::asset::BackgroundConfig {
                    grid_size,
                    ..Default::default()
                }
            }),
            viewport_display_settings: data
                .viewport_display_settings
                .unwrap_or_default()
                .clamped(),
            created_at: Some(now),
            updated_at: Some(now),
            is_locked: data.is_locked,
            border_shape: data.border_shape,
        };

        debug!("create asset {} ({:?}) under {:?}", id, asset.name, parent_id);
        self.assets.insert(id.clone(), asset);
        if let Some(parent) = parent_id.and_then(|p| self.assets.get_mut(&p)) {
            parent.children.push(id.clone());
        }
        self.touch();
        id
    }

    /// Move an asset under `new_parent_id` (or to root level with `None`).
    ///
    /// Detaches from the old parent, appends to the new parent's children and
    /// updates `parentId`. An unknown new parent moves the asset to root
    /// level. Returns `false` if the asset does not exist.
    pub fn reparent(&mut self, asset_id: &AssetId, new_parent_id: Option<&AssetId>) -> bool {
        let Some(asset) = self.assets.get(asset_id) else {
            return false;
        };
        let old_parent = asset.parent_id.clone();
        let new_parent = new_parent_id
            .filter(|p| self.assets.contains_key(*p))
            .cloned();

        if let Some(parent) = old_parent.and_then(|p| self.assets.get_mut(&p)) {
            parent.children.retain(|c| c != asset_id);
        }
        if let Some(parent) = new_parent.as_ref().and_then(|p| self.assets.get_mut(p)) {
            parent.children.push(asset_id.clone());
        }
        if let Some(asset) = self.assets.get_mut(asset_id) {
            asset.parent_id = new_parent.clone();
        }

        debug!("reparent asset {} to {:?}", asset_id, new_parent);
        self.touch();
        true
    }

    /// Delete an asset and its whole subtree.
    ///
    /// Returns the removed ids (root first, then descendants depth-first),
    /// empty if the asset does not exist. Clears the active asset and the
    /// viewport context when they were among the removed ids.
    pub fn delete(&mut self, asset_id: &AssetId) -> Vec<AssetId> {
        let Some(asset) = self.assets.get(asset_id) else {
            return Vec::new();
        };
        let parent_id = asset.parent_id.clone();

        let mut removed = vec![asset_id.clone()];
        removed.extend(self.descendants(asset_id));
        let removed_set: HashSet<&AssetId> = removed.iter().collect();

        if let Some(parent) = parent_id.and_then(|p| self.assets.get_mut(&p)) {
            parent.children.retain(|c| !removed_set.contains(c));
        }
        for id in &removed {
            self.assets.shift_remove(id);
        }
        if self
            .active_id
            .as_ref()
            .is_some_and(|id| removed_set.contains(id))
        {
            self.active_id = None;
        }
        if self
            .current_viewport_id
            .as_ref()
            .is_some_and(|id| removed_set.contains(id))
        {
            self.current_viewport_id = None;
        }

        debug!("delete asset {} ({} removed)", asset_id, removed.len());
        self.touch();
        removed
    }

    // ------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------

    /// Move within the parent's space. Non-finite coordinates are ignored.
    pub fn update_position(&mut self, asset_id: &AssetId, x: f64, y: f64) -> bool {
        if !x.is_finite() || !y.is_finite() {
            return false;
        }
        let Some(asset) = self.assets.get_mut(asset_id) else {
            return false;
        };
        asset.x = x;
        asset.y = y;
        self.touch();
        true
    }

    /// Resize, never below the configured minimum size
    pub fn update_size(&mut self, asset_id: &AssetId, width: f64, height: f64) -> bool {
        let min_width = self.defaults.min_width;
        let min_height = self.defaults.min_height;
        let Some(asset) = self.assets.get_mut(asset_id) else {
            return false;
        };
        // f64::max also maps NaN to the floor
        asset.width = width.max(min_width);
        asset.height = height.max(min_height);
        self.touch();
        true
    }

    /// Shallow-merge `patch` into the asset
    pub fn update(&mut self, asset_id: &AssetId, patch: AssetPatch) -> bool {
        let Some(asset) = self.assets.get_mut(asset_id) else {
            return false;
        };
        patch.apply_to(asset);
        asset.updated_at = Some(now_millis());
        self.touch();
        true
    }

    pub fn update_viewport_display_settings(
        &mut self,
        asset_id: &AssetId,
        patch: DisplaySettingsPatch,
    ) -> bool {
        let Some(asset) = self.assets.get_mut(asset_id) else {
            return false;
        };
        patch.apply_to(&mut asset.viewport_display_settings);
        asset.updated_at = Some(now_millis());
        self.touch();
        true
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    pub fn set_active_asset(&mut self, asset_id: Option<AssetId>) {
        self.active_id = asset_id;
    }

    /// Set the asset whose viewport is currently entered
    pub fn set_current_viewport_id(&mut self, asset_id: Option<AssetId>) {
        self.current_viewport_id = asset_id;
    }

    pub fn active_id(&self) -> Option<&AssetId> {
        self.active_id.as_ref()
    }

    pub fn current_viewport_id(&self) -> Option<&AssetId> {
        self.current_viewport_id.as_ref()
    }

    /// The active asset, if it still exists
    pub fn active_asset(&self) -> Option<&Asset> {
        self.active_id.as_ref().and_then(|id| self.assets.get(id))
    }

    // ------------------------------------------------------------------
    // Per-asset custom fields
    // ------------------------------------------------------------------

    /// Add a field definition to one asset. Returns the new field id.
    pub fn add_custom_field(&mut self, asset_id: &AssetId, field: NewField) -> Option<FieldId> {
        let asset = self.assets.get_mut(asset_id)?;
        let id = FieldId::generate();
        asset.custom_fields.push(CustomField {
            id: id.clone(),
            label: field.label,
            kind: field.kind,
            display_in_viewport: field.display_in_viewport,
            is_global: false,
        });
        asset.updated_at = Some(now_millis());
        self.touch();
        Some(id)
    }

    pub fn update_custom_field(
        &mut self,
        asset_id: &AssetId,
        field_id: &FieldId,
        patch: FieldPatch,
    ) -> bool {
        let Some(asset) = self.assets.get_mut(asset_id) else {
            return false;
        };
        let Some(field) = asset.custom_fields.iter_mut().find(|f| &f.id == field_id) else {
            return false;
        };
        patch.apply_to(field);
        asset.updated_at = Some(now_millis());
        self.touch();
        true
    }

    /// Remove a field definition and its value from one asset
    pub fn remove_custom_field(&mut self, asset_id: &AssetId, field_id: &FieldId) -> bool {
        let Some(asset) = self.assets.get_mut(asset_id) else {
            return false;
        };
        let before = asset.custom_fields.len() + asset.custom_field_values.len();
        asset.custom_fields.retain(|f| &f.id != field_id);
        asset.custom_field_values.retain(|v| &v.field_id != field_id);
        if asset.custom_fields.len() + asset.custom_field_values.len() == before {
            return false;
        }
        asset.updated_at = Some(now_millis());
        self.touch();
        true
    }

    /// Insert or replace the value of a field on one asset
    pub fn set_custom_field_value(
        &mut self,
        asset_id: &AssetId,
        field_id: &FieldId,
        value: impl Into<FieldValue>,
    ) -> bool {
        let Some(asset) = self.assets.get_mut(asset_id) else {
            return false;
        };
        let value = value.into();
        match asset
            .custom_field_values
            .iter_mut()
            .find(|v| &v.field_id == field_id)
        {
            Some(existing) => existing.value = value,
            None => asset
                .custom_field_values
                .push(CustomFieldValue::new(field_id.clone(), value)),
        }
        asset.updated_at = Some(now_millis());
        self.touch();
        true
    }

    // ------------------------------------------------------------------
    // Global custom fields
    // ------------------------------------------------------------------

    pub fn global_fields(&self) -> &[GlobalCustomField] {
        &self.global_fields
    }

    pub fn add_global_field(&mut self, field: NewField) -> FieldId {
        let id = FieldId::generate();
        let now = now_millis();
        self.global_fields.push(GlobalCustomField {
            id: id.clone(),
            label: field.label,
            kind: field.kind,
            display_in_viewport: field.display_in_viewport,
            created_at: now,
            updated_at: now,
        });
        self.touch();
        id
    }

    /// Update a global template. Copies already applied to assets keep their
    /// own definition.
    pub fn update_global_field(&mut self, field_id: &FieldId, patch: FieldPatch) -> bool {
        let Some(field) = self.global_fields.iter_mut().find(|f| &f.id == field_id) else {
            return false;
        };
        patch.apply_to_global(field);
        field.updated_at = now_millis();
        self.touch();
        true
    }

    /// Remove a global template and strip it (definition and value) from
    /// every asset that has it
    pub fn remove_global_field(&mut self, field_id: &FieldId) -> bool {
        let before = self.global_fields.len();
        self.global_fields.retain(|f| &f.id != field_id);
        if self.global_fields.len() == before {
            return false;
        }

        let now = now_millis();
        for asset in self.assets.values_mut() {
            let had_field = asset.custom_fields.iter().any(|f| &f.id == field_id)
                || asset.custom_field_values.iter().any(|v| &v.field_id == field_id);
            if had_field {
                asset.custom_fields.retain(|f| &f.id != field_id);
                asset.custom_field_values.retain(|v| &v.field_id != field_id);
                asset.updated_at = Some(now);
            }
        }
        self.touch();
        true
    }

    /// Copy every global template the asset does not have yet onto it.
    ///
    /// Returns the number of fields added; applying twice adds nothing.
    pub fn apply_global_fields(&mut self, asset_id: &AssetId) -> usize {
        let Some(asset) = self.assets.get_mut(asset_id) else {
            return 0;
        };
        let existing: HashSet<FieldId> = asset.custom_fields.iter().map(|f| f.id.clone()).collect();
        let missing: Vec<CustomField> = self
            .global_fields
            .iter()
            .filter(|g| !existing.contains(&g.id))
            .map(|g| g.to_asset_field())
            .collect();

        if missing.is_empty() {
            return 0;
        }
        let added = missing.len();
        asset.custom_fields.extend(missing);
        asset.updated_at = Some(now_millis());
        self.touch();
        added
    }

    // ------------------------------------------------------------------
    // Canvas view
    // ------------------------------------------------------------------

    pub fn view(&self) -> CanvasView {
        self.view
    }

    pub fn set_viewport_offset(&mut self, offset: Point) {
        if self.view.offset != offset {
            self.view.offset = offset;
            self.touch();
        }
    }

    pub fn set_viewport_scale(&mut self, scale: f64) {
        if self.view.scale != scale {
            self.view.scale = scale;
            self.touch();
        }
    }

    /// Per-asset viewport, if the asset exists and has one
    pub fn viewport_config(&self, asset_id: &AssetId) -> Option<ViewportConfig> {
        self.assets.get(asset_id).and_then(|a| a.viewport_config)
    }

    // ------------------------------------------------------------------
    // World hand-off
    // ------------------------------------------------------------------

    /// Replace the whole registry content with a loaded world snapshot.
    ///
    /// Clears the active asset and viewport context.
    pub fn restore(
        &mut self,
        assets: IndexMap<AssetId, Asset>,
        global_fields: Vec<GlobalCustomField>,
        view: CanvasView,
    ) {
        // Keys win over whatever id the record carries
        self.assets = assets
            .into_iter()
            .map(|(id, mut asset)| {
                asset.id = id.clone();
                (id, asset)
            })
            .collect();
        self.global_fields = global_fields;
        self.view = view;
        self.active_id = None;
        self.current_viewport_id = None;
        self.touch();
    }

    /// Reset to an empty world
    pub fn clear(&mut self) {
        self.assets.clear();
        self.global_fields.clear();
        self.view = CanvasView::from(&self.canvas_defaults);
        self.active_id = None;
        self.current_viewport_id = None;
        self.touch();
    }

    /// The id-keyed asset map, in insertion order
    pub fn assets(&self) -> &IndexMap<AssetId, Asset> {
        &self.assets
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn get(&self, asset_id: &AssetId) -> Option<&Asset> {
        self.assets.get(asset_id)
    }

    pub fn contains(&self, asset_id: &AssetId) -> bool {
        self.assets.contains_key(asset_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.assets.values()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Root-level assets in insertion order
    pub fn root_assets(&self) -> Vec<&Asset> {
        self.assets.values().filter(|a| a.parent_id.is_none()).collect()
    }

    /// Direct children of an asset, in order. Unknown ids yield nothing.
    pub fn children_of(&self, parent_id: &AssetId) -> Vec<&Asset> {
        self.assets
            .get(parent_id)
            .map(|parent| {
                parent
                    .children
                    .iter()
                    .filter_map(|id| self.assets.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All transitive descendants, depth-first pre-order, excluding the asset
    pub fn descendants(&self, asset_id: &AssetId) -> Vec<AssetId> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        seen.insert(asset_id.clone());
        self.collect_descendants(asset_id, &mut out, &mut seen);
        out
    }

    fn collect_descendants(
        &self,
        asset_id: &AssetId,
        out: &mut Vec<AssetId>,
        seen: &mut HashSet<AssetId>,
    ) {
        let Some(asset) = self.assets.get(asset_id) else {
            return;
        };
        for child in &asset.children {
            if seen.insert(child.clone()) {
                out.push(child.clone());
                self.collect_descendants(child, out, seen);
            }
        }
    }

    /// Pre-order listing of one subtree, or of every root subtree with `None`
    pub fn subtree(&self, root: Option<&AssetId>) -> Vec<&Asset> {
        let roots: Vec<AssetId> = match root {
            Some(id) => vec![id.clone()],
            None => self.root_assets().iter().map(|a| a.id.clone()).collect(),
        };

        let mut out = Vec::new();
        for id in roots {
            if let Some(asset) = self.assets.get(&id) {
                out.push(asset);
                out.extend(self.descendants(&id).iter().filter_map(|d| self.assets.get(d)));
            }
        }
        out
    }

    /// Verify that `parentId` and `children` are exact inverses and that the
    /// parent graph is acyclic. Returns every problem found.
    pub fn check_integrity(&self) -> Vec<IntegrityIssue> {
        let mut issues = Vec::new();

        for asset in self.assets.values() {
            if let Some(parent_id) = &asset.parent_id {
                match self.assets.get(parent_id) {
                    None => issues.push(IntegrityIssue::MissingParent {
                        asset: asset.id.clone(),
                        parent: parent_id.clone(),
                    }),
                    Some(parent) if !parent.children.contains(&asset.id) => {
                        issues.push(IntegrityIssue::NotInParentChildren {
                            asset: asset.id.clone(),
                            parent: parent_id.clone(),
                        })
                    }
                    Some(_) => {}
                }
            }

            let mut seen = HashSet::new();
            for child in &asset.children {
                if !seen.insert(child) {
                    issues.push(IntegrityIssue::DuplicateChild {
                        parent: asset.id.clone(),
                        child: child.clone(),
                    });
                    continue;
                }
                match self.assets.get(child) {
                    None => issues.push(IntegrityIssue::DanglingChild {
                        parent: asset.id.clone(),
                        child: child.clone(),
                    }),
                    Some(c) if c.parent_id.as_ref() != Some(&asset.id) => {
                        issues.push(IntegrityIssue::ChildParentMismatch {
                            parent: asset.id.clone(),
                            child: child.clone(),
                        })
                    }
                    Some(_) => {}
                }
            }

            let mut visited = HashSet::new();
            visited.insert(&asset.id);
            let mut current = asset.parent_id.as_ref();
            while let Some(id) = current {
                if !visited.insert(id) {
                    issues.push(IntegrityIssue::Cycle {
                        asset: asset.id.clone(),
                    });
                    break;
                }
                current = self.assets.get(id).and_then(|a| a.parent_id.as_ref());
            }
        }

        issues
    }
}

impl Default for AssetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

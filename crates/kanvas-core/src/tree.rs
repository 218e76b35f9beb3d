//! Hierarchical view over the flat registry
//!
//! Nothing here is persisted: the tree is rebuilt from `children` pointers
//! on every read. [`AssetRegistry::can_move`] is the single gatekeeper for
//! user-driven structural changes; the `*_checked` wrappers call it before
//! touching any pointer.

use crate::registry::AssetRegistry;
use crate::{Asset, AssetId, Error, NewAsset, Result};
use indexmap::IndexSet;
use log::{debug, warn};
use std::collections::HashSet;

/// A resolved tree node
#[derive(Debug, Clone)]
pub struct AssetNode<'a> {
    pub asset: &'a Asset,
    /// Depth in the tree, roots are 0
    pub level: usize,
    pub is_expanded: bool,
    pub children: Vec<AssetNode<'a>>,
}

impl<'a> AssetNode<'a> {
    pub fn id(&self) -> &'a AssetId {
        self.asset.id()
    }
}

impl AssetRegistry {
    /// True if `id` sits somewhere below `ancestor`
    pub fn is_descendant(&self, ancestor: &AssetId, id: &AssetId) -> bool {
        let mut seen = HashSet::new();
        let mut current = self.get(id).and_then(|a| a.parent_id());
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            if !seen.insert(parent) {
                break;
            }
            current = self.get(parent).and_then(|a| a.parent_id());
        }
        false
    }

    /// Whether `asset_id` may be placed under `target_parent_id`.
    ///
    /// Moving to root level is always allowed. Moving under itself or under
    /// one of its own descendants is not.
    pub fn can_move(&self, asset_id: &AssetId, target_parent_id: Option<&AssetId>) -> bool {
        match target_parent_id {
            None => true,
            Some(target) if target == asset_id => false,
            Some(target) => !self.is_descendant(asset_id, target),
        }
    }

    /// Number of ancestors
    pub fn depth(&self, asset_id: &AssetId) -> usize {
        self.asset_path(asset_id).len().saturating_sub(1)
    }

    /// Other children of the same parent. Root assets have no siblings.
    pub fn siblings(&self, asset_id: &AssetId) -> Vec<&Asset> {
        let Some(parent_id) = self.get(asset_id).and_then(|a| a.parent_id()) else {
            return Vec::new();
        };
        self.children_of(parent_id)
            .into_iter()
            .filter(|a| a.id() != asset_id)
            .collect()
    }

    /// Chain of ids from `from` down to `to`, if `from` is `to` or one of its
    /// ancestors
    pub fn find_path(&self, from: &AssetId, to: &AssetId) -> Option<Vec<AssetId>> {
        let path = self.asset_path(to);
        let start = path.iter().position(|a| a.id() == from)?;
        Some(path[start..].iter().map(|a| a.id().clone()).collect())
    }

    /// The asset and its ancestors, ordered root first
    pub fn asset_path(&self, asset_id: &AssetId) -> Vec<&Asset> {
        let mut path = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(asset_id);
        while let Some(id) = current {
            if !seen.insert(id) {
                break;
            }
            let Some(asset) = self.get(id) else {
                break;
            };
            path.push(asset);
            current = asset.parent_id();
        }
        path.reverse();
        path
    }

    /// Case-insensitive substring match on names, in depth-first order from
    /// the roots
    pub fn search(&self, query: &str) -> Vec<&Asset> {
        let needle = query.to_lowercase();
        self.subtree(None)
            .into_iter()
            .filter(|a| a.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Create an asset, rejecting an unknown parent
    pub fn create_checked(
        &mut self,
        data: NewAsset,
        parent_id: Option<&AssetId>,
    ) -> Result<AssetId> {
        if let Some(parent) = parent_id {
            if !self.contains(parent) {
                return Err(Error::InvalidTarget(parent.clone()));
            }
        }
        Ok(self.create(data, parent_id))
    }

    /// Reparent after validating the asset, the target and the move itself
    pub fn reparent_checked(
        &mut self,
        asset_id: &AssetId,
        new_parent_id: Option<&AssetId>,
    ) -> Result<()> {
        if !self.contains(asset_id) {
            return Err(Error::AssetNotFound(asset_id.clone()));
        }
        if let Some(target) = new_parent_id {
            if !self.contains(target) {
                return Err(Error::InvalidTarget(target.clone()));
            }
        }
        if !self.can_move(asset_id, new_parent_id) {
            let target = new_parent_id.cloned().unwrap_or_else(|| asset_id.clone());
            warn!("rejected move of {} under {}: circular reference", asset_id, target);
            return Err(Error::CircularReference {
                asset: asset_id.clone(),
                target,
            });
        }
        self.reparent(asset_id, new_parent_id);
        Ok(())
    }

    /// Delete an asset and its subtree, optionally asking first.
    ///
    /// With `on_confirm` the callback receives every id that would be removed
    /// and nothing is deleted; the caller deletes again without a callback
    /// once the user agrees. Without a callback the subtree is removed right
    /// away. Either way the affected ids are returned.
    pub fn delete_with_confirmation<F>(
        &mut self,
        asset_id: &AssetId,
        on_confirm: Option<F>,
    ) -> Result<Vec<AssetId>>
    where
        F: FnOnce(&[AssetId]),
    {
        if !self.contains(asset_id) {
            return Err(Error::AssetNotFound(asset_id.clone()));
        }

        let mut ids = vec![asset_id.clone()];
        ids.extend(self.descendants(asset_id));

        match on_confirm {
            Some(confirm) => {
                debug!("delete of {} awaits confirmation ({} assets)", asset_id, ids.len());
                confirm(&ids);
                Ok(ids)
            }
            None => Ok(self.delete(asset_id)),
        }
    }

    /// Delete an asset and its subtree without asking
    pub fn delete_checked(&mut self, asset_id: &AssetId) -> Result<Vec<AssetId>> {
        self.delete_with_confirmation(asset_id, None::<fn(&[AssetId])>)
    }
}

/// UI state of an explorer tree: expanded and selected nodes.
///
/// Kept outside the registry; nodes default to collapsed.
#[derive(Debug, Clone, Default)]
pub struct AssetTree {
    expanded: HashSet<AssetId>,
    selected: IndexSet<AssetId>,
}

impl AssetTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, asset_id: &AssetId) -> bool {
        self.expanded.contains(asset_id)
    }

    pub fn toggle_expansion(&mut self, asset_id: &AssetId) {
        if !self.expanded.remove(asset_id) {
            self.expanded.insert(asset_id.clone());
        }
    }

    pub fn set_expanded(&mut self, asset_id: &AssetId, expanded: bool) {
        if expanded {
            self.expanded.insert(asset_id.clone());
        } else {
            self.expanded.remove(asset_id);
        }
    }

    /// Expand every asset currently in the registry
    pub fn expand_all(&mut self, registry: &AssetRegistry) {
        self.expanded.extend(registry.iter().map(|a| a.id().clone()));
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    /// Select a node. With `multi` the node is toggled in the selection,
    /// otherwise it replaces the selection.
    pub fn toggle_selection(&mut self, asset_id: &AssetId, multi: bool) {
        if multi {
            if !self.selected.shift_remove(asset_id) {
                self.selected.insert(asset_id.clone());
            }
        } else {
            self.selected.clear();
            self.selected.insert(asset_id.clone());
        }
    }

    pub fn selected(&self) -> impl Iterator<Item = &AssetId> {
        self.selected.iter()
    }

    pub fn is_selected(&self, asset_id: &AssetId) -> bool {
        self.selected.contains(asset_id)
    }

    /// Forget state for assets that no longer exist
    pub fn prune(&mut self, registry: &AssetRegistry) {
        self.expanded.retain(|id| registry.contains(id));
        self.selected.retain(|id| registry.contains(id));
    }

    /// Resolve the registry into nested nodes, starting at the roots
    pub fn build<'a>(&self, registry: &'a AssetRegistry) -> Vec<AssetNode<'a>> {
        let mut seen = HashSet::new();
        registry
            .root_assets()
            .into_iter()
            .filter_map(|asset| self.build_node(registry, asset, 0, &mut seen))
            .collect()
    }

    /// Resolve a single subtree
    pub fn build_from<'a>(
        &self,
        registry: &'a AssetRegistry,
        root: &AssetId,
    ) -> Option<AssetNode<'a>> {
        let asset = registry.get(root)?;
        self.build_node(registry, asset, 0, &mut HashSet::new())
    }

    fn build_node<'a>(
        &self,
        registry: &'a AssetRegistry,
        asset: &'a Asset,
        level: usize,
        seen: &mut HashSet<&'a AssetId>,
    ) -> Option<AssetNode<'a>> {
        if !seen.insert(asset.id()) {
            return None;
        }
        let children = asset
            .children()
            .iter()
            .filter_map(|id| registry.get(id))
            .filter_map(|child| self.build_node(registry, child, level + 1, seen))
            .collect();

        Some(AssetNode {
            asset,
            level,
            is_expanded: self.is_expanded(asset.id()),
            children,
        })
    }

    /// Build and flatten in one go
    pub fn flattened<'a>(&self, registry: &'a AssetRegistry) -> Vec<(usize, &'a Asset)> {
        flatten(&self.build(registry))
            .into_iter()
            .map(|node| (node.level, node.asset))
            .collect()
    }
}

/// Pre-order list of nodes for list rendering; children of collapsed nodes
/// are skipped
pub fn flatten<'n, 'a>(nodes: &'n [AssetNode<'a>]) -> Vec<&'n AssetNode<'a>> {
    fn walk<'n, 'a>(node: &'n AssetNode<'a>, out: &mut Vec<&'n AssetNode<'a>>) {
        out.push(node);
        if node.is_expanded {
            for child in &node.children {
                walk(child, out);
            }
        }
    }

    let mut out = Vec::new();
    for node in nodes {
        walk(node, &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AssetKind;

    fn sample() -> (AssetRegistry, AssetId, AssetId, AssetId, AssetId) {
        let mut registry = AssetRegistry::new();
        let world = registry.create(NewAsset::new("World", AssetKind::Other), None);
        let city = registry.create(NewAsset::new("Capital City", AssetKind::Other), Some(&world));
        let hero = registry.create(NewAsset::new("Hero", AssetKind::Image), Some(&city));
        let lore = registry.create(NewAsset::new("City Lore", AssetKind::Document), None);
        (registry, world, city, hero, lore)
    }

    #[test]
    fn test_can_move() {
        let (registry, world, city, hero, lore) = sample();
        assert!(!registry.can_move(&world, Some(&world)));
        assert!(!registry.can_move(&world, Some(&city)));
        assert!(!registry.can_move(&world, Some(&hero)));
        assert!(registry.can_move(&hero, Some(&world)));
        assert!(registry.can_move(&world, Some(&lore)));
        assert!(registry.can_move(&hero, None));
    }

    #[test]
    fn test_reparent_checked_rejects_cycle() {
        let (mut registry, world, _city, hero, _) = sample();
        let rev = registry.revision();
        let err = registry.reparent_checked(&world, Some(&hero)).unwrap_err();
        assert!(matches!(err, Error::CircularReference { .. }));
        assert_eq!(registry.revision(), rev);
        assert!(registry.get(&world).unwrap().is_root());
    }

    #[test]
    fn test_reparent_checked_rejects_missing_target() {
        let (mut registry, world, ..) = sample();
        let err = registry
            .reparent_checked(&world, Some(&AssetId::new("ghost")))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTarget(_)));

        let err = registry
            .reparent_checked(&AssetId::new("ghost"), None)
            .unwrap_err();
        assert!(matches!(err, Error::AssetNotFound(_)));
    }

    #[test]
    fn test_reparent_checked_moves() {
        let (mut registry, world, _city, hero, _) = sample();
        registry.reparent_checked(&hero, Some(&world)).unwrap();
        assert_eq!(registry.get(&hero).unwrap().parent_id(), Some(&world));
        assert_eq!(registry.get(&world).unwrap().children().len(), 2);
    }

    #[test]
    fn test_create_checked() {
        let (mut registry, world, ..) = sample();
        assert!(registry
            .create_checked(NewAsset::new("Inn", AssetKind::Other), Some(&world))
            .is_ok());
        let err = registry
            .create_checked(NewAsset::new("Inn", AssetKind::Other), Some(&AssetId::new("x")))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTarget(_)));
    }

    #[test]
    fn test_delete_with_confirmation_defers() {
        let (mut registry, world, city, hero, _) = sample();
        let mut asked = Vec::new();
        let ids = registry
            .delete_with_confirmation(&world, Some(|ids: &[AssetId]| asked = ids.to_vec()))
            .unwrap();

        assert_eq!(asked, vec![world.clone(), city.clone(), hero.clone()]);
        assert_eq!(ids, asked);
        assert_eq!(registry.len(), 4);

        let removed = registry.delete_checked(&world).unwrap();
        assert_eq!(removed.len(), 3);
        assert_eq!(registry.len(), 1);
        assert!(registry.delete_checked(&world).is_err());
    }

    #[test]
    fn test_asset_path_and_depth() {
        let (registry, world, city, hero, lore) = sample();
        let path: Vec<&AssetId> = registry.asset_path(&hero).iter().map(|a| a.id()).collect();
        assert_eq!(path, vec![&world, &city, &hero]);
        assert_eq!(registry.depth(&hero), 2);
        assert_eq!(registry.depth(&lore), 0);
        assert!(registry.asset_path(&AssetId::new("ghost")).is_empty());
    }

    #[test]
    fn test_find_path() {
        let (registry, world, city, hero, lore) = sample();
        assert_eq!(
            registry.find_path(&city, &hero),
            Some(vec![city.clone(), hero.clone()])
        );
        assert_eq!(registry.find_path(&world, &world), Some(vec![world.clone()]));
        assert_eq!(registry.find_path(&lore, &hero), None);
    }

    #[test]
    fn test_siblings() {
        let (mut registry, world, city, ..) = sample();
        let inn = registry.create(NewAsset::new("Inn", AssetKind::Other), Some(&world));
        let names: Vec<&str> = registry.siblings(&city).iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Inn"]);
        assert!(registry.siblings(&world).is_empty());
        assert_eq!(registry.siblings(&inn).len(), 1);
    }

    #[test]
    fn test_search_is_case_insensitive_and_ordered() {
        let (registry, ..) = sample();
        let names: Vec<&str> = registry.search("CITY").iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Capital City", "City Lore"]);
        assert!(registry.search("dragon").is_empty());
    }

    #[test]
    fn test_build_levels() {
        let (registry, world, ..) = sample();
        let tree = AssetTree::new();
        let nodes = tree.build(&registry);

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].id(), &world);
        assert_eq!(nodes[0].children[0].level, 1);
        assert_eq!(nodes[0].children[0].children[0].level, 2);
    }

    #[test]
    fn test_flatten_respects_expansion() {
        let (registry, world, city, ..) = sample();
        let mut tree = AssetTree::new();

        let names = |tree: &AssetTree| -> Vec<String> {
            tree.flattened(&registry)
                .iter()
                .map(|(_, a)| a.name.clone())
                .collect()
        };

        assert_eq!(names(&tree), vec!["World", "City Lore"]);

        tree.toggle_expansion(&world);
        assert_eq!(names(&tree), vec!["World", "Capital City", "City Lore"]);

        tree.set_expanded(&city, true);
        assert_eq!(names(&tree), vec!["World", "Capital City", "Hero", "City Lore"]);

        // Collapsing a parent hides the expanded grandchild too
        tree.toggle_expansion(&world);
        assert_eq!(names(&tree), vec!["World", "City Lore"]);
    }

    #[test]
    fn test_selection() {
        let (_, world, city, hero, _) = sample();
        let mut tree = AssetTree::new();
        tree.toggle_selection(&world, false);
        tree.toggle_selection(&city, true);
        tree.toggle_selection(&world, true);
        assert_eq!(tree.selected().collect::<Vec<_>>(), vec![&city]);

        tree.toggle_selection(&hero, false);
        assert!(tree.is_selected(&hero));
        assert!(!tree.is_selected(&city));
    }

    #[test]
    fn test_prune_drops_deleted() {
        let (mut registry, world, city, ..) = sample();
        let mut tree = AssetTree::new();
        tree.expand_all(&registry);
        tree.toggle_selection(&city, false);
        registry.delete(&world);
        tree.prune(&registry);
        assert!(!tree.is_expanded(&world));
        assert_eq!(tree.selected().count(), 0);
    }
}

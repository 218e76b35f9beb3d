//! Entered-viewport navigation
//!
//! Double-clicking an asset "enters" it: the canvas then shows that asset's
//! children, in coordinates local to it, under the asset's own viewport.

use crate::geometry::{
    calculate_center_transform, local_to_global, screen_to_viewport, Point, Size, ViewportConfig,
    REFERENCE_HEIGHT, REFERENCE_WIDTH,
};
use crate::registry::AssetRegistry;
use crate::{Asset, AssetId};
use log::debug;

/// Which asset is entered and the live viewport
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    entered: Option<AssetId>,
    viewport: ViewportConfig,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entered(&self) -> Option<&AssetId> {
        self.entered.as_ref()
    }

    pub fn viewport(&self) -> ViewportConfig {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: ViewportConfig) {
        self.viewport = viewport;
    }

    /// Enter an asset.
    ///
    /// The asset becomes active and the registry's viewport context. The
    /// viewport switches to the asset's own config, or centres the asset in
    /// `container` if it has none. Returns the new viewport, or `None` if the
    /// asset does not exist.
    pub fn enter(
        &mut self,
        registry: &mut AssetRegistry,
        asset_id: &AssetId,
        container: Size,
    ) -> Option<ViewportConfig> {
        let asset = registry.get(asset_id)?;
        let viewport = asset.viewport_config.unwrap_or_else(|| {
            calculate_center_transform(asset, container.width, container.height)
        });

        registry.set_active_asset(Some(asset_id.clone()));
        registry.set_current_viewport_id(Some(asset_id.clone()));
        self.entered = Some(asset_id.clone());
        self.viewport = viewport;
        debug!("entered asset {}", asset_id);
        Some(viewport)
    }

    /// Leave the entered asset and return to the top-level canvas
    pub fn exit(&mut self, registry: &mut AssetRegistry) {
        if let Some(id) = self.entered.take() {
            debug!("exited asset {}", id);
        }
        registry.set_active_asset(None);
        registry.set_current_viewport_id(None);
        self.viewport = ViewportConfig::default();
    }

    /// Drop the entered asset if it no longer exists
    pub fn sync(&mut self, registry: &mut AssetRegistry) {
        if self
            .entered
            .as_ref()
            .is_some_and(|id| !registry.contains(id))
        {
            self.exit(registry);
        }
    }

    /// Assets drawn on the current canvas: the entered asset's children, or
    /// the roots
    pub fn visible_assets<'a>(&self, registry: &'a AssetRegistry) -> Vec<&'a Asset> {
        match &self.entered {
            Some(id) => registry.children_of(id),
            None => registry.root_assets(),
        }
    }

    /// Global position for an asset dragged to `screen` (already corrected
    /// for the grab offset) inside a `container`.
    ///
    /// The point is converted to viewport space, kept inside the container
    /// minus the reference box, then made global relative to the entered
    /// asset.
    pub fn drag_position(&self, registry: &AssetRegistry, screen: Point, container: Size) -> Point {
        let p = screen_to_viewport(screen, &self.viewport);
        let max_x = (container.width - REFERENCE_WIDTH).max(0.0);
        let max_y = (container.height - REFERENCE_HEIGHT).max(0.0);
        let bounded = Point::new(p.x.clamp(0.0, max_x), p.y.clamp(0.0, max_y));

        match self.entered.as_ref().and_then(|id| registry.get(id)) {
            Some(parent) => local_to_global(bounded, parent),
            None => bounded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AssetKind, AssetPatch, NewAsset};

    #[test]
    fn test_enter_uses_asset_viewport() {
        let mut registry = AssetRegistry::new();
        let id = registry.create(
            NewAsset::new("Castle", AssetKind::Other).at(100.0, 50.0),
            None,
        );
        registry.update(
            &id,
            AssetPatch {
                viewport_config: Some(Some(ViewportConfig::new(2.0, 5.0, 6.0))),
                ..Default::default()
            },
        );

        let mut nav = Navigator::new();
        let viewport = nav.enter(&mut registry, &id, Size::new(800.0, 600.0)).unwrap();
        assert_eq!(viewport, ViewportConfig::new(2.0, 5.0, 6.0));
        assert_eq!(registry.active_id(), Some(&id));
        assert_eq!(registry.current_viewport_id(), Some(&id));
    }

    #[test]
    fn test_enter_centres_without_viewport() {
        let mut registry = AssetRegistry::new();
        let id = registry.create(
            NewAsset::new("Castle", AssetKind::Other).at(100.0, 50.0),
            None,
        );
        registry.update(
            &id,
            AssetPatch {
                viewport_config: Some(None),
                ..Default::default()
            },
        );

        let mut nav = Navigator::new();
        let viewport = nav.enter(&mut registry, &id, Size::new(800.0, 600.0)).unwrap();
        assert_eq!(viewport, ViewportConfig::new(1.0, 200.0, 225.0));
    }

    #[test]
    fn test_enter_unknown_is_none() {
        let mut registry = AssetRegistry::new();
        let mut nav = Navigator::new();
        assert!(nav
            .enter(&mut registry, &AssetId::new("ghost"), Size::new(1.0, 1.0))
            .is_none());
        assert!(nav.entered().is_none());
    }

    #[test]
    fn test_exit_resets() {
        let mut registry = AssetRegistry::new();
        let id = registry.create(NewAsset::new("Castle", AssetKind::Other), None);
        let mut nav = Navigator::new();
        nav.enter(&mut registry, &id, Size::new(800.0, 600.0));
        nav.exit(&mut registry);

        assert!(nav.entered().is_none());
        assert!(registry.active_id().is_none());
        assert!(registry.current_viewport_id().is_none());
        assert_eq!(nav.viewport(), ViewportConfig::default());
    }

    #[test]
    fn test_visible_assets() {
        let mut registry = AssetRegistry::new();
        let castle = registry.create(NewAsset::new("Castle", AssetKind::Other), None);
        registry.create(NewAsset::new("Throne", AssetKind::Other), Some(&castle));
        registry.create(NewAsset::new("Forest", AssetKind::Other), None);

        let mut nav = Navigator::new();
        let names: Vec<&str> = nav
            .visible_assets(&registry)
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(names, vec!["Castle", "Forest"]);

        nav.enter(&mut registry, &castle, Size::new(800.0, 600.0));
        let names: Vec<&str> = nav
            .visible_assets(&registry)
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(names, vec!["Throne"]);
    }

    #[test]
    fn test_drag_position_clamps_and_globalises() {
        let mut registry = AssetRegistry::new();
        let castle = registry.create(
            NewAsset::new("Castle", AssetKind::Other).at(300.0, 200.0),
            None,
        );
        let mut nav = Navigator::new();
        let container = Size::new(800.0, 600.0);

        // Top level, zoom 1: clamped to [0, 600] x [0, 550]
        assert_eq!(
            nav.drag_position(&registry, Point::new(-20.0, 700.0), container),
            Point::new(0.0, 550.0)
        );

        nav.enter(&mut registry, &castle, container);
        nav.set_viewport(ViewportConfig::new(2.0, 100.0, 0.0));
        // (300 - 100) / 2 = 100, 80 / 2 = 40, then + castle position
        assert_eq!(
            nav.drag_position(&registry, Point::new(300.0, 80.0), container),
            Point::new(400.0, 240.0)
        );
    }

    #[test]
    fn test_sync_exits_deleted() {
        let mut registry = AssetRegistry::new();
        let id = registry.create(NewAsset::new("Castle", AssetKind::Other), None);
        let mut nav = Navigator::new();
        nav.enter(&mut registry, &id, Size::new(800.0, 600.0));
        registry.delete(&id);
        nav.sync(&mut registry);
        assert!(nav.entered().is_none());
    }
}

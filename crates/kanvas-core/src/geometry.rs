//! Coordinate spaces of the nested canvas
//!
//! Three spaces are in play:
//! - **global**: the canvas space asset positions are stored in
//! - **local**: relative to a parent asset's top-left corner
//! - **screen**: what the user sees, after the viewport's zoom and pan
//!
//! Screen and viewport space relate by `screen = viewport * zoom + pan`.

use crate::Asset;
use serde::{Deserialize, Serialize};

/// Width of the reference box used for centering and hit testing
pub const REFERENCE_WIDTH: f64 = 200.0;
/// Height of the reference box used for centering and hit testing
pub const REFERENCE_HEIGHT: f64 = 50.0;

/// A 2D point
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A 2D extent
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Zoom and pan of a viewport
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportConfig {
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

impl ViewportConfig {
    pub fn new(zoom: f64, pan_x: f64, pan_y: f64) -> Self {
        Self { zoom, pan_x, pan_y }
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }
}

/// Convert a global point to coordinates relative to `parent`
pub fn global_to_local(point: Point, parent: &Asset) -> Point {
    Point {
        x: point.x - parent.x,
        y: point.y - parent.y,
    }
}

/// Convert a point relative to `parent` back to global coordinates
pub fn local_to_global(point: Point, parent: &Asset) -> Point {
    Point {
        x: point.x + parent.x,
        y: point.y + parent.y,
    }
}

/// Undo a viewport's pan and zoom
///
/// `viewport.zoom` must be non-zero.
pub fn screen_to_viewport(point: Point, viewport: &ViewportConfig) -> Point {
    Point {
        x: (point.x - viewport.pan_x) / viewport.zoom,
        y: (point.y - viewport.pan_y) / viewport.zoom,
    }
}

/// Apply a viewport's zoom and pan
pub fn viewport_to_screen(point: Point, viewport: &ViewportConfig) -> Point {
    Point {
        x: point.x * viewport.zoom + viewport.pan_x,
        y: point.y * viewport.zoom + viewport.pan_y,
    }
}

/// Viewport at zoom 1 that puts the asset's reference-box midpoint in the
/// middle of a `container_width` x `container_height` container
pub fn calculate_center_transform(
    asset: &Asset,
    container_width: f64,
    container_height: f64,
) -> ViewportConfig {
    let center_x = asset.x + REFERENCE_WIDTH / 2.0;
    let center_y = asset.y + REFERENCE_HEIGHT / 2.0;

    ViewportConfig {
        zoom: 1.0,
        pan_x: container_width / 2.0 - center_x,
        pan_y: container_height / 2.0 - center_y,
    }
}

/// Hit test against the asset's reference box (edges inclusive)
pub fn is_point_in_asset(point: Point, asset: &Asset) -> bool {
    point.x >= asset.x
        && point.x <= asset.x + REFERENCE_WIDTH
        && point.y >= asset.y
        && point.y <= asset.y + REFERENCE_HEIGHT
}

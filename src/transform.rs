//! Conversions between device pixels, world units and grid cells.
//!
//! World space is what the scene geometry is authored in: the grid is centered on the origin,
//! Y grows upward, and at zoom 1 the visible height spans `2 * PROJECTION_HALF_HEIGHT` units.
//! Hit testing must exactly invert the placement in [`CellGeometry::cell_center`], so both live
//! here.

use glam::{Mat4, Vec2, Vec3};

use crate::model::GridModel;

/// Half the visible world height at zoom 1.
pub const PROJECTION_HALF_HEIGHT: f32 = 2.0;
pub const PROJECTION_NEAR: f32 = -1.0;
pub const PROJECTION_FAR: f32 = 1.0;

/// Drawable surface size in device pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    /// Half extents of the visible world rectangle at `zoom`.
    pub fn half_extents(&self, zoom: f32) -> Vec2 {
        let half_h = PROJECTION_HALF_HEIGHT / zoom;
        Vec2::new(half_h * self.aspect(), half_h)
    }
}

pub fn screen_to_world(screen: Vec2, viewport: Viewport, zoom: f32) -> Vec2 {
    let half = viewport.half_extents(zoom);
    Vec2::new(
        ((screen.x / viewport.width) * 2.0 - 1.0) * half.x,
        -((screen.y / viewport.height) * 2.0 - 1.0) * half.y,
    )
}

pub fn world_to_screen(world: Vec2, viewport: Viewport, zoom: f32) -> Vec2 {
    let half = viewport.half_extents(zoom);
    Vec2::new(
        (world.x / half.x + 1.0) * 0.5 * viewport.width,
        (1.0 - world.y / half.y) * 0.5 * viewport.height,
    )
}

/// Fixed cell layout of a grid in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellGeometry {
    pub spacing: f32,
    /// Half of the grid's longest side in world units.
    pub extent: f32,
}

impl CellGeometry {
    pub fn for_grid(grid: &GridModel, spacing: f32) -> Self {
        Self {
            spacing,
            extent: grid.size().longest_side() as f32 * spacing * 0.5,
        }
    }

    pub fn cell_center(&self, x: u32, y: u32) -> Vec2 {
        Vec2::new(
            -self.extent + (x as f32 + 0.5) * self.spacing,
            self.extent - (y as f32 + 0.5) * self.spacing,
        )
    }

    /// Continuous grid coordinates of a world point, before rounding.
    pub fn world_to_grid(&self, world: Vec2, scroll: Vec2) -> Vec2 {
        let local = world - scroll;
        Vec2::new(
            (local.x + self.extent) / self.spacing - 0.5,
            (self.extent - local.y) / self.spacing - 0.5,
        )
    }

    /// The cell a world point falls in. May be outside the grid; callers bounds-check.
    pub fn world_to_cell(&self, world: Vec2, scroll: Vec2) -> (i32, i32) {
        let g = self.world_to_grid(world, scroll);
        (g.x.round() as i32, g.y.round() as i32)
    }
}

pub fn projection_matrix(viewport: Viewport, zoom: f32) -> Mat4 {
    let half = viewport.half_extents(zoom);
    Mat4::orthographic_rh_gl(
        -half.x,
        half.x,
        -half.y,
        half.y,
        PROJECTION_NEAR,
        PROJECTION_FAR,
    )
}

pub fn model_matrix(scroll: Vec2) -> Mat4 {
    Mat4::from_translation(Vec3::new(scroll.x, scroll.y, 0.0))
}

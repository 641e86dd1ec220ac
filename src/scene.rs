//! Geometry for the four draw passes, rebuilt wholesale from the grid and the selection.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::model::{GridCell, GridModel, Position};
use crate::transform::CellGeometry;

pub type Index = u32;
pub type Rgb = [f32; 3];

pub const OUTLINE_COLOR: Rgb = [0.55, 0.58, 0.62];
pub const TEAM1_COLOR: Rgb = [0.90, 0.28, 0.25];
pub const TEAM2_COLOR: Rgb = [0.25, 0.50, 0.95];
pub const TEAM3_COLOR: Rgb = [0.30, 0.80, 0.40];
pub const OBJECT_COLOR: Rgb = [0.85, 0.55, 0.15];
pub const HIGHLIGHT_COLOR: Rgb = [1.0, 0.85, 0.10];

/// Fraction of a cell covered by object blocks and tank sprites.
const FILL_SCALE: f32 = 0.8;
const HIGHLIGHT_SCALE: f32 = 1.1;
/// Slightly in front of the base layer at z = 0.
pub const HIGHLIGHT_DEPTH: f32 = 0.05;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ColorVertex {
    pub position: [f32; 3],
    pub color: Rgb,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct TexturedVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

#[derive(Clone, Debug, PartialEq)]
pub struct Batch<V> {
    pub vertices: Vec<V>,
    pub indices: Vec<Index>,
}

impl<V> Default for Batch<V> {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }
}

impl<V> Batch<V> {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    fn base(&self) -> Index {
        self.vertices.len() as Index
    }
}

/// Corners of an axis-aligned square, counter-clockwise from top-left.
fn square(center: Vec2, half: f32) -> [Vec2; 4] {
    [
        Vec2::new(center.x - half, center.y + half),
        Vec2::new(center.x - half, center.y - half),
        Vec2::new(center.x + half, center.y - half),
        Vec2::new(center.x + half, center.y + half),
    ]
}

impl Batch<ColorVertex> {
    pub fn push_outline(&mut self, center: Vec2, half: f32, z: f32, color: Rgb) {
        let base = self.base();
        for c in square(center, half) {
            self.vertices.push(ColorVertex {
                position: [c.x, c.y, z],
                color,
            });
        }
        self.indices.extend(
            [0, 1, 1, 2, 2, 3, 3, 0]
                .into_iter()
                .map(|i: Index| base + i),
        );
    }

    pub fn push_filled(&mut self, center: Vec2, half: f32, z: f32, color: Rgb) {
        let base = self.base();
        for c in square(center, half) {
            self.vertices.push(ColorVertex {
                position: [c.x, c.y, z],
                color,
            });
        }
        self.indices
            .extend([0, 1, 2, 0, 2, 3].into_iter().map(|i: Index| base + i));
    }
}

impl Batch<TexturedVertex> {
    /// A quad mapping the whole sprite, image top row at the top of the cell.
    pub fn push_sprite(&mut self, center: Vec2, half: f32, z: f32) {
        let base = self.base();
        let uvs = [[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]];
        for (c, uv) in square(center, half).into_iter().zip(uvs) {
            self.vertices.push(TexturedVertex {
                position: [c.x, c.y, z],
                uv,
            });
        }
        self.indices
            .extend([0, 1, 2, 0, 2, 3].into_iter().map(|i: Index| base + i));
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    pub lines: Batch<ColorVertex>,
    pub triangles: Batch<ColorVertex>,
    pub textured: Batch<TexturedVertex>,
    pub highlight: Batch<ColorVertex>,
    /// Bumped on every rebuild so the renderer re-uploads once per change.
    pub generation: u64,
}

pub fn outline_color(cell: GridCell) -> Option<Rgb> {
    match cell {
        GridCell::Empty | GridCell::Unknown => Some(OUTLINE_COLOR),
        GridCell::Team1 => Some(TEAM1_COLOR),
        GridCell::Team2 => Some(TEAM2_COLOR),
        GridCell::Team3 => Some(TEAM3_COLOR),
        GridCell::Tank | GridCell::Object => None,
    }
}

pub fn build_scene(
    grid: &GridModel,
    selection: Option<Position>,
    geometry: &CellGeometry,
    generation: u64,
) -> Scene {
    let half = geometry.spacing * 0.5;
    let mut scene = Scene {
        generation,
        ..Scene::default()
    };
    for (pos, cell) in grid.cells() {
        let center = geometry.cell_center(pos.x, pos.y);
        match cell {
            GridCell::Tank => scene.textured.push_sprite(center, half * FILL_SCALE, 0.0),
            GridCell::Object => {
                scene
                    .triangles
                    .push_filled(center, half * FILL_SCALE, 0.0, OBJECT_COLOR)
            }
            other => {
                if let Some(color) = outline_color(other) {
                    scene.lines.push_outline(center, half, 0.0, color);
                }
            }
        }
    }
    scene.highlight = build_highlight(selection, geometry);
    scene
}

pub fn build_highlight(selection: Option<Position>, geometry: &CellGeometry) -> Batch<ColorVertex> {
    let mut batch = Batch::default();
    if let Some(pos) = selection {
        let center = geometry.cell_center(pos.x, pos.y);
        batch.push_outline(
            center,
            geometry.spacing * 0.5 * HIGHLIGHT_SCALE,
            HIGHLIGHT_DEPTH,
            HIGHLIGHT_COLOR,
        );
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geo(grid: &GridModel) -> CellGeometry {
        CellGeometry::for_grid(grid, 0.4)
    }

    #[test]
    fn cells_go_to_their_pass() {
        let grid = GridModel::load(&["xo", " 1", "2?"]);
        let scene = build_scene(&grid, None, &geo(&grid), 7);
        assert_eq!(scene.generation, 7);
        // outline quads: ' ', '1', '2', '?'
        assert_eq!(scene.lines.vertices.len(), 4 * 4);
        assert_eq!(scene.lines.indices.len(), 4 * 8);
        assert_eq!(scene.triangles.vertices.len(), 4);
        assert_eq!(scene.triangles.indices.len(), 6);
        assert_eq!(scene.textured.vertices.len(), 4);
        assert_eq!(scene.textured.indices.len(), 6);
        assert!(scene.highlight.is_empty());
    }

    #[test]
    fn team_outlines_are_tinted() {
        let grid = GridModel::load(&["123"]);
        let scene = build_scene(&grid, None, &geo(&grid), 0);
        let colors: Vec<Rgb> = scene.lines.vertices.iter().step_by(4).map(|v| v.color).collect();
        assert_eq!(colors, vec![TEAM1_COLOR, TEAM2_COLOR, TEAM3_COLOR]);
    }

    #[test]
    fn indices_reference_their_own_quads() {
        let grid = GridModel::fallback();
        let scene = build_scene(&grid, None, &geo(&grid), 0);
        let n = scene.lines.vertices.len() as Index;
        assert!(scene.lines.indices.iter().all(|&i| i < n));
        assert_eq!(&scene.lines.indices[8..16], &[4, 5, 5, 6, 6, 7, 7, 4]);
        assert_eq!(scene.textured.indices[6..12], [4, 5, 6, 4, 6, 7]);
    }

    #[test]
    fn outline_quads_cover_exact_cell_bounds() {
        let grid = GridModel::load(&[" "]);
        let scene = build_scene(&grid, None, &geo(&grid), 0);
        let xs: Vec<f32> = scene.lines.vertices.iter().map(|v| v.position[0]).collect();
        let ys: Vec<f32> = scene.lines.vertices.iter().map(|v| v.position[1]).collect();
        assert!(xs.iter().all(|x| (x.abs() - 0.2).abs() < 1e-6));
        assert!(ys.iter().all(|y| (y.abs() - 0.2).abs() < 1e-6));
    }

    #[test]
    fn sprite_uvs_cover_whole_image() {
        let grid = GridModel::load(&["x"]);
        let scene = build_scene(&grid, None, &geo(&grid), 0);
        let uvs: Vec<[f32; 2]> = scene.textured.vertices.iter().map(|v| v.uv).collect();
        assert_eq!(uvs, vec![[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]]);
        // top-left corner carries uv (0,0)
        let tl = scene.textured.vertices[0].position;
        assert!(tl[0] < 0.0 && tl[1] > 0.0);
    }

    #[test]
    fn highlight_is_centered_larger_and_forward() {
        let grid = GridModel::fallback();
        let g = geo(&grid);
        let scene = build_scene(&grid, Some(Position::new(3, 3)), &g, 0);
        assert_eq!(scene.highlight.vertices.len(), 4);
        assert_eq!(scene.highlight.indices.len(), 8);
        let center = g.cell_center(3, 3);
        for v in &scene.highlight.vertices {
            assert!(((v.position[0] - center.x).abs() - 0.22).abs() < 1e-5);
            assert!(((v.position[1] - center.y).abs() - 0.22).abs() < 1e-5);
            assert_eq!(v.position[2], HIGHLIGHT_DEPTH);
            assert_eq!(v.color, HIGHLIGHT_COLOR);
        }
    }

    #[test]
    fn vertex_layouts_are_tightly_packed() {
        assert_eq!(std::mem::size_of::<ColorVertex>(), 24);
        assert_eq!(std::mem::size_of::<TexturedVertex>(), 20);
    }
}

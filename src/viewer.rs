//! Per-frame orchestration of the map view.
//!
//! A frame consumes whatever the loaders published, applies queued input, rebuilds the scene if
//! the grid or selection changed and then renders. Everything runs on the animation-frame
//! callback; the loaders only ever touch the [`ViewerInbox`].
use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::config::ViewerConfig;
use crate::host::DecodedImage;
use crate::input::InputEvent;
use crate::model::{GridCell, GridModel, GridSize, MapOrigin, Position};
use crate::render::{FrameRenderer, RenderBackend};
use crate::scene::{Scene, build_scene};
use crate::state::{GestureTracker, SelectionController, SelectionReporter, ViewState};
use crate::transform::{CellGeometry, Viewport};

/// Single-slot publish point. A newer value replaces one that was never taken.
pub struct Mailbox<T>(Rc<RefCell<Option<T>>>);

impl<T> Clone for Mailbox<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self(Rc::new(RefCell::new(None)))
    }
}

impl<T> Mailbox<T> {
    pub fn publish(&self, value: T) {
        *self.0.borrow_mut() = Some(value);
    }

    pub fn take(&self) -> Option<T> {
        self.0.borrow_mut().take()
    }
}

#[derive(Clone, Default)]
pub struct ViewerInbox {
    map: Mailbox<(GridModel, MapOrigin)>,
    sprite: Mailbox<DecodedImage>,
}

impl ViewerInbox {
    pub fn publish_map(&self, grid: GridModel, origin: MapOrigin) {
        self.map.publish((grid, origin));
    }

    pub fn publish_sprite(&self, image: DecodedImage) {
        self.sprite.publish(image);
    }

    pub fn take_map(&self) -> Option<(GridModel, MapOrigin)> {
        self.map.take()
    }

    pub fn take_sprite(&self) -> Option<DecodedImage> {
        self.sprite.take()
    }
}

/// Snapshot of the viewer for the UI panels.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerStatus {
    /// `None` until the first map has been published.
    pub origin: Option<MapOrigin>,
    pub size: GridSize,
    pub tanks: usize,
    /// Cell kinds that occur in the grid, in [`GridCell::ALL`] order.
    pub present: Vec<GridCell>,
    pub zoom: f32,
    pub selected: Option<Position>,
    pub texture_loaded: bool,
}

pub struct Viewer {
    grid: GridModel,
    origin: Option<MapOrigin>,
    spacing: f32,
    geometry: CellGeometry,
    view: ViewState,
    gestures: GestureTracker,
    selection: SelectionController,
    scene: Scene,
    scene_dirty: bool,
    generation: u64,
    renderer: FrameRenderer,
    texture_loaded: bool,
    inbox: ViewerInbox,
}

impl Viewer {
    pub fn new(config: &ViewerConfig, reporter: Rc<dyn SelectionReporter>) -> Self {
        let grid = GridModel::default();
        let geometry = CellGeometry::for_grid(&grid, config.grid_spacing);
        Self {
            grid,
            origin: None,
            spacing: config.grid_spacing,
            geometry,
            view: ViewState::new(config.zoom_bounds(), config.default_zoom),
            gestures: GestureTracker::default(),
            selection: SelectionController::new(reporter),
            scene: Scene::default(),
            scene_dirty: true,
            generation: 0,
            renderer: FrameRenderer::new(),
            texture_loaded: false,
            inbox: ViewerInbox::default(),
        }
    }

    /// Handle for loaders to publish into.
    pub fn inbox(&self) -> ViewerInbox {
        self.inbox.clone()
    }

    pub fn grid(&self) -> &GridModel {
        &self.grid
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn geometry(&self) -> &CellGeometry {
        &self.geometry
    }

    pub fn status(&self) -> ViewerStatus {
        ViewerStatus {
            origin: self.origin,
            size: self.grid.size(),
            tanks: self.grid.count(GridCell::Tank),
            present: GridCell::ALL
                .into_iter()
                .filter(|&cell| self.grid.count(cell) > 0)
                .collect(),
            zoom: self.view.zoom(),
            selected: self.selection.selected(),
            texture_loaded: self.texture_loaded,
        }
    }

    /// Runs one frame. Returns whether anything was drawn.
    pub fn frame<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        viewport: Viewport,
        events: Vec<InputEvent>,
    ) -> bool {
        self.consume_inbox(backend);
        for event in events {
            self.apply(event, viewport);
        }
        if self.scene_dirty {
            self.rebuild_scene();
        }
        self.renderer
            .render(backend, viewport, &mut self.view, &self.scene)
    }

    fn consume_inbox<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) {
        if let Some((grid, origin)) = self.inbox.take_map() {
            self.replace_grid(grid, origin);
        }
        if let Some(image) = self.inbox.take_sprite() {
            match backend.upload_texture(&image) {
                Ok(()) => {
                    self.texture_loaded = true;
                    info!(width = image.width, height = image.height, "sprite uploaded");
                }
                Err(e) => warn!(error = %e, "sprite upload failed, tanks stay untextured"),
            }
        }
    }

    fn replace_grid(&mut self, grid: GridModel, origin: MapOrigin) {
        info!(
            ?origin,
            width = grid.width(),
            height = grid.height(),
            "grid replaced"
        );
        self.geometry = CellGeometry::for_grid(&grid, self.spacing);
        self.grid = grid;
        self.origin = Some(origin);
        self.selection.clear();
        self.gestures.reset();
        self.scene_dirty = true;
    }

    fn apply(&mut self, event: InputEvent, viewport: Viewport) {
        match event {
            InputEvent::Pointer(pointer) => {
                let Some(tap) = self.gestures.handle(&pointer, viewport, &mut self.view) else {
                    return;
                };
                let update =
                    self.selection
                        .try_select(tap.world, &self.grid, &self.view, &self.geometry);
                if update.needs_rebuild() {
                    self.scene_dirty = true;
                }
            }
            InputEvent::Key(key) => {
                debug!(key = %key.key, pressed = key.pressed, "key");
            }
            InputEvent::Zoom(factor) => {
                let zoom = self.view.zoom_by(factor);
                self.gestures.rebase(viewport, zoom);
                debug!(factor, zoom, "zoom step");
            }
            InputEvent::ResetView => {
                self.view.reset();
                self.gestures.rebase(viewport, self.view.zoom());
                debug!("view reset");
            }
        }
    }

    fn rebuild_scene(&mut self) {
        self.generation += 1;
        self.scene = build_scene(
            &self.grid,
            self.selection.selected(),
            &self.geometry,
            self.generation,
        );
        self.scene_dirty = false;
    }
}

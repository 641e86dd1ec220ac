// Pointer lifecycle -> pan / pinch / tap.
use glam::Vec2;
use tracing::debug;

use super::camera::ViewState;
use super::touch::{TouchState, TrackedPointer};
use crate::input::{PointerEvent, PointerPhase};
use crate::transform::{Viewport, screen_to_world};

/// Distances below this are treated as coincident pointers and never used as a zoom reference.
const MIN_PINCH_DISTANCE: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureMode {
    #[default]
    Idle,
    Panning,
    Pinching,
}

/// A pointer went down; selection hit-tests at this world position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tap {
    pub world: Vec2,
}

#[derive(Debug, Clone, Default)]
pub struct GestureTracker {
    mode: GestureMode,
    touches: TouchState,
    /// World position the next pan delta is measured from.
    anchor: Vec2,
}

impl GestureTracker {
    pub fn mode(&self) -> GestureMode {
        self.mode
    }

    pub fn touches(&self) -> &TouchState {
        &self.touches
    }

    pub fn anchor(&self) -> Vec2 {
        self.anchor
    }

    /// Applies one pointer event, mutating scroll/zoom in `view`. Every pointer-down yields a
    /// [`Tap`], including the second finger of a pinch.
    pub fn handle(
        &mut self,
        event: &PointerEvent,
        viewport: Viewport,
        view: &mut ViewState,
    ) -> Option<Tap> {
        if viewport.is_empty() {
            return None;
        }
        match event.phase {
            PointerPhase::Down => Some(self.pointer_down(event, viewport, view)),
            PointerPhase::Move => {
                self.pointer_move(event, viewport, view);
                None
            }
            PointerPhase::Up => {
                self.pointer_up(event, viewport, view);
                None
            }
            PointerPhase::Cancel => {
                self.reset();
                None
            }
        }
    }

    /// Drops every tracked pointer; scroll and zoom keep their last committed values.
    pub fn reset(&mut self) {
        if self.mode != GestureMode::Idle {
            debug!(from = ?self.mode, "gesture -> Idle");
        }
        self.mode = GestureMode::Idle;
        self.touches.clear();
    }

    /// Recomputes tracked world positions after zoom changed outside a gesture (wheel, buttons,
    /// reset) so the next pan delta reflects pointer motion only.
    pub fn rebase(&mut self, viewport: Viewport, zoom: f32) {
        if viewport.is_empty() {
            return;
        }
        for pointer in [self.touches.touch1.as_mut(), self.touches.touch2.as_mut()]
            .into_iter()
            .flatten()
        {
            pointer.world = screen_to_world(pointer.screen, viewport, zoom);
        }
        if self.mode == GestureMode::Panning {
            if let Some(lead) = self.touches.touch1 {
                self.anchor = lead.world;
            }
        }
    }

    fn pointer_down(&mut self, event: &PointerEvent, viewport: Viewport, view: &ViewState) -> Tap {
        let world = screen_to_world(event.position, viewport, view.zoom());
        let pointer = TrackedPointer {
            id: event.id,
            screen: event.position,
            world,
        };
        if self.touches.press(pointer) {
            match self.touches.active_count() {
                1 => {
                    self.mode = GestureMode::Panning;
                    self.touches.pinch = false;
                    self.anchor = world;
                    debug!(id = event.id, x = world.x, y = world.y, "gesture -> Panning");
                }
                _ => {
                    self.mode = GestureMode::Pinching;
                    self.touches.pinch = true;
                    self.touches.last_pinch_distance = self.pinch_distance(viewport).unwrap_or(0.0);
                    debug!(
                        distance = self.touches.last_pinch_distance,
                        "gesture -> Pinching"
                    );
                }
            }
        } else {
            debug!(id = event.id, "pointer down not tracked");
        }
        Tap { world }
    }

    fn pointer_move(&mut self, event: &PointerEvent, viewport: Viewport, view: &mut ViewState) {
        let world = screen_to_world(event.position, viewport, view.zoom());
        let Some(pointer) = self.touches.get_mut(event.id) else {
            return;
        };
        pointer.screen = event.position;
        pointer.world = world;

        match self.mode {
            GestureMode::Pinching => {
                let Some(current) = self.pinch_distance(viewport) else {
                    return;
                };
                let last = self.touches.last_pinch_distance;
                if last > MIN_PINCH_DISTANCE && current > MIN_PINCH_DISTANCE {
                    view.zoom_by(current / last);
                    view.mark_projection_dirty();
                }
                self.touches.last_pinch_distance = current;
            }
            GestureMode::Panning => {
                view.pan_by(world - self.anchor);
                self.anchor = world;
            }
            GestureMode::Idle => {}
        }
    }

    fn pointer_up(&mut self, event: &PointerEvent, viewport: Viewport, view: &ViewState) {
        let lifted = self.touches.release(event.id);
        // Pointers that were never tracked (a mouse-up during a touch gesture) leave it alone.
        if self.touches.active_count() == 0 || (lifted.is_some() && event.pointer_count == 0) {
            self.reset();
            return;
        }
        if lifted.is_none() {
            return;
        }
        if let Some(survivor) = self.touches.touch1.as_mut() {
            // The survivor's stored world position may predate the last zoom step.
            survivor.world = screen_to_world(survivor.screen, viewport, view.zoom());
            self.anchor = survivor.world;
            self.mode = GestureMode::Panning;
            self.touches.pinch = false;
            debug!(id = survivor.id, "gesture -> Panning (survivor)");
        }
    }

    /// Distance between the two tracked pointers in world units at unit zoom, so the reference
    /// does not shrink as the zoom it drives grows.
    fn pinch_distance(&self, viewport: Viewport) -> Option<f32> {
        let (a, b) = self.touches.pair()?;
        let a = screen_to_world(a.screen, viewport, 1.0);
        let b = screen_to_world(b.screen, viewport, 1.0);
        Some(a.distance(b))
    }
}

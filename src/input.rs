//! Input events queued by DOM listeners and drained once per frame.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use glam::Vec2;

use crate::state::touch::PointerId;

/// Identity used for the mouse, which never collides with touch identifiers (those are >= 0).
pub const MOUSE_POINTER_ID: PointerId = -1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub id: PointerId,
    /// Position in device pixels relative to the canvas.
    pub position: Vec2,
    /// Pointers still down once this event has been applied.
    pub pointer_count: u32,
}

impl PointerEvent {
    pub fn new(phase: PointerPhase, id: PointerId, x: f32, y: f32, pointer_count: u32) -> Self {
        Self {
            phase,
            id,
            position: Vec2::new(x, y),
            pointer_count,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct KeyEvent {
    pub key: String,
    pub pressed: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    Pointer(PointerEvent),
    Key(KeyEvent),
    /// Multiplicative zoom from the wheel or the zoom buttons.
    Zoom(f32),
    ResetView,
}

/// Single-threaded event buffer shared between DOM callbacks and the frame loop.
#[derive(Clone, Default)]
pub struct InputQueue(Rc<RefCell<VecDeque<InputEvent>>>);

impl InputQueue {
    pub fn push(&self, event: InputEvent) {
        self.0.borrow_mut().push_back(event);
    }

    pub fn drain(&self) -> Vec<InputEvent> {
        self.0.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }
}

/// Wheel delta (pixels, positive = scroll down) to a zoom factor.
pub fn wheel_zoom_factor(delta_y: f64) -> f32 {
    (-delta_y * 0.001).exp() as f32
}

// Pan/zoom view state shared by input handling and the frame renderer.
use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomBounds {
    pub min: f32,
    pub max: f32,
}

impl Default for ZoomBounds {
    fn default() -> Self {
        Self { min: 0.5, max: 3.0 }
    }
}

impl ZoomBounds {
    pub fn clamp(&self, zoom: f32) -> f32 {
        zoom.clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone)]
pub struct ViewState {
    pub scroll: Vec2,
    zoom: f32,
    default_zoom: f32,
    bounds: ZoomBounds,
    /// Set whenever zoom changes; the projection needs the viewport aspect, known only at render
    /// time, so recomputation is deferred to the next frame.
    projection_dirty: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(ZoomBounds::default(), 1.0)
    }
}

impl ViewState {
    pub fn new(bounds: ZoomBounds, default_zoom: f32) -> Self {
        let default_zoom = bounds.clamp(default_zoom);
        Self {
            scroll: Vec2::ZERO,
            zoom: default_zoom,
            default_zoom,
            bounds,
            projection_dirty: true,
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn bounds(&self) -> ZoomBounds {
        self.bounds
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.scroll += delta;
    }

    /// Multiplies the zoom by `factor`, clamped to the bounds. Returns the committed zoom.
    pub fn zoom_by(&mut self, factor: f32) -> f32 {
        if !factor.is_finite() || factor <= 0.0 {
            return self.zoom;
        }
        self.set_zoom(self.zoom * factor)
    }

    pub fn set_zoom(&mut self, zoom: f32) -> f32 {
        let zoom = self.bounds.clamp(zoom);
        if zoom != self.zoom {
            self.zoom = zoom;
            self.projection_dirty = true;
        }
        self.zoom
    }

    pub fn reset(&mut self) {
        self.scroll = Vec2::ZERO;
        self.set_zoom(self.default_zoom);
    }

    pub fn mark_projection_dirty(&mut self) {
        self.projection_dirty = true;
    }

    pub fn projection_dirty(&self) -> bool {
        self.projection_dirty
    }

    /// Returns whether the projection needed recomputing and clears the flag.
    pub fn take_projection_dirty(&mut self) -> bool {
        std::mem::take(&mut self.projection_dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let v = ViewState::default();
        assert_eq!(v.zoom(), 1.0);
        assert_eq!(v.scroll, Vec2::ZERO);
        assert_eq!(v.bounds(), ZoomBounds { min: 0.5, max: 3.0 });
        assert!(v.projection_dirty());
    }

    #[test]
    fn zoom_is_clamped_and_marks_dirty() {
        let mut v = ViewState::default();
        v.take_projection_dirty();
        assert_eq!(v.zoom_by(10.0), 3.0);
        assert!(v.take_projection_dirty());
        assert_eq!(v.zoom_by(0.01), 0.5);
        assert_eq!(v.zoom(), 0.5);
    }

    #[test]
    fn unchanged_zoom_does_not_dirty_projection() {
        let mut v = ViewState::default();
        v.set_zoom(3.0);
        v.take_projection_dirty();
        v.zoom_by(1.5);
        assert!(!v.projection_dirty());
    }

    #[test]
    fn nonsense_factors_are_ignored() {
        let mut v = ViewState::default();
        assert_eq!(v.zoom_by(f32::NAN), 1.0);
        assert_eq!(v.zoom_by(-2.0), 1.0);
        assert_eq!(v.zoom_by(0.0), 1.0);
    }

    #[test]
    fn reset_restores_scroll_and_default_zoom() {
        let mut v = ViewState::new(ZoomBounds { min: 0.5, max: 3.0 }, 1.25);
        v.pan_by(Vec2::new(1.0, -2.0));
        v.zoom_by(2.0);
        v.reset();
        assert_eq!(v.scroll, Vec2::ZERO);
        assert_eq!(v.zoom(), 1.25);
    }
}

use tracing::{debug, warn};

use super::{Pass, RenderBackend, ShaderKind};
use crate::scene::Scene;
use crate::state::ViewState;
use crate::transform::{Viewport, model_matrix, projection_matrix};

/// Issues the fixed pass sequence each frame and keeps GPU-side state in step with the scene.
#[derive(Debug, Default)]
pub struct FrameRenderer {
    viewport: Option<Viewport>,
    uploaded_generation: Option<u64>,
    /// Passes whose last upload succeeded with at least one index.
    drawable: Vec<Pass>,
}

impl FrameRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn uploaded_generation(&self) -> Option<u64> {
        self.uploaded_generation
    }

    /// Renders one frame. Returns `false` when the surface has no area and nothing was issued.
    pub fn render<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        viewport: Viewport,
        view: &mut ViewState,
        scene: &Scene,
    ) -> bool {
        if viewport.is_empty() {
            return false;
        }
        if self.viewport != Some(viewport) {
            debug!(width = viewport.width, height = viewport.height, "viewport resized");
            backend.set_viewport(viewport);
            self.viewport = Some(viewport);
            view.mark_projection_dirty();
        }
        if view.take_projection_dirty() {
            let projection = projection_matrix(viewport, view.zoom());
            for shader in ShaderKind::ALL {
                backend.set_projection(shader, &projection);
            }
        }
        if self.uploaded_generation != Some(scene.generation) {
            self.upload(backend, scene);
        }

        let model = model_matrix(view.scroll);
        for shader in ShaderKind::ALL {
            backend.set_model(shader, &model);
        }

        backend.clear();
        for pass in Pass::ORDER {
            if !self.drawable.contains(&pass) {
                continue;
            }
            if pass == Pass::Textured && !backend.has_texture() {
                continue;
            }
            backend.draw(pass);
        }
        backend.present();
        true
    }

    fn upload<B: RenderBackend + ?Sized>(&mut self, backend: &mut B, scene: &Scene) {
        self.drawable.clear();
        let colored = [
            (Pass::Lines, &scene.lines),
            (Pass::Triangles, &scene.triangles),
            (Pass::Highlight, &scene.highlight),
        ];
        for (pass, batch) in colored {
            match backend.upload_colored(pass, batch) {
                Ok(()) if !batch.is_empty() => self.drawable.push(pass),
                Ok(()) => {}
                Err(e) => warn!(?pass, error = %e, "batch upload failed; pass disabled"),
            }
        }
        match backend.upload_textured(&scene.textured) {
            Ok(()) if !scene.textured.is_empty() => self.drawable.push(Pass::Textured),
            Ok(()) => {}
            Err(e) => warn!(error = %e, "sprite batch upload failed; pass disabled"),
        }
        self.uploaded_generation = Some(scene.generation);
        debug!(generation = scene.generation, passes = ?self.drawable, "scene uploaded");
    }
}

//! Renderer facade
//!
//! Owns the backend, the material registry, per-frame draw queues and frame
//! pacing. Scene code submits drawables during the update; [`Renderer::render`]
//! flushes every pipeline once and presents.

use super::{
    AcquireStatus, Camera2D, Drawable, FramePacer, FrameStatus, IndexBufferId, MaterialDesc, MaterialId,
    MaterialRegistry, Pipeline, PipelineKey, PresentStatus, RenderBackend, RenderError, RenderResult,
    SpriteBatcher, TextureDesc, TextureId, Vertex, VertexBufferId,
};
use crate::config::RendererConfig;
use crate::foundation::math::Mat4;
use std::collections::HashMap;
use std::time::Duration;

/// Counters for the last presented frame and totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frames presented
    pub frames_presented: u64,
    /// Drawables submitted for the last presented frame
    pub drawables: usize,
    /// Draw calls issued for the last presented frame
    pub draw_calls: usize,
    /// Swapchain recreations
    pub resizes: u64,
}

/// Sprite renderer over a [`RenderBackend`]
pub struct Renderer {
    backend: Box<dyn RenderBackend>,
    materials: MaterialRegistry,
    pipelines: HashMap<PipelineKey, Pipeline>,
    pipeline_order: Vec<PipelineKey>,
    batcher: Option<SpriteBatcher>,
    pacer: FramePacer,
    view_projection: Mat4,
    acquire_timeout: Duration,
    submitted: usize,
    swapchain_dirty: bool,
    stats: FrameStats,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("pipelines", &self.pipeline_order.len())
            .field("batching", &self.batcher.is_some())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Renderer {
    /// Create a renderer over `backend`
    pub fn new(backend: impl RenderBackend + 'static, config: &RendererConfig) -> Self {
        let acquire_timeout = Duration::from_millis(config.acquire_timeout_ms);
        log::info!(
            "Renderer created: {} frames in flight, batching {}",
            config.max_frames_in_flight,
            if config.batching { "on" } else { "off" }
        );
        Self {
            backend: Box::new(backend),
            materials: MaterialRegistry::new(),
            pipelines: HashMap::new(),
            pipeline_order: Vec::new(),
            batcher: config.batching.then(SpriteBatcher::new),
            pacer: FramePacer::new(config.max_frames_in_flight, acquire_timeout),
            view_projection: Mat4::identity(),
            acquire_timeout,
            submitted: 0,
            swapchain_dirty: false,
            stats: FrameStats::default(),
        }
    }

    /// Surface extent in pixels
    pub fn extent(&self) -> (u32, u32) {
        self.backend.extent()
    }

    /// Create a vertex buffer
    pub fn create_vertex_buffer(&mut self, vertices: &[Vertex]) -> RenderResult<VertexBufferId> {
        self.backend.create_vertex_buffer(vertices)
    }

    /// Create an index buffer
    pub fn create_index_buffer(&mut self, indices: &[u32]) -> RenderResult<IndexBufferId> {
        self.backend.create_index_buffer(indices)
    }

    /// Create a unit quad (vertex and index buffer)
    pub fn create_quad(&mut self) -> RenderResult<(VertexBufferId, IndexBufferId)> {
        let (vertices, indices) = Vertex::quad();
        Ok((self.create_vertex_buffer(&vertices)?, self.create_index_buffer(&indices)?))
    }

    /// Create a texture, or return the existing one with the same name
    pub fn create_texture_2d(&mut self, desc: &TextureDesc) -> RenderResult<TextureId> {
        let backend = &mut self.backend;
        self.materials.intern_texture(&desc.name, || backend.create_texture_2d(desc))
    }

    /// Create a material, or return the existing one with the same name
    pub fn create_material(&mut self, desc: &MaterialDesc) -> RenderResult<MaterialId> {
        let backend = &mut self.backend;
        self.materials.intern_material(desc, |desc| backend.create_material(desc))
    }

    /// Material by name
    pub fn material(&self, name: &str) -> RenderResult<MaterialId> {
        self.materials.material(name)
    }

    /// Texture by name
    pub fn texture(&self, name: &str) -> RenderResult<TextureId> {
        self.materials.texture(name)
    }

    /// Material registry
    pub fn materials(&self) -> &MaterialRegistry {
        &self.materials
    }

    /// Use `camera` for the next frame
    pub fn set_camera(&mut self, camera: &Camera2D) {
        self.view_projection = camera.view_projection();
    }

    /// View-projection matrix of the current camera
    pub fn view_projection(&self) -> &Mat4 {
        &self.view_projection
    }

    /// Queue a drawable on its (material, vertex buffer) pipeline
    pub fn submit_draw(&mut self, drawable: Drawable) {
        let key = PipelineKey::of(&drawable);
        let pipeline = self.pipelines.entry(key).or_insert_with(|| {
            log::debug!("Created pipeline for {key:?}");
            self.pipeline_order.push(key);
            Pipeline::new(key)
        });
        pipeline.enqueue(drawable);
        self.submitted += 1;
    }

    /// Queue a sprite: batched by material when batching is on
    pub fn submit_sprite(&mut self, drawable: Drawable) {
        match &mut self.batcher {
            Some(batcher) => {
                batcher.add(&drawable);
                self.submitted += 1;
            }
            None => self.submit_draw(drawable),
        }
    }

    /// Whether sprites are batched
    pub fn is_batching(&self) -> bool {
        self.batcher.is_some()
    }

    /// Batcher, when batching is on
    pub fn batcher(&self) -> Option<&SpriteBatcher> {
        self.batcher.as_ref()
    }

    /// Drawables queued for the coming frame
    pub fn queued(&self) -> usize {
        self.submitted
    }

    /// Number of pipelines created so far
    pub fn pipeline_count(&self) -> usize {
        self.pipeline_order.len()
    }

    /// Pipeline for a key
    pub fn pipeline(&self, key: &PipelineKey) -> Option<&Pipeline> {
        self.pipelines.get(key)
    }

    /// Frame counters
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Draw and present the queued frame
    ///
    /// On [`FrameStatus::NeedsResize`] or [`FrameStatus::Timeout`] the
    /// queue is kept so a retry draws the same frame. Call
    /// [`Renderer::discard_frame`] to give up on it instead.
    pub fn render(&mut self) -> RenderResult<FrameStatus> {
        let slot = self.pacer.begin_frame(self.backend.as_mut())?;
        match self.backend.acquire(slot, self.acquire_timeout) {
            Ok(AcquireStatus::Ready) => {}
            Ok(AcquireStatus::OutOfDate) | Err(RenderError::SwapchainOutOfDate) => {
                log::warn!("Swapchain out of date on acquire");
                return Ok(FrameStatus::NeedsResize);
            }
            Err(RenderError::AcquireTimeout(millis)) => {
                log::warn!("Swapchain image not available after {millis} ms");
                return Ok(FrameStatus::Timeout);
            }
            Err(e) => return Err(e),
        }

        self.backend.set_view_projection(&self.view_projection);
        let draw_calls = self.draw_queued()?;

        let status = match self.backend.present() {
            Ok(PresentStatus::Presented) => FrameStatus::Presented,
            Ok(PresentStatus::Suboptimal) => {
                log::warn!("Swapchain suboptimal after present");
                self.swapchain_dirty = true;
                FrameStatus::Presented
            }
            Ok(PresentStatus::OutOfDate) | Err(RenderError::SwapchainOutOfDate) => {
                log::warn!("Swapchain out of date on present");
                return Ok(FrameStatus::NeedsResize);
            }
            Err(e) => return Err(e),
        };
        self.finish_frame(draw_calls);
        Ok(status)
    }

    /// Whether the last present asked for a swapchain recreation
    pub fn is_swapchain_dirty(&self) -> bool {
        self.swapchain_dirty
    }

    /// Drop the queued frame without drawing it
    pub fn discard_frame(&mut self) {
        for pipeline in self.pipelines.values_mut() {
            pipeline.clear();
        }
        if let Some(batcher) = &mut self.batcher {
            batcher.clear_frame();
        }
        self.submitted = 0;
    }

    /// Recreate the swapchain for a new surface size
    pub fn handle_resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        self.pacer.wait_all(self.backend.as_mut())?;
        self.backend.recreate_swapchain(width, height)?;
        self.swapchain_dirty = false;
        self.stats.resizes += 1;
        log::info!("Swapchain recreated at {width}x{height}");
        Ok(())
    }

    /// Wait for the GPU and release renderer-owned buffers
    pub fn shutdown(&mut self) -> RenderResult<()> {
        self.pacer.wait_all(self.backend.as_mut())?;
        if let Some(batcher) = &mut self.batcher {
            batcher.release(self.backend.as_mut());
        }
        Ok(())
    }

    /// Issue every queued draw, lowest layer first across all pipelines
    ///
    /// Within a layer, batches go first, then pipelines in creation order.
    fn draw_queued(&mut self) -> RenderResult<usize> {
        let mut layers = self.batcher.as_ref().map(SpriteBatcher::layers).unwrap_or_default();
        for pipeline in self.pipelines.values_mut() {
            layers.extend(pipeline.layers());
        }

        let backend = self.backend.as_mut();
        let mut draw_calls = 0;
        for layer in layers {
            if let Some(batcher) = &mut self.batcher {
                draw_calls += batcher.flush_layer(backend, layer)?;
            }
            for key in &self.pipeline_order {
                if let Some(pipeline) = self.pipelines.get_mut(key) {
                    draw_calls += pipeline.draw_layer(backend, layer)?;
                }
            }
        }
        for pipeline in self.pipelines.values_mut() {
            if pipeline.queued() > 0 {
                pipeline.mark_flushed();
            }
        }
        Ok(draw_calls)
    }

    fn finish_frame(&mut self, draw_calls: usize) {
        self.pacer.end_frame();
        self.stats.frames_presented += 1;
        self.stats.drawables = self.submitted;
        self.stats.draw_calls = draw_calls;
        self.discard_frame();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec4;
    use crate::render::{HeadlessBackend, HeadlessRecorder, SpriteUniform};

    fn renderer(batching: bool) -> (Renderer, HeadlessRecorder) {
        let backend = HeadlessBackend::new(800, 600);
        let recorder = backend.recorder();
        let config = RendererConfig {
            batching,
            ..RendererConfig::default()
        };
        (Renderer::new(backend, &config), recorder)
    }

    fn drawable(renderer: &mut Renderer, material: &str) -> Drawable {
        let material = renderer
            .create_material(&MaterialDesc::flat(material, Vec4::new(1.0, 1.0, 1.0, 1.0)))
            .unwrap();
        let (vertex_buffer, index_buffer) = renderer.create_quad().unwrap();
        Drawable {
            material,
            vertex_buffer,
            index_buffer,
            index_count: 6,
            uniform: SpriteUniform::default(),
            layer: 0,
        }
    }

    #[test]
    fn test_materials_are_idempotent_by_name() {
        let (mut renderer, recorder) = renderer(false);
        let desc = MaterialDesc::flat("ship", Vec4::new(1.0, 1.0, 1.0, 1.0));
        let a = renderer.create_material(&desc).unwrap();
        let b = renderer.create_material(&desc).unwrap();
        assert_eq!(a, b);
        assert_eq!(recorder.log().materials_created, 1);
        assert!(matches!(renderer.material("nope"), Err(RenderError::UnknownMaterial(_))));
    }

    #[test]
    fn test_pipelines_grouped_by_material_and_buffer() {
        let (mut renderer, recorder) = renderer(false);
        let ship = drawable(&mut renderer, "ship");
        let rock = drawable(&mut renderer, "rock");
        for _ in 0..3 {
            renderer.submit_draw(ship);
        }
        renderer.submit_draw(rock);
        assert_eq!(renderer.pipeline_count(), 2);

        assert_eq!(renderer.render().unwrap(), FrameStatus::Presented);
        assert_eq!(recorder.log().draws.len(), 4);
        assert_eq!(renderer.stats().drawables, 4);

        // Each pipeline flushed once; queues emptied after present
        let pipeline = renderer.pipeline(&PipelineKey::of(&ship)).unwrap();
        assert_eq!(pipeline.flush_count(), 1);
        assert_eq!(pipeline.queued(), 0);
        assert_eq!(renderer.queued(), 0);
    }

    #[test]
    fn test_layers_order_draws_across_materials() {
        for batching in [false, true] {
            let (mut renderer, recorder) = renderer(batching);
            let top = Drawable {
                layer: 5,
                ..drawable(&mut renderer, "top")
            };
            let bottom = drawable(&mut renderer, "bottom");
            renderer.submit_sprite(top);
            renderer.submit_sprite(bottom);
            renderer.submit_sprite(Drawable { layer: -1, ..top });

            assert_eq!(renderer.render().unwrap(), FrameStatus::Presented);
            let materials: Vec<MaterialId> = recorder.log().draws.iter().map(|draw| draw.material).collect();
            assert_eq!(materials, vec![top.material, bottom.material, top.material], "batching {batching}");
        }
    }

    #[test]
    fn test_out_of_date_keeps_frame_for_retry() {
        let (mut renderer, recorder) = renderer(false);
        let ship = drawable(&mut renderer, "ship");
        renderer.submit_draw(ship);

        recorder.fail_acquires(1);
        assert_eq!(renderer.render().unwrap(), FrameStatus::NeedsResize);
        assert!(recorder.log().draws.is_empty());

        renderer.handle_resize(1024, 768).unwrap();
        assert_eq!(renderer.render().unwrap(), FrameStatus::Presented);
        let log = recorder.log();
        assert_eq!(log.recreations, 1);
        assert_eq!(log.draws.len(), 1);
        assert_eq!(log.presents, 1);
    }

    #[test]
    fn test_failed_present_redraws_on_retry() {
        let (mut renderer, recorder) = renderer(false);
        let ship = drawable(&mut renderer, "ship");
        renderer.submit_draw(ship);

        recorder.fail_presents(1);
        assert_eq!(renderer.render().unwrap(), FrameStatus::NeedsResize);
        renderer.handle_resize(800, 600).unwrap();
        assert_eq!(renderer.render().unwrap(), FrameStatus::Presented);
        assert_eq!(recorder.log().draws.len(), 1);
    }

    #[test]
    fn test_timeout_is_reported() {
        let (mut renderer, recorder) = renderer(false);
        recorder.time_out_acquires(1);
        assert_eq!(renderer.render().unwrap(), FrameStatus::Timeout);
        assert_eq!(renderer.render().unwrap(), FrameStatus::Presented);
    }

    #[test]
    fn test_batching_collapses_draws_per_material() {
        let (mut renderer, recorder) = renderer(true);
        let ship = drawable(&mut renderer, "ship");
        for _ in 0..50 {
            renderer.submit_sprite(ship);
        }
        renderer.render().unwrap();
        assert_eq!(recorder.log().draws.len(), 1);
        assert_eq!(recorder.log().draws[0].instance_count, 50);
        assert_eq!(renderer.stats().drawables, 50);
        assert_eq!(renderer.stats().draw_calls, 1);
    }
}

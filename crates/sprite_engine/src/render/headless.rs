//! Headless backend
//!
//! Implements [`RenderBackend`] without a GPU. Resources live in slotmaps
//! so handles behave like real ones (unknown handles are rejected), and
//! every call is recorded in a [`HeadlessLog`] shared through a
//! [`HeadlessRecorder`]. Tests and the demo keep a recorder clone to
//! inspect what was drawn and to inject swapchain failures.

use super::{
    AcquireStatus, DrawCall, IndexBufferId, MaterialDesc, MaterialId, PresentStatus, RenderBackend,
    RenderError, RenderResult, SpriteUniform, TextureDesc, TextureId, Vertex, VertexBufferId,
};
use crate::foundation::math::Mat4;
use slotmap::SlotMap;
use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::time::Duration;

/// One recorded draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedDraw {
    /// Presented frame the draw belongs to
    pub frame: u64,
    /// Bound material
    pub material: MaterialId,
    /// Bound vertex buffer
    pub vertex_buffer: VertexBufferId,
    /// Bound index buffer
    pub index_buffer: IndexBufferId,
    /// Instances drawn
    pub instance_count: u32,
}

/// Everything the headless backend has been asked to do
#[derive(Debug, Default)]
pub struct HeadlessLog {
    /// Draws in submission order
    pub draws: Vec<RecordedDraw>,
    /// Frames presented
    pub presents: u64,
    /// Images acquired
    pub acquires: u64,
    /// Swapchain recreations
    pub recreations: u64,
    /// Slots waited on
    pub waits: Vec<usize>,
    /// Instance uploads as (buffer, instance count)
    pub instance_updates: Vec<(VertexBufferId, usize)>,
    /// Vertex buffers created
    pub vertex_buffers_created: u64,
    /// Vertex buffers destroyed
    pub vertex_buffers_destroyed: u64,
    /// Textures created
    pub textures_created: u64,
    /// Materials created
    pub materials_created: u64,
    /// Last camera matrix
    pub view_projection: Option<Mat4>,
    pending_out_of_date_acquires: u32,
    pending_out_of_date_presents: u32,
    pending_timeouts: u32,
}

impl HeadlessLog {
    /// Draws recorded for presented frame `frame`
    pub fn draws_in_frame(&self, frame: u64) -> impl Iterator<Item = &RecordedDraw> {
        self.draws.iter().filter(move |draw| draw.frame == frame)
    }
}

/// Shared handle onto a [`HeadlessLog`]
#[derive(Debug, Clone, Default)]
pub struct HeadlessRecorder(Rc<RefCell<HeadlessLog>>);

impl HeadlessRecorder {
    /// Borrow the log
    pub fn log(&self) -> Ref<'_, HeadlessLog> {
        self.0.borrow()
    }

    /// Make the next `count` acquires report an out-of-date swapchain
    pub fn fail_acquires(&self, count: u32) {
        self.0.borrow_mut().pending_out_of_date_acquires += count;
    }

    /// Make the next `count` presents report an out-of-date swapchain
    pub fn fail_presents(&self, count: u32) {
        self.0.borrow_mut().pending_out_of_date_presents += count;
    }

    /// Make the next `count` acquires time out
    pub fn time_out_acquires(&self, count: u32) {
        self.0.borrow_mut().pending_timeouts += count;
    }
}

/// GPU-less [`RenderBackend`]
#[derive(Debug)]
pub struct HeadlessBackend {
    extent: (u32, u32),
    vertex_buffers: SlotMap<VertexBufferId, usize>,
    index_buffers: SlotMap<IndexBufferId, usize>,
    textures: SlotMap<TextureId, TextureDesc>,
    materials: SlotMap<MaterialId, MaterialDesc>,
    recorder: HeadlessRecorder,
}

impl HeadlessBackend {
    /// Backend with a swapchain of `width` x `height`
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            extent: (width, height),
            vertex_buffers: SlotMap::with_key(),
            index_buffers: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            materials: SlotMap::with_key(),
            recorder: HeadlessRecorder::default(),
        }
    }

    /// Handle for inspecting the call log
    pub fn recorder(&self) -> HeadlessRecorder {
        self.recorder.clone()
    }

    /// Number of live vertex buffers
    pub fn vertex_buffer_count(&self) -> usize {
        self.vertex_buffers.len()
    }
}

impl RenderBackend for HeadlessBackend {
    fn extent(&self) -> (u32, u32) {
        self.extent
    }

    fn create_vertex_buffer(&mut self, vertices: &[Vertex]) -> RenderResult<VertexBufferId> {
        self.recorder.0.borrow_mut().vertex_buffers_created += 1;
        Ok(self.vertex_buffers.insert(vertices.len()))
    }

    fn create_index_buffer(&mut self, indices: &[u32]) -> RenderResult<IndexBufferId> {
        Ok(self.index_buffers.insert(indices.len()))
    }

    fn destroy_vertex_buffer(&mut self, buffer: VertexBufferId) {
        if self.vertex_buffers.remove(buffer).is_some() {
            self.recorder.0.borrow_mut().vertex_buffers_destroyed += 1;
        }
    }

    fn destroy_index_buffer(&mut self, buffer: IndexBufferId) {
        self.index_buffers.remove(buffer);
    }

    fn create_texture_2d(&mut self, desc: &TextureDesc) -> RenderResult<TextureId> {
        if desc.width == 0 || desc.height == 0 {
            return Err(RenderError::Backend(format!("texture '{}' has zero size", desc.name)));
        }
        self.recorder.0.borrow_mut().textures_created += 1;
        Ok(self.textures.insert(desc.clone()))
    }

    fn create_material(&mut self, desc: &MaterialDesc) -> RenderResult<MaterialId> {
        if let Some(texture) = desc.texture {
            if !self.textures.contains_key(texture) {
                return Err(RenderError::UnknownTexture(format!("{texture:?}")));
            }
        }
        self.recorder.0.borrow_mut().materials_created += 1;
        Ok(self.materials.insert(desc.clone()))
    }

    fn update_instance_buffer(&mut self, buffer: VertexBufferId, instances: &[SpriteUniform]) -> RenderResult<()> {
        if !self.vertex_buffers.contains_key(buffer) {
            return Err(RenderError::UnknownBuffer(format!("{buffer:?}")));
        }
        self.recorder.0.borrow_mut().instance_updates.push((buffer, instances.len()));
        Ok(())
    }

    fn wait_for_frame(&mut self, slot: usize, _timeout: Duration) -> RenderResult<()> {
        self.recorder.0.borrow_mut().waits.push(slot);
        Ok(())
    }

    fn acquire(&mut self, _slot: usize, timeout: Duration) -> RenderResult<AcquireStatus> {
        let mut log = self.recorder.0.borrow_mut();
        if log.pending_timeouts > 0 {
            log.pending_timeouts -= 1;
            let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
            return Err(RenderError::AcquireTimeout(millis));
        }
        if log.pending_out_of_date_acquires > 0 {
            log.pending_out_of_date_acquires -= 1;
            return Ok(AcquireStatus::OutOfDate);
        }
        log.acquires += 1;
        Ok(AcquireStatus::Ready)
    }

    fn set_view_projection(&mut self, view_projection: &Mat4) {
        self.recorder.0.borrow_mut().view_projection = Some(*view_projection);
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> RenderResult<()> {
        if !self.materials.contains_key(call.material) {
            return Err(RenderError::UnknownMaterial(format!("{:?}", call.material)));
        }
        if !self.vertex_buffers.contains_key(call.vertex_buffer) {
            return Err(RenderError::UnknownBuffer(format!("{:?}", call.vertex_buffer)));
        }
        if !self.index_buffers.contains_key(call.index_buffer) {
            return Err(RenderError::UnknownBuffer(format!("{:?}", call.index_buffer)));
        }
        let mut log = self.recorder.0.borrow_mut();
        let frame = log.presents;
        log.draws.push(RecordedDraw {
            frame,
            material: call.material,
            vertex_buffer: call.vertex_buffer,
            index_buffer: call.index_buffer,
            instance_count: call.instance_count,
        });
        Ok(())
    }

    fn present(&mut self) -> RenderResult<PresentStatus> {
        let mut log = self.recorder.0.borrow_mut();
        if log.pending_out_of_date_presents > 0 {
            log.pending_out_of_date_presents -= 1;
            // Draws recorded for a frame that never reached the screen
            let frame = log.presents;
            log.draws.retain(|draw| draw.frame != frame);
            return Ok(PresentStatus::OutOfDate);
        }
        log.presents += 1;
        Ok(PresentStatus::Presented)
    }

    fn recreate_swapchain(&mut self, width: u32, height: u32) -> RenderResult<()> {
        self.extent = (width, height);
        self.recorder.0.borrow_mut().recreations += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_rejects_unknown_handles() {
        let mut backend = HeadlessBackend::new(640, 480);
        let (vertices, indices) = Vertex::quad();
        let vb = backend.create_vertex_buffer(&vertices).unwrap();
        let ib = backend.create_index_buffer(&indices).unwrap();
        let material = backend
            .create_material(&MaterialDesc::flat("red", crate::foundation::math::Vec4::new(1.0, 0.0, 0.0, 1.0)))
            .unwrap();

        let call = DrawCall {
            material,
            vertex_buffer: vb,
            index_buffer: ib,
            index_count: 6,
            instance_count: 1,
            uniforms: &[],
        };
        assert!(backend.draw(&call).is_ok());

        backend.destroy_vertex_buffer(vb);
        assert!(matches!(backend.draw(&call), Err(RenderError::UnknownBuffer(_))));
        assert_eq!(backend.recorder().log().draws.len(), 1);
    }

    #[test]
    fn test_injected_failures_are_consumed() {
        let mut backend = HeadlessBackend::new(640, 480);
        let recorder = backend.recorder();
        recorder.fail_acquires(1);
        recorder.time_out_acquires(1);

        assert!(matches!(
            backend.acquire(0, Duration::from_millis(5)),
            Err(RenderError::AcquireTimeout(5))
        ));
        assert_eq!(backend.acquire(0, Duration::ZERO).unwrap(), AcquireStatus::OutOfDate);
        assert_eq!(backend.acquire(0, Duration::ZERO).unwrap(), AcquireStatus::Ready);
        assert_eq!(recorder.log().acquires, 1);
    }
}

//! # Render Backend Abstraction
//!
//! The contract a graphics backend honours for the sprite renderer. A
//! Vulkan implementation maps these onto buffers, descriptor sets and the
//! swapchain; [`super::HeadlessBackend`] records them for tests.
//!
//! Swapchain invalidation is reported through [`AcquireStatus`] and
//! [`PresentStatus`] rather than as an error so the frame loop can recreate
//! the swapchain and retry.

use super::{
    IndexBufferId, MaterialDesc, MaterialId, RenderResult, SpriteUniform, TextureDesc, TextureId,
    Vertex, VertexBufferId,
};
use crate::foundation::math::Mat4;
use std::time::Duration;

/// Result of acquiring a swapchain image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireStatus {
    /// Image acquired; recording may begin
    Ready,
    /// Swapchain must be recreated before drawing
    OutOfDate,
}

/// Result of presenting a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentStatus {
    /// Frame presented
    Presented,
    /// Presented, but the swapchain no longer matches the surface exactly
    Suboptimal,
    /// Not presented; swapchain must be recreated
    OutOfDate,
}

/// One draw command
#[derive(Debug, Clone, Copy)]
pub struct DrawCall<'a> {
    /// Material to bind
    pub material: MaterialId,
    /// Vertex buffer to bind
    pub vertex_buffer: VertexBufferId,
    /// Index buffer to bind
    pub index_buffer: IndexBufferId,
    /// Indices per instance
    pub index_count: u32,
    /// Instances to draw
    pub instance_count: u32,
    /// Inline uniforms; empty when instance data was uploaded separately
    pub uniforms: &'a [SpriteUniform],
}

/// Graphics backend used by [`super::Renderer`]
pub trait RenderBackend {
    /// Current swapchain extent in pixels
    fn extent(&self) -> (u32, u32);

    /// Upload vertices into a new buffer
    fn create_vertex_buffer(&mut self, vertices: &[Vertex]) -> RenderResult<VertexBufferId>;

    /// Upload indices into a new buffer
    fn create_index_buffer(&mut self, indices: &[u32]) -> RenderResult<IndexBufferId>;

    /// Release a vertex buffer
    fn destroy_vertex_buffer(&mut self, buffer: VertexBufferId);

    /// Release an index buffer
    fn destroy_index_buffer(&mut self, buffer: IndexBufferId);

    /// Create a 2D texture
    fn create_texture_2d(&mut self, desc: &TextureDesc) -> RenderResult<TextureId>;

    /// Create a material
    fn create_material(&mut self, desc: &MaterialDesc) -> RenderResult<MaterialId>;

    /// Replace the per-instance data bound alongside `buffer`
    fn update_instance_buffer(&mut self, buffer: VertexBufferId, instances: &[SpriteUniform]) -> RenderResult<()>;

    /// Block until the frame that last used `slot` has finished on the GPU
    fn wait_for_frame(&mut self, slot: usize, timeout: Duration) -> RenderResult<()>;

    /// Acquire the next swapchain image for `slot`
    fn acquire(&mut self, slot: usize, timeout: Duration) -> RenderResult<AcquireStatus>;

    /// Set the camera matrix for subsequent draws
    fn set_view_projection(&mut self, view_projection: &Mat4);

    /// Record one draw
    fn draw(&mut self, call: &DrawCall<'_>) -> RenderResult<()>;

    /// Submit and present the recorded frame
    fn present(&mut self) -> RenderResult<PresentStatus>;

    /// Recreate the swapchain for a new surface size
    fn recreate_swapchain(&mut self, width: u32, height: u32) -> RenderResult<()>;
}

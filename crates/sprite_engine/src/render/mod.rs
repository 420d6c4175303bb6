//! Render submission
//!
//! The entity core never talks to the GPU. Visual components turn into
//! [`Drawable`]s, which the [`Renderer`] groups into per-(material, vertex
//! buffer) [`Pipeline`]s, or hands to the [`SpriteBatcher`], and flushes to
//! a [`RenderBackend`] once per frame.
//!
//! ```text
//! RenderComponent ──uniforms()──> Drawable ──submit──> Renderer
//!                                                        ├─ Pipeline (material, vb) ─┐
//!                                                        └─ SpriteBatcher (material) ─┴─> RenderBackend
//! ```
//!
//! Swapchain trouble is not an error at this level: [`Renderer::render`]
//! reports [`FrameStatus::NeedsResize`] and keeps the frame's queue so the
//! caller can recreate the swapchain and try again.

pub mod backend;
pub mod batch;
pub mod camera;
pub mod drawable;
pub mod frame_sync;
pub mod headless;
pub mod material;
pub mod pipeline;
pub mod renderer;
pub mod resources;
pub mod uniform;

pub use backend::{AcquireStatus, DrawCall, PresentStatus, RenderBackend};
pub use batch::{BatchStats, SpriteBatcher};
pub use camera::Camera2D;
pub use drawable::Drawable;
pub use frame_sync::FramePacer;
pub use headless::{HeadlessBackend, HeadlessLog, HeadlessRecorder, RecordedDraw};
pub use material::MaterialRegistry;
pub use pipeline::{Pipeline, PipelineKey};
pub use renderer::{FrameStats, Renderer};
pub use resources::{IndexBufferId, MaterialDesc, MaterialId, TextureDesc, TextureId, Vertex, VertexBufferId};
pub use uniform::{SpriteUniform, SPRITE_UNIFORM_FLOATS};

use thiserror::Error;

/// Rendering errors
#[derive(Debug, Error)]
pub enum RenderError {
    /// Material name never registered
    #[error("Unknown material '{0}'")]
    UnknownMaterial(String),

    /// Texture name never registered
    #[error("Unknown texture '{0}'")]
    UnknownTexture(String),

    /// Buffer handle the backend does not know
    #[error("Unknown buffer: {0}")]
    UnknownBuffer(String),

    /// Swapchain no longer matches the surface
    #[error("Swapchain out of date")]
    SwapchainOutOfDate,

    /// No swapchain image became available in time
    #[error("Timed out after {0} ms waiting for a frame")]
    AcquireTimeout(u64),

    /// Backend-specific failure
    #[error("Backend error: {0}")]
    Backend(String),
}

impl RenderError {
    /// Whether the frame loop can recover by recreating resources or retrying
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::SwapchainOutOfDate | Self::AcquireTimeout(_))
    }
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Outcome of one [`Renderer::render`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// Frame drawn and presented
    Presented,
    /// Swapchain is dirty; recreate it and retry
    NeedsResize,
    /// No image became available in time; retry
    Timeout,
}

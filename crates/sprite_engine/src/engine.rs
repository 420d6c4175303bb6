//! Core engine implementation
//!
//! The engine owns the scene, renderer and input state and drives one frame
//! at a time: poll the platform, run whole fixed ticks of simulation, queue
//! the frame once, present it. Window and input events come from a
//! [`Platform`] so the loop runs the same against a real window or a
//! scripted one in tests.

use crate::application::{AppContext, AppError, Application};
use crate::config::{ConfigError, EngineConfig};
use crate::foundation::time::{FixedStep, Timer};
use crate::input::{InputState, KeyCode};
use crate::render::{FrameStatus, RenderBackend, RenderError, Renderer};
use crate::scene::{Scene, SceneError, TickStats};
use thiserror::Error;

/// What happened on the platform side since the last frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlatformEvents {
    /// The window was asked to close
    pub close_requested: bool,
    /// New framebuffer size
    pub resized: Option<(u32, u32)>,
    /// Frame duration to use instead of wall-clock time
    pub frame_time: Option<f32>,
}

/// Window and input collaborator
pub trait Platform {
    /// Feed pending input into `input` and report window events
    fn poll_events(&mut self, input: &mut InputState) -> PlatformEvents;
}

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Scene simulation failed
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Non-recoverable render failure
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Application callback failed
    #[error("Application error: {0}")]
    Application(#[from] AppError),
}

/// Running totals across frames
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Frames run
    pub frames: u64,
    /// Fixed ticks simulated
    pub ticks: u64,
    /// Frames dropped after a failed retry
    pub dropped_frames: u64,
    /// Collision pairs dispatched
    pub collisions: u64,
    /// Entities removed by the scene
    pub removed: u64,
}

/// Main engine struct
pub struct Engine {
    config: EngineConfig,
    scene: Scene,
    renderer: Renderer,
    input: InputState,
    timer: Timer,
    fixed_step: FixedStep,
    surface: (u32, u32),
    running: bool,
    stats: EngineStats,
}

impl Engine {
    /// Create an engine rendering through `backend`
    pub fn new(config: EngineConfig, backend: impl RenderBackend + 'static) -> Result<Self, EngineError> {
        config.validate()?;
        log::info!(
            "Initializing engine: '{}' {}x{}, tick {:.4}s",
            config.window.title,
            config.window.width,
            config.window.height,
            config.simulation.fixed_tick
        );
        let renderer = Renderer::new(backend, &config.renderer);
        Ok(Self {
            scene: Scene::new(&config),
            fixed_step: FixedStep::new(config.simulation.fixed_tick, config.simulation.max_ticks_per_frame),
            surface: renderer.extent(),
            renderer,
            input: InputState::new(),
            timer: Timer::new(),
            config,
            running: true,
            stats: EngineStats::default(),
        })
    }

    /// Run `app` until it, the player or the platform asks to stop
    pub fn run(&mut self, platform: &mut dyn Platform, app: &mut dyn Application) -> Result<(), EngineError> {
        app.initialize(&mut self.context())?;
        log::info!("Starting main loop...");

        let result = loop {
            match self.run_frame(platform, app) {
                Ok(true) => {}
                Ok(false) => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        app.cleanup(&mut self.context());
        self.renderer.shutdown()?;
        log::info!(
            "Engine shutdown complete after {} frames / {} ticks",
            self.stats.frames,
            self.stats.ticks
        );
        result
    }

    /// Run one frame; false once the loop should stop
    pub fn run_frame(&mut self, platform: &mut dyn Platform, app: &mut dyn Application) -> Result<bool, EngineError> {
        if !self.running {
            return Ok(false);
        }

        self.input.begin_frame();
        let events = platform.poll_events(&mut self.input);
        if events.close_requested || self.input.key_state(KeyCode::Escape).just_pressed() || app.should_quit() {
            log::info!("Engine shutdown requested");
            self.running = false;
            return Ok(false);
        }
        if let Some((width, height)) = events.resized {
            self.resize(width, height)?;
        }

        self.timer.update();
        let delta_time = events.frame_time.unwrap_or_else(|| self.timer.delta_time());
        let ticks = self.fixed_step.accumulate(delta_time);
        for _ in 0..ticks {
            let tick = self.fixed_step.tick();
            app.update(&mut self.context(), tick)?;
            let tick_stats = self.scene.simulate(&self.input)?;
            self.record(tick_stats);
        }

        self.scene.submit(&mut self.renderer);
        self.present()?;
        self.stats.frames += 1;
        Ok(true)
    }

    /// Stop after the current frame
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Whether the loop is still running
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Scene
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Scene, mutably
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Renderer
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Renderer, mutably
    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    /// Input state
    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// Running totals
    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    fn context(&mut self) -> AppContext<'_> {
        AppContext {
            scene: &mut self.scene,
            renderer: &mut self.renderer,
            input: &self.input,
        }
    }

    fn record(&mut self, tick: TickStats) {
        self.stats.ticks += 1;
        self.stats.collisions += tick.collisions as u64;
        self.stats.removed += tick.removed as u64;
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), EngineError> {
        self.surface = (width, height);
        self.renderer.handle_resize(width, height)?;
        self.scene.cameras_mut().set_viewport(width as f32, height as f32);
        Ok(())
    }

    /// Present the queued frame, recreating the swapchain and retrying once
    fn present(&mut self) -> Result<(), EngineError> {
        let mut retried = false;
        loop {
            let status = match self.renderer.render() {
                Ok(status) => status,
                Err(e) if e.is_transient() => {
                    log::warn!("Transient render failure: {e}");
                    FrameStatus::NeedsResize
                }
                Err(e) => return Err(e.into()),
            };
            match status {
                FrameStatus::Presented => {
                    if self.renderer.is_swapchain_dirty() {
                        let (width, height) = self.surface;
                        self.renderer.handle_resize(width, height)?;
                    }
                    return Ok(());
                }
                FrameStatus::NeedsResize | FrameStatus::Timeout if !retried => {
                    if status == FrameStatus::NeedsResize {
                        let (width, height) = self.surface;
                        self.renderer.handle_resize(width, height)?;
                    }
                    retried = true;
                }
                FrameStatus::NeedsResize | FrameStatus::Timeout => {
                    log::warn!("Dropping frame {} after a failed retry ({status:?})", self.stats.frames);
                    self.renderer.discard_frame();
                    self.stats.dropped_frames += 1;
                    return Ok(());
                }
            }
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("scene", &self.scene)
            .field("surface", &self.surface)
            .field("running", &self.running)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

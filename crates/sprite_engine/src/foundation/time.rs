//! Time management utilities

use std::time::Instant;

/// High-precision timer for frame timing
pub struct Timer {
    last_frame: Instant,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Update the timer (should be called once per frame)
    pub fn update(&mut self) {
        let now = Instant::now();
        self.delta_time = now.duration_since(self.last_frame).as_secs_f32();
        self.total_time += self.delta_time;
        self.last_frame = now;
        self.frame_count += 1;
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total elapsed time since timer creation
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the average FPS since timer creation
    pub fn average_fps(&self) -> f32 {
        if self.total_time > 0.0 {
            self.frame_count as f32 / self.total_time
        } else {
            0.0
        }
    }
}

/// Fixed-timestep accumulator
///
/// Variable frame deltas go in, whole fixed ticks come out. Catch-up is
/// bounded so a long stall does not turn into a spiral of simulation steps.
#[derive(Debug, Clone)]
pub struct FixedStep {
    tick: f32,
    accumulator: f32,
    max_ticks_per_frame: u32,
}

impl FixedStep {
    /// Create an accumulator producing ticks of `tick` seconds
    pub fn new(tick: f32, max_ticks_per_frame: u32) -> Self {
        Self {
            tick,
            accumulator: 0.0,
            max_ticks_per_frame: max_ticks_per_frame.max(1),
        }
    }

    /// Fixed tick length in seconds
    pub fn tick(&self) -> f32 {
        self.tick
    }

    /// Add frame time and return how many fixed ticks to run
    pub fn accumulate(&mut self, delta_time: f32) -> u32 {
        self.accumulator += delta_time.max(0.0);
        let mut ticks = 0;
        while self.accumulator >= self.tick && ticks < self.max_ticks_per_frame {
            self.accumulator -= self.tick;
            ticks += 1;
        }
        if ticks == self.max_ticks_per_frame && self.accumulator >= self.tick {
            log::debug!(
                "Dropping {:.3}s of simulation time after {} catch-up ticks",
                self.accumulator,
                ticks
            );
            self.accumulator %= self.tick;
        }
        ticks
    }

    /// Fraction of a tick left in the accumulator (for interpolation)
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.tick
    }
}

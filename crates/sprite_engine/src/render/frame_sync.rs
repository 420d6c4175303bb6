//! Frame-in-flight pacing
//!
//! Tracks which frame slots still have GPU work in flight. Before a slot is
//! reused the pacer blocks on the backend's fence wait for it, so per-slot
//! resources are never rewritten while a previous frame still reads them.

use super::{RenderBackend, RenderResult};
use std::time::Duration;

/// Round-robin tracker of in-flight frame slots
#[derive(Debug, Clone)]
pub struct FramePacer {
    slots: Vec<Option<u64>>,
    current: usize,
    frame: u64,
    timeout: Duration,
}

impl FramePacer {
    /// Pacer for `frames_in_flight` slots (at least one)
    pub fn new(frames_in_flight: usize, timeout: Duration) -> Self {
        Self {
            slots: vec![None; frames_in_flight.max(1)],
            current: 0,
            frame: 0,
            timeout,
        }
    }

    /// Slot the next frame records into
    pub fn current_slot(&self) -> usize {
        self.current
    }

    /// Frames handed to the GPU so far
    pub fn frame_number(&self) -> u64 {
        self.frame
    }

    /// Wait timeout applied to fences and image acquisition
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of slots whose work has not been waited on
    pub fn in_flight(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Make the current slot free, waiting on its previous frame if needed
    pub fn begin_frame(&mut self, backend: &mut dyn RenderBackend) -> RenderResult<usize> {
        if let Some(frame) = self.slots[self.current] {
            log::trace!("Waiting on frame {frame} in slot {}", self.current);
            backend.wait_for_frame(self.current, self.timeout)?;
            self.slots[self.current] = None;
        }
        Ok(self.current)
    }

    /// Mark the current slot in flight and advance to the next one
    pub fn end_frame(&mut self) {
        self.slots[self.current] = Some(self.frame);
        self.frame += 1;
        self.current = (self.current + 1) % self.slots.len();
    }

    /// Wait on every in-flight slot (before resize or shutdown)
    pub fn wait_all(&mut self, backend: &mut dyn RenderBackend) -> RenderResult<()> {
        for (slot, frame) in self.slots.iter_mut().enumerate() {
            if frame.take().is_some() {
                backend.wait_for_frame(slot, self.timeout)?;
            }
        }
        Ok(())
    }
}

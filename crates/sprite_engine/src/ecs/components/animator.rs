//! Sprite-sheet animator
//!
//! An animation is a run of tiles on one row of a sprite sheet. The animator
//! advances through it on fixed ticks and reports the tile the paired render
//! component should show.
//!
//! States: no animation, playing looped, playing single-shot, complete.
//! A single-shot animation reaches `Complete` once, on the tick that would
//! wrap it, and then stalls on its last frame until a new animation is set.

use crate::ecs::EcsError;
use crate::foundation::math::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Elapsed time counts as a full frame from this value on, absorbing float
/// drift from summing fractional ticks
const FRAME_THRESHOLD: f32 = 1.0 - 1e-5;

/// One named animation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    /// First tile column
    pub start_frame: u32,
    /// End tile column (exclusive)
    pub end_frame: u32,
    /// Tile row
    pub row: u32,
    /// Frames per second
    pub speed: f32,
}

impl Animation {
    /// Create an animation over columns `start_frame..end_frame` of `row`
    pub const fn new(start_frame: u32, end_frame: u32, row: u32, speed: f32) -> Self {
        Self {
            start_frame,
            end_frame,
            row,
            speed,
        }
    }

    /// Number of frames before wrapping (at least one)
    pub fn frame_count(&self) -> u32 {
        self.end_frame.saturating_sub(self.start_frame).max(1)
    }
}

/// Animator state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimatorState {
    /// No animation selected
    Idle,
    /// Playing and wrapping forever
    Looping,
    /// Playing once
    SinglePlay,
    /// Single-shot animation finished; holding the last frame
    Complete,
}

/// Animator component
#[derive(Debug, Clone, Default)]
pub struct Animator {
    animations: HashMap<String, Animation>,
    current: Option<String>,
    elapsed: f32,
    frame: u32,
    single_play: bool,
    complete: bool,
    tile_dirty: bool,
}

impl Animator {
    /// Animator over a table of named animations
    pub fn new(animations: HashMap<String, Animation>) -> Self {
        Self {
            animations,
            ..Self::default()
        }
    }

    /// Builder pattern: add an animation
    pub fn with_animation(mut self, name: impl Into<String>, animation: Animation) -> Self {
        self.animations.insert(name.into(), animation);
        self
    }

    /// Look up an animation by name
    pub fn animation(&self, name: &str) -> Option<&Animation> {
        self.animations.get(name)
    }

    /// Name of the current animation
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Frame index relative to the animation's start
    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// Whether a single-shot animation has finished
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Current state
    pub fn state(&self) -> AnimatorState {
        match (&self.current, self.single_play, self.complete) {
            (None, _, _) => AnimatorState::Idle,
            (Some(_), _, true) => AnimatorState::Complete,
            (Some(_), true, false) => AnimatorState::SinglePlay,
            (Some(_), false, false) => AnimatorState::Looping,
        }
    }

    /// Select an animation
    ///
    /// Switching to a different animation, or replaying a completed
    /// single-shot one, restarts from its first frame. Setting the animation
    /// that is already playing only updates the single-play flag.
    pub fn set_animation(&mut self, name: &str, single_play: bool) -> Result<(), EcsError> {
        if !self.animations.contains_key(name) {
            return Err(EcsError::UnknownAnimation(name.to_string()));
        }
        if self.current.as_deref() != Some(name) || self.complete {
            self.current = Some(name.to_string());
            self.frame = 0;
            self.elapsed = 0.0;
            self.complete = false;
            self.tile_dirty = true;
        }
        self.single_play = single_play;
        Ok(())
    }

    /// Tile (column, row) the paired sprite should show
    pub fn tile_offset(&self) -> Option<Vec2> {
        let animation = self.current_animation()?;
        Some(Vec2::new(
            (animation.start_frame + self.frame) as f32,
            animation.row as f32,
        ))
    }

    /// Advance by one fixed tick
    ///
    /// Returns the new tile offset when the shown tile changed.
    pub fn simulate(&mut self, tick: f32) -> Option<Vec2> {
        let animation = *self.current_animation()?;
        if !self.complete {
            self.elapsed += animation.speed * tick;
            if self.elapsed >= FRAME_THRESHOLD {
                self.elapsed = 0.0;
                let next = self.frame + 1;
                if next >= animation.frame_count() {
                    if self.single_play {
                        self.complete = true;
                    } else {
                        self.frame = 0;
                        self.tile_dirty = true;
                    }
                } else {
                    self.frame = next;
                    self.tile_dirty = true;
                }
            }
        }
        if std::mem::replace(&mut self.tile_dirty, false) {
            self.tile_offset()
        } else {
            None
        }
    }

    fn current_animation(&self) -> Option<&Animation> {
        self.current.as_deref().and_then(|name| self.animations.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walker() -> Animator {
        Animator::default()
            .with_animation("walk", Animation::new(0, 3, 0, 1.0))
            .with_animation("attack", Animation::new(4, 8, 2, 2.0))
    }

    #[test]
    fn test_idle_until_set() {
        let mut animator = walker();
        assert_eq!(animator.state(), AnimatorState::Idle);
        assert!(animator.simulate(1.0).is_none());
        assert!(animator.tile_offset().is_none());
    }

    #[test]
    fn test_unknown_animation_is_an_error() {
        let mut animator = walker();
        let err = animator.set_animation("fly", false).unwrap_err();
        assert!(matches!(err, EcsError::UnknownAnimation(ref name) if name == "fly"));
        assert_eq!(animator.state(), AnimatorState::Idle);
    }

    #[test]
    fn test_frame_wraps_to_zero() {
        let mut animator = walker();
        animator.set_animation("walk", false).unwrap();
        animator.simulate(0.0);

        let mut frames = Vec::new();
        for _ in 0..4 {
            animator.simulate(1.0);
            frames.push(animator.frame());
        }
        assert_eq!(frames, vec![1, 2, 0, 1]);
        assert_eq!(animator.state(), AnimatorState::Looping);
    }

    #[test]
    fn test_single_play_completes_and_stalls() {
        let mut animator = walker();
        animator.set_animation("attack", true).unwrap();
        let animation = *animator.animation("attack").unwrap();
        let tick = 0.25;
        let ticks_needed = (animation.frame_count() as f32 / animation.speed / tick).ceil() as usize;

        for _ in 0..ticks_needed {
            animator.simulate(tick);
        }
        assert!(animator.is_complete());
        assert_eq!(animator.state(), AnimatorState::Complete);
        let last = animator.frame();
        assert_eq!(last, animation.frame_count() - 1);

        for _ in 0..20 {
            assert!(animator.simulate(tick).is_none());
        }
        assert_eq!(animator.frame(), last);
        assert_eq!(animator.tile_offset(), Some(Vec2::new(7.0, 2.0)));
    }

    #[test]
    fn test_replaying_completed_animation_restarts() {
        let mut animator = walker();
        animator.set_animation("walk", true).unwrap();
        for _ in 0..3 {
            animator.simulate(1.0);
        }
        assert!(animator.is_complete());

        animator.set_animation("walk", true).unwrap();
        assert!(!animator.is_complete());
        assert_eq!(animator.frame(), 0);
    }

    #[test]
    fn test_same_animation_does_not_restart() {
        let mut animator = walker();
        animator.set_animation("walk", false).unwrap();
        animator.simulate(1.0);
        animator.set_animation("walk", false).unwrap();
        assert_eq!(animator.frame(), 1);
    }

    #[test]
    fn test_tile_offset_reported_on_change() {
        let mut animator = walker();
        animator.set_animation("attack", false).unwrap();
        assert_eq!(animator.simulate(0.25), Some(Vec2::new(4.0, 2.0)));
        assert_eq!(animator.simulate(0.25), Some(Vec2::new(5.0, 2.0)));
        assert_eq!(animator.simulate(0.0), None);
    }
}

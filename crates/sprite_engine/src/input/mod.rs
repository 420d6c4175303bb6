//! Input state
//!
//! The platform layer feeds raw key, button, cursor and text events into an
//! [`InputState`]; gameplay reads tri-state buttons from it once per frame.
//! A button is `Pressed` on the frame it goes down, `Down` while held,
//! `Released` on the frame it comes up, and `Up` otherwise.

use crate::foundation::math::Vec2;
use std::collections::{HashMap, VecDeque};

/// Per-frame button state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonState {
    /// Went down this frame
    Pressed,
    /// Held
    Down,
    /// Came up this frame
    Released,
    /// Not held
    #[default]
    Up,
}

impl ButtonState {
    /// Pressed this frame or held
    pub fn is_down(self) -> bool {
        matches!(self, Self::Pressed | Self::Down)
    }

    /// Went down this frame
    pub fn just_pressed(self) -> bool {
        self == Self::Pressed
    }

    /// Came up this frame
    pub fn just_released(self) -> bool {
        self == Self::Released
    }

    fn advance(self) -> Self {
        match self {
            Self::Pressed | Self::Down => Self::Down,
            Self::Released | Self::Up => Self::Up,
        }
    }
}

/// Keyboard and mouse state for the current frame
#[derive(Debug, Clone, Default)]
pub struct InputState {
    keys: HashMap<KeyCode, ButtonState>,
    mouse_buttons: HashMap<MouseButton, ButtonState>,
    mouse_position: Vec2,
    codepoints: VecDeque<char>,
}

impl InputState {
    /// Create an empty input state
    pub fn new() -> Self {
        Self::default()
    }

    /// Age the per-frame states: `Pressed` becomes `Down`, `Released`
    /// becomes `Up`. Call once before feeding the frame's events.
    pub fn begin_frame(&mut self) {
        for state in self.keys.values_mut().chain(self.mouse_buttons.values_mut()) {
            *state = state.advance();
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        let state = self.keys.entry(key).or_default();
        *state = Self::transition(*state, pressed);
    }

    /// Handle mouse button input
    pub fn handle_mouse_button(&mut self, button: MouseButton, pressed: bool) {
        let state = self.mouse_buttons.entry(button).or_default();
        *state = Self::transition(*state, pressed);
    }

    /// Handle mouse movement (window pixels)
    pub fn handle_mouse_move(&mut self, x: f32, y: f32) {
        self.mouse_position = Vec2::new(x, y);
    }

    /// Queue a typed character
    pub fn push_codepoint(&mut self, codepoint: char) {
        self.codepoints.push_back(codepoint);
    }

    /// State of `key`
    pub fn key_state(&self, key: KeyCode) -> ButtonState {
        self.keys.get(&key).copied().unwrap_or_default()
    }

    /// State of `button`
    pub fn mouse_state(&self, button: MouseButton) -> ButtonState {
        self.mouse_buttons.get(&button).copied().unwrap_or_default()
    }

    /// Cursor position in window pixels
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    /// Oldest typed character not yet consumed
    pub fn pop_codepoint(&mut self) -> Option<char> {
        self.codepoints.pop_front()
    }

    /// Horizontal/vertical axis from two opposing keys (-1, 0 or 1)
    pub fn axis(&self, negative: KeyCode, positive: KeyCode) -> f32 {
        let mut value = 0.0;
        if self.key_state(negative).is_down() {
            value -= 1.0;
        }
        if self.key_state(positive).is_down() {
            value += 1.0;
        }
        value
    }

    fn transition(state: ButtonState, pressed: bool) -> ButtonState {
        match (pressed, state.is_down()) {
            (true, false) => ButtonState::Pressed,
            (false, true) => ButtonState::Released,
            _ => state,
        }
    }
}

/// Key codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A key
    A,
    /// D key
    D,
    /// S key
    S,
    /// W key
    W,
    /// Space key
    Space,
    /// Enter key
    Enter,
    /// Escape key
    Escape,
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
}

/// Mouse buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left mouse button
    Left,
    /// Right mouse button
    Right,
    /// Middle mouse button
    Middle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_tri_state_sequence() {
        let mut input = InputState::new();
        assert_eq!(input.key_state(KeyCode::Space), ButtonState::Up);

        input.begin_frame();
        input.handle_key(KeyCode::Space, true);
        assert_eq!(input.key_state(KeyCode::Space), ButtonState::Pressed);

        input.begin_frame();
        assert_eq!(input.key_state(KeyCode::Space), ButtonState::Down);
        // Key repeat does not re-trigger Pressed
        input.handle_key(KeyCode::Space, true);
        assert_eq!(input.key_state(KeyCode::Space), ButtonState::Down);

        input.begin_frame();
        input.handle_key(KeyCode::Space, false);
        assert_eq!(input.key_state(KeyCode::Space), ButtonState::Released);

        input.begin_frame();
        assert_eq!(input.key_state(KeyCode::Space), ButtonState::Up);
    }

    #[test]
    fn test_mouse_state_and_position() {
        let mut input = InputState::new();
        input.handle_mouse_button(MouseButton::Left, true);
        input.handle_mouse_move(12.0, 34.0);
        assert!(input.mouse_state(MouseButton::Left).just_pressed());
        assert!(!input.mouse_state(MouseButton::Right).is_down());
        assert_eq!(input.mouse_position(), Vec2::new(12.0, 34.0));
    }

    #[test]
    fn test_codepoints_are_fifo() {
        let mut input = InputState::new();
        for c in "hi!".chars() {
            input.push_codepoint(c);
        }
        assert_eq!(input.pop_codepoint(), Some('h'));
        assert_eq!(input.pop_codepoint(), Some('i'));
        assert_eq!(input.pop_codepoint(), Some('!'));
        assert_eq!(input.pop_codepoint(), None);
    }

    #[test]
    fn test_axis() {
        let mut input = InputState::new();
        input.handle_key(KeyCode::Right, true);
        assert_eq!(input.axis(KeyCode::Left, KeyCode::Right), 1.0);
        input.handle_key(KeyCode::Left, true);
        assert_eq!(input.axis(KeyCode::Left, KeyCode::Right), 0.0);
    }
}

//! Input state tracking with both edge-triggered and level-triggered queries.
//!
//! - **Level-triggered (held):** `is_held(key)` is true every frame the key is
//!   physically down. This is what movement resolvers read.
//!
//! - **Edge-triggered (just_pressed / just_released):** true only during the
//!   frame the transition happened. A press reported on frame N stays visible
//!   to every query made during frame N, no matter how many widgets ask, and
//!   is cleared by `end_frame()` once the frame has been presented.
//!
//! Typed characters are collected separately for text fields and follow the
//! same per-frame lifetime as the edge state.

use glam::Vec2;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Escape,
    Space,
    Enter,
    Backspace,
    Tab,
    Shift,
    F1,
    F3,
    F4,
    F5,
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    Num0,
    Num1,
    Num2,
    Num3,
    Num4,
    Num5,
    Num6,
    Num7,
    Num8,
    Num9,
}

impl Key {
    /// Digit key for `0..=9`.
    pub fn digit(n: u8) -> Option<Key> {
        const DIGITS: [Key; 10] = [
            Key::Num0,
            Key::Num1,
            Key::Num2,
            Key::Num3,
            Key::Num4,
            Key::Num5,
            Key::Num6,
            Key::Num7,
            Key::Num8,
            Key::Num9,
        ];
        DIGITS.get(n as usize).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseBtn {
    Left,
    Right,
    Middle,
}

pub struct InputState {
    held: HashSet<Key>,
    just_pressed: HashSet<Key>,
    just_released: HashSet<Key>,

    mouse_held: HashSet<MouseBtn>,
    mouse_just_pressed: HashSet<MouseBtn>,
    mouse_just_released: HashSet<MouseBtn>,

    typed: String,

    pub mouse_position: (f64, f64),
}

impl InputState {
    pub fn new() -> Self {
        Self {
            held: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
            mouse_held: HashSet::new(),
            mouse_just_pressed: HashSet::new(),
            mouse_just_released: HashSet::new(),
            typed: String::new(),
            mouse_position: (0.0, 0.0),
        }
    }

    pub fn key_down(&mut self, key: Key) {
        if self.held.insert(key) {
            self.just_pressed.insert(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        if self.held.remove(&key) {
            self.just_released.insert(key);
        }
    }

    pub fn mouse_down(&mut self, btn: MouseBtn) {
        if self.mouse_held.insert(btn) {
            self.mouse_just_pressed.insert(btn);
        }
    }

    pub fn mouse_up(&mut self, btn: MouseBtn) {
        if self.mouse_held.remove(&btn) {
            self.mouse_just_released.insert(btn);
        }
    }

    /// Control characters are dropped; editing keys arrive through `key_down`.
    pub fn push_text(&mut self, text: &str) {
        self.typed.extend(text.chars().filter(|c| !c.is_control()));
    }

    pub fn typed_text(&self) -> &str {
        &self.typed
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn is_any_held(&self, keys: &[Key]) -> bool {
        keys.iter().any(|k| self.held.contains(k))
    }

    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.just_pressed.contains(&key)
    }

    pub fn is_just_released(&self, key: Key) -> bool {
        self.just_released.contains(&key)
    }

    pub fn is_mouse_held(&self, btn: MouseBtn) -> bool {
        self.mouse_held.contains(&btn)
    }

    pub fn is_mouse_just_pressed(&self, btn: MouseBtn) -> bool {
        self.mouse_just_pressed.contains(&btn)
    }

    pub fn is_mouse_just_released(&self, btn: MouseBtn) -> bool {
        self.mouse_just_released.contains(&btn)
    }

    /// Left-button click on this frame only.
    pub fn clicked(&self) -> bool {
        self.is_mouse_just_pressed(MouseBtn::Left)
    }

    pub fn mouse_pos(&self) -> Vec2 {
        Vec2::new(self.mouse_position.0 as f32, self.mouse_position.1 as f32)
    }

    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
        self.mouse_just_pressed.clear();
        self.mouse_just_released.clear();
        self.typed.clear();
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_down_sets_held_and_just_pressed() {
        let mut input = InputState::new();
        input.key_down(Key::A);
        assert!(input.is_held(Key::A));
        assert!(input.is_just_pressed(Key::A));
    }

    #[test]
    fn test_key_up_clears_held_sets_just_released() {
        let mut input = InputState::new();
        input.key_down(Key::A);
        input.key_up(Key::A);
        assert!(!input.is_held(Key::A));
        assert!(input.is_just_released(Key::A));
    }

    #[test]
    fn test_held_key_is_pressed_only_on_first_frame() {
        let mut input = InputState::new();
        input.key_down(Key::Space);
        assert!(input.is_just_pressed(Key::Space));
        input.end_frame();
        // OS key repeat delivers another key_down while still held.
        input.key_down(Key::Space);
        assert!(input.is_held(Key::Space));
        assert!(!input.is_just_pressed(Key::Space));
    }

    #[test]
    fn test_key_up_without_down_is_no_op() {
        let mut input = InputState::new();
        input.key_up(Key::A);
        assert!(!input.is_just_released(Key::A));
        assert!(!input.is_held(Key::A));
    }

    #[test]
    fn test_end_frame_clears_transient_state() {
        let mut input = InputState::new();
        input.key_down(Key::A);
        input.mouse_down(MouseBtn::Left);
        input.push_text("hi");
        input.end_frame();
        assert!(!input.is_just_pressed(Key::A));
        assert!(!input.clicked());
        assert!(input.typed_text().is_empty());
        assert!(input.is_held(Key::A));
        assert!(input.is_mouse_held(MouseBtn::Left));
    }

    #[test]
    fn test_click_visible_to_every_query_in_frame() {
        let mut input = InputState::new();
        input.mouse_down(MouseBtn::Left);
        assert!(input.clicked());
        assert!(input.clicked());
        input.end_frame();
        assert!(!input.clicked());
    }

    #[test]
    fn test_push_text_drops_control_characters() {
        let mut input = InputState::new();
        input.push_text("a\u{8}b\r");
        assert_eq!(input.typed_text(), "ab");
    }

    #[test]
    fn test_is_any_held() {
        let mut input = InputState::new();
        input.key_down(Key::Left);
        assert!(input.is_any_held(&[Key::A, Key::Left]));
        assert!(!input.is_any_held(&[Key::D, Key::Right]));
    }

    #[test]
    fn test_digit_lookup() {
        assert_eq!(Key::digit(2), Some(Key::Num2));
        assert_eq!(Key::digit(10), None);
    }

    #[test]
    fn test_mouse_pos_converts_to_vec2() {
        let mut input = InputState::new();
        input.mouse_position = (100.0, 200.0);
        assert_eq!(input.mouse_pos(), Vec2::new(100.0, 200.0));
    }
}

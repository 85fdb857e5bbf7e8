//! Per-engine services handed to every callback: input, time, the frame's
//! canvas, the screen rect and requests that the engine acts on between
//! frames.

use crate::sound::SoundManager;
use glam::Vec2;
use nova_core::{Color, FrameClock, InputState, Key, Rect};
use nova_render::Canvas;

pub struct Context {
    pub input: InputState,
    pub clock: FrameClock,
    pub canvas: Canvas,
    /// Window area in logical pixels, origin top-left.
    pub screen: Rect,
    /// Draw sprite outlines, coordinates, FPS and mouse position.
    pub debug: bool,
    pub sound: SoundManager,
    running: bool,
    restart_requested: bool,
    save_requested: bool,
    load_requested: bool,
    scene_request: Option<String>,
}

impl Context {
    pub fn new(width: u32, height: u32, target_fps: u32) -> Self {
        Self {
            input: InputState::new(),
            clock: FrameClock::new(target_fps),
            canvas: Canvas::new(),
            screen: Rect::new(0.0, 0.0, width as f32, height as f32),
            debug: false,
            sound: SoundManager::silent(),
            running: true,
            restart_requested: false,
            save_requested: false,
            load_requested: false,
            scene_request: None,
        }
    }

    /// Seconds since the previous frame.
    pub fn dt(&self) -> f32 {
        self.clock.dt as f32
    }

    /// True only on the frame `key` went down.
    pub fn key_pressed(&self, key: Key) -> bool {
        self.input.is_just_pressed(key)
    }

    pub fn key_held(&self, key: Key) -> bool {
        self.input.is_held(key)
    }

    /// True only on the frame the left button went down.
    pub fn mouse_clicked(&self) -> bool {
        self.input.clicked()
    }

    pub fn mouse_pos(&self) -> Vec2 {
        self.input.mouse_pos()
    }

    pub fn fill(&mut self, color: Color) {
        self.canvas.fill(color);
    }

    pub fn render_text(&mut self, text: impl Into<String>, pos: Vec2, size: f32, color: Color, centered: bool) {
        if centered {
            self.canvas.text_centered(text, pos, size, color);
        } else {
            self.canvas.text(text, pos, size, color);
        }
    }

    pub fn ticks_ms(&self) -> u64 {
        self.clock.ticks_ms()
    }

    pub fn in_game_ms(&self) -> u64 {
        self.clock.in_game_ms()
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn quit(&mut self) {
        if self.running {
            log::info!("Quitting the game...");
        }
        self.running = false;
    }

    /// Relaunch the executable with the same arguments, then quit.
    pub fn restart(&mut self) {
        self.restart_requested = true;
        self.quit();
    }

    pub fn restart_requested(&self) -> bool {
        self.restart_requested
    }

    /// Switch scenes once the current frame's callback returns.
    pub fn switch_scene(&mut self, name: impl Into<String>) {
        self.scene_request = Some(name.into());
    }

    pub fn request_save(&mut self) {
        self.save_requested = true;
    }

    pub fn request_load(&mut self) {
        self.load_requested = true;
    }

    pub(crate) fn take_scene_request(&mut self) -> Option<String> {
        self.scene_request.take()
    }

    pub(crate) fn take_save_request(&mut self) -> bool {
        std::mem::take(&mut self.save_requested)
    }

    pub(crate) fn take_load_request(&mut self) -> bool {
        std::mem::take(&mut self.load_requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_matches_window_size() {
        let ctx = Context::new(640, 480, 60);
        assert_eq!(ctx.screen, Rect::new(0.0, 0.0, 640.0, 480.0));
        assert!(ctx.is_running());
    }

    #[test]
    fn restart_also_quits() {
        let mut ctx = Context::new(10, 10, 60);
        ctx.restart();
        assert!(!ctx.is_running());
        assert!(ctx.restart_requested());
    }

    #[test]
    fn requests_are_consumed_once() {
        let mut ctx = Context::new(10, 10, 60);
        ctx.switch_scene("menu");
        ctx.request_save();
        assert_eq!(ctx.take_scene_request().as_deref(), Some("menu"));
        assert!(ctx.take_scene_request().is_none());
        assert!(ctx.take_save_request());
        assert!(!ctx.take_save_request());
        assert!(!ctx.take_load_request());
    }

    #[test]
    fn key_pressed_is_edge_and_held_is_level() {
        let mut ctx = Context::new(10, 10, 60);
        ctx.input.key_down(Key::Space);
        assert!(ctx.key_pressed(Key::Space));
        ctx.input.end_frame();
        assert!(!ctx.key_pressed(Key::Space));
        assert!(ctx.key_held(Key::Space));
    }

    #[test]
    fn render_text_records_centering() {
        let mut ctx = Context::new(10, 10, 60);
        ctx.render_text("hi", Vec2::new(1.0, 2.0), 12.0, Color::BLACK, true);
        assert!(ctx.canvas.texts().all(|t| t.centered && t.text == "hi"));
    }
}

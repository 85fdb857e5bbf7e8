//! Clickable and bound UI widgets drawn through the frame's canvas.
//!
//! `ProgressBar` and `TextLabel` can be bound to a registered attribute path;
//! `refresh` reads it from the game state each frame.

use crate::context::Context;
use crate::engine::Frame;
use crate::sprite::Sprite;
use glam::Vec2;
use nova_core::{AttributeRegistry, Color, Rect};
use nova_render::Canvas;
use serde_json::Value;
use std::path::Path;

fn clicked_inside(rect: &Rect, ctx: &Context) -> bool {
    rect.collidepoint(ctx.mouse_pos()) && ctx.mouse_clicked()
}

/// Shown as-is for strings, JSON text for everything else.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub struct Button {
    pub sprite: Sprite,
}

impl Button {
    pub fn new(image: impl AsRef<Path>, size: Option<(f32, f32)>) -> Result<Self, String> {
        Ok(Self {
            sprite: Sprite::new(image, size, false)?,
        })
    }

    pub fn from_sprite(sprite: Sprite) -> Self {
        Self { sprite }
    }

    /// Draw the button; true on the frame it was clicked.
    pub fn check(&mut self, ctx: &mut Context) -> bool {
        self.sprite.draw(&mut ctx.canvas, ctx.debug);
        clicked_inside(&self.sprite.rect, ctx)
    }
}

/// Button with an image per state that flips on click.
pub struct ToggleButton {
    pub sprite: Sprite,
    images: [String; 2],
    pub state: bool,
}

impl ToggleButton {
    pub fn new(
        off_image: impl Into<String>,
        on_image: impl Into<String>,
        size: Option<(f32, f32)>,
        start_state: bool,
    ) -> Result<Self, String> {
        let images = [off_image.into(), on_image.into()];
        let sprite = Sprite::new(&images[usize::from(start_state)], size, false)?;
        Ok(Self {
            sprite,
            images,
            state: start_state,
        })
    }

    /// Flip on click, draw the matching image and return the state.
    pub fn check(&mut self, ctx: &mut Context) -> bool {
        if clicked_inside(&self.sprite.rect, ctx) {
            self.state = !self.state;
        }
        self.sprite.set_image(self.images[usize::from(self.state)].clone());
        self.sprite.draw(&mut ctx.canvas, ctx.debug);
        self.state
    }
}

pub struct CheckBox {
    pub rect: Rect,
    pub text: String,
    pub text_size: f32,
    pub color: Color,
    pub state: bool,
}

impl CheckBox {
    pub fn new(x: f32, y: f32, text: impl Into<String>, state: bool) -> Self {
        Self {
            rect: Rect::new(x, y, 20.0, 20.0),
            text: text.into(),
            text_size: 16.0,
            color: Color::BLACK,
            state,
        }
    }

    pub fn check(&mut self, ctx: &Context) -> bool {
        if clicked_inside(&self.rect, ctx) {
            self.state = !self.state;
        }
        self.state
    }

    pub fn draw(&self, canvas: &mut Canvas) {
        let r = self.rect;
        canvas.rect_outline(r, self.color, 2.0);
        if self.state {
            canvas.line(r.top_left(), Vec2::new(r.right(), r.bottom()), self.color, 2.0);
            canvas.line(Vec2::new(r.right(), r.top()), Vec2::new(r.left(), r.bottom()), self.color, 2.0);
        }
        canvas.text(
            self.text.clone(),
            Vec2::new(r.x + 30.0, r.y),
            self.text_size,
            self.color,
        );
    }

    pub fn update(&mut self, ctx: &mut Context) -> bool {
        let state = self.check(ctx);
        self.draw(&mut ctx.canvas);
        state
    }
}

fn non_negative(v: f64) -> f64 {
    if v > 0.0 {
        v
    } else {
        0.0
    }
}

pub struct ProgressBar {
    pub rect: Rect,
    max_value: f64,
    value: f64,
    pub bg_color: Color,
    pub fg_color: Color,
    pub border_color: Color,
    pub border_width: f32,
    pub show_text: bool,
    binding: Option<String>,
}

impl ProgressBar {
    pub fn new(rect: Rect, max_value: f64, start_value: f64) -> Self {
        let mut bar = Self {
            rect,
            max_value: non_negative(max_value),
            value: 0.0,
            bg_color: Color::GRAY,
            fg_color: Color::rgb(0, 200, 0),
            border_color: Color::BLACK,
            border_width: 2.0,
            show_text: false,
            binding: None,
        };
        bar.set_value(start_value);
        bar
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    /// Negative or NaN maxima become 0; the value is re-clamped.
    pub fn set_max_value(&mut self, max_value: f64) {
        self.max_value = non_negative(max_value);
        self.set_value(self.value);
    }

    /// Clamped into `[0, max_value]`.
    pub fn set_value(&mut self, value: f64) {
        self.value = non_negative(value).min(self.max_value);
    }

    pub fn add_value(&mut self, delta: f64) {
        self.set_value(self.value + delta);
    }

    /// Follow a registered numeric attribute.
    pub fn bind(mut self, path: impl Into<String>) -> Self {
        self.binding = Some(path.into());
        self
    }

    pub fn binding(&self) -> Option<&str> {
        self.binding.as_deref()
    }

    pub fn refresh<S>(&mut self, registry: &AttributeRegistry<S>, state: &S) {
        let Some(path) = &self.binding else {
            return;
        };
        match registry.read(path, state).as_ref().and_then(Value::as_f64) {
            Some(v) => self.set_value(v),
            None => log::warn!(target: "Widgets", "Progress bar binding '{}' is not a number", path),
        }
    }

    pub fn fraction(&self) -> f32 {
        if self.max_value <= 0.0 {
            return 0.0;
        }
        (self.value / self.max_value) as f32
    }

    pub fn draw(&self, canvas: &mut Canvas) {
        canvas.rect(self.rect, self.bg_color);
        let fill_w = (self.fraction() * self.rect.w).floor();
        if fill_w > 0.0 {
            canvas.rect(
                Rect::new(self.rect.x, self.rect.y, fill_w, self.rect.h),
                self.fg_color,
            );
        }
        if self.border_width > 0.0 {
            canvas.rect_outline(self.rect, self.border_color, self.border_width);
        }
        if self.show_text {
            canvas.text_centered(
                format!("{} / {}", self.value, self.max_value),
                self.rect.center(),
                (self.rect.h * 0.6).max(8.0),
                Color::WHITE,
            );
        }
    }

    pub fn update<S>(&mut self, frame: &mut Frame<'_, S>) {
        self.refresh(frame.attributes, frame.state);
        self.draw(&mut frame.ctx.canvas);
    }
}

/// Text with an optional bound attribute appended.
pub struct TextLabel {
    pub pos: Vec2,
    pub text: String,
    pub size: f32,
    pub color: Color,
    pub centered: bool,
    binding: Option<String>,
    rendered: String,
}

impl TextLabel {
    pub fn new(pos: Vec2, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            pos,
            rendered: text.clone(),
            text,
            size: 16.0,
            color: Color::BLACK,
            centered: false,
            binding: None,
        }
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        if self.binding.is_none() {
            self.rendered = self.text.clone();
        }
    }

    pub fn bind(mut self, path: impl Into<String>) -> Self {
        self.binding = Some(path.into());
        self
    }

    pub fn rendered(&self) -> &str {
        &self.rendered
    }

    pub fn refresh<S>(&mut self, registry: &AttributeRegistry<S>, state: &S) {
        self.rendered = match &self.binding {
            Some(path) => match registry.read(path, state) {
                Some(value) => format!("{}{}", self.text, display_value(&value)),
                None => self.text.clone(),
            },
            None => self.text.clone(),
        };
    }

    pub fn draw(&self, canvas: &mut Canvas) {
        if self.centered {
            canvas.text_centered(self.rendered.clone(), self.pos, self.size, self.color);
        } else {
            canvas.text(self.rendered.clone(), self.pos, self.size, self.color);
        }
    }

    pub fn update<S>(&mut self, frame: &mut Frame<'_, S>) {
        self.refresh(frame.attributes, frame.state);
        self.draw(&mut frame.ctx.canvas);
    }
}

/// Single-line entry field. Enter moves the typed text into `value`.
pub struct TextInput {
    pub rect: Rect,
    pub text_size: f32,
    pub color: Color,
    pub bg_color: Color,
    pub value: String,
    pub active: bool,
    current_input: String,
}

impl TextInput {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            rect: Rect::new(x, y, w, h),
            text_size: 16.0,
            color: Color::BLACK,
            bg_color: Color::WHITE,
            value: String::new(),
            active: true,
            current_input: String::new(),
        }
    }

    pub fn current_input(&self) -> &str {
        &self.current_input
    }

    /// Consume this frame's typing. Returns true when Enter committed.
    pub fn handle_input(&mut self, ctx: &Context) -> bool {
        if !self.active {
            return false;
        }
        self.current_input.push_str(ctx.input.typed_text());
        if ctx.key_pressed(nova_core::Key::Backspace) {
            self.current_input.pop();
        }
        if ctx.key_pressed(nova_core::Key::Enter) {
            self.value = std::mem::take(&mut self.current_input);
            return true;
        }
        false
    }

    pub fn draw(&self, canvas: &mut Canvas) {
        canvas.rect(self.rect, self.bg_color);
        canvas.text(
            self.current_input.clone(),
            Vec2::new(
                self.rect.x + 5.0,
                self.rect.y + (self.rect.h - self.text_size).max(0.0) * 0.5,
            ),
            self.text_size,
            self.color,
        );
    }

    pub fn update(&mut self, ctx: &mut Context) -> bool {
        let committed = self.handle_input(ctx);
        self.draw(&mut ctx.canvas);
        committed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nova_core::{Key, MouseBtn};
    use nova_render::DrawCommand;

    fn click_at(ctx: &mut Context, x: f64, y: f64) {
        ctx.input.mouse_position = (x, y);
        ctx.input.mouse_down(MouseBtn::Left);
    }

    #[derive(Default)]
    struct Player {
        hp: i32,
        name: String,
    }

    fn registry() -> AttributeRegistry<Player> {
        let mut registry = AttributeRegistry::new();
        registry
            .field("player.hp", |p: &Player| Some(&p.hp), |p: &mut Player| Some(&mut p.hp))
            .expect("hp")
            .field("player.name", |p: &Player| Some(&p.name), |p: &mut Player| Some(&mut p.name))
            .expect("name");
        registry
    }

    #[test]
    fn button_reports_click_only_inside() {
        let mut ctx = Context::new(100, 100, 60);
        let mut button = Button::from_sprite(Sprite::blank(20.0, 20.0, false));
        click_at(&mut ctx, 50.0, 50.0);
        assert!(!button.check(&mut ctx));
        click_at(&mut ctx, 10.0, 10.0);
        assert!(button.check(&mut ctx));
        ctx.input.end_frame();
        assert!(!button.check(&mut ctx));
    }

    #[test]
    fn toggle_button_uses_second_image_when_on() {
        let dir = tempfile::tempdir().expect("tempdir");
        let off = dir.path().join("off.png");
        let on = dir.path().join("on.png");
        image::RgbaImage::new(8, 8).save(&off).expect("off");
        image::RgbaImage::new(8, 8).save(&on).expect("on");

        let mut ctx = Context::new(100, 100, 60);
        let mut toggle = ToggleButton::new(
            off.to_string_lossy(),
            on.to_string_lossy(),
            None,
            false,
        )
        .expect("toggle");
        click_at(&mut ctx, 4.0, 4.0);
        assert!(toggle.check(&mut ctx));
        assert_eq!(toggle.sprite.image(), Some(on.to_string_lossy().as_ref()));
    }

    #[test]
    fn checkbox_draws_cross_when_checked() {
        let mut ctx = Context::new(100, 100, 60);
        let mut checkbox = CheckBox::new(0.0, 0.0, "Music", false);
        click_at(&mut ctx, 5.0, 5.0);
        assert!(checkbox.update(&mut ctx));
        let lines = ctx
            .canvas
            .commands()
            .iter()
            .filter(|c| matches!(c, DrawCommand::Line { .. }))
            .count();
        assert_eq!(lines, 2);
        let label = ctx.canvas.texts().next().expect("label");
        assert_eq!(label.pos, Vec2::new(30.0, 0.0));
    }

    #[test]
    fn progress_value_is_clamped() {
        let mut bar = ProgressBar::new(Rect::new(0.0, 0.0, 100.0, 10.0), 50.0, 80.0);
        assert_eq!(bar.value(), 50.0);
        bar.add_value(-70.0);
        assert_eq!(bar.value(), 0.0);
        bar.set_value(25.0);
        assert_eq!(bar.fraction(), 0.5);
    }

    #[test]
    fn negative_max_does_not_panic() {
        let mut bar = ProgressBar::new(Rect::new(0.0, 0.0, 100.0, 10.0), -10.0, 5.0);
        assert_eq!(bar.max_value(), 0.0);
        assert_eq!(bar.value(), 0.0);

        bar.set_max_value(40.0);
        bar.set_value(30.0);
        bar.set_max_value(-1.0);
        assert_eq!(bar.value(), 0.0);
        bar.add_value(5.0);
        assert_eq!(bar.value(), 0.0);
        assert_eq!(bar.fraction(), 0.0);

        bar.set_max_value(f64::NAN);
        bar.set_value(f64::NAN);
        assert_eq!(bar.value(), 0.0);
    }

    #[test]
    fn progress_bar_follows_binding() {
        let registry = registry();
        let player = Player {
            hp: 30,
            name: "Ann".into(),
        };
        let mut bar = ProgressBar::new(Rect::new(0.0, 0.0, 100.0, 10.0), 100.0, 0.0).bind("player.hp");
        bar.refresh(&registry, &player);
        assert_eq!(bar.value(), 30.0);

        let mut canvas = Canvas::new();
        bar.draw(&mut canvas);
        assert!(canvas.commands().iter().any(|c| matches!(
            c,
            DrawCommand::Rect { rect, border, .. } if *border == 0.0 && rect.w == 30.0
        )));
    }

    #[test]
    fn label_shows_strings_without_quotes() {
        let registry = registry();
        let player = Player {
            hp: 7,
            name: "Ann".into(),
        };
        let mut name = TextLabel::new(Vec2::ZERO, "Name: ").bind("player.name");
        name.refresh(&registry, &player);
        assert_eq!(name.rendered(), "Name: Ann");

        let mut hp = TextLabel::new(Vec2::ZERO, "HP: ").bind("player.hp");
        hp.refresh(&registry, &player);
        assert_eq!(hp.rendered(), "HP: 7");
    }

    #[test]
    fn text_input_edits_and_commits() {
        let mut ctx = Context::new(100, 100, 60);
        let mut input = TextInput::new(0.0, 0.0, 200.0, 30.0);

        ctx.input.push_text("abc");
        assert!(!input.update(&mut ctx));
        ctx.input.end_frame();

        ctx.input.key_down(Key::Backspace);
        input.update(&mut ctx);
        assert_eq!(input.current_input(), "ab");
        ctx.input.end_frame();

        ctx.input.key_down(Key::Enter);
        assert!(input.update(&mut ctx));
        assert_eq!(input.value, "ab");
        assert_eq!(input.current_input(), "");
    }
}

//! Sprites and sprite groups.
//!
//! A sprite is an axis-aligned rect with an optional image drawn rotated
//! about its center. Angles are degrees, counterclockwise as seen on screen,
//! with 0 pointing right.

use crate::context::Context;
use glam::Vec2;
use nova_core::animation::{load_animation_file, Animator, FrameAnimation};
use nova_core::{Color, Cooldown, Rect};
use nova_render::{Canvas, DrawCommand};
use std::ops::Index;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

const COLLIDE_IMMUNITY_SECS: f32 = 0.1;
const DEBUG_TEXT_SIZE: f32 = 12.0;

static NEXT_SPRITE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpriteId(u64);

impl SpriteId {
    fn next() -> Self {
        Self(NEXT_SPRITE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

pub type UpdateHook = Box<dyn FnMut(&mut Sprite, &mut Context)>;

pub struct Sprite {
    id: SpriteId,
    pub rect: Rect,
    image: Option<String>,
    pub angle: f32,
    pub solid: bool,
    pub tint: Color,
    /// Drawn as a filled rect when there is no image.
    pub fill: Option<Color>,
    alive: bool,
    debug_color: Color,
    collide_immunity: Cooldown,
    animator: Animator,
    update_hook: Option<UpdateHook>,
}

impl Sprite {
    /// Sprite showing the image at `path`. Without `size` the image's own
    /// dimensions are used, which requires reading its header.
    pub fn new(path: impl AsRef<Path>, size: Option<(f32, f32)>, solid: bool) -> Result<Self, String> {
        let path = path.as_ref();
        let (w, h) = match size {
            Some(size) => size,
            None => {
                let (w, h) = image::image_dimensions(path)
                    .map_err(|e| format!("Failed to read image {}: {}", path.display(), e))?;
                (w as f32, h as f32)
            }
        };
        let mut sprite = Self::blank(w, h, solid);
        sprite.image = Some(path.to_string_lossy().into_owned());
        Ok(sprite)
    }

    /// Sprite with no image; set `fill` to make it visible.
    pub fn blank(w: f32, h: f32, solid: bool) -> Self {
        Self {
            id: SpriteId::next(),
            rect: Rect::new(0.0, 0.0, w, h),
            image: None,
            angle: 0.0,
            solid,
            tint: Color::WHITE,
            fill: None,
            alive: true,
            debug_color: Color::random(),
            collide_immunity: Cooldown::from_secs(COLLIDE_IMMUNITY_SECS),
            animator: Animator::new(),
            update_hook: None,
        }
    }

    pub fn with_fill(mut self, color: Color) -> Self {
        self.fill = Some(color);
        self
    }

    pub fn id(&self) -> SpriteId {
        self.id
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn set_image(&mut self, path: impl Into<String>) {
        self.image = Some(path.into());
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.rect.x = x;
        self.rect.y = y;
    }

    pub fn place_centered(&mut self, center: Vec2) {
        self.rect.set_center(center);
    }

    pub fn move_by(&mut self, dx: f32, dy: f32) {
        self.rect.translate(dx, dy);
    }

    /// Step the center toward `target` at `speed` px/s without overshooting.
    /// Returns true once the target is reached.
    pub fn move_to(&mut self, target: Vec2, speed: f32, dt: f32) -> bool {
        let center = self.rect.center();
        let delta = target - center;
        let step = speed.max(0.0) * dt;
        let distance = delta.length();
        if distance <= step || distance == 0.0 {
            self.rect.set_center(target);
            return true;
        }
        let offset = delta / distance * step;
        self.rect.translate(offset.x, offset.y);
        false
    }

    /// Move `distance` pixels along the current angle.
    pub fn move_angle(&mut self, distance: f32) {
        let rad = self.angle.to_radians();
        self.rect.translate(rad.cos() * distance, -rad.sin() * distance);
    }

    /// Resize by `factor`, keeping the center.
    pub fn scale(&mut self, factor: f32) {
        let factor = factor.max(0.0);
        self.rect = self
            .rect
            .resized_about_center(self.rect.w * factor, self.rect.h * factor);
    }

    pub fn stay_in_rect(&mut self, bounds: &Rect) {
        self.rect.clamp_inside(bounds);
    }

    /// Turn clockwise by `degrees`.
    pub fn rotate(&mut self, degrees: f32) {
        self.angle = (self.angle - degrees).rem_euclid(360.0);
    }

    /// Point the angle at `target`.
    pub fn look_at(&mut self, target: Vec2) {
        let d = target - self.rect.center();
        if d == Vec2::ZERO {
            return;
        }
        self.angle = (-d.y.atan2(d.x).to_degrees()).rem_euclid(360.0);
    }

    pub fn collide(&mut self, other: &Sprite) -> bool {
        self.collide_rect(&other.rect)
    }

    /// Overlap test gated by the collide immunity: after a hit, further hits
    /// are ignored until the immunity runs out.
    pub fn collide_rect(&mut self, other: &Rect) -> bool {
        if !self.collide_immunity.check() {
            return false;
        }
        if self.rect.colliderect(other) {
            self.collide_immunity.start();
            return true;
        }
        false
    }

    pub fn collide_any<'a>(&mut self, others: impl IntoIterator<Item = &'a Rect>) -> bool {
        if !self.collide_immunity.check() {
            return false;
        }
        if others.into_iter().any(|r| self.rect.colliderect(r)) {
            self.collide_immunity.start();
            return true;
        }
        false
    }

    pub fn set_collide_immunity(&mut self, secs: f32) {
        self.collide_immunity = Cooldown::from_secs(secs);
    }

    pub fn hover(&self, point: Vec2) -> bool {
        self.rect.collidepoint(point)
    }

    pub fn kill(&mut self) {
        self.alive = false;
    }

    pub fn alive(&self) -> bool {
        self.alive
    }

    /// Per-frame behaviour run after the sprite is drawn.
    pub fn set_update(&mut self, hook: impl FnMut(&mut Sprite, &mut Context) + 'static) {
        self.update_hook = Some(Box::new(hook));
    }

    pub fn update(&mut self, ctx: &mut Context) {
        if !self.alive {
            return;
        }
        self.draw(&mut ctx.canvas, ctx.debug);
        if let Some(mut hook) = self.update_hook.take() {
            hook(self, ctx);
            if self.update_hook.is_none() {
                self.update_hook = Some(hook);
            }
        }
    }

    pub fn draw(&self, canvas: &mut Canvas, debug: bool) {
        if let Some(path) = &self.image {
            canvas.push(DrawCommand::Image {
                path: path.clone(),
                rect: self.rect,
                angle: self.angle,
                tint: self.tint,
            });
        } else if let Some(color) = self.fill {
            canvas.rect(self.rect, color);
        }

        if debug {
            canvas.rect_outline(self.rect, self.debug_color, 1.0);
            canvas.text_centered(
                format!("{:.0}, {:.0}", self.rect.x, self.rect.y),
                self.rect.center(),
                DEBUG_TEXT_SIZE,
                self.debug_color,
            );
        }
    }

    /// Register a clip. The first one becomes current and shows immediately.
    pub fn set_animation(&mut self, name: &str, clip: FrameAnimation) {
        if let Some(frame) = self.animator.add(name, clip) {
            self.image = Some(frame);
        }
    }

    /// Register every clip in an animation file, in name order.
    pub fn load_animations(&mut self, path: impl AsRef<Path>) -> Result<(), String> {
        let clips = load_animation_file(path.as_ref())?;
        let mut names: Vec<&String> = clips.keys().collect();
        names.sort();
        for name in names {
            self.set_animation(name, clips[name].clone());
        }
        Ok(())
    }

    /// Switch to `name` if given and different, otherwise advance the
    /// current clip by `dt` seconds.
    pub fn play_animation(&mut self, name: Option<&str>, dt: f32) {
        if let Some(name) = name {
            if let Some(frame) = self.animator.play(name) {
                self.image = Some(frame);
                return;
            }
        }
        if let Some(frame) = self.animator.tick(dt as f64) {
            self.image = Some(frame);
        }
    }

    pub fn current_animation(&self) -> Option<&str> {
        self.animator.current()
    }

    pub fn animation_finished(&self) -> bool {
        self.animator.is_finished()
    }
}

impl std::fmt::Debug for Sprite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sprite")
            .field("id", &self.id)
            .field("rect", &self.rect)
            .field("image", &self.image)
            .field("angle", &self.angle)
            .field("solid", &self.solid)
            .field("alive", &self.alive)
            .finish_non_exhaustive()
    }
}

/// Owned collection of sprites handled as one.
#[derive(Debug, Default)]
pub struct Group {
    sprites: Vec<Sprite>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership, so a sprite can only ever be in one group once.
    pub fn add(&mut self, sprite: Sprite) -> SpriteId {
        let id = sprite.id;
        self.sprites.push(sprite);
        id
    }

    pub fn remove(&mut self, id: SpriteId) -> Option<Sprite> {
        let index = self.sprites.iter().position(|s| s.id == id)?;
        Some(self.sprites.remove(index))
    }

    pub fn get(&self, id: SpriteId) -> Option<&Sprite> {
        self.sprites.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: SpriteId) -> Option<&mut Sprite> {
        self.sprites.iter_mut().find(|s| s.id == id)
    }

    pub fn draw(&self, canvas: &mut Canvas, debug: bool) {
        for sprite in &self.sprites {
            sprite.draw(canvas, debug);
        }
    }

    /// Update every member, then drop the dead ones.
    pub fn update(&mut self, ctx: &mut Context) {
        for sprite in &mut self.sprites {
            sprite.update(ctx);
        }
        self.sprites.retain(Sprite::alive);
    }

    pub fn move_by(&mut self, dx: f32, dy: f32) {
        for sprite in &mut self.sprites {
            sprite.move_by(dx, dy);
        }
    }

    pub fn scale(&mut self, factor: f32) {
        for sprite in &mut self.sprites {
            sprite.scale(factor);
        }
    }

    pub fn rotate(&mut self, degrees: f32) {
        for sprite in &mut self.sprites {
            sprite.rotate(degrees);
        }
    }

    pub fn kill(&mut self) {
        for sprite in &mut self.sprites {
            sprite.kill();
        }
    }

    /// Members overlapping `sprite`, excluding `sprite` itself.
    pub fn collide(&self, sprite: &Sprite) -> Vec<SpriteId> {
        self.sprites
            .iter()
            .filter(|s| s.id != sprite.id && s.alive && s.rect.colliderect(&sprite.rect))
            .map(|s| s.id)
            .collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sprite> {
        self.sprites.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Sprite> {
        self.sprites.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }
}

impl Index<usize> for Group {
    type Output = Sprite;

    fn index(&self, index: usize) -> &Sprite {
        &self.sprites[index]
    }
}

impl<'a> IntoIterator for &'a Group {
    type Item = &'a Sprite;
    type IntoIter = std::slice::Iter<'a, Sprite>;

    fn into_iter(self) -> Self::IntoIter {
        self.sprites.iter()
    }
}

//! Keyboard-driven movement resolvers.
//!
//! Speeds are pixels per second and scaled by the frame delta. Collisions are
//! resolved one axis at a time so a sprite can slide along a wall.

use crate::context::Context;
use crate::sprite::Sprite;
use nova_core::{InputState, Key, Rect};

/// Direction requested by the keyboard this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveIntent {
    /// -1, 0 or 1.
    pub dx: f32,
    pub dy: f32,
    pub jump: bool,
}

impl MoveIntent {
    /// WASD and arrow keys; Space, W or Up also request a jump. With both
    /// directions of an axis held, right and down win.
    pub fn from_input(input: &InputState) -> Self {
        let axis = |neg: &[Key], pos: &[Key]| {
            if input.is_any_held(pos) {
                1.0
            } else if input.is_any_held(neg) {
                -1.0
            } else {
                0.0
            }
        };
        Self {
            dx: axis(&[Key::A, Key::Left], &[Key::D, Key::Right]),
            dy: axis(&[Key::W, Key::Up], &[Key::S, Key::Down]),
            jump: input.is_any_held(&[Key::Space, Key::W, Key::Up]),
        }
    }
}

fn resolve_x(rect: &mut Rect, dx: f32, solids: &[Rect]) -> bool {
    let mut hit = false;
    for solid in solids {
        if rect.colliderect(solid) {
            if dx > 0.0 {
                rect.set_right(solid.left());
            } else if dx < 0.0 {
                rect.set_left(solid.right());
            }
            hit = true;
        }
    }
    hit
}

fn resolve_y(rect: &mut Rect, dy: f32, solids: &[Rect]) -> bool {
    let mut hit = false;
    for solid in solids {
        if rect.colliderect(solid) {
            if dy > 0.0 {
                rect.set_bottom(solid.top());
            } else if dy < 0.0 {
                rect.set_top(solid.bottom());
            }
            hit = true;
        }
    }
    hit
}

/// Four-direction movement that stops at solids and the screen edge.
#[derive(Debug, Clone, Copy)]
pub struct TopDownMovement {
    pub speed: f32,
}

impl TopDownMovement {
    pub fn new(speed: f32) -> Self {
        Self { speed }
    }

    pub fn apply(&self, sprite: &mut Sprite, ctx: &Context, solids: &[Rect]) {
        let intent = MoveIntent::from_input(&ctx.input);
        self.step(sprite, intent, ctx.dt(), &ctx.screen, solids);
    }

    pub fn step(&self, sprite: &mut Sprite, intent: MoveIntent, dt: f32, screen: &Rect, solids: &[Rect]) {
        let dx = intent.dx * self.speed * dt;
        let dy = intent.dy * self.speed * dt;

        sprite.rect.x += dx;
        resolve_x(&mut sprite.rect, dx, solids);
        sprite.rect.y += dy;
        resolve_y(&mut sprite.rect, dy, solids);

        sprite.stay_in_rect(screen);
    }
}

impl Default for TopDownMovement {
    fn default() -> Self {
        Self::new(300.0)
    }
}

/// Side-on movement with gravity and jumping. The bottom screen edge is a
/// floor.
#[derive(Debug, Clone, Copy)]
pub struct PlatformerMovement {
    pub speed: f32,
    /// Downward acceleration, px/s².
    pub gravity: f32,
    /// Initial upward speed of a jump, px/s.
    pub jump_force: f32,
    pub vel_x: f32,
    pub vel_y: f32,
    pub on_ground: bool,
}

impl PlatformerMovement {
    pub fn new(speed: f32, gravity: f32, jump_force: f32) -> Self {
        Self {
            speed,
            gravity,
            jump_force,
            vel_x: 0.0,
            vel_y: 0.0,
            on_ground: false,
        }
    }

    pub fn apply(&mut self, sprite: &mut Sprite, ctx: &Context, solids: &[Rect]) {
        let intent = MoveIntent::from_input(&ctx.input);
        self.step(sprite, intent, ctx.dt(), &ctx.screen, solids);
    }

    pub fn step(&mut self, sprite: &mut Sprite, intent: MoveIntent, dt: f32, screen: &Rect, solids: &[Rect]) {
        self.vel_x = intent.dx * self.speed;
        if intent.jump && self.on_ground {
            self.vel_y = -self.jump_force;
            self.on_ground = false;
        }
        self.vel_y += self.gravity * dt;

        let dx = self.vel_x * dt;
        sprite.rect.x += dx;
        resolve_x(&mut sprite.rect, dx, solids);

        let dy = self.vel_y * dt;
        sprite.rect.y += dy;
        self.on_ground = false;
        if resolve_y(&mut sprite.rect, dy, solids) {
            if dy > 0.0 {
                self.on_ground = true;
            }
            self.vel_y = 0.0;
        }

        let rect = &mut sprite.rect;
        if rect.left() < screen.left() {
            rect.set_left(screen.left());
        }
        if rect.right() > screen.right() {
            rect.set_right(screen.right());
        }
        if rect.top() < screen.top() {
            rect.set_top(screen.top());
            self.vel_y = self.vel_y.max(0.0);
        }
        if rect.bottom() >= screen.bottom() {
            rect.set_bottom(screen.bottom());
            self.vel_y = self.vel_y.min(0.0);
            self.on_ground = true;
        }
    }
}

impl Default for PlatformerMovement {
    fn default() -> Self {
        Self::new(300.0, 1800.0, 700.0)
    }
}

/// Input-only movement: no collisions, no screen clamp.
#[derive(Debug, Clone, Copy)]
pub struct SimpleTopDown {
    pub speed: f32,
}

impl SimpleTopDown {
    pub fn new(speed: f32) -> Self {
        Self { speed }
    }

    pub fn apply(&self, sprite: &mut Sprite, ctx: &Context) {
        let intent = MoveIntent::from_input(&ctx.input);
        let step = self.speed * ctx.dt();
        sprite.move_by(intent.dx * step, intent.dy * step);
    }
}

use crate::context::Context;
use crate::sprite::Sprite;
use glam::Vec2;

/// Sprite that flies in a straight line from `start` toward `target` and
/// dies once it no longer overlaps the screen.
pub struct Projectile {
    pub sprite: Sprite,
    /// Pixels per second.
    pub speed: f32,
}

impl Projectile {
    pub fn new(mut sprite: Sprite, start: Vec2, target: Vec2, speed: f32) -> Self {
        sprite.place_centered(start);
        sprite.look_at(target);
        Self { sprite, speed }
    }

    pub fn alive(&self) -> bool {
        self.sprite.alive()
    }

    pub fn update(&mut self, ctx: &mut Context) {
        if !self.sprite.alive() {
            return;
        }
        if !self.sprite.rect.colliderect(&ctx.screen) {
            self.sprite.kill();
            return;
        }
        self.sprite.draw(&mut ctx.canvas, ctx.debug);
        self.sprite.move_angle(self.speed * ctx.dt());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flies_toward_target() {
        let p = Projectile::new(
            Sprite::blank(4.0, 4.0, false),
            Vec2::new(50.0, 50.0),
            Vec2::new(50.0, 0.0),
            100.0,
        );
        assert_eq!(p.sprite.rect.center(), Vec2::new(50.0, 50.0));
        assert!((p.sprite.angle - 90.0).abs() < 1e-3);

        let mut sprite = p.sprite;
        sprite.move_angle(10.0);
        assert!((sprite.rect.center().y - 40.0).abs() < 1e-3);
    }

    #[test]
    fn dies_off_screen() {
        let mut ctx = Context::new(100, 100, 60);
        let mut p = Projectile::new(
            Sprite::blank(4.0, 4.0, false),
            Vec2::new(-20.0, 50.0),
            Vec2::new(-40.0, 50.0),
            100.0,
        );
        p.update(&mut ctx);
        assert!(!p.alive());
        assert!(ctx.canvas.is_empty());
    }

    #[test]
    fn on_screen_projectile_is_drawn() {
        let mut ctx = Context::new(100, 100, 60);
        let mut p = Projectile::new(
            Sprite::blank(4.0, 4.0, false).with_fill(nova_core::Color::RED),
            Vec2::new(50.0, 50.0),
            Vec2::new(90.0, 50.0),
            100.0,
        );
        p.update(&mut ctx);
        assert!(p.alive());
        assert_eq!(ctx.canvas.len(), 1);
    }
}

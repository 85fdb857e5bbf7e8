//! Screen-space rectangles.
//!
//! Coordinates follow the window convention: origin at the top-left corner,
//! `y` grows downward. Edge setters move the rectangle rather than resize it.

use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_center(center: Vec2, w: f32, h: f32) -> Self {
        Self::new(center.x - w * 0.5, center.y - h * 0.5, w, h)
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn set_left(&mut self, v: f32) {
        self.x = v;
    }

    pub fn set_right(&mut self, v: f32) {
        self.x = v - self.w;
    }

    pub fn set_top(&mut self, v: f32) {
        self.y = v;
    }

    pub fn set_bottom(&mut self, v: f32) {
        self.y = v - self.h;
    }

    pub fn top_left(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.w, self.h)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    pub fn set_center(&mut self, center: Vec2) {
        self.x = center.x - self.w * 0.5;
        self.y = center.y - self.h * 0.5;
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
    }

    /// Overlap test with open edges: rectangles that only share an edge do
    /// not collide, so a body resting flush on a floor is not "inside" it.
    pub fn colliderect(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    /// Half-open containment: left/top edges inside, right/bottom outside.
    pub fn collidepoint(&self, p: Vec2) -> bool {
        p.x >= self.left() && p.x < self.right() && p.y >= self.top() && p.y < self.bottom()
    }

    /// Move inside `bounds`. A rect larger than the bounds is centered on
    /// that axis.
    pub fn clamp_inside(&mut self, bounds: &Rect) {
        if self.w >= bounds.w {
            self.x = bounds.x + (bounds.w - self.w) * 0.5;
        } else {
            self.x = self.x.clamp(bounds.left(), bounds.right() - self.w);
        }
        if self.h >= bounds.h {
            self.y = bounds.y + (bounds.h - self.h) * 0.5;
        } else {
            self.y = self.y.clamp(bounds.top(), bounds.bottom() - self.h);
        }
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.left() >= self.left()
            && other.right() <= self.right()
            && other.top() >= self.top()
            && other.bottom() <= self.bottom()
    }

    pub fn resized_about_center(&self, w: f32, h: f32) -> Rect {
        Rect::from_center(self.center(), w, h)
    }
}

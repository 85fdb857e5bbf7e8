//! CPU tessellation of a [`Canvas`] into one indexed triangle mesh.
//!
//! Solid shapes sample a 1x1 white texture so every command goes through the
//! same pipeline. Consecutive commands sharing a texture collapse into a
//! single draw call.

use crate::canvas::{Canvas, DrawCommand};
use crate::vertex::QuadVertex;
use glam::Vec2;
use nova_core::{Color, Rect};
use std::sync::Arc;

/// Texture key for untextured geometry.
pub const WHITE_TEXTURE_KEY: &str = "__white";

const CIRCLE_SEGMENTS: u32 = 32;

/// A contiguous run of indices sharing one texture binding.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub texture_key: Arc<str>,
    pub index_start: u32,
    pub index_count: u32,
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<QuadVertex>,
    pub indices: Vec<u32>,
    pub draw_calls: Vec<DrawCall>,
    /// Color of the last `Fill`, or black when the canvas never filled.
    pub clear_color: Color,
    pub image_count: usize,
}

impl Mesh {
    fn with_capacity(commands: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(commands * 4),
            indices: Vec::with_capacity(commands * 6),
            draw_calls: Vec::with_capacity(16),
            clear_color: Color::BLACK,
            image_count: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Number of texture switches needed to draw the mesh.
    pub fn texture_binds(&self) -> usize {
        let mut binds = 0usize;
        let mut current: Option<&str> = None;
        for draw in &self.draw_calls {
            let key: &str = &draw.texture_key;
            if current != Some(key) {
                current = Some(key);
                binds += 1;
            }
        }
        binds
    }

    fn add_quad(&mut self, texture_key: &str, corners: [Vec2; 4], color: [f32; 4]) {
        const UV: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        let base = self.vertices.len() as u32;
        for (corner, uv) in corners.iter().zip(UV) {
            self.vertices.push(QuadVertex {
                position: corner.to_array(),
                tex_coords: uv,
                color,
            });
        }
        let start = self.indices.len() as u32;
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        self.push_draw_call(texture_key, start, 6);
    }

    fn add_rect(&mut self, rect: Rect, color: [f32; 4]) {
        if rect.w <= 0.0 || rect.h <= 0.0 {
            return;
        }
        self.add_quad(WHITE_TEXTURE_KEY, rect_corners(&rect), color);
    }

    fn add_outline(&mut self, rect: Rect, border: f32, color: [f32; 4]) {
        let b = border.min(rect.w * 0.5).min(rect.h * 0.5);
        self.add_rect(Rect::new(rect.x, rect.y, rect.w, b), color);
        self.add_rect(Rect::new(rect.x, rect.bottom() - b, rect.w, b), color);
        self.add_rect(Rect::new(rect.x, rect.y + b, b, rect.h - 2.0 * b), color);
        self.add_rect(
            Rect::new(rect.right() - b, rect.y + b, b, rect.h - 2.0 * b),
            color,
        );
    }

    fn add_line(&mut self, from: Vec2, to: Vec2, width: f32, color: [f32; 4]) {
        let dir = to - from;
        if dir.length_squared() == 0.0 || width <= 0.0 {
            return;
        }
        let normal = dir.perp().normalize() * (width * 0.5);
        self.add_quad(
            WHITE_TEXTURE_KEY,
            [from + normal, to + normal, to - normal, from - normal],
            color,
        );
    }

    fn add_circle(&mut self, center: Vec2, radius: f32, color: [f32; 4]) {
        if radius <= 0.0 {
            return;
        }
        let base = self.vertices.len() as u32;
        self.vertices.push(QuadVertex {
            position: center.to_array(),
            tex_coords: [0.5, 0.5],
            color,
        });
        for i in 0..CIRCLE_SEGMENTS {
            let theta = i as f32 / CIRCLE_SEGMENTS as f32 * std::f32::consts::TAU;
            let (sin, cos) = theta.sin_cos();
            self.vertices.push(QuadVertex {
                position: [center.x + cos * radius, center.y + sin * radius],
                tex_coords: [0.5 + cos * 0.5, 0.5 + sin * 0.5],
                color,
            });
        }
        let start = self.indices.len() as u32;
        for i in 0..CIRCLE_SEGMENTS {
            let next = (i + 1) % CIRCLE_SEGMENTS;
            self.indices
                .extend_from_slice(&[base, base + 1 + i, base + 1 + next]);
        }
        self.push_draw_call(WHITE_TEXTURE_KEY, start, CIRCLE_SEGMENTS * 3);
    }

    fn push_draw_call(&mut self, texture_key: &str, index_start: u32, index_count: u32) {
        if let Some(last) = self.draw_calls.last_mut() {
            let contiguous = last.index_start + last.index_count == index_start;
            if &*last.texture_key == texture_key && contiguous {
                last.index_count += index_count;
                return;
            }
        }
        self.draw_calls.push(DrawCall {
            texture_key: Arc::from(texture_key),
            index_start,
            index_count,
        });
    }
}

/// Corners clockwise on screen starting top-left.
fn rect_corners(rect: &Rect) -> [Vec2; 4] {
    [
        Vec2::new(rect.left(), rect.top()),
        Vec2::new(rect.right(), rect.top()),
        Vec2::new(rect.right(), rect.bottom()),
        Vec2::new(rect.left(), rect.bottom()),
    ]
}

/// Corners of `rect` turned `angle_deg` counterclockwise as seen on a y-down
/// screen.
fn rotated_corners(rect: &Rect, angle_deg: f32) -> [Vec2; 4] {
    let corners = rect_corners(rect);
    if angle_deg == 0.0 {
        return corners;
    }
    let center = rect.center();
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    corners.map(|p| {
        let d = p - center;
        center + Vec2::new(d.x * cos + d.y * sin, -d.x * sin + d.y * cos)
    })
}

pub fn build_mesh(canvas: &Canvas) -> Mesh {
    let mut mesh = Mesh::with_capacity(canvas.len());
    for command in canvas.commands() {
        match command {
            DrawCommand::Fill(color) => mesh.clear_color = *color,
            DrawCommand::Image {
                path,
                rect,
                angle,
                tint,
            } => {
                if rect.w <= 0.0 || rect.h <= 0.0 {
                    continue;
                }
                mesh.add_quad(path, rotated_corners(rect, *angle), tint.to_linear_f32());
                mesh.image_count += 1;
            }
            DrawCommand::Rect {
                rect,
                color,
                border,
            } => {
                if *border > 0.0 {
                    mesh.add_outline(*rect, *border, color.to_linear_f32());
                } else {
                    mesh.add_rect(*rect, color.to_linear_f32());
                }
            }
            DrawCommand::Line {
                from,
                to,
                color,
                width,
            } => mesh.add_line(*from, *to, *width, color.to_linear_f32()),
            DrawCommand::Circle {
                center,
                radius,
                color,
            } => mesh.add_circle(*center, *radius, color.to_linear_f32()),
            DrawCommand::Text(_) => {}
        }
    }
    mesh
}

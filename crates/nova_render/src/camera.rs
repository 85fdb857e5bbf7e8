use glam::{Mat4, Vec2};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// Pixel-space orthographic camera: `position` is the world point shown at
/// the window's top-left corner and `y` grows downward.
pub struct Camera2D {
    pub position: Vec2,
    pub zoom: f32,
    pub viewport: (u32, u32),
}

impl Camera2D {
    pub fn new(viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: 1.0,
            viewport: (viewport_width, viewport_height),
        }
    }

    pub fn projection(&self) -> Mat4 {
        let w = self.viewport.0.max(1) as f32 / self.zoom;
        let h = self.viewport.1.max(1) as f32 / self.zoom;
        Mat4::orthographic_rh(
            self.position.x,
            self.position.x + w,
            self.position.y + h,
            self.position.y,
            -1.0,
            1.0,
        )
    }

    pub fn build_uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: self.projection().to_cols_array_2d(),
        }
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        self.position + screen / self.zoom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn ndc(camera: &Camera2D, x: f32, y: f32) -> Vec2 {
        let clip = camera.projection() * Vec4::new(x, y, 0.0, 1.0);
        Vec2::new(clip.x / clip.w, clip.y / clip.w)
    }

    #[test]
    fn top_left_pixel_maps_to_upper_left_ndc() {
        let camera = Camera2D::new(800, 600);
        assert!((ndc(&camera, 0.0, 0.0) - Vec2::new(-1.0, 1.0)).length() < 1e-5);
        assert!((ndc(&camera, 800.0, 600.0) - Vec2::new(1.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn scroll_and_zoom_shift_the_view() {
        let mut camera = Camera2D::new(800, 600);
        camera.position = Vec2::new(100.0, 50.0);
        camera.zoom = 2.0;
        assert!((ndc(&camera, 100.0, 50.0) - Vec2::new(-1.0, 1.0)).length() < 1e-5);
        assert!((ndc(&camera, 500.0, 350.0) - Vec2::new(1.0, -1.0)).length() < 1e-5);
        assert_eq!(camera.screen_to_world(Vec2::new(800.0, 600.0)), Vec2::new(500.0, 350.0));
    }
}

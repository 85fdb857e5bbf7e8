//! Streams a [`Mesh`] to the GPU and draws it.
//!
//! Vertex and index buffers grow to the next power of two and never shrink.
//! Textures are loaded from disk the first time a draw call names them; a
//! file that cannot be read or decoded is logged once and drawn white.

use crate::camera::Camera2D;
use crate::gpu_context::GpuContext;
use crate::mesh::{Mesh, WHITE_TEXTURE_KEY};
use crate::quad_pipeline::QuadPipeline;
use crate::texture::Texture;
use crate::vertex::QuadVertex;
use std::collections::HashMap;
use std::sync::Arc;
use wgpu::util::DeviceExt;

struct GpuTexture {
    texture: Texture,
    bind_group: wgpu::BindGroup,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderStats {
    pub draw_calls: u32,
    pub texture_binds: u32,
    pub images: u32,
    pub vertices: u32,
    pub textures_loaded: u32,
    /// Texture plus mesh buffer memory in megabytes.
    pub memory_estimate_mb: f32,
}

pub struct Renderer {
    pipeline: QuadPipeline,
    pub camera: Camera2D,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    vertex_capacity: usize,
    index_capacity: usize,
    textures: HashMap<Arc<str>, GpuTexture>,
    srgb_target: bool,
}

impl Renderer {
    pub fn new(gpu: &GpuContext) -> Self {
        let pipeline = QuadPipeline::new(&gpu.device, gpu.surface_format);
        let camera = Camera2D::new(gpu.size.0, gpu.size.1);
        let camera_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Uniform Buffer"),
                contents: bytemuck::cast_slice(&[camera.build_uniform()]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let camera_bind_group = pipeline.create_camera_bind_group(&gpu.device, &camera_buffer);

        let mut renderer = Self {
            vertex_buffer: create_vertex_buffer(&gpu.device, 1),
            index_buffer: create_index_buffer(&gpu.device, 1),
            vertex_capacity: 0,
            index_capacity: 0,
            pipeline,
            camera,
            camera_buffer,
            camera_bind_group,
            textures: HashMap::new(),
            srgb_target: gpu.surface_format.is_srgb(),
        };
        let white = Texture::white(&gpu.device, &gpu.queue);
        renderer.insert_texture(&gpu.device, Arc::from(WHITE_TEXTURE_KEY), white);
        renderer
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.viewport = (width, height);
    }

    /// Upload everything `mesh` needs. Call once per frame before `draw`.
    pub fn prepare(&mut self, gpu: &GpuContext, mesh: &Mesh) {
        for draw in &mesh.draw_calls {
            if !self.textures.contains_key(&draw.texture_key) {
                let texture = load_texture(gpu, &draw.texture_key);
                self.insert_texture(&gpu.device, draw.texture_key.clone(), texture);
            }
        }

        self.ensure_capacity(&gpu.device, mesh.vertices.len(), mesh.indices.len());
        if !mesh.vertices.is_empty() {
            gpu.queue
                .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&mesh.vertices));
        }
        if !mesh.indices.is_empty() {
            gpu.queue
                .write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(&mesh.indices));
        }
        gpu.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[self.camera.build_uniform()]),
        );
    }

    /// Clear to the mesh's fill color and draw it in one pass.
    pub fn draw(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView, mesh: &Mesh) {
        let clear = if self.srgb_target {
            mesh.clear_color.to_linear_f64()
        } else {
            let c = mesh.clear_color;
            [c.r as f64 / 255.0, c.g as f64 / 255.0, c.b as f64 / 255.0, c.a as f64 / 255.0]
        };
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: clear[0],
                        g: clear[1],
                        b: clear[2],
                        a: clear[3],
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            ..Default::default()
        });

        if mesh.is_empty() {
            return;
        }

        render_pass.set_pipeline(&self.pipeline.render_pipeline);
        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

        let mut last_bound: Option<&Arc<str>> = None;
        for draw in &mesh.draw_calls {
            let Some(texture) = self.textures.get(&draw.texture_key) else {
                continue;
            };
            if last_bound.is_none_or(|last| **last != *draw.texture_key) {
                render_pass.set_bind_group(1, &texture.bind_group, &[]);
                last_bound = Some(&draw.texture_key);
            }
            render_pass.draw_indexed(
                draw.index_start..(draw.index_start + draw.index_count),
                0,
                0..1,
            );
        }
    }

    pub fn stats(&self, mesh: &Mesh) -> RenderStats {
        let mut bytes: usize = self.textures.values().map(|t| t.texture.byte_size()).sum();
        bytes += self.vertex_capacity * std::mem::size_of::<QuadVertex>();
        bytes += self.index_capacity * std::mem::size_of::<u32>();
        RenderStats {
            draw_calls: mesh.draw_calls.len() as u32,
            texture_binds: mesh.texture_binds() as u32,
            images: mesh.image_count as u32,
            vertices: mesh.vertices.len() as u32,
            textures_loaded: self.textures.len() as u32,
            memory_estimate_mb: bytes as f32 / (1024.0 * 1024.0),
        }
    }

    fn insert_texture(&mut self, device: &wgpu::Device, key: Arc<str>, texture: Texture) {
        let bind_group = self.pipeline.create_texture_bind_group(device, &texture);
        self.textures.insert(
            key,
            GpuTexture {
                texture,
                bind_group,
            },
        );
    }

    fn ensure_capacity(&mut self, device: &wgpu::Device, vertex_count: usize, index_count: usize) {
        let needed_vertices = vertex_count.max(1);
        if needed_vertices > self.vertex_capacity {
            self.vertex_capacity = needed_vertices.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(device, self.vertex_capacity);
        }
        let needed_indices = index_count.max(1);
        if needed_indices > self.index_capacity {
            self.index_capacity = needed_indices.next_power_of_two();
            self.index_buffer = create_index_buffer(device, self.index_capacity);
        }
    }
}

fn load_texture(gpu: &GpuContext, path: &str) -> Texture {
    let loaded = std::fs::read(path)
        .map_err(|e| format!("Failed to read texture '{}': {e}", path))
        .and_then(|bytes| Texture::from_bytes(&gpu.device, &gpu.queue, &bytes, path));
    match loaded {
        Ok(texture) => {
            log::debug!("Loaded texture '{}' ({}x{})", path, texture.size.0, texture.size.1);
            texture
        }
        Err(e) => {
            log::warn!("{}. Drawing it white.", e);
            Texture::white(&gpu.device, &gpu.queue)
        }
    }
}

fn create_vertex_buffer(device: &wgpu::Device, vertex_capacity: usize) -> wgpu::Buffer {
    let byte_len = (vertex_capacity * std::mem::size_of::<QuadVertex>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Scene Vertex Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, index_capacity: usize) -> wgpu::Buffer {
    let byte_len = (index_capacity * std::mem::size_of::<u32>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Scene Index Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

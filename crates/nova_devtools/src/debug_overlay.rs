//! egui layer drawn over the game: the debug statistics window and the
//! text of the frame's `Canvas`.
//!
//! egui needs its render pass split from the encoder borrow, so a frame goes
//! through four phases:
//!
//!   1. `prepare()` -- run the UI, produce tessellated primitives
//!   2. `upload()`  -- push textures and buffers (borrows the encoder)
//!   3. `paint()`   -- render into a pass opened with `forget_lifetime()`
//!   4. `cleanup()` -- free textures egui dropped
//!
//! Canvas text is always painted; the statistics window only while
//! `visible` (F3 or the engine's debug flag).

use nova_core::time::FrameClock;
use nova_core::Color;
use nova_render::TextCommand;
use winit::window::Window;

#[derive(Debug, Clone, Default)]
pub struct OverlayStats {
    pub draw_calls: u32,
    pub texture_binds: u32,
    pub sprite_count: u32,
    pub images: u32,
    pub memory_estimate_mb: f32,
    pub scene_name: String,
    pub mouse_position: (f32, f32),
    pub in_game_ms: u64,
    pub frozen: bool,
}

#[derive(Debug, Clone, Default)]
pub struct OverlayActions {
    /// Freeze or unfreeze in-game time.
    pub toggle_freeze: bool,
    pub save_now: bool,
}

pub struct DebugOverlay {
    pub egui_ctx: egui::Context,
    pub egui_winit_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,
    pub visible: bool,
}

impl DebugOverlay {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        window: &Window,
    ) -> Self {
        let egui_ctx = egui::Context::default();
        let egui_winit_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(device, surface_format, None, 1, false);

        Self {
            egui_ctx,
            egui_winit_state,
            egui_renderer,
            visible: false,
        }
    }

    pub fn handle_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        let response = self.egui_winit_state.on_window_event(window, event);
        response.consumed
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        log::info!("Debug overlay: {}", if self.visible { "ON" } else { "OFF" });
    }

    pub fn prepare<'a>(
        &mut self,
        window: &Window,
        clock: &FrameClock,
        stats: &OverlayStats,
        texts: impl Iterator<Item = &'a TextCommand>,
    ) -> (
        Vec<egui::ClippedPrimitive>,
        egui::TexturesDelta,
        OverlayActions,
    ) {
        let mut actions = OverlayActions::default();
        let raw_input = self.egui_winit_state.take_egui_input(window);
        let visible = self.visible;
        let texts: Vec<&TextCommand> = texts.collect();
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            let painter = ctx.layer_painter(egui::LayerId::background());
            for text in &texts {
                painter.text(
                    egui::pos2(text.pos.x, text.pos.y),
                    text_anchor(text.centered),
                    &text.text,
                    egui::FontId::proportional(text.size),
                    to_color32(text.color),
                );
            }

            if !visible {
                return;
            }
            egui::Window::new("Debug")
                .default_pos([10.0, 10.0])
                .show(ctx, |ui| {
                    ui.label(format!("FPS: {:.1}", clock.smoothed_fps));
                    ui.label(format!("Frame time: {:.2} ms", clock.smoothed_frame_time_ms));
                    ui.label(format!("Frame: {}", clock.frame_count));
                    ui.label(format!("In-game time: {:.2} s", stats.in_game_ms as f64 / 1000.0));
                    ui.separator();
                    ui.label(format!("Scene: {}", stats.scene_name));
                    ui.label(format!("Sprites: {}", stats.sprite_count));
                    ui.label(format!("Images: {}", stats.images));
                    ui.label(format!("Draw calls: {}", stats.draw_calls));
                    ui.label(format!("Texture binds: {}", stats.texture_binds));
                    ui.label(format!("Memory: {:.1} MB", stats.memory_estimate_mb));
                    ui.label(format!(
                        "Mouse: ({:.0}, {:.0})",
                        stats.mouse_position.0, stats.mouse_position.1
                    ));
                    ui.separator();
                    ui.horizontal(|ui| {
                        let freeze_label = if stats.frozen { "Unfreeze" } else { "Freeze" };
                        if ui.button(freeze_label).clicked() {
                            actions.toggle_freeze = true;
                        }
                        if ui.button("Save").clicked() {
                            actions.save_now = true;
                        }
                    });
                });
        });

        self.egui_winit_state
            .handle_platform_output(window, full_output.platform_output);

        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        (primitives, full_output.textures_delta, actions)
    }

    /// Upload textures and update buffers. Call before creating the egui render pass.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor);
    }

    pub fn paint(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    pub fn cleanup(&mut self, textures_delta: &egui::TexturesDelta) {
        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

fn text_anchor(centered: bool) -> egui::Align2 {
    if centered {
        egui::Align2::CENTER_CENTER
    } else {
        egui::Align2::LEFT_TOP
    }
}

fn to_color32(color: Color) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
}

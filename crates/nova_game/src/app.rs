//! winit driver for an [`Engine`].
//!
//! The window and GPU objects are created lazily in `resumed`. Each
//! `RedrawRequested` steps the engine once, tessellates its canvas, draws the
//! mesh and then composites the egui layer (canvas text and the F3 debug
//! window) in a second pass.
//!
//! Game coordinates are logical pixels: the camera zoom tracks the window's
//! scale factor and cursor positions are divided by it.

use crate::engine::{Engine, EngineError};
use nova_core::{Key, MouseBtn};
use nova_devtools::{DebugOverlay, OverlayStats};
use nova_render::{build_mesh, GpuContext, Renderer};
use std::sync::Arc;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

struct Graphics {
    window: Arc<Window>,
    gpu: GpuContext,
    renderer: Renderer,
    overlay: DebugOverlay,
}

impl Graphics {
    fn new(window: Arc<Window>, vsync: bool, show_overlay: bool) -> Result<Self, EngineError> {
        let gpu = GpuContext::new(window.clone(), vsync).map_err(EngineError::Gpu)?;
        let mut renderer = Renderer::new(&gpu);
        renderer.camera.zoom = window.scale_factor() as f32;
        let mut overlay = DebugOverlay::new(&gpu.device, gpu.surface_format, &window);
        overlay.visible = show_overlay;
        Ok(Self {
            window,
            gpu,
            renderer,
            overlay,
        })
    }

    fn scale(&self) -> f64 {
        self.window.scale_factor()
    }
}

pub struct NovaApp<S> {
    engine: Engine<S>,
    graphics: Option<Graphics>,
    error: Option<EngineError>,
}

impl<S> NovaApp<S> {
    pub fn new(engine: Engine<S>) -> Self {
        Self {
            engine,
            graphics: None,
            error: None,
        }
    }

    /// Hand the engine back after the event loop returned, with the error
    /// that stopped it, if any.
    pub fn finish(self) -> (Engine<S>, Option<EngineError>) {
        (self.engine, self.error)
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: EngineError) {
        log::error!("{}", error);
        self.error = Some(error);
        self.engine.quit();
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Self {
            engine, graphics, ..
        } = self;
        let Some(gfx) = graphics.as_mut() else {
            return;
        };
        if gfx.gpu.size.0 == 0 || gfx.gpu.size.1 == 0 {
            return;
        }

        engine.step_frame();
        if !engine.is_running() {
            event_loop.exit();
            return;
        }

        let mesh = build_mesh(&engine.ctx.canvas);
        let Some((output, view)) = gfx.gpu.begin_frame() else {
            engine.end_frame();
            return;
        };
        gfx.renderer.prepare(&gfx.gpu, &mesh);

        let render_stats = gfx.renderer.stats(&mesh);
        let mouse = engine.ctx.mouse_pos();
        let stats = OverlayStats {
            draw_calls: render_stats.draw_calls,
            texture_binds: render_stats.texture_binds,
            sprite_count: engine.sprite_count() as u32,
            images: render_stats.images,
            memory_estimate_mb: render_stats.memory_estimate_mb,
            scene_name: engine.scenes().active_name().unwrap_or("-").to_string(),
            mouse_position: (mouse.x, mouse.y),
            in_game_ms: engine.ctx.in_game_ms(),
            frozen: engine.ctx.clock.is_frozen(),
        };
        let (primitives, textures_delta, actions) = gfx.overlay.prepare(
            &gfx.window,
            &engine.ctx.clock,
            &stats,
            engine.ctx.canvas.texts(),
        );
        if actions.toggle_freeze {
            if engine.ctx.clock.is_frozen() {
                engine.ctx.clock.unfreeze();
            } else {
                engine.ctx.clock.freeze();
            }
        }
        if actions.save_now {
            engine.ctx.request_save();
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gfx.gpu.size.0, gfx.gpu.size.1],
            pixels_per_point: gfx.scale() as f32,
        };
        let mut encoder = gfx
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        gfx.renderer.draw(&mut encoder, &view, &mesh);

        gfx.overlay.upload(
            &gfx.gpu.device,
            &gfx.gpu.queue,
            &mut encoder,
            &primitives,
            &textures_delta,
            &screen_descriptor,
        );
        {
            let mut egui_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            gfx.overlay
                .paint(&mut egui_pass, &primitives, &screen_descriptor);
        }
        gfx.overlay.cleanup(&textures_delta);

        gfx.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        engine.end_frame();
        engine.ctx.clock.pace();
    }
}

impl<S> ApplicationHandler for NovaApp<S> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.graphics.is_some() {
            return;
        }
        let config = self.engine.config().clone();
        let window = match nova_platform::create_window(event_loop, &config.platform_config()) {
            Ok(window) => window,
            Err(e) => return self.fail(event_loop, EngineError::Window(e)),
        };
        log::info!("Window created: {}x{}", config.width, config.height);
        match Graphics::new(window, config.vsync, config.debug) {
            Ok(graphics) => self.graphics = Some(graphics),
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gfx) = &self.graphics {
            gfx.window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(gfx) = self.graphics.as_mut() else {
            return;
        };
        let egui_consumed = gfx.overlay.handle_window_event(&gfx.window, &event);
        let input = &mut self.engine.ctx.input;

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                self.engine.quit();
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                let (w, h) = (physical_size.width, physical_size.height);
                if w > 0 && h > 0 {
                    gfx.gpu.resize(w, h);
                    gfx.renderer.resize(w, h);
                    let scale = gfx.scale() as f32;
                    self.engine.ctx.screen.w = w as f32 / scale;
                    self.engine.ctx.screen.h = h as f32 / scale;
                    log::info!("Resized to {}x{}", w, h);
                }
            }

            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                gfx.renderer.camera.zoom = scale_factor as f32;
            }

            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                let PhysicalKey::Code(code) = event.physical_key else {
                    return;
                };
                match event.state {
                    ElementState::Pressed => {
                        if code == KeyCode::F3 && !event.repeat {
                            gfx.overlay.toggle();
                        }
                        if let Some(key) = map_key(code) {
                            input.key_down(key);
                        }
                        if let Some(text) = &event.text {
                            input.push_text(text);
                        }
                    }
                    ElementState::Released => {
                        if let Some(key) = map_key(code) {
                            input.key_up(key);
                        }
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                let scale = gfx.scale();
                input.mouse_position = (position.x / scale, position.y / scale);
            }

            WindowEvent::MouseInput { state, button, .. } if !egui_consumed => {
                if let Some(btn) = map_mouse(button) {
                    match state {
                        ElementState::Pressed => input.mouse_down(btn),
                        ElementState::Released => input.mouse_up(btn),
                    }
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }
}

fn map_mouse(button: MouseButton) -> Option<MouseBtn> {
    match button {
        MouseButton::Left => Some(MouseBtn::Left),
        MouseButton::Right => Some(MouseBtn::Right),
        MouseButton::Middle => Some(MouseBtn::Middle),
        _ => None,
    }
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    let key = match key_code {
        KeyCode::ArrowLeft => Key::Left,
        KeyCode::ArrowRight => Key::Right,
        KeyCode::ArrowUp => Key::Up,
        KeyCode::ArrowDown => Key::Down,
        KeyCode::Escape => Key::Escape,
        KeyCode::Space => Key::Space,
        KeyCode::Enter | KeyCode::NumpadEnter => Key::Enter,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Tab => Key::Tab,
        KeyCode::ShiftLeft | KeyCode::ShiftRight => Key::Shift,
        KeyCode::F1 => Key::F1,
        KeyCode::F3 => Key::F3,
        KeyCode::F4 => Key::F4,
        KeyCode::F5 => Key::F5,
        KeyCode::KeyA => Key::A,
        KeyCode::KeyB => Key::B,
        KeyCode::KeyC => Key::C,
        KeyCode::KeyD => Key::D,
        KeyCode::KeyE => Key::E,
        KeyCode::KeyF => Key::F,
        KeyCode::KeyG => Key::G,
        KeyCode::KeyH => Key::H,
        KeyCode::KeyI => Key::I,
        KeyCode::KeyJ => Key::J,
        KeyCode::KeyK => Key::K,
        KeyCode::KeyL => Key::L,
        KeyCode::KeyM => Key::M,
        KeyCode::KeyN => Key::N,
        KeyCode::KeyO => Key::O,
        KeyCode::KeyP => Key::P,
        KeyCode::KeyQ => Key::Q,
        KeyCode::KeyR => Key::R,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyT => Key::T,
        KeyCode::KeyU => Key::U,
        KeyCode::KeyV => Key::V,
        KeyCode::KeyW => Key::W,
        KeyCode::KeyX => Key::X,
        KeyCode::KeyY => Key::Y,
        KeyCode::KeyZ => Key::Z,
        KeyCode::Digit0 | KeyCode::Numpad0 => Key::Num0,
        KeyCode::Digit1 | KeyCode::Numpad1 => Key::Num1,
        KeyCode::Digit2 | KeyCode::Numpad2 => Key::Num2,
        KeyCode::Digit3 | KeyCode::Numpad3 => Key::Num3,
        KeyCode::Digit4 | KeyCode::Numpad4 => Key::Num4,
        KeyCode::Digit5 | KeyCode::Numpad5 => Key::Num5,
        KeyCode::Digit6 | KeyCode::Numpad6 => Key::Num6,
        KeyCode::Digit7 | KeyCode::Numpad7 => Key::Num7,
        KeyCode::Digit8 | KeyCode::Numpad8 => Key::Num8,
        KeyCode::Digit9 | KeyCode::Numpad9 => Key::Num9,
        _ => return None,
    };
    Some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_digits_and_editing_keys_map() {
        assert_eq!(map_key(KeyCode::KeyQ), Some(Key::Q));
        assert_eq!(map_key(KeyCode::Numpad7), Some(Key::Num7));
        assert_eq!(map_key(KeyCode::NumpadEnter), Some(Key::Enter));
        assert_eq!(map_key(KeyCode::ShiftRight), Some(Key::Shift));
        assert_eq!(map_key(KeyCode::F12), None);
    }

    #[test]
    fn back_and_forward_buttons_are_ignored() {
        assert_eq!(map_mouse(MouseButton::Left), Some(MouseBtn::Left));
        assert_eq!(map_mouse(MouseButton::Back), None);
    }
}

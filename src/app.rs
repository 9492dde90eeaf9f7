//! Interactive viewer: window, surface, render loop and input routing.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use egui_wgpu::ScreenDescriptor;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::debug_panel::DebugPanel;
use crate::galaxy::Galaxy;
use crate::gpu::renderer::Renderer;
use crate::params::GalaxyParameters;
use crate::visualiser::VisualiserState;

/// Pixels per wheel "line" for touchpads reporting pixel deltas.
const PIXELS_PER_LINE: f32 = 40.0;

struct GpuState {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    renderer: Renderer,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl GpuState {
    async fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow!("No adapter found"))?;

        log::info!("Using GPU: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default(), None)
            .await?;

        // Colors are written as-is, so prefer a non-sRGB target.
        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow!("Surface reports no supported formats"))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &*window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, format, None, 1, false);

        let renderer = Renderer::new(device, queue, format, config.width, config.height);

        Ok(Self {
            window,
            surface,
            config,
            renderer,
            egui_ctx,
            egui_state,
            egui_renderer,
        })
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(self.renderer.device(), &self.config);
            self.renderer.resize(new_size.width, new_size.height);
        }
    }

    fn render(&mut self, state: &mut VisualiserState, panel: &mut DebugPanel) -> Result<(), wgpu::SurfaceError> {
        let raw_input = self.egui_state.take_egui_input(&self.window);
        let particle_count = self.renderer.particle_count();
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            panel.show(ctx, state, particle_count);
        });
        self.egui_state
            .handle_platform_output(&self.window, full_output.platform_output);

        // Edits committed this frame are visible in the same frame.
        if state.take_regenerate() {
            regenerate(&mut self.renderer, &state.params);
        }

        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        self.renderer.render(&view, state);

        let device = self.renderer.device();
        let queue = self.renderer.queue();
        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer.update_texture(device, queue, *id, image_delta);
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("egui Encoder"),
        });
        let user_buffers =
            self.egui_renderer
                .update_buffers(device, queue, &mut encoder, &paint_jobs, &screen_descriptor);

        {
            let mut render_pass = encoder
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
                    timestamp_writes: None,
                    occlusion_query_set: None,
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut render_pass, &paint_jobs, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        queue.submit(user_buffers.into_iter().chain(std::iter::once(encoder.finish())));
        output.present();

        Ok(())
    }
}

/// Regenerate the galaxy and replace the GPU buffers.
fn regenerate(renderer: &mut Renderer, params: &GalaxyParameters) {
    let started = Instant::now();
    let galaxy = Galaxy::new(params.clone());
    renderer.set_galaxy(&galaxy.geometry);
    log::info!(
        "Generated {} particles ({} branches) in {:.1} ms",
        galaxy.len(),
        params.branches,
        started.elapsed().as_secs_f64() * 1000.0
    );
}

/// Which pointer gesture is driving the orbit controls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Drag {
    Rotate,
    Pan,
}

pub struct App {
    title: String,
    initial_size: PhysicalSize<u32>,
    gpu: Option<GpuState>,
    state: VisualiserState,
    panel: DebugPanel,
    drag: Option<Drag>,
    last_cursor: Option<(f64, f64)>,
    last_frame: Instant,
    error: Option<anyhow::Error>,
}

impl App {
    pub fn new(params: GalaxyParameters, width: u32, height: u32) -> Self {
        Self {
            title: "Galaxy".to_string(),
            initial_size: PhysicalSize::new(width, height),
            gpu: None,
            state: VisualiserState::new(params),
            panel: DebugPanel::new(),
            drag: None,
            last_cursor: None,
            last_frame: Instant::now(),
            error: None,
        }
    }

    fn viewport_height(&self) -> f32 {
        self.gpu.as_ref().map_or(1.0, |gpu| gpu.config.height as f32)
    }

    fn handle_cursor(&mut self, x: f64, y: f64) {
        if let (Some(drag), Some((lx, ly))) = (self.drag, self.last_cursor) {
            let dx = (x - lx) as f32;
            let dy = (y - ly) as f32;
            let h = self.viewport_height();
            match drag {
                Drag::Rotate => self.state.controls.rotate(dx, dy, h),
                Drag::Pan => self.state.controls.pan(dx, dy, h, self.state.camera.fov),
            }
        }
        self.last_cursor = Some((x, y));
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        let attributes = Window::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(self.initial_size);

        let result = event_loop
            .create_window(attributes)
            .context("Failed to create window")
            .and_then(|window| pollster::block_on(GpuState::new(Arc::new(window))));

        match result {
            Ok(gpu) => {
                self.state.camera.set_viewport(gpu.config.width, gpu.config.height);
                gpu.window.request_redraw();
                self.gpu = Some(gpu);
                self.last_frame = Instant::now();
            }
            Err(e) => {
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        // egui gets first pick; events over the panel never reach the camera.
        if let Some(gpu) = &mut self.gpu {
            if gpu.egui_state.on_window_event(&gpu.window, &event).consumed {
                if matches!(event, WindowEvent::MouseInput { state: ElementState::Released, .. }) {
                    self.drag = None;
                }
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(size);
                }
                self.state.camera.set_viewport(size.width, size.height);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let gesture = match button {
                    MouseButton::Left => Some(Drag::Rotate),
                    MouseButton::Right => Some(Drag::Pan),
                    _ => None,
                };
                if let Some(gesture) = gesture {
                    self.drag = match state {
                        ElementState::Pressed => Some(gesture),
                        ElementState::Released if self.drag == Some(gesture) => None,
                        ElementState::Released => self.drag,
                    };
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.handle_cursor(position.x, position.y);
            }
            WindowEvent::CursorLeft { .. } => {
                self.last_cursor = None;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_LINE,
                };
                self.state.controls.zoom(lines);
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = now.duration_since(self.last_frame).as_secs_f32();
                self.last_frame = now;
                self.panel.record_frame(dt);
                self.state.update(dt);

                let Some(gpu) = &mut self.gpu else {
                    return;
                };
                match gpu.render(&mut self.state, &mut self.panel) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = gpu.window.inner_size();
                        gpu.resize(size);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Surface out of memory");
                        event_loop.exit();
                    }
                    Err(e) => {
                        log::warn!("Surface error: {:?}", e);
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

/// Open the viewer window and run until it is closed.
pub fn run(params: GalaxyParameters, width: u32, height: u32) -> Result<()> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(params, width, height);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

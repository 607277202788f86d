// SPDX-License-Identifier: MIT OR Apache-2.0
//! Main replay application setup and event loop.

use crate::model_loader::{LoadStatus, ModelHandle, ModelLoader};
use crate::panels::{DisclaimerPanel, RenderContext, ViewportPanel};
use crate::viewport_renderer::ViewportRenderer;
use egui_wgpu::wgpu;
use flight_replay_core::{AnimationDriver, CameraMode, ReplayState, Scenario, ScenarioError};
use std::sync::Arc;
use thiserror::Error;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

/// Application errors
#[derive(Debug, Error)]
pub enum AppError {
    /// Window creation failed
    #[error("Failed to create window: {0}")]
    WindowCreation(String),

    /// Renderer initialization failed
    #[error("Failed to initialize renderer: {0}")]
    RendererInit(String),

    /// The scenario cannot drive a replay
    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    /// Event loop error
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

/// Result type for application operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Graphics state for wgpu rendering
struct GraphicsState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    egui_renderer: egui_wgpu::Renderer,
}

impl GraphicsState {
    fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .map_err(|e| AppError::RendererInit(e.to_string()))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| AppError::RendererInit("no suitable GPU adapter".to_string()))?;

        tracing::info!("Using GPU: {}", adapter.get_info().name);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Flight Replay Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            },
            None,
        ))
        .map_err(|e| AppError::RendererInit(e.to_string()))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(wgpu::TextureFormat::is_srgb)
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| AppError::RendererInit("surface has no supported formats".to_string()))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            egui_renderer,
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    fn render(
        &mut self,
        egui_ctx: &egui::Context,
        full_output: egui::FullOutput,
        window: &Window,
    ) -> std::result::Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Replay Encoder"),
        });

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: window.scale_factor() as f32,
        };

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer.update_texture(&self.device, &self.queue, *id, image_delta);
        }

        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        {
            // egui-wgpu wants a 'static pass
            let mut render_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color {
                                r: 0.1,
                                g: 0.1,
                                b: 0.1,
                                a: 1.0,
                            }),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                })
                .forget_lifetime();

            self.egui_renderer.render(&mut render_pass, &paint_jobs, &screen_descriptor);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        Ok(())
    }
}

/// Running state of the application
struct ReplayRunning {
    window: Arc<Window>,
    graphics: GraphicsState,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    replay: ReplayInner,
    viewport_renderer: ViewportRenderer,
}

/// Status line text for the model loader
fn load_status_text(status: &LoadStatus, handle: Option<&ModelHandle>) -> String {
    match (status, handle) {
        (LoadStatus::Loading { progress }, _) => format!("Loading model... {:.0}%", progress * 100.0),
        (LoadStatus::Loaded, Some(handle)) => {
            format!("{} ({} triangles)", handle.name, handle.triangle_count)
        }
        (LoadStatus::Loaded, None) => "Model loaded".to_string(),
        (LoadStatus::Failed(message), _) => format!("Model unavailable: {message}"),
    }
}

/// Replay data, per-frame state and panels
struct ReplayInner {
    scenario: Scenario,
    driver: AnimationDriver,
    state: ReplayState<ModelHandle>,
    loader: ModelLoader,
    viewport: ViewportPanel,
    disclaimer: DisclaimerPanel,
}

impl ReplayInner {
    fn new(scenario: Scenario, driver: AnimationDriver) -> Self {
        let loader = ModelLoader::spawn(scenario.model.path.clone());

        Self {
            scenario,
            driver,
            state: ReplayState::new(),
            loader,
            viewport: ViewportPanel::new(),
            disclaimer: DisclaimerPanel::new(),
        }
    }

    /// Upload and publish the model once the loader delivers it
    fn poll_loader(&mut self, viewport_renderer: &mut ViewportRenderer, device: &wgpu::Device) {
        if let Some(model) = self.loader.poll() {
            viewport_renderer.upload_aircraft(device, &model.mesh);
            self.state.tracked.publish(ModelHandle {
                triangle_count: model.mesh.triangle_count(),
                name: model.name,
            });
        }
    }

    fn update(
        &mut self,
        ctx: &egui::Context,
        viewport_renderer: &mut ViewportRenderer,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        egui_renderer: &mut egui_wgpu::Renderer,
    ) {
        self.poll_loader(viewport_renderer, device);

        let controls_enabled = self.disclaimer.is_acknowledged();

        egui::TopBottomPanel::top("camera_bar").show(ctx, |ui| {
            ui.add_enabled_ui(controls_enabled, |ui| {
                ui.horizontal(|ui| {
                    self.camera_controls(ui);
                });
            });
        });

        egui::TopBottomPanel::bottom("timeline_bar").show(ctx, |ui| {
            ui.add_enabled_ui(controls_enabled, |ui| {
                ui.horizontal(|ui| {
                    self.timeline_controls(ui);
                });
            });
        });

        let frame = self.driver.tick(&mut self.state);
        let aircraft_transform = frame.object.map(|o| o.transform(self.scenario.model.scale));

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                self.viewport.ui_with_renderer(
                    ui,
                    &frame,
                    self.state.camera_mode,
                    &self.scenario.lens,
                    aircraft_transform,
                    RenderContext {
                        renderer: viewport_renderer,
                        device,
                        queue,
                        egui_renderer,
                    },
                );
            });

        self.disclaimer.show(ctx);
    }

    fn camera_controls(&mut self, ui: &mut egui::Ui) {
        ui.label("Camera:");
        for mode in CameraMode::ALL {
            let selected = self.state.camera_mode == mode;
            if ui
                .selectable_label(selected, mode.name())
                .on_hover_text(mode.description())
                .clicked()
            {
                self.state.select_camera(mode);
            }
        }

        ui.separator();
        ui.checkbox(&mut self.viewport.show_path, "Flight path");
        ui.checkbox(&mut self.viewport.show_stats, "Stats");

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(egui::RichText::new(&self.scenario.name).strong());
        });
    }

    fn timeline_controls(&mut self, ui: &mut egui::Ui) {
        let elapsed = self.driver.elapsed_seconds(self.state.progress());
        let countdown = self.driver.countdown_seconds(elapsed);
        ui.label(egui::RichText::new(format!("T-{countdown:02}s")).monospace());

        let status = load_status_text(self.loader.status(), self.state.tracked.handle());
        let status_width = 220.0;
        let slider_width = (ui.available_width() - status_width).max(100.0);
        ui.spacing_mut().slider_width = slider_width;
        ui.add(
            egui::Slider::new(&mut self.state.timeline_percent, 0.0..=100.0)
                .show_value(false),
        )
        .on_hover_text("Scrub through the approach");

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(status);
        });
    }
}

/// Main replay application
pub struct FlightReplayApp {
    running: Option<ReplayRunning>,
    /// Scenario and driver waiting for the first resume
    pending: Option<(Scenario, AnimationDriver)>,
    /// Error raised while starting up
    error: Option<AppError>,
}

impl FlightReplayApp {
    /// Create a new application for a scenario
    pub fn new(scenario: Scenario) -> Result<Self> {
        let driver = scenario.build_driver()?;
        tracing::info!(
            "Scenario '{}': {} control points, path length {:.0}, {} events",
            scenario.name,
            scenario.control_points.len(),
            driver.path().total_length(),
            driver.timeline().events().len()
        );

        Ok(Self {
            running: None,
            pending: Some((scenario, driver)),
            error: None,
        })
    }

    /// Run the replay until the window closes
    pub fn run(scenario: Scenario) -> Result<()> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = FlightReplayApp::new(scenario)?;
        event_loop.run_app(&mut app)?;

        match app.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn start(event_loop: &ActiveEventLoop, scenario: Scenario, driver: AnimationDriver) -> Result<ReplayRunning> {
        tracing::info!("Creating replay window...");

        let window_attrs = Window::default_attributes()
            .with_title(format!("Flight Replay - {}", scenario.name))
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 800))
            .with_min_inner_size(winit::dpi::LogicalSize::new(640, 480));

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .map_err(|e| AppError::WindowCreation(e.to_string()))?,
        );

        tracing::info!("Initializing graphics...");
        let graphics = GraphicsState::new(window.clone())?;

        let egui_ctx = egui::Context::default();
        egui_ctx.set_visuals(egui::Visuals::dark());

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            &window,
            Some(window.scale_factor() as f32),
            None,
            Some(2 * 1024),
        );

        let initial_size = window.inner_size();
        let viewport_renderer = ViewportRenderer::new(
            &graphics.device,
            [initial_size.width.max(1), initial_size.height.max(1)],
            &scenario,
            driver.path(),
        );

        let replay = ReplayInner::new(scenario, driver);

        tracing::info!("Replay initialized, window size: {:?}", window.inner_size());

        Ok(ReplayRunning {
            window,
            graphics,
            egui_ctx,
            egui_state,
            replay,
            viewport_renderer,
        })
    }
}

impl ApplicationHandler for FlightReplayApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }
        let Some((scenario, driver)) = self.pending.take() else {
            return;
        };

        match Self::start(event_loop, scenario, driver) {
            Ok(running) => self.running = Some(running),
            Err(e) => {
                tracing::error!("{e}");
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(running) = &mut self.running else {
            return;
        };

        let response = running.egui_state.on_window_event(&running.window, &event);

        if response.consumed {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("Close requested, exiting...");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                tracing::debug!("Window resized to {:?}", new_size);
                running.graphics.resize(new_size);
                running.window.request_redraw();
            }
            WindowEvent::RedrawRequested => {
                let raw_input = running.egui_state.take_egui_input(&running.window);
                let full_output = running.egui_ctx.run(raw_input, |ctx| {
                    running.replay.update(
                        ctx,
                        &mut running.viewport_renderer,
                        &running.graphics.device,
                        &running.graphics.queue,
                        &mut running.graphics.egui_renderer,
                    );
                });

                running
                    .egui_state
                    .handle_platform_output(&running.window, full_output.platform_output.clone());

                match running.graphics.render(&running.egui_ctx, full_output, &running.window) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = running.window.inner_size();
                        running.graphics.resize(size);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        tracing::error!("Out of GPU memory!");
                        event_loop.exit();
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        tracing::warn!("Surface timeout");
                    }
                }

                running.window.request_redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(running) = &self.running {
            running.window.request_redraw();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_status_text() {
        assert_eq!(
            load_status_text(&LoadStatus::Loading { progress: 0.5 }, None),
            "Loading model... 50%"
        );
        assert_eq!(load_status_text(&LoadStatus::Loaded, None), "Model loaded");

        let handle = ModelHandle {
            name: "Airliner".to_string(),
            triangle_count: 120,
        };
        assert_eq!(
            load_status_text(&LoadStatus::Loaded, Some(&handle)),
            "Airliner (120 triangles)"
        );
        assert_eq!(
            load_status_text(&LoadStatus::Failed("missing".to_string()), None),
            "Model unavailable: missing"
        );
    }

    #[test]
    fn test_app_rejects_invalid_scenario() {
        let mut scenario = Scenario::default();
        scenario.control_points.truncate(1);
        assert!(matches!(
            FlightReplayApp::new(scenario),
            Err(AppError::Scenario(ScenarioError::Curve(_)))
        ));
    }

    #[test]
    fn test_app_starts_pending() {
        let app = FlightReplayApp::new(Scenario::default()).unwrap();
        assert!(app.running.is_none());
        assert!(app.pending.is_some());
        assert!(app.error.is_none());
    }
}

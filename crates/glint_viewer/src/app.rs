use std::sync::Arc;
use std::time::Instant;

use glint_renderer::{CommittedScene, Renderer};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::ActiveEventLoop,
    window::{Window, WindowId},
};

use crate::gpu::Gpu;
use crate::snapshot::SnapshotWriter;

/// Width of the stats panel next to the image.
const PANEL_WIDTH: u32 = 240;

/// Camera input gathered while drawing the UI.
#[derive(Default)]
struct Interaction {
    orbit: (f32, f32),
    zoom: f32,
    save_requested: bool,
}

/// Interactive window: one progressive frame per redraw.
pub struct ViewerApp<S> {
    renderer: Renderer<S>,
    snapshots: SnapshotWriter,
    title: String,
    frames_left: Option<u32>,

    window: Option<Arc<Window>>,
    gpu: Option<Gpu>,
    texture: Option<egui::TextureHandle>,

    last_frame_time: Instant,
    fps: f32,
    frame_count: u32,
    fps_update_timer: f32,
}

impl<S: CommittedScene> ViewerApp<S> {
    pub fn new(
        renderer: Renderer<S>,
        snapshots: SnapshotWriter,
        title: String,
        frames: Option<u32>,
    ) -> Self {
        Self {
            renderer,
            snapshots,
            title,
            frames_left: frames,
            window: None,
            gpu: None,
            texture: None,
            last_frame_time: Instant::now(),
            fps: 0.0,
            frame_count: 0,
            fps_update_timer: 0.0,
        }
    }

    fn update_fps(&mut self, delta_time: f32) {
        self.frame_count += 1;
        self.fps_update_timer += delta_time;

        if self.fps_update_timer >= 0.5 {
            self.fps = self.frame_count as f32 / self.fps_update_timer;
            self.frame_count = 0;
            self.fps_update_timer = 0.0;
        }
    }

    /// Render one frame, present it and route the resulting camera input.
    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let delta_time = (now - self.last_frame_time).as_secs_f32();
        self.last_frame_time = now;
        self.update_fps(delta_time);

        let report = self.renderer.render_frame();
        if report.snapshot {
            if let Err(e) = self.snapshots.write(self.renderer.display(), report.samples) {
                log::error!("Snapshot failed: {:#}", e);
            }
        }

        if let Some(frames_left) = &mut self.frames_left {
            *frames_left = frames_left.saturating_sub(1);
            if *frames_left == 0 {
                log::info!("Frame limit reached");
                event_loop.exit();
            }
        }

        let (Some(window), Some(gpu)) = (&self.window, &mut self.gpu) else {
            return;
        };

        let preview = self.renderer.preview();
        let image_size = [preview.width() as usize, preview.height() as usize];
        let image = egui::ColorImage::from_rgba_unmultiplied(image_size, &preview.to_rgba());

        let renderer = &self.renderer;
        let texture = &mut self.texture;
        let fps = self.fps;
        let mut interaction = Interaction::default();

        let result = gpu.present(window, |ctx| {
            let texture = texture.get_or_insert_with(|| {
                ctx.load_texture("render", image.clone(), egui::TextureOptions::NEAREST)
            });
            texture.set(image.clone(), egui::TextureOptions::NEAREST);

            egui::SidePanel::right("stats_panel")
                .exact_width(PANEL_WIDTH as f32)
                .show(ctx, |ui| {
                    ui.heading("Glint");
                    ui.separator();

                    ui.label(format!("FPS: {:.1}", fps));
                    ui.label(format!("Samples: {}", renderer.samples()));
                    ui.label(format!("Resolution: {}x{}", renderer.width(), renderer.height()));
                    ui.separator();

                    ui.collapsing("Scene", |ui| {
                        let scene = renderer.scene();
                        ui.label(format!("Lights: {}", scene.lights().len()));
                        ui.label(format!("Extent: {:.2}", scene.extent()));
                    });

                    ui.collapsing("Camera", |ui| {
                        let camera = renderer.camera();
                        let eye = camera.eye();
                        let look = -camera.forward();
                        ui.label(format!("Eye: ({:.2}, {:.2}, {:.2})", eye.x, eye.y, eye.z));
                        ui.label(format!(
                            "Look: ({:.2}, {:.2}, {:.2})",
                            look.x, look.y, look.z
                        ));
                        ui.label(format!("HFOV: {:.2}°", camera.hfov().to_degrees()));
                    });

                    ui.separator();
                    if ui.button("Save snapshot").clicked() {
                        interaction.save_requested = true;
                    }

                    ui.separator();
                    ui.collapsing("Controls", |ui| {
                        ui.label("Left drag: orbit");
                        ui.label("Scroll: zoom");
                    });
                });

            egui::CentralPanel::default().show(ctx, |ui| {
                let size = egui::vec2(image_size[0] as f32, image_size[1] as f32);
                let response = ui.add(
                    egui::Image::new(egui::load::SizedTexture::new(texture.id(), size))
                        .sense(egui::Sense::drag()),
                );

                let config = renderer.config();
                if response.dragged_by(egui::PointerButton::Primary) {
                    let delta = response.drag_delta();
                    interaction.orbit = (
                        -delta.x * config.orbit_sensitivity,
                        -delta.y * config.orbit_sensitivity,
                    );
                }
                if response.hovered() {
                    let scroll = ui.input(|i| i.raw_scroll_delta.y);
                    interaction.zoom = -scroll * config.zoom_sensitivity;
                }
            });
        });

        match result {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = gpu.size();
                gpu.resize(size);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of memory!");
                event_loop.exit();
            }
            Err(e) => log::error!("Surface error: {:?}", e),
        }

        if interaction.orbit != (0.0, 0.0) {
            self.renderer.queue_orbit(interaction.orbit.0, interaction.orbit.1);
        }
        if interaction.zoom != 0.0 {
            self.renderer.queue_zoom(interaction.zoom);
        }
        if interaction.save_requested {
            if let Err(e) = self.snapshots.write(&preview, self.renderer.samples()) {
                log::error!("Snapshot failed: {:#}", e);
            }
        }
    }
}

impl<S: CommittedScene> ApplicationHandler for ViewerApp<S> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.renderer.width() + PANEL_WIDTH + 32,
                self.renderer.height() + 32,
            ));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        match pollster::block_on(Gpu::new(window.clone())) {
            Ok(gpu) => {
                self.gpu = Some(gpu);
                window.request_redraw();
                self.window = Some(window);
                log::info!("Window and GPU initialized");
            }
            Err(e) => {
                log::error!("Failed to initialize GPU: {:#}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(window), Some(gpu)) = (&self.window, &mut self.gpu) {
            if gpu.handle_event(window, &event) {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize((physical_size.width, physical_size.height));
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

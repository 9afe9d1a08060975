//! Progressive frame loop.
//!
//! Each frame traces one primary ray per pixel and folds the result into a
//! per-pixel running mean. Camera moves restart the accumulation.

use glint_math::{Interval, Ray, Vec3};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;

use crate::backend::CommittedScene;
use crate::builder::{Scene, SceneAndCamera};
use crate::camera::Camera;
use crate::display::DisplayBuffer;
use crate::light::ShadowTest;
use crate::Color;

/// Shadow rays start this far from the shading point.
const SHADOW_NEAR: f32 = 0.01;

/// Shadow rays stop this far short of their target.
const SHADOW_FAR_MARGIN: f32 = 0.02;

/// Render configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    /// Encode the display buffer every this many accumulated samples
    pub snapshot_interval: u32,
    /// Base seed for the per-row random streams
    pub seed: u64,
    /// Radians of orbit per pixel of drag
    pub orbit_sensitivity: f32,
    /// Zoom distance per point of scroll
    pub zoom_sensitivity: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 400,
            height: 400,
            snapshot_interval: 64,
            seed: 0,
            orbit_sensitivity: 0.01,
            zoom_sensitivity: 0.01,
        }
    }
}

/// Camera motion queued for the next frame boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraDelta {
    pub theta: f32,
    pub phi: f32,
    pub zoom: f32,
}

impl CameraDelta {
    pub fn is_zero(&self) -> bool {
        self.theta == 0.0 && self.phi == 0.0 && self.zoom == 0.0
    }
}

/// What one call to [`Renderer::render_frame`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    /// Samples accumulated per pixel after this frame
    pub samples: u32,
    /// The display buffer was re-encoded this frame
    pub snapshot: bool,
    /// A queued camera move restarted the accumulation
    pub restarted: bool,
}

/// Occlusion queries against a committed scene from one shading point.
pub struct SceneShadowTest<'a, S> {
    scene: &'a S,
    origin: Vec3,
    extent: f32,
}

impl<'a, S: CommittedScene> SceneShadowTest<'a, S> {
    pub fn new(scene: &'a S, origin: Vec3, extent: f32) -> Self {
        Self {
            scene,
            origin,
            extent,
        }
    }
}

impl<S: CommittedScene> ShadowTest for SceneShadowTest<'_, S> {
    fn unoccluded(&self, target: Vec3, max_range: f32) -> bool {
        let to_target = target - self.origin;
        let range = if max_range.is_infinite() {
            to_target.length()
        } else {
            max_range
        };

        let ray = Ray::with_bounds(
            self.origin,
            to_target.normalize(),
            Interval::new(SHADOW_NEAR, range - SHADOW_FAR_MARGIN),
        );
        !self.scene.occluded(&ray)
    }

    fn scene_extent(&self) -> f32 {
        self.extent
    }
}

impl<S: CommittedScene> Scene<S> {
    /// Radiance arriving along `ray`: direct lighting at the nearest hit,
    /// background radiance on a miss.
    pub fn radiance(&self, ray: &Ray, extent: f32, rng: &mut dyn RngCore) -> Color {
        let Some(hit) = self.geometry().intersect(ray) else {
            return self.background();
        };

        let travel = ray.direction * hit.t;
        let point = ray.origin + travel;
        let incoming = travel.normalize();

        let mut normal = hit.normal.normalize();
        if normal.dot(ray.direction) > 0.0 {
            normal = -normal;
        }

        let shadow = SceneShadowTest::new(self.geometry(), point, extent);
        self.lights().contribution(
            incoming,
            point,
            normal,
            self.material(hit.geometry_id),
            &shadow,
            rng,
        )
    }
}

/// Fold `sample` into a running mean over `n` samples.
#[inline]
fn accumulate(mean: &mut Color, sample: Color, n: u32) {
    if n == 1 {
        *mean = sample;
    } else {
        *mean += (sample - *mean) / n as f32;
    }
}

/// Seed of the random stream for one row of one frame.
fn row_seed(seed: u64, frame: u64, row: usize) -> u64 {
    seed ^ frame.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (row as u64).wrapping_add(1).wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
}

/// Progressive renderer over a built scene.
pub struct Renderer<S> {
    scene: Scene<S>,
    camera: Camera,
    config: RenderConfig,

    // Running mean per pixel, row 0 at the bottom of the image
    accumulation: Vec<Color>,
    samples: u32,
    // Never reset; keeps random streams distinct across restarts
    frame_index: u64,

    pending: CameraDelta,
    display: DisplayBuffer,
    extent: f32,
}

impl<S: CommittedScene> Renderer<S> {
    /// Create a renderer; a zero width or height is raised to 1.
    pub fn new(built: SceneAndCamera<S>, mut config: RenderConfig) -> Self {
        if config.width == 0 || config.height == 0 {
            log::warn!(
                "Image size {}x{} raised to at least 1x1",
                config.width,
                config.height
            );
            config.width = config.width.max(1);
            config.height = config.height.max(1);
        }
        let pixel_count = (config.width * config.height) as usize;
        let extent = built.scene.extent();

        log::info!(
            "Renderer {}x{}, snapshot every {} samples, scene extent {:.3}",
            config.width,
            config.height,
            config.snapshot_interval,
            extent
        );

        Self {
            display: DisplayBuffer::new(config.width, config.height),
            scene: built.scene,
            camera: built.camera,
            accumulation: vec![Color::ZERO; pixel_count],
            samples: 0,
            frame_index: 0,
            pending: CameraDelta::default(),
            extent,
            config,
        }
    }

    /// Queue an orbit for the next frame; repeated calls add up.
    pub fn queue_orbit(&mut self, theta: f32, phi: f32) {
        self.pending.theta += theta;
        self.pending.phi += phi;
    }

    /// Queue a zoom for the next frame; repeated calls add up.
    pub fn queue_zoom(&mut self, z: f32) {
        self.pending.zoom += z;
    }

    /// Render one progressive frame.
    pub fn render_frame(&mut self) -> FrameReport {
        let delta = std::mem::take(&mut self.pending);
        let restarted = !delta.is_zero();
        if restarted {
            self.camera.orbit(delta.theta, delta.phi);
            self.camera.zoom(delta.zoom);
            self.samples = 0;
            log::debug!("Camera moved: {:?}; accumulation restarted", delta);
        }

        self.samples += 1;
        let n = self.samples;

        let width = self.config.width as usize;
        let height = self.config.height;
        let seed = self.config.seed;
        let frame = self.frame_index;
        let scene = &self.scene;
        let camera = &self.camera;
        let extent = self.extent;

        self.accumulation
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(i, row)| {
                let mut rng = StdRng::seed_from_u64(row_seed(seed, frame, i));
                let v = (i as f32 + 0.5) / height as f32;

                for (j, mean) in row.iter_mut().enumerate() {
                    let u = (j as f32 + 0.5) / width as f32;
                    let ray = camera.generate_ray(u, v);
                    let sample = scene.radiance(&ray, extent, &mut rng);
                    accumulate(mean, sample, n);
                }
            });
        self.frame_index += 1;

        let interval = self.config.snapshot_interval.max(1);
        let snapshot = n % interval == 0;
        if snapshot {
            self.display.encode(&self.accumulation);
            log::info!("Frame {} snapshot", n);
        }

        FrameReport {
            samples: n,
            snapshot,
            restarted,
        }
    }

    /// Encode the current running mean without touching the snapshot buffer.
    pub fn preview(&self) -> DisplayBuffer {
        let mut preview = DisplayBuffer::new(self.config.width, self.config.height);
        preview.encode(&self.accumulation);
        preview
    }

    /// Display buffer as of the last snapshot.
    pub fn display(&self) -> &DisplayBuffer {
        &self.display
    }

    pub fn accumulation(&self) -> &[Color] {
        &self.accumulation
    }

    /// Running mean at `(x, y)`, `y = 0` being the bottom row.
    pub fn pixel(&self, x: u32, y: u32) -> Color {
        self.accumulation[(y * self.config.width + x) as usize]
    }

    pub fn samples(&self) -> u32 {
        self.samples
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn scene(&self) -> &Scene<S> {
        &self.scene
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn width(&self) -> u32 {
        self.config.width
    }

    pub fn height(&self) -> u32 {
        self.config.height
    }
}

mod app;
mod gpu;
mod snapshot;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use glint_core::{import_scene, ImportedScene, ResourceLayout, SceneInfo};
use glint_renderer::{CommittedScene, RenderConfig, Renderer, SceneAndCamera, SceneBuilder};
use winit::event_loop::{ControlFlow, EventLoop};

use crate::app::ViewerApp;
use crate::snapshot::SnapshotWriter;

/// Progressive direct-illumination renderer.
#[derive(Parser, Debug)]
#[command(name = "glint", version, about)]
struct Args {
    /// Scene file; only its stem is used to find `<stem>.obj` and `<stem>_info.json`
    scene: String,

    /// Directory holding scene files
    #[arg(long, default_value = "resources/scenes")]
    resources: PathBuf,

    /// Directory for PNG snapshots
    #[arg(long, default_value = "output")]
    output: PathBuf,

    /// Image height in pixels; width follows the camera aspect ratio
    #[arg(long, default_value_t = 400)]
    height: u32,

    /// Stop after this many frames
    #[arg(long)]
    frames: Option<u32>,

    /// Render without a window
    #[arg(long)]
    headless: bool,

    /// Write a snapshot every K accumulated samples
    #[arg(long, value_name = "K", default_value_t = 64)]
    snapshot_every: u32,

    /// Base seed for sampling
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

impl Args {
    fn layout(&self) -> ResourceLayout {
        ResourceLayout {
            resource_dir: self.resources.clone(),
            output_dir: self.output.clone(),
            ..Default::default()
        }
    }

    fn render_config(&self, aspect: f32) -> RenderConfig {
        RenderConfig {
            width: ((aspect * self.height as f32) as u32).max(1),
            height: self.height.max(1),
            snapshot_interval: self.snapshot_every.max(1),
            seed: self.seed,
            ..Default::default()
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();
    log::info!("Starting Glint");

    let layout = args.layout();
    let files = layout.scene_files(&args.scene);
    log::info!("Scene '{}' from {}", files.base, layout.resource_dir.display());

    let info = SceneInfo::load_or_default(&files.info);
    let imported = match import_scene(&files, &info) {
        Ok(scene) => scene,
        Err(e) => {
            log::error!("Import failed: {}; rendering an empty scene", e);
            ImportedScene::empty()
        }
    };

    let builder = SceneBuilder::new(&info);

    #[cfg(feature = "embree")]
    let built = {
        let backend = glint_renderer::EmbreeBackend::new().context("Embree initialization failed")?;
        builder.build(&imported, backend)
    };
    #[cfg(not(feature = "embree"))]
    let built = builder.build(&imported, glint_renderer::BvhBackend::new());

    let built = built.context("Scene build failed")?;
    let snapshots = SnapshotWriter::new(layout, files.base.clone());
    run(built, &args, snapshots, files.base)
}

fn run<S: CommittedScene>(
    built: SceneAndCamera<S>,
    args: &Args,
    snapshots: SnapshotWriter,
    base: String,
) -> Result<()> {
    let config = args.render_config(built.camera.aspect());
    let renderer = Renderer::new(built, config);

    if args.headless {
        let frames = args.frames.unwrap_or(renderer.config().snapshot_interval);
        return run_headless(renderer, &snapshots, frames);
    }

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ViewerApp::new(renderer, snapshots, format!("Glint - {}", base), args.frames);

    log::info!("Running event loop");
    event_loop.run_app(&mut app)?;

    Ok(())
}

fn run_headless<S: CommittedScene>(
    mut renderer: Renderer<S>,
    snapshots: &SnapshotWriter,
    frames: u32,
) -> Result<()> {
    log::info!("Rendering {} frames headless", frames);
    let start = Instant::now();

    for _ in 0..frames {
        let report = renderer.render_frame();
        if report.snapshot {
            snapshots.write(renderer.display(), report.samples)?;
        }
    }

    let elapsed = start.elapsed().as_secs_f32();
    log::info!(
        "{} frames in {:.2}s ({:.1} frames/s)",
        frames,
        elapsed,
        frames as f32 / elapsed.max(f32::EPSILON)
    );
    Ok(())
}

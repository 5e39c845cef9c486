//! Headless demo that flies a camera down onto a planet and runs the patch-LOD
//! pipeline every frame.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p orbis-demo -- --frames 900 --max-lod 10`.
//! When a GPU adapter is available the leaf geometry is also uploaded to
//! fixed-capacity GPU buffers.

mod flight;
mod scene;

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use glam::DMat4;
use orbis_config::{CliArgs, Config, default_config_dir};
use orbis_lod::CacheSettings;
use orbis_planet::{FrameParams, GovernorSettings, OriginManager, PlanetRenderer, RendererConfig};
use orbis_render::{DrawQueue, GpuPatchMeshes};
use tracing::{info, warn};

use crate::flight::Flight;
use crate::scene::{STAR, StarSystem, TERRA};

const FRAME_SECONDS: f64 = 1.0 / 60.0;
const REPORT_EVERY: u32 = 60;

fn renderer_config(config: &Config) -> RendererConfig {
    RendererConfig {
        canvas_height: f64::from(config.window.height),
        fov_y: config.fov_y_radians(),
        target_pixel_size_index: config.lod.target_pixel_size_index,
        max_lod: config.lod.max_lod,
        cache: CacheSettings {
            position_step: config.cache.position_step,
            direction_step: config.cache.direction_step,
            position_threshold: config.cache.position_threshold,
            rotation_threshold: config.cache.rotation_threshold,
            lod_distance_tolerance: config.cache.lod_distance_tolerance,
            max_age_seconds: config.cache.max_age_seconds,
            max_entries: config.cache.max_entries,
        },
        governor: GovernorSettings {
            enabled: config.governor.enabled,
            frame_budget_ms: config.governor.frame_budget_ms,
            overrun_frames: config.governor.overrun_frames,
            recovery_frames: config.governor.recovery_frames,
            min_max_lod: config.governor.min_max_lod,
        },
        retain_patch_tree: config.lod.retain_patch_tree,
        max_retained_patches: config.lod.max_retained_patches,
    }
}

/// Headless device for buffer uploads, if the machine has an adapter.
fn headless_device() -> Option<(wgpu::Device, wgpu::Queue)> {
    pollster::block_on(async {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok()?;
        info!(adapter = ?adapter.get_info().name, "GPU adapter acquired");
        adapter
            .request_device(&wgpu::DeviceDescriptor::default())
            .await
            .ok()
    })
}

fn main() {
    let args = CliArgs::parse();

    let config_dir = args.config.clone().unwrap_or_else(|| {
        default_config_dir().unwrap_or_else(|e| {
            eprintln!("{e}, using ./orbis");
            PathBuf::from("orbis")
        })
    });

    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    orbis_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    info!(
        width = config.window.width,
        height = config.window.height,
        frames = args.frames,
        "Orbis demo starting"
    );

    let max_patches = config.gpu.max_patches_per_body as usize;
    let mut renderer = PlanetRenderer::new(renderer_config(&config), DrawQueue::new(max_patches));
    renderer.set_lod_debug_colors(config.lod.show_lod_debug_colors);

    let gpu = headless_device();
    if gpu.is_none() {
        warn!("No GPU adapter available, running without uploads");
    }
    let mut meshes = GpuPatchMeshes::new(max_patches);

    let system = StarSystem::demo();
    let flight = Flight::new(args.frames, 40.0, 0.02);
    let mut origin = OriginManager::new();
    let aspect = f64::from(config.window.width) / f64::from(config.window.height.max(1));
    let projection = DMat4::perspective_rh(config.fov_y_radians(), aspect, 1e-4, 1e6);

    let mut total_uploads = 0;
    for frame in 0..args.frames {
        let time = f64::from(frame) * FRAME_SECONDS;
        let bodies = system.at(time);
        let (Some(target), Some(star)) = (
            bodies.iter().find(|b| b.id == TERRA),
            bodies.iter().find(|b| b.id == STAR),
        ) else {
            warn!("Demo system is missing its planet or star");
            break;
        };

        let camera = flight.camera(frame, target);
        if let Some(shift) = origin.update(camera.world_position) {
            info!(frame, shift = ?shift, "Render origin rebased");
        }
        renderer.attach_camera(camera);

        let mut params = FrameParams::new(&camera, projection, time, star.world_position);
        params.animate_surface = config.lod.animate_surface;

        let started = Instant::now();
        let report = renderer.render_frame(&bodies, &params);
        let draws = renderer.drawer_mut().take();
        if let Some((device, queue)) = &gpu {
            total_uploads += meshes.sync(device, queue, &draws);
        }
        let frame_ms = started.elapsed().as_secs_f64() * 1000.0;
        renderer.record_frame_time(frame_ms);

        if frame % REPORT_EVERY == 0 || frame + 1 == args.frames {
            info!(
                frame,
                altitude = flight.altitude(frame),
                patches = report.patch_count,
                vertices = report.vertex_count,
                cache_hits = report.cache_hits,
                bodies = system.len(),
                frustum_culled = report.cull_stats.frustum_culled,
                backface_culled = report.cull_stats.backface_culled,
                rings = report.ring_requests.len(),
                max_lod = renderer.effective_max_lod(&params),
                frame_ms,
                "Frame rendered"
            );
        }
    }

    let stats = renderer.cache().stats();
    let camera_local = renderer
        .camera()
        .map(|c| origin.local_camera_pos(c.world_position))
        .unwrap_or_default();
    info!(
        hits = stats.hits,
        misses = stats.misses,
        stale = stats.stale,
        evictions = stats.evictions,
        invalidations = stats.invalidations,
        uploads = total_uploads,
        gpu_meshes = meshes.len(),
        rejected_draws = renderer.drawer().rejected(),
        camera_local = ?camera_local,
        "Orbis demo finished"
    );
}

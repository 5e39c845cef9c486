//! Per-frame orchestration of the patch-LOD pipeline.
//!
//! For each body: floating-origin transform, rotation check, cache lookup,
//! and on a miss leaf building, culling and geometry generation, then the
//! draw through the [`BodyDrawer`] seam and a deferred ring request.

use std::sync::Arc;

use glam::{DMat3, DMat4, DVec3};
use orbis_geodesic::{BodyDescriptor, BodyId, PatchForest, root_patches};
use orbis_lod::{
    BodyFrame, CacheEntry, CacheQuery, CacheSettings, CullStats, GeometryBuffers, GeometryCache,
    LodDistanceTable, PatchCuller, build_leaves, generate,
};
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    FloatingOriginCamera, GovernorSettings, LodSettings, MAX_SUPPORTED_LOD, QualityGovernor,
    RingQueue, RingRenderRequest, RotationTracker,
};

/// Failure reported by a [`BodyDrawer`].
#[derive(Debug, Error)]
pub enum DrawError {
    /// The geometry does not fit the drawer's fixed buffers.
    #[error("geometry needs {requested} vertices but buffers hold {capacity}")]
    CapacityExceeded {
        /// Vertices the draw needed.
        requested: usize,
        /// Vertices the buffers can hold.
        capacity: usize,
    },
    /// Backend-specific failure.
    #[error("draw backend failed: {0}")]
    Backend(String),
}

/// Reasons a body is skipped for the frame.
#[derive(Debug, Error)]
pub enum RenderError {
    /// No camera is attached to convert world positions.
    #[error("no camera attached, cannot render {0}")]
    CameraNotAttached(BodyId),
    /// The drawer rejected the body.
    #[error("drawing {body_id} failed: {source}")]
    Draw {
        /// Body being drawn.
        body_id: BodyId,
        /// Drawer error.
        #[source]
        source: DrawError,
    },
}

/// Everything that changes per frame.
///
/// The LOD knobs live on the renderer; `max_lod` and `show_lod_debug_colors`
/// here only restrict or force them for a single frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameParams {
    /// Absolute camera position. Must match the attached camera.
    pub camera_position: DVec3,
    /// Unit camera forward vector.
    pub camera_forward: DVec3,
    /// Camera-relative view matrix.
    pub view: DMat4,
    /// Projection matrix.
    pub projection: DMat4,
    /// Frame time in seconds; drives surface animation and cache ageing.
    pub time: f64,
    /// Tint leaves by depth this frame even if the knob is off.
    pub show_lod_debug_colors: bool,
    /// Animate the surface shading.
    pub animate_surface: bool,
    /// Absolute sun position.
    pub sun_position: DVec3,
    /// Per-frame LOD depth cap, applied on top of the renderer's max LOD.
    pub max_lod: u8,
}

impl FrameParams {
    /// Frame parameters for `camera` with no per-frame LOD overrides.
    pub fn new(
        camera: &FloatingOriginCamera,
        projection: DMat4,
        time: f64,
        sun_position: DVec3,
    ) -> Self {
        Self {
            camera_position: camera.world_position,
            camera_forward: camera.forward,
            view: camera.view(),
            projection,
            time,
            show_lod_debug_colors: false,
            animate_surface: true,
            sun_position,
            max_lod: MAX_SUPPORTED_LOD,
        }
    }
}

/// Transform and shading inputs for one body draw. Positions are
/// camera-relative, so narrowing them to f32 later is safe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyUniforms {
    /// Camera-relative world transform.
    pub world_matrix: DMat4,
    /// Normal matrix of the world transform.
    pub normal_matrix: DMat3,
    /// Camera-relative view matrix.
    pub view: DMat4,
    /// Projection matrix.
    pub projection: DMat4,
    /// Sun position relative to the camera.
    pub sun_position: DVec3,
    /// Body radius.
    pub radius: f64,
    /// Frame time in seconds.
    pub time: f64,
    /// Surface noise amplitude.
    pub noise_amplitude: f64,
    /// Surface noise base frequency.
    pub noise_frequency: f64,
    /// Surface noise octaves.
    pub noise_octaves: u8,
    /// Surface noise seed.
    pub noise_seed: u64,
    /// Max LOD the geometry was built for.
    pub max_lod: u8,
    /// Tint leaves by depth.
    pub show_lod_debug_colors: bool,
    /// Animate the surface shading.
    pub animate_surface: bool,
}

/// One body ready to be drawn.
#[derive(Clone, Debug)]
pub struct BodyDraw {
    /// Body being drawn.
    pub body_id: BodyId,
    /// Shared stencil geometry.
    pub geometry: Arc<GeometryBuffers>,
    /// False when the geometry is the same cached buffer set as last time.
    pub geometry_changed: bool,
    /// Transform and shading inputs.
    pub uniforms: BodyUniforms,
}

/// The per-body shading program, as seen by the renderer.
pub trait BodyDrawer {
    /// Upload (if needed) and draw one body.
    fn draw(&mut self, draw: BodyDraw) -> Result<(), DrawError>;
}

/// Outcome of rendering one body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BodyRenderStats {
    /// Leaves drawn.
    pub patch_count: usize,
    /// Vertices drawn.
    pub vertex_count: usize,
    /// Counters from the traversal; zero on a cache hit.
    pub cull_stats: CullStats,
    /// Whether the geometry came from the cache.
    pub cache_hit: bool,
    /// Whether a draw was issued.
    pub drawn: bool,
}

/// Outcome of rendering a whole frame.
#[derive(Clone, Debug, Default)]
pub struct FrameReport {
    /// Per-body results, in input order.
    pub bodies: Vec<(BodyId, BodyRenderStats)>,
    /// Sum of leaves drawn.
    pub patch_count: usize,
    /// Sum of vertices drawn.
    pub vertex_count: usize,
    /// Sum of traversal counters.
    pub cull_stats: CullStats,
    /// Bodies served from the cache.
    pub cache_hits: usize,
    /// Ring draws deferred to after the opaque pass.
    pub ring_requests: Vec<RingRenderRequest>,
}

/// Construction parameters for [`PlanetRenderer`].
#[derive(Clone, Debug)]
pub struct RendererConfig {
    /// Viewport height in pixels.
    pub canvas_height: f64,
    /// Vertical field of view in radians.
    pub fov_y: f64,
    /// Initial target pixel size index.
    pub target_pixel_size_index: usize,
    /// Initial LOD depth cap.
    pub max_lod: u8,
    /// Geometry cache tunables.
    pub cache: CacheSettings,
    /// Quality governor tunables.
    pub governor: GovernorSettings,
    /// Keep the patch tree between traversals instead of rebuilding it.
    pub retain_patch_tree: bool,
    /// Retained tree size beyond which it is reset.
    pub max_retained_patches: usize,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            canvas_height: 720.0,
            fov_y: 60f64.to_radians(),
            target_pixel_size_index: 4,
            max_lod: 8,
            cache: CacheSettings::default(),
            governor: GovernorSettings::default(),
            retain_patch_tree: false,
            max_retained_patches: 200_000,
        }
    }
}

/// Owns all cross-frame LOD state and renders bodies through a [`BodyDrawer`].
pub struct PlanetRenderer<D> {
    drawer: D,
    camera: Option<FloatingOriginCamera>,
    canvas_height: f64,
    fov_y: f64,
    settings: LodSettings,
    cache: GeometryCache,
    rotation: RotationTracker,
    governor: QualityGovernor,
    culler: PatchCuller,
    forest: Option<PatchForest>,
    max_retained_patches: usize,
    rings: RingQueue,
    last_geometry: FxHashMap<BodyId, Arc<GeometryBuffers>>,
    last_requested_max_lod: u8,
}

impl<D: BodyDrawer> PlanetRenderer<D> {
    /// Renderer drawing through `drawer`. No camera is attached yet.
    pub fn new(config: RendererConfig, drawer: D) -> Self {
        info!(
            pixel_size_index = config.target_pixel_size_index,
            max_lod = config.max_lod,
            retain_patch_tree = config.retain_patch_tree,
            governor = config.governor.enabled,
            "Planet renderer created"
        );
        let settings = LodSettings::new(config.target_pixel_size_index, config.max_lod);
        Self {
            drawer,
            camera: None,
            canvas_height: config.canvas_height,
            fov_y: config.fov_y,
            last_requested_max_lod: settings.max_lod(),
            settings,
            cache: GeometryCache::new(config.cache),
            rotation: RotationTracker::new(),
            governor: QualityGovernor::new(config.governor),
            culler: PatchCuller::new(),
            forest: config.retain_patch_tree.then(PatchForest::new),
            max_retained_patches: config.max_retained_patches,
            rings: RingQueue::new(),
            last_geometry: FxHashMap::default(),
        }
    }

    /// Attach (or replace) the camera used for coordinate conversion.
    pub fn attach_camera(&mut self, camera: FloatingOriginCamera) {
        self.camera = Some(camera);
    }

    /// Detach the camera; bodies are skipped until one is attached again.
    pub fn detach_camera(&mut self) -> Option<FloatingOriginCamera> {
        self.camera.take()
    }

    /// The attached camera.
    pub fn camera(&self) -> Option<&FloatingOriginCamera> {
        self.camera.as_ref()
    }

    /// Mutable access to the attached camera.
    pub fn camera_mut(&mut self) -> Option<&mut FloatingOriginCamera> {
        self.camera.as_mut()
    }

    /// The drawer.
    pub fn drawer(&self) -> &D {
        &self.drawer
    }

    /// Mutable access to the drawer.
    pub fn drawer_mut(&mut self) -> &mut D {
        &mut self.drawer
    }

    /// Current LOD knobs.
    pub fn settings(&self) -> &LodSettings {
        &self.settings
    }

    /// Geometry cache, for inspection.
    pub fn cache(&self) -> &GeometryCache {
        &self.cache
    }

    /// Quality governor, for inspection.
    pub fn governor(&self) -> &QualityGovernor {
        &self.governor
    }

    /// Retained patch forest, if enabled.
    pub fn forest(&self) -> Option<&PatchForest> {
        self.forest.as_ref()
    }

    /// Change the viewport. LOD tables are recomputed every frame, so stale
    /// cache entries fail their validity check on their own.
    pub fn set_viewport(&mut self, canvas_height: f64, fov_y: f64) {
        self.canvas_height = canvas_height;
        self.fov_y = fov_y;
    }

    /// Select the target pixel size; clears the cache next frame.
    pub fn set_target_pixel_size_index(&mut self, index: usize) {
        self.settings.set_target_pixel_size_index(index);
    }

    /// Set the LOD depth cap.
    pub fn set_max_lod(&mut self, max_lod: u8) {
        self.settings.set_max_lod(max_lod);
    }

    /// Toggle debug colouring.
    pub fn set_lod_debug_colors(&mut self, enabled: bool) {
        self.settings.set_lod_debug_colors(enabled);
    }

    /// Report how long the last frame took, for the quality governor.
    pub fn record_frame_time(&mut self, frame_ms: f64) {
        self.governor
            .record_frame(frame_ms, self.last_requested_max_lod);
    }

    /// Max LOD before the governor: the knob, restricted by the frame's cap.
    fn requested_max_lod(&self, params: &FrameParams) -> u8 {
        self.settings.max_lod().min(params.max_lod)
    }

    /// Max LOD a body rendered with `params` is built for.
    pub fn effective_max_lod(&self, params: &FrameParams) -> u8 {
        self.governor
            .effective_max_lod(self.requested_max_lod(params))
    }

    fn apply_setting_changes(&mut self) {
        let changes = self.settings.take_changes();
        if changes.pixel_size {
            self.cache.clear();
            info!(
                index = self.settings.target_pixel_size_index(),
                pixels = self.settings.target_pixel_size(),
                "Target pixel size changed, geometry cache cleared"
            );
        }
        if changes.max_lod {
            info!(max_lod = self.settings.max_lod(), "Max LOD changed");
        }
    }

    /// Render one body. A body that cannot be rendered is logged and skipped;
    /// the returned stats then have `drawn == false`.
    pub fn render_body(&mut self, body: &BodyDescriptor, params: &FrameParams) -> BodyRenderStats {
        match self.try_render_body(body, params) {
            Ok(stats) => stats,
            Err(err) => {
                warn!(body = %body.name, "{err}");
                BodyRenderStats::default()
            }
        }
    }

    /// Render one body, reporting why it was skipped.
    pub fn try_render_body(
        &mut self,
        body: &BodyDescriptor,
        params: &FrameParams,
    ) -> Result<BodyRenderStats, RenderError> {
        self.apply_setting_changes();

        let camera = self
            .camera
            .ok_or(RenderError::CameraNotAttached(body.id))?;
        debug_assert!(
            params.camera_position.distance(camera.world_position)
                <= 1e-9 * camera.world_position.length().max(1.0),
            "frame camera position {} disagrees with the attached camera at {}",
            params.camera_position,
            camera.world_position,
        );
        let relative_center = camera.world_to_camera_relative(body.world_position);
        let world_matrix = camera.camera_relative_world_matrix(body);
        self.last_requested_max_lod = self.requested_max_lod(params);
        let max_lod = self.effective_max_lod(params);

        if self
            .rotation
            .has_rotated_significantly(body.id, &world_matrix, DVec3::ZERO, body, max_lod)
        {
            let removed = self.cache.invalidate_body(body.id);
            debug!(body = %body.name, removed, "Body rotated, cache entries dropped");
        }

        let lod_distances = LodDistanceTable::for_body(
            body.radius,
            body.lod_multiplier,
            self.settings.target_pixel_size(),
            self.canvas_height,
            self.fov_y,
        );

        let camera_from_body = -relative_center;
        let key = self.cache.key(
            body.id,
            camera_from_body,
            params.camera_forward,
            max_lod,
            self.settings.target_pixel_size_index(),
        );
        let query = CacheQuery {
            camera_position: camera_from_body,
            camera_forward: params.camera_forward,
            lod_distances: &lod_distances,
            max_lod,
            body_radius: body.radius,
        };

        let mut stats = BodyRenderStats::default();
        let geometry = match self.cache.get(&key, &query, params.time) {
            Some(geometry) => {
                stats.cache_hit = true;
                geometry
            }
            None => {
                let (geometry, cull_stats) =
                    self.build_geometry(body, params, &world_matrix, &lod_distances, max_lod);
                stats.cull_stats = cull_stats;
                self.cache
                    .put(key, CacheEntry::new(Arc::clone(&geometry), &query, params.time));
                let evicted = self.cache.evict(params.time);
                if evicted > 0 {
                    debug!(evicted, "Aged geometry cache entries evicted");
                }
                geometry
            }
        };

        stats.patch_count = geometry.patch_count();
        stats.vertex_count = geometry.vertex_count();

        if let Some(request) = RingRenderRequest::for_body(body, relative_center) {
            self.rings.push(request);
        }

        if geometry.is_empty() {
            return Ok(stats);
        }

        let geometry_changed = self
            .last_geometry
            .get(&body.id)
            .is_none_or(|last| !Arc::ptr_eq(last, &geometry));

        let uniforms = BodyUniforms {
            world_matrix,
            normal_matrix: DMat3::from_mat4(world_matrix),
            view: params.view,
            projection: params.projection,
            sun_position: camera.world_to_camera_relative(params.sun_position),
            radius: body.radius,
            time: params.time,
            noise_amplitude: body.terrain.amplitude,
            noise_frequency: body.terrain.frequency,
            noise_octaves: body.terrain.octaves,
            noise_seed: body.terrain.seed,
            max_lod,
            show_lod_debug_colors: self.settings.show_lod_debug_colors()
                || params.show_lod_debug_colors,
            animate_surface: params.animate_surface,
        };

        // Only geometry the drawer accepted counts as uploaded.
        let drawn = Arc::clone(&geometry);
        if let Err(source) = self.drawer.draw(BodyDraw {
            body_id: body.id,
            geometry,
            geometry_changed,
            uniforms,
        }) {
            self.last_geometry.remove(&body.id);
            return Err(RenderError::Draw {
                body_id: body.id,
                source,
            });
        }
        self.last_geometry.insert(body.id, drawn);
        stats.drawn = true;
        Ok(stats)
    }

    fn build_geometry(
        &mut self,
        body: &BodyDescriptor,
        params: &FrameParams,
        world_matrix: &DMat4,
        lod_distances: &LodDistanceTable,
        max_lod: u8,
    ) -> (Arc<GeometryBuffers>, CullStats) {
        self.culler.reset_stats();
        self.culler
            .extract_frustum_planes(&(params.projection * params.view));
        let frame = BodyFrame::new(body, *world_matrix);

        let mut fresh_roots;
        let roots = match self.forest.as_mut() {
            Some(forest) => forest.roots_mut(),
            None => {
                fresh_roots = root_patches();
                &mut fresh_roots[..]
            }
        };
        let leaves = build_leaves(
            DVec3::ZERO,
            &frame,
            lod_distances,
            max_lod,
            &mut self.culler,
            roots,
        );

        if let Some(forest) = self.forest.as_mut() {
            if forest.reset_if_over(self.max_retained_patches) {
                debug!(limit = self.max_retained_patches, "Retained patch forest reset");
            }
        }

        let geometry = generate(&leaves, body.radius, DVec3::ZERO, world_matrix, lod_distances);
        let cull_stats = self.culler.stats();
        debug!(
            body = %body.name,
            leaves = leaves.len(),
            visited = cull_stats.visited,
            frustum_culled = cull_stats.frustum_culled,
            backface_culled = cull_stats.backface_culled,
            "Body geometry rebuilt"
        );
        (Arc::new(geometry), cull_stats)
    }

    /// Render every body, then evict aged cache entries and hand back the
    /// deferred ring requests.
    pub fn render_frame(&mut self, bodies: &[BodyDescriptor], params: &FrameParams) -> FrameReport {
        let mut report = FrameReport::default();
        for body in bodies {
            let stats = self.render_body(body, params);
            report.patch_count += stats.patch_count;
            report.vertex_count += stats.vertex_count;
            report.cull_stats += stats.cull_stats;
            if stats.cache_hit {
                report.cache_hits += 1;
            }
            report.bodies.push((body.id, stats));
        }

        let evicted = self.cache.evict(params.time);
        if evicted > 0 {
            debug!(evicted, "Aged geometry cache entries evicted");
        }
        let live: FxHashSet<BodyId> = bodies.iter().map(|b| b.id).collect();
        self.last_geometry.retain(|id, _| live.contains(id));

        report.ring_requests = self.rings.drain();
        report
    }

    /// Forget everything cached about `body_id`.
    pub fn forget_body(&mut self, body_id: BodyId) {
        self.cache.invalidate_body(body_id);
        self.rotation.forget(body_id);
        self.last_geometry.remove(&body_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbis_geodesic::{RingSystem, TerrainKind};

    #[derive(Default)]
    struct Recorder {
        draws: Vec<BodyDraw>,
        fail: bool,
    }

    fn move_camera(
        renderer: &mut PlanetRenderer<Recorder>,
        params: &FrameParams,
        camera: FloatingOriginCamera,
        time: f64,
    ) -> FrameParams {
        renderer.attach_camera(camera);
        FrameParams::new(&camera, params.projection, time, params.sun_position)
    }

    impl BodyDrawer for Recorder {
        fn draw(&mut self, draw: BodyDraw) -> Result<(), DrawError> {
            if self.fail {
                return Err(DrawError::Backend("device lost".into()));
            }
            self.draws.push(draw);
            Ok(())
        }
    }

    fn planet() -> BodyDescriptor {
        BodyDescriptor::new(BodyId(1), "Terra", 1.0, DVec3::ZERO, TerrainKind::Temperate)
    }

    fn renderer_at(camera_world: DVec3) -> (PlanetRenderer<Recorder>, FrameParams) {
        let mut renderer = PlanetRenderer::new(RendererConfig::default(), Recorder::default());
        let camera = FloatingOriginCamera::looking_at(camera_world, DVec3::ZERO);
        renderer.attach_camera(camera);
        let projection = DMat4::perspective_rh(60f64.to_radians(), 16.0 / 9.0, 0.001, 1000.0);
        let params = FrameParams::new(&camera, projection, 0.0, DVec3::new(100.0, 0.0, 0.0));
        (renderer, params)
    }

    #[test]
    fn test_missing_camera_skips_body() {
        let (mut renderer, params) = renderer_at(DVec3::new(0.0, 0.0, 5.0));
        renderer.detach_camera();
        let err = renderer.try_render_body(&planet(), &params).unwrap_err();
        assert!(matches!(err, RenderError::CameraNotAttached(BodyId(1))));
        let stats = renderer.render_body(&planet(), &params);
        assert!(!stats.drawn);
        assert!(renderer.drawer().draws.is_empty());
    }

    #[test]
    fn test_draw_carries_camera_relative_uniforms() {
        let (mut renderer, params) = renderer_at(DVec3::new(0.0, 0.0, 5.0));
        let stats = renderer.render_body(&planet(), &params);
        assert!(stats.drawn);
        let draw = &renderer.drawer().draws[0];
        assert_eq!(draw.body_id, BodyId(1));
        assert!(draw.geometry_changed);
        let center = draw.uniforms.world_matrix.transform_point3(DVec3::ZERO);
        assert!((center - DVec3::new(0.0, 0.0, -5.0)).length() < 1e-12);
        assert_eq!(stats.vertex_count, draw.geometry.vertex_count());
    }

    #[test]
    fn test_cached_redraw_reports_unchanged_geometry() {
        let (mut renderer, params) = renderer_at(DVec3::new(0.0, 0.0, 5.0));
        renderer.render_body(&planet(), &params);
        let stats = renderer.render_body(&planet(), &params);
        assert!(stats.cache_hit);
        assert_eq!(stats.cull_stats, CullStats::default());
        assert!(!renderer.drawer().draws[1].geometry_changed);
    }

    #[test]
    fn test_drawer_failure_is_reported_not_fatal() {
        let (mut renderer, params) = renderer_at(DVec3::new(0.0, 0.0, 5.0));
        renderer.drawer_mut().fail = true;
        let err = renderer.try_render_body(&planet(), &params).unwrap_err();
        assert!(matches!(err, RenderError::Draw { body_id: BodyId(1), .. }));
        assert!(!renderer.render_body(&planet(), &params).drawn);
    }

    #[test]
    fn test_render_frame_collects_rings_and_totals() {
        let (mut renderer, params) = renderer_at(DVec3::new(0.0, 0.0, 30.0));
        let giant = BodyDescriptor::new(
            BodyId(2),
            "Giant",
            3.0,
            DVec3::new(10.0, 0.0, 0.0),
            TerrainKind::Gaseous,
        )
        .with_rings(RingSystem {
            inner: 1.3,
            outer: 2.2,
        });
        let report = renderer.render_frame(&[planet(), giant], &params);
        assert_eq!(report.bodies.len(), 2);
        assert_eq!(report.ring_requests.len(), 1);
        assert_eq!(report.ring_requests[0].body_id, BodyId(2));
        let summed: usize = report.bodies.iter().map(|(_, s)| s.vertex_count).sum();
        assert_eq!(report.vertex_count, summed);
        // Requests are drained per frame.
        let report = renderer.render_frame(&[planet()], &params);
        assert!(report.ring_requests.is_empty());
    }

    #[test]
    fn test_retained_forest_is_used() {
        let config = RendererConfig {
            retain_patch_tree: true,
            max_lod: 4,
            ..RendererConfig::default()
        };
        let mut renderer = PlanetRenderer::new(config, Recorder::default());
        let camera = FloatingOriginCamera::looking_at(DVec3::new(0.0, 0.0, 2.0), DVec3::ZERO);
        renderer.attach_camera(camera);
        let params = FrameParams::new(
            &camera,
            DMat4::perspective_rh(1.0, 1.0, 0.001, 100.0),
            0.0,
            DVec3::X * 50.0,
        );
        renderer.render_body(&planet(), &params);
        let forest = renderer.forest().expect("forest enabled");
        assert!(forest.node_count() > 20, "forest should have grown");
    }

    #[test]
    fn test_failed_draw_is_reuploaded_from_cache() {
        let (mut renderer, params) = renderer_at(DVec3::new(0.0, 0.0, 5.0));
        assert!(renderer.render_body(&planet(), &params).drawn);

        let moved = FloatingOriginCamera::looking_at(DVec3::new(0.0, 0.0, 5.5), DVec3::ZERO);
        let params = move_camera(&mut renderer, &params, moved, 0.0);
        renderer.drawer_mut().fail = true;
        assert!(renderer.try_render_body(&planet(), &params).is_err());

        renderer.drawer_mut().fail = false;
        let stats = renderer.render_body(&planet(), &params);
        assert!(stats.cache_hit);
        let draw = &renderer.drawer().draws[1];
        assert!(draw.geometry_changed, "the drawer never received this geometry");

        // Once accepted, the same buffers count as unchanged.
        renderer.render_body(&planet(), &params);
        assert!(!renderer.drawer().draws[2].geometry_changed);
    }

    #[test]
    fn test_render_body_alone_keeps_cache_bounded() {
        let (mut renderer, params) = renderer_at(DVec3::new(0.0, 0.0, 5.0));
        for frame in 0..300u32 {
            let position = DVec3::new(0.05 * f64::from(frame), 0.0, 5.0);
            let camera = FloatingOriginCamera::new(position, DVec3::NEG_Z);
            let params = move_camera(&mut renderer, &params, camera, f64::from(frame));
            renderer.render_body(&planet(), &params);
        }
        let settings = CacheSettings::default();
        let live = settings.max_age_seconds as usize + 1;
        assert!(renderer.cache().len() <= live, "cache holds {}", renderer.cache().len());
        assert!(renderer.cache().stats().evictions > 0);
    }

    #[test]
    fn test_knobs_apply_without_new_frame_params() {
        let (mut renderer, params) = renderer_at(DVec3::new(0.0, 0.0, 100.0));
        renderer.set_max_lod(0);
        renderer.set_lod_debug_colors(true);
        let stats = renderer.render_body(&planet(), &params);
        assert_eq!(stats.patch_count, 20);
        let uniforms = &renderer.drawer().draws[0].uniforms;
        assert_eq!(uniforms.max_lod, 0);
        assert!(uniforms.show_lod_debug_colors);
    }

    #[test]
    fn test_frame_cap_restricts_knob() {
        let (mut renderer, mut params) = renderer_at(DVec3::new(0.0, 0.0, 5.0));
        renderer.set_max_lod(6);
        params.max_lod = 2;
        assert_eq!(renderer.effective_max_lod(&params), 2);
        params.max_lod = MAX_SUPPORTED_LOD;
        assert_eq!(renderer.effective_max_lod(&params), 6);
    }

    #[test]
    fn test_governor_caps_the_knob_value() {
        let config = RendererConfig {
            governor: GovernorSettings {
                enabled: true,
                frame_budget_ms: 10.0,
                overrun_frames: 1,
                recovery_frames: 100,
                min_max_lod: 0,
            },
            ..RendererConfig::default()
        };
        let mut renderer = PlanetRenderer::new(config, Recorder::default());
        let camera = FloatingOriginCamera::looking_at(DVec3::new(0.0, 0.0, 5.0), DVec3::ZERO);
        renderer.attach_camera(camera);
        let params = FrameParams::new(
            &camera,
            DMat4::perspective_rh(1.0, 1.0, 0.001, 100.0),
            0.0,
            DVec3::X * 50.0,
        );
        renderer.set_max_lod(5);
        renderer.render_body(&planet(), &params);
        renderer.record_frame_time(50.0);
        assert_eq!(renderer.effective_max_lod(&params), 4);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "disagrees with the attached camera")]
    fn test_mismatched_camera_position_panics_in_debug() {
        let (mut renderer, mut params) = renderer_at(DVec3::new(0.0, 0.0, 5.0));
        params.camera_position = DVec3::new(0.0, 0.0, 9.0);
        renderer.render_body(&planet(), &params);
    }
}

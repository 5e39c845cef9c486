//! Per-body geometry cache keyed on quantized camera state.
//!
//! The cache is advisory: a miss, a stale hit or an invalidation only costs a
//! regeneration. Entries are validated on every hit, not just matched by key,
//! because quantization alone lets drift accumulate across a step.

use std::sync::Arc;

use glam::DVec3;
use orbis_geodesic::BodyId;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::{GeometryBuffers, LodDistanceTable};

/// Tunables for keying, validation and eviction.
#[derive(Clone, Debug, PartialEq)]
pub struct CacheSettings {
    /// Quantization step for camera position, in world units.
    pub position_step: f64,
    /// Quantization step for forward-vector components.
    pub direction_step: f64,
    /// Largest camera displacement, in world units, that still reuses an entry.
    pub position_threshold: f64,
    /// Smallest forward-vector dot product that still reuses an entry.
    pub rotation_threshold: f64,
    /// Relative difference allowed between cached and fresh LOD distances.
    pub lod_distance_tolerance: f64,
    /// Entries untouched for longer than this are evicted.
    pub max_age_seconds: f64,
    /// Entry count beyond which the least recently touched are evicted.
    pub max_entries: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            position_step: 0.01,
            direction_step: 0.01,
            position_threshold: 0.01,
            rotation_threshold: 0.9999,
            lod_distance_tolerance: 0.03,
            max_age_seconds: 5.0,
            max_entries: 64,
        }
    }
}

/// Cache lookup key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GeometryCacheKey {
    /// Body the geometry belongs to.
    pub body_id: BodyId,
    /// Camera position relative to the body center, quantized.
    pub position: [i64; 3],
    /// Camera forward vector, quantized.
    pub forward: [i64; 3],
    /// LOD depth cap the geometry was built with.
    pub max_lod: u8,
    /// Target pixel size index the geometry was built with.
    pub target_lod_index: usize,
}

fn quantize(v: DVec3, step: f64) -> [i64; 3] {
    let step = step.max(f64::EPSILON);
    (v / step).floor().to_array().map(|c| c as i64)
}

impl GeometryCacheKey {
    /// Snap camera state to the configured steps.
    ///
    /// `camera_position` is relative to the body center.
    pub fn new(
        body_id: BodyId,
        camera_position: DVec3,
        camera_forward: DVec3,
        max_lod: u8,
        target_lod_index: usize,
        settings: &CacheSettings,
    ) -> Self {
        Self {
            body_id,
            position: quantize(camera_position, settings.position_step),
            forward: quantize(camera_forward, settings.direction_step),
            max_lod,
            target_lod_index,
        }
    }
}

/// Fresh camera state a cached entry is validated against.
#[derive(Clone, Copy, Debug)]
pub struct CacheQuery<'a> {
    /// Camera position relative to the body center.
    pub camera_position: DVec3,
    /// Camera forward vector.
    pub camera_forward: DVec3,
    /// Freshly computed LOD distances.
    pub lod_distances: &'a LodDistanceTable,
    /// Current LOD depth cap.
    pub max_lod: u8,
    /// Body radius, for the proximity scaling of thresholds.
    pub body_radius: f64,
}

/// Scale applied to validity thresholds: 1 at two radii of altitude and
/// above, falling linearly to 0.1 at half a radius and below.
pub fn proximity_scale(altitude_ratio: f64) -> f64 {
    const NEAR: f64 = 0.5;
    const FAR: f64 = 2.0;
    const MIN_SCALE: f64 = 0.1;
    let t = ((altitude_ratio - NEAR) / (FAR - NEAR)).clamp(0.0, 1.0);
    MIN_SCALE + (1.0 - MIN_SCALE) * t
}

/// A cached geometry buffer set and the camera state that produced it.
#[derive(Clone, Debug)]
pub struct CacheEntry {
    geometry: Arc<GeometryBuffers>,
    camera_position: DVec3,
    camera_forward: DVec3,
    lod_distances: LodDistanceTable,
    max_lod: u8,
    created_at: f64,
    last_touched: f64,
    hits: u64,
}

impl CacheEntry {
    /// Entry for geometry built under `query` at time `now` (seconds).
    pub fn new(geometry: Arc<GeometryBuffers>, query: &CacheQuery<'_>, now: f64) -> Self {
        Self {
            geometry,
            camera_position: query.camera_position,
            camera_forward: query.camera_forward,
            lod_distances: query.lod_distances.clone(),
            max_lod: query.max_lod,
            created_at: now,
            last_touched: now,
            hits: 0,
        }
    }

    /// The shared buffers.
    pub fn geometry(&self) -> &Arc<GeometryBuffers> {
        &self.geometry
    }

    /// Time the entry was created.
    pub fn created_at(&self) -> f64 {
        self.created_at
    }

    /// Time of the last valid hit, or creation.
    pub fn last_touched(&self) -> f64 {
        self.last_touched
    }

    /// Number of valid hits served.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Re-check the entry against fresh camera state.
    pub fn is_valid_for(&self, query: &CacheQuery<'_>, settings: &CacheSettings) -> bool {
        let radius = query.body_radius.max(f64::MIN_POSITIVE);
        let altitude_ratio = (query.camera_position.length() - radius) / radius;
        let scale = proximity_scale(altitude_ratio);

        let position_ok = self.camera_position.distance(query.camera_position)
            < settings.position_threshold * scale;
        let min_dot = 1.0 - (1.0 - settings.rotation_threshold) * scale;
        let forward_ok = self.camera_forward.dot(query.camera_forward) > min_dot;

        position_ok
            && forward_ok
            && self.max_lod == query.max_lod
            && self
                .lod_distances
                .within_tolerance(query.lod_distances, settings.lod_distance_tolerance)
    }
}

/// Counters for cache behaviour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Valid hits served.
    pub hits: u64,
    /// Lookups that returned nothing (including stale hits).
    pub misses: u64,
    /// Key matches rejected by the validity check.
    pub stale: u64,
    /// Entries removed by age or capacity.
    pub evictions: u64,
    /// Entries removed by body invalidation or clears.
    pub invalidations: u64,
}

/// Quantized camera state to shared geometry.
#[derive(Debug, Default)]
pub struct GeometryCache {
    settings: CacheSettings,
    entries: FxHashMap<GeometryCacheKey, CacheEntry>,
    stats: CacheStats,
}

impl GeometryCache {
    /// An empty cache.
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            settings,
            entries: FxHashMap::default(),
            stats: CacheStats::default(),
        }
    }

    /// Current tunables.
    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// Replace the tunables. Existing entries are kept; the next validity
    /// checks use the new thresholds.
    pub fn set_settings(&mut self, settings: CacheSettings) {
        self.settings = settings;
    }

    /// Build a key with this cache's quantization steps.
    pub fn key(
        &self,
        body_id: BodyId,
        camera_position: DVec3,
        camera_forward: DVec3,
        max_lod: u8,
        target_lod_index: usize,
    ) -> GeometryCacheKey {
        GeometryCacheKey::new(
            body_id,
            camera_position,
            camera_forward,
            max_lod,
            target_lod_index,
            &self.settings,
        )
    }

    /// Look up `key`, validating the entry against `query`.
    ///
    /// A stale entry is removed and reported as a miss.
    pub fn get(
        &mut self,
        key: &GeometryCacheKey,
        query: &CacheQuery<'_>,
        now: f64,
    ) -> Option<Arc<GeometryBuffers>> {
        let Some(entry) = self.entries.get_mut(key) else {
            self.stats.misses += 1;
            return None;
        };

        if !entry.is_valid_for(query, &self.settings) {
            self.entries.remove(key);
            self.stats.stale += 1;
            self.stats.misses += 1;
            return None;
        }

        entry.last_touched = now;
        entry.hits += 1;
        self.stats.hits += 1;
        Some(Arc::clone(&entry.geometry))
    }

    /// Store an entry, replacing any previous one under the same key.
    pub fn put(&mut self, key: GeometryCacheKey, entry: CacheEntry) {
        self.entries.insert(key, entry);
    }

    /// Drop every entry for `body_id`. Returns how many were removed.
    pub fn invalidate_body(&mut self, body_id: BodyId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.body_id != body_id);
        let removed = before - self.entries.len();
        self.stats.invalidations += removed as u64;
        if removed > 0 {
            debug!(%body_id, removed, "Geometry cache invalidated");
        }
        removed
    }

    /// Remove entries idle longer than the max age, then the least recently
    /// touched beyond the max entry count. Returns how many were removed.
    pub fn evict(&mut self, now: f64) -> usize {
        let before = self.entries.len();
        let max_age = self.settings.max_age_seconds;
        self.entries
            .retain(|_, entry| now - entry.last_touched <= max_age);

        let max_entries = self.settings.max_entries;
        if self.entries.len() > max_entries {
            let mut by_age: Vec<(GeometryCacheKey, f64)> = self
                .entries
                .iter()
                .map(|(key, entry)| (*key, entry.last_touched))
                .collect();
            by_age.sort_by(|a, b| a.1.total_cmp(&b.1));
            let excess = self.entries.len() - max_entries;
            for (key, _) in by_age.into_iter().take(excess) {
                self.entries.remove(&key);
            }
        }

        let removed = before - self.entries.len();
        self.stats.evictions += removed as u64;
        if removed > 0 {
            debug!(removed, remaining = self.entries.len(), "Geometry cache evicted");
        }
        removed
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.stats.invalidations += self.entries.len() as u64;
        self.entries.clear();
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if an entry exists under `key` (without validating it).
    pub fn contains_key(&self, key: &GeometryCacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Counters since construction.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

//! Patch level of detail: screen-space split distances, frustum and horizon
//! culling, leaf selection over the geodesic tree, stencil geometry generation
//! and the per-body geometry cache.

mod culling;
mod geometry;
mod geometry_cache;
pub mod horizon_culling;
mod quadtree;
mod screen_space;

pub use culling::{
    BOTTOM, CullBody, CullStats, DEFAULT_HORIZON_BIAS, FAR, Frustum, LEFT, NEAR, PatchCuller,
    RIGHT, TOP,
};
pub use geometry::{
    GeometryBuffers, INDICES_PER_PATCH, PatchVertex, VERTICES_PER_PATCH, generate, morph_factor,
};
pub use geometry_cache::{
    CacheEntry, CacheQuery, CacheSettings, CacheStats, GeometryCache, GeometryCacheKey,
    proximity_scale,
};
pub use quadtree::{BodyFrame, FRUSTUM_CULL_MIN_LEVEL, HORIZON_CULL_MIN_LEVEL, build_leaves};
pub use screen_space::{
    LOD_LEVEL_COUNT, LodDistanceTable, TARGET_PIXEL_SIZES, focal_length, lod_distance_for_level,
    target_pixel_size,
};

//! Geodesic sphere geometry: the base icosahedron, recursively subdivided
//! patches, and the descriptors of the bodies they are draped over.

mod body;
mod direction;
mod forest;
mod icosahedron;
mod patch;

pub use body::{BodyDescriptor, BodyId, RingSystem, TerrainKind, TerrainNoise};
pub use direction::{FALLBACK_DIRECTION, normalize_or_fallback};
pub use forest::PatchForest;
pub use icosahedron::{ICOSAHEDRON_FACES, icosahedron_vertices, root_patches};
pub use patch::{BOUNDING_RADIUS_MARGIN, LeafPatch, Patch, edge_midpoints};

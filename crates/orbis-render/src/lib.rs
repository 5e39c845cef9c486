//! GPU side of patch rendering: the canonical vertex layout, the per-body
//! uniform block, fixed-capacity patch meshes and the recorded draw queue.

mod draw_queue;
mod gpu_patch_mesh;
mod uniform;
mod vertex_layout;

pub use draw_queue::{DEFAULT_MAX_PATCHES_PER_BODY, DrawQueue, QueuedDraw};
pub use gpu_patch_mesh::{GpuPatchMesh, GpuPatchMeshes};
pub use uniform::{BodyUniform, FLAG_ANIMATE_SURFACE, FLAG_LOD_DEBUG_COLORS};
pub use vertex_layout::{PATCH_VERTEX_ATTRIBUTES, PATCH_VERTEX_LAYOUT, patch_vertex_buffer_layout};

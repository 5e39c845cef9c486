//! Canonical `wgpu::VertexBufferLayout` for patch stencils.
//!
//! Every body pipeline references [`PATCH_VERTEX_LAYOUT`] so the attribute
//! offsets cannot drift from [`PatchVertex`].
//!
//! ## Attribute Packing
//!
//! | Location | Offset | Format    | Field          |
//! |----------|--------|-----------|----------------|
//! | 0        | 0      | Float32x3 | position       |
//! | 1        | 12     | Float32   | lod_level      |
//! | 2        | 16     | Float32   | morph_flag     |
//! | 3        | 20     | Float32   | morph_factor   |
//! | 4        | 24     | Float32x3 | morph_start    |
//! | 5        | 36     | Float32x3 | morph_end      |

use std::mem;

use orbis_lod::PatchVertex;
use wgpu::{VertexAttribute, VertexBufferLayout, VertexFormat, VertexStepMode};

static_assertions::assert_eq_size!(PatchVertex, [u8; 48]);

/// Vertex attributes covering all 48 bytes of [`PatchVertex`].
pub const PATCH_VERTEX_ATTRIBUTES: [VertexAttribute; 6] = [
    VertexAttribute {
        format: VertexFormat::Float32x3,
        offset: mem::offset_of!(PatchVertex, position) as u64,
        shader_location: 0,
    },
    VertexAttribute {
        format: VertexFormat::Float32,
        offset: mem::offset_of!(PatchVertex, lod_level) as u64,
        shader_location: 1,
    },
    VertexAttribute {
        format: VertexFormat::Float32,
        offset: mem::offset_of!(PatchVertex, morph_flag) as u64,
        shader_location: 2,
    },
    VertexAttribute {
        format: VertexFormat::Float32,
        offset: mem::offset_of!(PatchVertex, morph_factor) as u64,
        shader_location: 3,
    },
    VertexAttribute {
        format: VertexFormat::Float32x3,
        offset: mem::offset_of!(PatchVertex, morph_start) as u64,
        shader_location: 4,
    },
    VertexAttribute {
        format: VertexFormat::Float32x3,
        offset: mem::offset_of!(PatchVertex, morph_end) as u64,
        shader_location: 5,
    },
];

/// The vertex buffer layout for every body pipeline.
pub const PATCH_VERTEX_LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
    array_stride: mem::size_of::<PatchVertex>() as u64,
    step_mode: VertexStepMode::Vertex,
    attributes: &PATCH_VERTEX_ATTRIBUTES,
};

/// [`PATCH_VERTEX_LAYOUT`] as an owned value.
pub fn patch_vertex_buffer_layout() -> VertexBufferLayout<'static> {
    PATCH_VERTEX_LAYOUT
}

const _: () = assert!(PATCH_VERTEX_ATTRIBUTES[0].offset == 0);
const _: () = assert!(PATCH_VERTEX_ATTRIBUTES[1].offset == 12);
const _: () = assert!(PATCH_VERTEX_ATTRIBUTES[3].offset == 20);
const _: () = assert!(PATCH_VERTEX_ATTRIBUTES[4].offset == 24);

/// Last attribute must end exactly at the stride.
const _: () = assert!(
    PATCH_VERTEX_ATTRIBUTES[5].offset + 12 == mem::size_of::<PatchVertex>() as u64,
    "PatchVertex has trailing bytes the layout does not cover"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stride_matches_vertex() {
        assert_eq!(PATCH_VERTEX_LAYOUT.array_stride, 48);
        assert_eq!(PATCH_VERTEX_LAYOUT.step_mode, VertexStepMode::Vertex);
    }

    /// Shader locations are 0..6 with no gaps.
    #[test]
    fn test_shader_locations_contiguous() {
        let locations: Vec<u32> = PATCH_VERTEX_ATTRIBUTES
            .iter()
            .map(|a| a.shader_location)
            .collect();
        assert_eq!(locations, vec![0, 1, 2, 3, 4, 5]);
    }

    /// Attributes tile the vertex without overlap.
    #[test]
    fn test_attributes_do_not_overlap() {
        for pair in PATCH_VERTEX_ATTRIBUTES.windows(2) {
            let end = pair[0].offset + pair[0].format.size();
            assert_eq!(end, pair[1].offset, "gap or overlap before location {}", pair[1].shader_location);
        }
    }

    #[test]
    fn test_owned_layout_equals_const() {
        let layout = patch_vertex_buffer_layout();
        assert_eq!(layout.array_stride, PATCH_VERTEX_LAYOUT.array_stride);
        assert_eq!(layout.attributes.len(), 6);
    }
}

//! Per-body uniform block.
//!
//! All matrices and positions arrive camera-relative in f64, so narrowing them
//! to f32 here keeps full precision near the viewer.

use bytemuck::{Pod, Zeroable};
use glam::{DMat3, DMat4};
use orbis_planet::BodyUniforms;

/// `flags` bit: tint leaves by depth.
pub const FLAG_LOD_DEBUG_COLORS: u32 = 1;
/// `flags` bit: animate the surface shading.
pub const FLAG_ANIMATE_SURFACE: u32 = 1 << 1;

/// GPU layout of [`BodyUniforms`].
///
/// Bound at group 0, binding 0. Visible to vertex and fragment stages.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct BodyUniform {
    /// Camera-relative world transform.
    pub world: [[f32; 4]; 4],
    /// Normal matrix as three padded columns (WGSL `mat3x3<f32>`).
    pub normal: [[f32; 4]; 3],
    /// Camera-relative view matrix.
    pub view: [[f32; 4]; 4],
    /// Projection matrix.
    pub projection: [[f32; 4]; 4],
    /// Camera-relative sun position (xyz), w unused.
    pub sun_position: [f32; 4],
    /// Radius, time, noise amplitude, noise frequency.
    pub params: [f32; 4],
    /// Noise octaves, max LOD, flag bits, low 32 bits of the noise seed.
    pub config: [u32; 4],
}

const _: () = assert!(
    std::mem::size_of::<BodyUniform>() % 16 == 0,
    "uniform blocks must be a multiple of 16 bytes"
);

fn mat3_columns(m: DMat3) -> [[f32; 4]; 3] {
    let m = m.as_mat3();
    [
        m.x_axis.extend(0.0).to_array(),
        m.y_axis.extend(0.0).to_array(),
        m.z_axis.extend(0.0).to_array(),
    ]
}

impl From<&BodyUniforms> for BodyUniform {
    fn from(u: &BodyUniforms) -> Self {
        let to_cols = |m: DMat4| m.as_mat4().to_cols_array_2d();
        let mut flags = 0;
        if u.show_lod_debug_colors {
            flags |= FLAG_LOD_DEBUG_COLORS;
        }
        if u.animate_surface {
            flags |= FLAG_ANIMATE_SURFACE;
        }
        Self {
            world: to_cols(u.world_matrix),
            normal: mat3_columns(u.normal_matrix),
            view: to_cols(u.view),
            projection: to_cols(u.projection),
            sun_position: u.sun_position.as_vec3().extend(0.0).to_array(),
            params: [
                u.radius as f32,
                u.time as f32,
                u.noise_amplitude as f32,
                u.noise_frequency as f32,
            ],
            config: [
                u32::from(u.noise_octaves),
                u32::from(u.max_lod),
                flags,
                u.noise_seed as u32,
            ],
        }
    }
}

impl BodyUniform {
    /// Raw bytes for `queue.write_buffer`.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

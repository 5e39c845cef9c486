//! Recorded draw list implementing the renderer's [`BodyDrawer`] seam.
//!
//! The planet renderer pushes one [`BodyDraw`] per visible body; the queue
//! converts uniforms to their GPU layout and keeps the shared geometry until
//! the frame is encoded.

use std::sync::Arc;

use orbis_geodesic::BodyId;
use orbis_lod::{GeometryBuffers, VERTICES_PER_PATCH};
use orbis_planet::{BodyDraw, BodyDrawer, DrawError};

use crate::{BodyUniform, GpuPatchMeshes};

/// Leaves one body may submit by default.
pub const DEFAULT_MAX_PATCHES_PER_BODY: usize = 65_536;

/// One body draw waiting to be encoded.
#[derive(Clone, Debug)]
pub struct QueuedDraw {
    /// Body being drawn.
    pub body_id: BodyId,
    /// Shared stencil geometry.
    pub geometry: Arc<GeometryBuffers>,
    /// Whether the GPU copy needs rewriting.
    pub geometry_changed: bool,
    /// Uniforms in GPU layout.
    pub uniform: BodyUniform,
}

/// Frame-scoped list of body draws.
#[derive(Debug)]
pub struct DrawQueue {
    max_patches_per_body: usize,
    draws: Vec<QueuedDraw>,
    rejected: usize,
}

impl DrawQueue {
    /// Empty queue accepting up to `max_patches_per_body` leaves per draw.
    pub fn new(max_patches_per_body: usize) -> Self {
        Self {
            max_patches_per_body,
            draws: Vec::new(),
            rejected: 0,
        }
    }

    /// Leaves one draw may carry.
    pub fn max_patches_per_body(&self) -> usize {
        self.max_patches_per_body
    }

    /// Draws recorded so far.
    pub fn draws(&self) -> &[QueuedDraw] {
        &self.draws
    }

    /// Number of recorded draws.
    pub fn len(&self) -> usize {
        self.draws.len()
    }

    /// Returns true if nothing is recorded.
    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    /// Draws turned away for exceeding the capacity since creation.
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Vertices across all recorded draws.
    pub fn vertex_count(&self) -> usize {
        self.draws.iter().map(|d| d.geometry.vertex_count()).sum()
    }

    /// Take the recorded draws, leaving the queue empty for the next frame.
    pub fn take(&mut self) -> Vec<QueuedDraw> {
        std::mem::take(&mut self.draws)
    }

    /// Encode every recorded draw. Geometry must already be uploaded through
    /// [`GpuPatchMeshes::sync`].
    ///
    /// `bind_body` is called before each draw so the caller can bind the
    /// pipeline resources for that body's uniform. Draws whose mesh is
    /// missing are skipped.
    pub fn encode<'a, F>(
        &self,
        meshes: &'a GpuPatchMeshes,
        render_pass: &mut wgpu::RenderPass<'a>,
        mut bind_body: F,
    ) -> usize
    where
        F: FnMut(&mut wgpu::RenderPass<'a>, &QueuedDraw),
    {
        let mut encoded = 0;
        for draw in &self.draws {
            let Some(mesh) = meshes.get(draw.body_id) else {
                log::warn!("No GPU mesh for {}, draw skipped", draw.body_id);
                continue;
            };
            bind_body(render_pass, draw);
            mesh.bind(render_pass);
            mesh.draw(render_pass);
            encoded += 1;
        }
        encoded
    }
}

impl Default for DrawQueue {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PATCHES_PER_BODY)
    }
}

impl BodyDrawer for DrawQueue {
    fn draw(&mut self, draw: BodyDraw) -> Result<(), DrawError> {
        if draw.geometry.patch_count() > self.max_patches_per_body {
            self.rejected += 1;
            return Err(DrawError::CapacityExceeded {
                requested: draw.geometry.vertex_count(),
                capacity: self.max_patches_per_body * VERTICES_PER_PATCH,
            });
        }
        self.draws.push(QueuedDraw {
            body_id: draw.body_id,
            uniform: BodyUniform::from(&draw.uniforms),
            geometry: draw.geometry,
            geometry_changed: draw.geometry_changed,
        });
        Ok(())
    }
}

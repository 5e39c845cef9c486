//! Fixed-capacity GPU buffers for one body's patch stencils.
//!
//! Buffers are sized once for the body's patch budget and rewritten in place
//! whenever the leaf set changes, so a body never reallocates mid-flight.

use orbis_geodesic::BodyId;
use orbis_lod::{GeometryBuffers, INDICES_PER_PATCH, PatchVertex, VERTICES_PER_PATCH};
use rustc_hash::FxHashMap;

use crate::QueuedDraw;

const VERTEX_STRIDE: u64 = std::mem::size_of::<PatchVertex>() as u64;
const INDEX_STRIDE: u64 = std::mem::size_of::<u32>() as u64;

/// A body's patch geometry resident on the GPU.
pub struct GpuPatchMesh {
    /// Vertex buffer on the GPU.
    pub vertex_buffer: wgpu::Buffer,
    /// Index buffer on the GPU.
    pub index_buffer: wgpu::Buffer,
    capacity: usize,
    patch_count: usize,
}

impl GpuPatchMesh {
    /// Allocate buffers for up to `max_patches` leaves.
    pub fn new(device: &wgpu::Device, label: &str, max_patches: usize) -> Self {
        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{label}-patch-vertices")),
            size: (max_patches * VERTICES_PER_PATCH) as u64 * VERTEX_STRIDE,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let index_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{label}-patch-indices")),
            size: (max_patches * INDICES_PER_PATCH) as u64 * INDEX_STRIDE,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            vertex_buffer,
            index_buffer,
            capacity: max_patches,
            patch_count: 0,
        }
    }

    /// Leaves the buffers can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Leaves written by the last [`write`](Self::write).
    pub fn patch_count(&self) -> usize {
        self.patch_count
    }

    /// Indices to draw.
    pub fn index_count(&self) -> u32 {
        (self.patch_count * INDICES_PER_PATCH) as u32
    }

    /// Size of both buffers in bytes.
    pub fn total_gpu_bytes(&self) -> u64 {
        self.vertex_buffer.size() + self.index_buffer.size()
    }

    /// Overwrite the buffers with `geometry`. Returns the leaves written.
    ///
    /// Geometry beyond the capacity is a sizing bug: it asserts in debug
    /// builds and is truncated to the first `capacity` leaves otherwise.
    pub fn write(&mut self, queue: &wgpu::Queue, geometry: &GeometryBuffers) -> usize {
        let requested = geometry.patch_count();
        debug_assert!(
            requested <= self.capacity,
            "patch mesh overflow: {requested} leaves for capacity {}",
            self.capacity
        );
        let patches = if requested > self.capacity {
            log::error!(
                "Patch mesh overflow: {requested} leaves for capacity {}, truncating",
                self.capacity
            );
            self.capacity
        } else {
            requested
        };

        if patches > 0 {
            let vertices = &geometry.vertices[..patches * VERTICES_PER_PATCH];
            let indices = &geometry.indices[..patches * INDICES_PER_PATCH];
            queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(vertices));
            queue.write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(indices));
        }
        self.patch_count = patches;
        patches
    }

    /// Bind this mesh's buffers to a render pass.
    pub fn bind<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
    }

    /// Issue an indexed draw for the written leaves.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass) {
        if self.patch_count > 0 {
            render_pass.draw_indexed(0..self.index_count(), 0, 0..1);
        }
    }
}

/// One [`GpuPatchMesh`] per body, allocated on first use.
pub struct GpuPatchMeshes {
    max_patches_per_body: usize,
    meshes: FxHashMap<BodyId, GpuPatchMesh>,
}

impl GpuPatchMeshes {
    /// Empty set; each body gets `max_patches_per_body` leaves of capacity.
    pub fn new(max_patches_per_body: usize) -> Self {
        Self {
            max_patches_per_body,
            meshes: FxHashMap::default(),
        }
    }

    /// Upload the geometry of every draw that changed it. Returns the number
    /// of uploads.
    pub fn sync(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        draws: &[QueuedDraw],
    ) -> usize {
        let capacity = self.max_patches_per_body;
        let mut uploads = 0;
        for draw in draws {
            let fresh = !self.meshes.contains_key(&draw.body_id);
            let mesh = self.meshes.entry(draw.body_id).or_insert_with(|| {
                GpuPatchMesh::new(device, &draw.body_id.to_string(), capacity)
            });
            if fresh || draw.geometry_changed {
                mesh.write(queue, &draw.geometry);
                uploads += 1;
            }
        }
        uploads
    }

    /// The mesh of `body_id`, if allocated.
    pub fn get(&self, body_id: BodyId) -> Option<&GpuPatchMesh> {
        self.meshes.get(&body_id)
    }

    /// Release meshes of bodies not in `live`.
    pub fn retain(&mut self, live: &[BodyId]) {
        self.meshes.retain(|id, _| live.contains(id));
    }

    /// Number of allocated meshes.
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    /// Returns true if no mesh is allocated.
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

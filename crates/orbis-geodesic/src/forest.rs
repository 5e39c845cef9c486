//! Retained patch roots shared by every body.
//!
//! Patches live in unit-sphere space, so one forest serves all bodies. Children
//! created while traversing for one body are reused by the next traversal
//! instead of being reallocated each frame. The forest only grows; callers
//! bound it with [`PatchForest::reset_if_over`].

use crate::{Patch, root_patches};

/// The 20 icosahedron root patches plus whatever children have been created.
#[derive(Clone, Debug)]
pub struct PatchForest {
    roots: Vec<Patch>,
}

impl PatchForest {
    /// A forest containing only the unsplit root faces.
    pub fn new() -> Self {
        Self {
            roots: root_patches(),
        }
    }

    /// Mutable access to the root patches for traversal.
    pub fn roots_mut(&mut self) -> &mut [Patch] {
        &mut self.roots
    }

    /// Read-only access to the root patches.
    pub fn roots(&self) -> &[Patch] {
        &self.roots
    }

    /// Total number of patch nodes currently allocated.
    pub fn node_count(&self) -> usize {
        self.roots.iter().map(Patch::node_count).sum()
    }

    /// Drop every child, keeping only the root faces.
    pub fn reset(&mut self) {
        self.roots = root_patches();
    }

    /// Reset if more than `max_nodes` nodes are allocated. Returns whether a reset happened.
    pub fn reset_if_over(&mut self, max_nodes: usize) -> bool {
        if self.node_count() > max_nodes {
            self.reset();
            true
        } else {
            false
        }
    }
}

impl Default for PatchForest {
    fn default() -> Self {
        Self::new()
    }
}

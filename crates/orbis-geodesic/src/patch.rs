//! Recursive geodesic triangle patches.

use glam::DVec3;

use crate::normalize_or_fallback;

/// Safety margin applied to the corner-to-center chord when sizing the
/// bounding sphere used for culling.
pub const BOUNDING_RADIUS_MARGIN: f64 = 1.5;

/// Unit-sphere midpoints of the three edges `(v0,v1)`, `(v1,v2)`, `(v2,v0)`.
pub fn edge_midpoints(vertices: &[DVec3; 3]) -> [DVec3; 3] {
    let [a, b, c] = *vertices;
    [
        normalize_or_fallback(a + b),
        normalize_or_fallback(b + c),
        normalize_or_fallback(c + a),
    ]
}

/// A node of the geodesic quadtree.
///
/// Corners, level, center and bounding radius are fixed at construction; only
/// the children are filled in, lazily, on the first subdivision. A patch with
/// children always has exactly four.
#[derive(Clone, Debug)]
pub struct Patch {
    vertices: [DVec3; 3],
    level: u8,
    center: DVec3,
    bounding_radius: f64,
    children: Option<Box<[Patch; 4]>>,
}

/// A detached copy of a patch selected for rendering.
///
/// Leaves carry no child pointers, so the leaf set can outlive the tree it was
/// collected from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LeafPatch {
    /// Triangle corners on the unit sphere.
    pub vertices: [DVec3; 3],
    /// Subdivision depth (0 = icosahedron face).
    pub level: u8,
    /// Normalized centroid of the corners.
    pub center: DVec3,
    /// Bounding radius in unit-sphere units.
    pub bounding_radius: f64,
}

impl LeafPatch {
    /// Unit-sphere midpoints of this patch's edges.
    pub fn edge_midpoints(&self) -> [DVec3; 3] {
        edge_midpoints(&self.vertices)
    }
}

impl Patch {
    /// Create a leaf patch from three unit-sphere corners.
    pub fn new(vertices: [DVec3; 3], level: u8) -> Self {
        let center = normalize_or_fallback(vertices[0] + vertices[1] + vertices[2]);
        let max_chord = vertices
            .iter()
            .map(|v| v.distance(center))
            .fold(0.0_f64, f64::max);

        Self {
            vertices,
            level,
            center,
            bounding_radius: max_chord * BOUNDING_RADIUS_MARGIN,
            children: None,
        }
    }

    /// Triangle corners on the unit sphere.
    pub fn vertices(&self) -> &[DVec3; 3] {
        &self.vertices
    }

    /// Subdivision depth.
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Normalized centroid.
    pub fn center(&self) -> DVec3 {
        self.center
    }

    /// Bounding radius in unit-sphere units.
    pub fn bounding_radius(&self) -> f64 {
        self.bounding_radius
    }

    /// Returns true if the patch has never been subdivided.
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// The four children, if this patch has been subdivided.
    pub fn children(&self) -> Option<&[Patch; 4]> {
        self.children.as_deref()
    }

    /// Split into the standard geodesic quad: three corner triangles and the
    /// center triangle. Existing children are reused.
    ///
    /// Children are ordered `[corner0, corner1, corner2, center]`.
    pub fn subdivide(&mut self) -> &mut [Patch; 4] {
        let vertices = self.vertices;
        let level = self.level + 1;
        self.children.get_or_insert_with(|| {
            let [a, b, c] = vertices;
            let [ab, bc, ca] = edge_midpoints(&vertices);
            Box::new([
                Patch::new([a, ab, ca], level),
                Patch::new([ab, b, bc], level),
                Patch::new([ca, bc, c], level),
                Patch::new([ab, bc, ca], level),
            ])
        })
    }

    /// Snapshot this patch for the leaf set.
    pub fn to_leaf(&self) -> LeafPatch {
        LeafPatch {
            vertices: self.vertices,
            level: self.level,
            center: self.center,
            bounding_radius: self.bounding_radius,
        }
    }

    /// Number of nodes in this subtree, including this one.
    pub fn node_count(&self) -> usize {
        1 + self
            .children()
            .map_or(0, |children| children.iter().map(Patch::node_count).sum())
    }

    /// Depth of the deepest node in this subtree.
    pub fn max_depth(&self) -> u8 {
        self.children().map_or(self.level, |children| {
            children.iter().map(Patch::max_depth).max().unwrap_or(self.level)
        })
    }
}

//! The fixed icosahedron every body is subdivided from.

use std::sync::LazyLock;

use glam::DVec3;

use crate::Patch;

/// Corner indices of the 20 faces, wound counter-clockwise seen from outside.
pub const ICOSAHEDRON_FACES: [[usize; 3]; 20] = [
    [0, 11, 5],
    [0, 5, 1],
    [0, 1, 7],
    [0, 7, 10],
    [0, 10, 11],
    [1, 5, 9],
    [5, 11, 4],
    [11, 10, 2],
    [10, 7, 6],
    [7, 1, 8],
    [3, 9, 4],
    [3, 4, 2],
    [3, 2, 6],
    [3, 6, 8],
    [3, 8, 9],
    [4, 9, 5],
    [2, 4, 11],
    [6, 2, 10],
    [8, 6, 7],
    [9, 8, 1],
];

static VERTICES: LazyLock<[DVec3; 12]> = LazyLock::new(|| {
    let phi = (1.0 + 5.0_f64.sqrt()) / 2.0;
    [
        DVec3::new(-1.0, phi, 0.0),
        DVec3::new(1.0, phi, 0.0),
        DVec3::new(-1.0, -phi, 0.0),
        DVec3::new(1.0, -phi, 0.0),
        DVec3::new(0.0, -1.0, phi),
        DVec3::new(0.0, 1.0, phi),
        DVec3::new(0.0, -1.0, -phi),
        DVec3::new(0.0, 1.0, -phi),
        DVec3::new(phi, 0.0, -1.0),
        DVec3::new(phi, 0.0, 1.0),
        DVec3::new(-phi, 0.0, -1.0),
        DVec3::new(-phi, 0.0, 1.0),
    ]
    .map(DVec3::normalize)
});

/// The 12 icosahedron vertices on the unit sphere.
pub fn icosahedron_vertices() -> &'static [DVec3; 12] {
    &VERTICES
}

/// Fresh level-0 patches, one per icosahedron face.
pub fn root_patches() -> Vec<Patch> {
    let vertices = icosahedron_vertices();
    ICOSAHEDRON_FACES
        .iter()
        .map(|&[a, b, c]| Patch::new([vertices[a], vertices[b], vertices[c]], 0))
        .collect()
}

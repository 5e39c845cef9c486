//! Body descriptors: the immutable per-body parameters the LOD engine reads.
//!
//! Orbital simulation owns where a body is and how it is oriented; this module
//! only describes what the renderer needs to know about it each frame.

use std::fmt;

use glam::{DMat3, DMat4, DQuat, DVec3};

/// Stable identifier of a rendered body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u32);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body#{}", self.0)
    }
}

/// Broad surface category, used to size the relief allowance for culling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TerrainKind {
    /// Stars: turbulent but shallow surface.
    Stellar,
    /// Gas giants: banded, almost no relief.
    Gaseous,
    /// Ocean worlds with low islands.
    Oceanic,
    /// Earth-like continents and hills.
    Temperate,
    /// Airless moons with craters.
    Cratered,
    /// Volcanic worlds with tall shields and calderas.
    Volcanic,
    /// Extreme ridges and peaks.
    Mountainous,
}

impl TerrainKind {
    /// Fraction of the radius reserved below the surface for displaced terrain.
    ///
    /// Horizon culling tests against a sphere shrunk by this fraction so that
    /// peaks poking over the horizon are not culled.
    pub fn noise_allowance(self) -> f64 {
        match self {
            TerrainKind::Stellar | TerrainKind::Gaseous => 0.04,
            TerrainKind::Oceanic => 0.06,
            TerrainKind::Temperate => 0.08,
            TerrainKind::Cratered => 0.10,
            TerrainKind::Volcanic => 0.12,
            TerrainKind::Mountainous => 0.15,
        }
    }
}

/// Procedural surface noise parameters handed through to the shading stage.
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainNoise {
    /// Surface category.
    pub kind: TerrainKind,
    /// Peak displacement as a fraction of the radius.
    pub amplitude: f64,
    /// Base frequency on the unit sphere.
    pub frequency: f64,
    /// Number of fractal octaves.
    pub octaves: u8,
    /// Noise seed.
    pub seed: u64,
}

impl TerrainNoise {
    /// Reasonable noise defaults for a terrain kind.
    pub fn for_kind(kind: TerrainKind) -> Self {
        let (frequency, octaves) = match kind {
            TerrainKind::Stellar => (3.0, 4),
            TerrainKind::Gaseous => (1.5, 3),
            TerrainKind::Oceanic => (2.0, 5),
            TerrainKind::Temperate => (2.5, 6),
            TerrainKind::Cratered => (4.0, 6),
            TerrainKind::Volcanic => (3.0, 7),
            TerrainKind::Mountainous => (3.5, 8),
        };
        Self {
            kind,
            amplitude: kind.noise_allowance() * 0.5,
            frequency,
            octaves,
            seed: 0,
        }
    }
}

/// A ring system around a body, in multiples of the body radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RingSystem {
    /// Inner edge radius / body radius.
    pub inner: f64,
    /// Outer edge radius / body radius.
    pub outer: f64,
}

/// Everything the patch-LOD engine needs to know about one body.
#[derive(Clone, Debug, PartialEq)]
pub struct BodyDescriptor {
    /// Stable identifier, also the cache and rotation-tracker key.
    pub id: BodyId,
    /// Human-readable name, for logs.
    pub name: String,
    /// Radius of the undisplaced sphere.
    pub radius: f64,
    /// Center in absolute world space.
    pub world_position: DVec3,
    /// Current spin orientation.
    pub orientation: DQuat,
    /// Surface noise parameters.
    pub terrain: TerrainNoise,
    /// Scales every LOD distance; above 1 refines earlier.
    pub lod_multiplier: f64,
    /// Fraction of the radius reserved for surface relief; pads culling bounds.
    pub max_displacement: f64,
    /// Optional rings, rendered by an external collaborator.
    pub rings: Option<RingSystem>,
}

impl BodyDescriptor {
    /// Construct a body with defaults derived from its terrain kind.
    ///
    /// # Panics
    ///
    /// Panics if `radius` is not positive and finite.
    pub fn new(
        id: BodyId,
        name: impl Into<String>,
        radius: f64,
        world_position: DVec3,
        kind: TerrainKind,
    ) -> Self {
        assert!(
            radius > 0.0 && radius.is_finite(),
            "Body radius must be positive, got {radius}"
        );
        let terrain = TerrainNoise::for_kind(kind);
        Self {
            id,
            name: name.into(),
            radius,
            world_position,
            orientation: DQuat::IDENTITY,
            max_displacement: terrain.amplitude,
            terrain,
            lod_multiplier: 1.0,
            rings: None,
        }
    }

    /// Set the LOD distance multiplier.
    pub fn with_lod_multiplier(mut self, lod_multiplier: f64) -> Self {
        self.lod_multiplier = lod_multiplier;
        self
    }

    /// Attach a ring system.
    pub fn with_rings(mut self, rings: RingSystem) -> Self {
        self.rings = Some(rings);
        self
    }

    /// Set the spin orientation.
    pub fn with_orientation(mut self, orientation: DQuat) -> Self {
        self.orientation = orientation;
        self
    }

    /// Absolute world transform (rotation then translation, no scale).
    pub fn world_matrix(&self) -> DMat4 {
        DMat4::from_rotation_translation(self.orientation, self.world_position)
    }

    /// Normal matrix for the world transform. Rotation-only, so it is the
    /// rotation block itself.
    pub fn normal_matrix(&self) -> DMat3 {
        DMat3::from_quat(self.orientation)
    }

    /// Radius fraction reserved for terrain by the horizon test.
    pub fn noise_allowance(&self) -> f64 {
        self.terrain.kind.noise_allowance()
    }

    /// Distance from `point` to the undisplaced surface (negative inside).
    pub fn altitude_of(&self, point: DVec3) -> f64 {
        point.distance(self.world_position) - self.radius
    }
}

//! A small star system on simple circular orbits.

use glam::{DQuat, DVec3};
use orbis_geodesic::{BodyDescriptor, BodyId, RingSystem, TerrainKind};

pub const STAR: BodyId = BodyId(0);
pub const TERRA: BodyId = BodyId(1);
pub const LUNA: BodyId = BodyId(2);
pub const GIANT: BodyId = BodyId(3);

/// Orbit and spin of one body around its parent.
struct Orbit {
    parent: Option<BodyId>,
    distance: f64,
    period: f64,
    phase: f64,
    spin_period: f64,
}

impl Orbit {
    fn offset(&self, time: f64) -> DVec3 {
        if self.period <= 0.0 {
            return DVec3::ZERO;
        }
        let angle = self.phase + std::f64::consts::TAU * time / self.period;
        DVec3::new(angle.cos(), 0.0, angle.sin()) * self.distance
    }

    fn orientation(&self, time: f64) -> DQuat {
        if self.spin_period <= 0.0 {
            return DQuat::IDENTITY;
        }
        DQuat::from_rotation_y(std::f64::consts::TAU * time / self.spin_period)
    }
}

/// Body templates plus their orbits. Parents are listed before children.
pub struct StarSystem {
    bodies: Vec<(BodyDescriptor, Orbit)>,
}

impl StarSystem {
    /// Star, a temperate planet with a moon, and a ringed gas giant.
    pub fn demo() -> Self {
        let body = |id, name: &str, radius, kind| {
            BodyDescriptor::new(id, name, radius, DVec3::ZERO, kind)
        };
        let bodies = vec![
            (
                body(STAR, "Sol", 40.0, TerrainKind::Stellar).with_lod_multiplier(0.5),
                Orbit {
                    parent: None,
                    distance: 0.0,
                    period: 0.0,
                    phase: 0.0,
                    spin_period: 0.0,
                },
            ),
            (
                body(TERRA, "Terra", 1.0, TerrainKind::Temperate),
                Orbit {
                    parent: Some(STAR),
                    distance: 2_000.0,
                    period: 3_600.0,
                    phase: 0.0,
                    spin_period: 240.0,
                },
            ),
            (
                body(LUNA, "Luna", 0.27, TerrainKind::Cratered),
                Orbit {
                    parent: Some(TERRA),
                    distance: 6.0,
                    period: 120.0,
                    phase: 1.2,
                    spin_period: 120.0,
                },
            ),
            (
                body(GIANT, "Jove", 11.0, TerrainKind::Gaseous).with_rings(RingSystem {
                    inner: 1.3,
                    outer: 2.4,
                }),
                Orbit {
                    parent: Some(STAR),
                    distance: 9_000.0,
                    period: 20_000.0,
                    phase: 2.5,
                    spin_period: 60.0,
                },
            ),
        ];
        Self { bodies }
    }

    /// Number of bodies.
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Every body placed at `time` seconds.
    pub fn at(&self, time: f64) -> Vec<BodyDescriptor> {
        let mut placed: Vec<BodyDescriptor> = Vec::with_capacity(self.bodies.len());
        for (template, orbit) in &self.bodies {
            let parent_position = orbit
                .parent
                .and_then(|id| placed.iter().find(|b| b.id == id))
                .map_or(DVec3::ZERO, |p| p.world_position);
            let mut body = template.clone().with_orientation(orbit.orientation(time));
            body.world_position = parent_position + orbit.offset(time);
            placed.push(body);
        }
        placed
    }
}

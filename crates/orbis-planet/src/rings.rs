//! Deferred ring draws.
//!
//! Rings are translucent and have to be drawn after every opaque body, so the
//! renderer only records a request for each ringed body and hands the list to
//! the ring collaborator at the end of the frame.

use glam::{DQuat, DVec3};
use orbis_geodesic::{BodyDescriptor, BodyId, RingSystem};

/// Everything the ring collaborator needs to draw one body's rings.
#[derive(Clone, Debug, PartialEq)]
pub struct RingRenderRequest {
    /// Owning body.
    pub body_id: BodyId,
    /// Ring extents in body radii.
    pub rings: RingSystem,
    /// Body center relative to the camera.
    pub relative_center: DVec3,
    /// Body radius.
    pub body_radius: f64,
    /// Body orientation; rings lie in the body's equatorial plane.
    pub orientation: DQuat,
}

impl RingRenderRequest {
    /// Request for `body` if it has rings.
    pub fn for_body(body: &BodyDescriptor, relative_center: DVec3) -> Option<Self> {
        body.rings.map(|rings| Self {
            body_id: body.id,
            rings,
            relative_center,
            body_radius: body.radius,
            orientation: body.orientation,
        })
    }

    /// Camera distance to the body center.
    pub fn camera_distance(&self) -> f64 {
        self.relative_center.length()
    }
}

/// Requests collected during one frame.
#[derive(Clone, Debug, Default)]
pub struct RingQueue {
    requests: Vec<RingRenderRequest>,
}

impl RingQueue {
    /// An empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request.
    pub fn push(&mut self, request: RingRenderRequest) {
        self.requests.push(request);
    }

    /// Number of pending requests.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Returns true if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Take every pending request in submission order.
    pub fn drain(&mut self) -> Vec<RingRenderRequest> {
        std::mem::take(&mut self.requests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbis_geodesic::TerrainKind;

    fn giant() -> BodyDescriptor {
        BodyDescriptor::new(BodyId(5), "Giant", 4.0, DVec3::ZERO, TerrainKind::Gaseous).with_rings(
            RingSystem {
                inner: 1.4,
                outer: 2.3,
            },
        )
    }

    #[test]
    fn test_only_ringed_bodies_produce_requests() {
        let moon = BodyDescriptor::new(BodyId(6), "Moon", 1.0, DVec3::ZERO, TerrainKind::Cratered);
        assert!(RingRenderRequest::for_body(&moon, DVec3::ONE).is_none());
        let request = RingRenderRequest::for_body(&giant(), DVec3::new(0.0, 3.0, 4.0)).unwrap();
        assert_eq!(request.body_id, BodyId(5));
        assert_eq!(request.camera_distance(), 5.0);
    }

    #[test]
    fn test_drain_empties_queue_in_order() {
        let mut queue = RingQueue::new();
        for z in [10.0, 20.0] {
            queue.push(RingRenderRequest::for_body(&giant(), DVec3::new(0.0, 0.0, z)).unwrap());
        }
        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].relative_center.z, 10.0);
        assert!(queue.is_empty());
    }
}

//! Snap resolver: bind a raw pointer location to an existing node.
//!
//! Every accepted segment endpoint must be a node, so the connectivity
//! engine only ever compares [`NodeId`]s. Segment endpoints are nodes
//! themselves, which makes "snap to the end of an existing line" fall out
//! of the node scan with no separate pass over segments.

use crate::store::PointStore;
use crate::types::{NodeId, Point};

/// Resolves pointer locations to nodes within a fixed radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapResolver {
    radius: f64,
}

impl SnapResolver {
    /// Create a resolver with the given snap radius.
    #[must_use]
    pub const fn new(radius: f64) -> Self {
        Self { radius }
    }

    /// The snap radius.
    #[must_use]
    pub const fn radius(&self) -> f64 {
        self.radius
    }

    /// Find the node nearest to `location` whose distance is at most the
    /// snap radius.
    ///
    /// Ties go to the lowest [`NodeId`], i.e. the node created first.
    /// Returns `None` when nothing qualifies; the caller then materializes
    /// a junction at `location` (or rejects the drag, for a start point).
    #[must_use]
    pub fn resolve(&self, store: &PointStore, location: Point) -> Option<NodeId> {
        store
            .within_radius(location, self.radius)
            .min_by(|(a_id, a_dist), (b_id, b_dist)| {
                a_dist.total_cmp(b_dist).then_with(|| a_id.cmp(b_id))
            })
            .map(|(id, _)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> PointStore {
        PointStore::with_originals([
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
        ])
    }

    #[test]
    fn resolves_nearest_within_radius() {
        let resolver = SnapResolver::new(20.0);
        assert_eq!(
            resolver.resolve(&store(), Point::new(95.0, 4.0)),
            Some(NodeId::new(1))
        );
    }

    #[test]
    fn empty_space_resolves_to_none() {
        let resolver = SnapResolver::new(20.0);
        assert_eq!(resolver.resolve(&store(), Point::new(50.0, 50.0)), None);
    }

    #[test]
    fn resolving_twice_returns_same_node() {
        let resolver = SnapResolver::new(20.0);
        let s = store();
        let location = Point::new(3.0, -2.0);
        let first = resolver.resolve(&s, location);
        let second = resolver.resolve(&s, location);
        assert_eq!(first, second);
        assert_eq!(first, Some(NodeId::new(0)));
    }

    #[test]
    fn boundary_is_inclusive() {
        let radius = 22.5;
        let resolver = SnapResolver::new(radius);
        let s = store();
        assert_eq!(
            resolver.resolve(&s, Point::new(radius, 0.0)),
            Some(NodeId::new(0))
        );
        assert_eq!(resolver.resolve(&s, Point::new(radius + 1e-6, 0.0)), None);
    }

    #[test]
    fn just_outside_one_node_falls_back_to_next_nearest() {
        let s = PointStore::with_originals([Point::new(0.0, 0.0), Point::new(30.0, 0.0)]);
        let resolver = SnapResolver::new(15.0);
        // 15.5 from the first node, 14.5 from the second.
        assert_eq!(
            resolver.resolve(&s, Point::new(15.5, 0.0)),
            Some(NodeId::new(1))
        );
    }

    #[test]
    fn ties_go_to_first_inserted() {
        let s = PointStore::with_originals([Point::new(0.0, 0.0), Point::new(20.0, 0.0)]);
        let resolver = SnapResolver::new(15.0);
        assert_eq!(
            resolver.resolve(&s, Point::new(10.0, 0.0)),
            Some(NodeId::new(0))
        );
    }

    #[test]
    fn junctions_are_snap_targets() {
        let mut s = store();
        let j = s.add_junction(Point::new(300.0, 300.0));
        let resolver = SnapResolver::new(20.0);
        assert_eq!(resolver.resolve(&s, Point::new(310.0, 305.0)), Some(j));
    }
}

//! Point store: the node set of the puzzle graph.
//!
//! Holds the round's original points and any junctions the player has
//! materialized, in insertion order. Each node gets a [`NodeId`] equal to
//! its insertion index. An R\*-tree over node positions backs the radius
//! queries made by the [`snap`](crate::snap) resolver.
//!
//! Originals are normally all added during setup, before the store is
//! handed to an [`Engine`](crate::connectivity::Engine). After that the
//! engine only exposes the store by shared reference, so the only way a
//! node can be added is as a junction through
//! [`Engine::add_segment`](crate::connectivity::Engine::add_segment).
//! Node kinds are recorded per node, so ids stay correct even when a
//! caller interleaves the two kinds during setup.

use std::fmt;

use rstar::RTree;
use rstar::primitives::GeomWithData;

use crate::types::{Node, NodeId, NodeKind, Point};

/// A node position tagged with its id, suitable for R\*-tree insertion.
type IndexedNode = GeomWithData<[f64; 2], NodeId>;

/// The set of nodes in one round.
#[derive(Clone)]
pub struct PointStore {
    nodes: Vec<Node>,
    original_count: usize,
    index: RTree<IndexedNode>,
}

impl PointStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            original_count: 0,
            index: RTree::new(),
        }
    }

    /// Create a store holding the given original points, in order.
    #[must_use]
    pub fn with_originals(positions: impl IntoIterator<Item = Point>) -> Self {
        let mut store = Self::new();
        for p in positions {
            store.add_original(p);
        }
        store
    }

    /// Add an original puzzle point.
    pub fn add_original(&mut self, position: Point) -> NodeId {
        self.original_count += 1;
        self.push(position, NodeKind::Original)
    }

    /// Add a junction point.
    ///
    /// Callers resolve the location through the snap resolver first, so a
    /// junction is never created on top of an existing node.
    pub fn add_junction(&mut self, position: Point) -> NodeId {
        self.push(position, NodeKind::Junction)
    }

    fn push(&mut self, position: Point, kind: NodeKind) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Node { position, kind });
        self.index
            .insert(GeomWithData::new(position.to_array(), id));
        id
    }

    /// Look up a node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// All nodes in insertion order; the slice index is the [`NodeId`].
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All nodes with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId::new(i), node))
    }

    /// Ids of the original puzzle points.
    pub fn original_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter()
            .filter(|(_, node)| node.kind == NodeKind::Original)
            .map(|(id, _)| id)
    }

    /// Ids of every node.
    pub fn all_node_ids(&self) -> impl Iterator<Item = NodeId> + use<> {
        (0..self.nodes.len()).map(NodeId::new)
    }

    /// Number of original points.
    #[must_use]
    pub const fn original_count(&self) -> usize {
        self.original_count
    }

    /// Number of junctions.
    #[must_use]
    pub const fn junction_count(&self) -> usize {
        self.nodes.len() - self.original_count
    }

    /// Total number of nodes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the store holds no nodes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes within `radius` of `location` (inclusive), with their squared
    /// distance, in no particular order.
    pub(crate) fn within_radius(
        &self,
        location: Point,
        radius: f64,
    ) -> impl Iterator<Item = (NodeId, f64)> + '_ {
        let radius_sq = radius * radius;
        // The tree only prefilters; the boundary test below is exact.
        let query_sq = radius_sq * (1.0 + 1e-9);
        self.index
            .locate_within_distance(location.to_array(), query_sq)
            .filter_map(move |entry| {
                let [x, y] = *entry.geom();
                let d_sq = location.distance_squared(Point::new(x, y));
                (d_sq <= radius_sq).then_some((entry.data, d_sq))
            })
    }
}

impl Default for PointStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PointStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointStore")
            .field("nodes", &self.nodes)
            .field("original_count", &self.original_count)
            .finish_non_exhaustive()
    }
}

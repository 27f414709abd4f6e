//! Connectivity engine: segment admission and incremental components.
//!
//! The engine owns the round's [`PointStore`], the drawn [`Segment`]s and a
//! [`UnionFind`] partition over node indices. Each accepted segment is one
//! `union` of its two endpoints, so the partition is never stale and never
//! needs a traversal from some remembered root.
//!
//! The engine also counts the components that hold at least one node the
//! win rule requires. A `union` of two such components decrements the
//! count, so the win check after each insertion is constant time.
//!
//! # State machine
//!
//! ```text
//! Idle --first accepted segment--> InProgress --win rule holds--> Won
//! ```
//!
//! The win rule is evaluated after every insertion. Once `Won`, every
//! further [`add_segment`](Engine::add_segment) is rejected with
//! [`EngineError::RoundOver`].

use std::collections::HashMap;

use petgraph::unionfind::UnionFind;
use serde::{Deserialize, Serialize};

use crate::geometry::distance;
use crate::snap::SnapResolver;
use crate::store::PointStore;
use crate::types::{EngineError, NodeId, NodeKind, Point, Segment, WinRule};

/// Lifecycle of one round inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// Points placed, nothing drawn yet.
    Idle,
    /// At least one segment drawn, win rule not yet satisfied.
    InProgress,
    /// Every required node shares one component.
    Won,
}

/// Identifier of a component: the union-find representative of its nodes.
///
/// Only meaningful until the next accepted segment, which may merge
/// components and change representatives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(usize);

/// Result of an accepted segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentAdded {
    /// Node the segment starts on.
    pub start: NodeId,
    /// Node the segment ends on.
    pub end: NodeId,
    /// Length of the new segment.
    pub length: f64,
    /// The junction created for the end point, if it did not snap.
    pub junction: Option<NodeId>,
    /// Engine state after the insertion.
    pub state: EngineState,
}

/// Segment list plus connected-component partition for one round.
#[derive(Debug, Clone)]
pub struct Engine {
    store: PointStore,
    resolver: SnapResolver,
    win_rule: WinRule,
    segments: Vec<Segment>,
    components: UnionFind<usize>,
    /// Per node; only meaningful at union-find roots: whether the root's
    /// component holds a required node.
    holds_required: Vec<bool>,
    /// Components holding at least one required node.
    required_components: usize,
    total_length: f64,
    state: EngineState,
}

impl Engine {
    /// Start a round over the given store (original points only, in
    /// practice) in the [`EngineState::Idle`] state.
    #[must_use]
    pub fn new(store: PointStore, snap_radius: f64, win_rule: WinRule) -> Self {
        let components = UnionFind::new(store.len());
        let holds_required: Vec<bool> = store
            .nodes()
            .iter()
            .map(|node| win_rule.requires(node.kind))
            .collect();
        let required_components = holds_required.iter().filter(|&&r| r).count();
        Self {
            store,
            resolver: SnapResolver::new(snap_radius),
            win_rule,
            segments: Vec::new(),
            components,
            holds_required,
            required_components,
            total_length: 0.0,
            state: EngineState::Idle,
        }
    }

    /// Admit a segment drawn from `raw_start` to `raw_end`.
    ///
    /// The start must snap to an existing node. The end snaps to a node
    /// when one is within range; otherwise a junction is materialized at
    /// `raw_end`. Rejections leave the engine unchanged.
    ///
    /// # Errors
    ///
    /// - [`EngineError::RoundOver`] once the round is won.
    /// - [`EngineError::InvalidStart`] if `raw_start` is not near a node.
    /// - [`EngineError::DegenerateSegment`] if both ends resolve to the
    ///   same node.
    pub fn add_segment(
        &mut self,
        raw_start: Point,
        raw_end: Point,
    ) -> Result<SegmentAdded, EngineError> {
        if self.state == EngineState::Won {
            return Err(EngineError::RoundOver);
        }

        let start = self
            .resolver
            .resolve(&self.store, raw_start)
            .ok_or(EngineError::InvalidStart)?;

        // Checked before any junction exists so a rejection stays a no-op.
        let snapped_end = self.resolver.resolve(&self.store, raw_end);
        if snapped_end == Some(start) {
            return Err(EngineError::DegenerateSegment);
        }

        let (end, junction) = match snapped_end {
            Some(id) => (id, None),
            None => {
                let id = self.store.add_junction(raw_end);
                let set = self.components.new_set();
                debug_assert_eq!(set, id.index(), "union-find out of step with store");
                let required = self.win_rule.requires(NodeKind::Junction);
                self.holds_required.push(required);
                self.required_components += usize::from(required);
                tracing::debug!(%id, x = raw_end.x, y = raw_end.y, "materialized junction");
                (id, Some(id))
            }
        };

        let length = distance(self.position(start), self.position(end));
        self.segments.push(Segment::new(start, end, length));
        self.merge(start, end);
        self.total_length += length;

        self.state = if self.is_fully_connected() {
            EngineState::Won
        } else {
            EngineState::InProgress
        };

        tracing::debug!(
            %start,
            %end,
            length,
            total_length = self.total_length,
            state = ?self.state,
            "accepted segment",
        );

        Ok(SegmentAdded {
            start,
            end,
            length,
            junction,
            state: self.state,
        })
    }

    fn merge(&mut self, a: NodeId, b: NodeId) {
        let root_a = self.components.find_mut(a.index());
        let root_b = self.components.find_mut(b.index());
        if root_a == root_b {
            return;
        }
        let (req_a, req_b) = (self.holds_required[root_a], self.holds_required[root_b]);
        self.components.union(root_a, root_b);
        let root = self.components.find_mut(root_a);
        self.holds_required[root] = req_a || req_b;
        if req_a && req_b {
            self.required_components -= 1;
        }
    }

    fn position(&self, id: NodeId) -> Point {
        self.store.nodes()[id.index()].position
    }

    /// Whether every node required by the win rule shares one component.
    ///
    /// Trivially `true` when the rule requires at most one node. This is a
    /// pure query; the engine only enters [`EngineState::Won`] on an
    /// insertion.
    #[must_use]
    pub const fn is_fully_connected(&self) -> bool {
        self.required_components <= 1
    }

    /// Component of a node, or `None` for an unknown id.
    #[must_use]
    pub fn component_of(&self, id: NodeId) -> Option<ComponentId> {
        (id.index() < self.store.len()).then(|| ComponentId(self.components.find(id.index())))
    }

    /// Whether two nodes are connected by drawn segments. Unknown ids are
    /// never connected.
    #[must_use]
    pub fn same_component(&self, a: NodeId, b: NodeId) -> bool {
        let len = self.store.len();
        a.index() < len && b.index() < len && self.components.equiv(a.index(), b.index())
    }

    /// All components as groups of node ids.
    ///
    /// Groups are ordered by their smallest member and each group is
    /// sorted, so the result is independent of union order.
    #[must_use]
    pub fn components(&self) -> Vec<Vec<NodeId>> {
        let mut group_of_root: HashMap<usize, usize> = HashMap::new();
        let mut groups: Vec<Vec<NodeId>> = Vec::new();
        for id in self.store.all_node_ids() {
            let root = self.components.find(id.index());
            let group = *group_of_root.entry(root).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[group].push(id);
        }
        groups
    }

    /// Dense component label per node, indexed by [`NodeId::index`].
    ///
    /// Labels count up from zero in order of each component's smallest
    /// member.
    #[must_use]
    pub fn component_labels(&self) -> Vec<usize> {
        let mut labels = vec![0; self.store.len()];
        for (label, group) in self.components().iter().enumerate() {
            for id in group {
                labels[id.index()] = label;
            }
        }
        labels
    }

    /// The round's nodes.
    #[must_use]
    pub const fn store(&self) -> &PointStore {
        &self.store
    }

    /// Accepted segments in insertion order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Sum of all accepted segment lengths.
    #[must_use]
    pub const fn total_length(&self) -> f64 {
        self.total_length
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> EngineState {
        self.state
    }

    /// The win rule in effect.
    #[must_use]
    pub const fn win_rule(&self) -> WinRule {
        self.win_rule
    }

    /// The snap resolver used for both segment ends.
    #[must_use]
    pub const fn resolver(&self) -> &SnapResolver {
        &self.resolver
    }
}

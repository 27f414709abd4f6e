//! Shared types for the dotlink puzzle engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A 2D point in play-bounds coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (from the left edge of the play area).
    pub x: f64,
    /// Vertical position (from the top edge of the play area).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    pub(crate) const fn to_array(self) -> [f64; 2] {
        [self.x, self.y]
    }
}

/// Size of the rectangular play area. The origin is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Width of the play area.
    pub width: f64,
    /// Height of the play area.
    pub height: f64,
}

impl Bounds {
    /// Create new bounds.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Stable identity of a node in a [`PointStore`](crate::store::PointStore).
///
/// Assigned in insertion order when the node is created and never reused
/// within a round. All connectivity bookkeeping works on `NodeId`s, never
/// on coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position of this node in insertion order.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Whether a node was part of the puzzle or created by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A puzzle point generated at round start.
    Original,
    /// A point materialized where a drawn segment ended away from any node.
    Junction,
}

/// A node of the puzzle graph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Location of the node. Never changes after creation.
    pub position: Point,
    /// Original puzzle point or player-created junction.
    pub kind: NodeKind,
}

/// A drawn segment between two nodes.
///
/// Only [`Engine::add_segment`](crate::connectivity::Engine::add_segment)
/// creates segments, so both endpoints always exist in the point store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    a: NodeId,
    b: NodeId,
    length: f64,
}

impl Segment {
    pub(crate) const fn new(a: NodeId, b: NodeId, length: f64) -> Self {
        Self { a, b, length }
    }

    /// The node the drag started from.
    #[must_use]
    pub const fn start(&self) -> NodeId {
        self.a
    }

    /// The node the drag ended on.
    #[must_use]
    pub const fn end(&self) -> NodeId {
        self.b
    }

    /// Euclidean length between the two endpoint nodes.
    #[must_use]
    pub const fn length(&self) -> f64 {
        self.length
    }
}

/// Difficulty setting, applied as a multiplier on the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Score multiplier 0.8.
    Easy,
    /// Score multiplier 1.0.
    #[default]
    Medium,
    /// Score multiplier 1.2.
    Hard,
}

impl Difficulty {
    /// Multiplier applied to the raw score.
    #[must_use]
    pub const fn factor(self) -> f64 {
        match self {
            Self::Easy => 0.8,
            Self::Medium => 1.0,
            Self::Hard => 1.2,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        })
    }
}

/// Which nodes must share one component for the round to be won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinRule {
    /// Only the puzzle's original points must be connected. Junctions are
    /// scaffolding.
    #[default]
    OriginalNodes,
    /// Every node, junctions included, must be connected.
    AllNodes,
}

impl WinRule {
    /// Whether a node of this kind must join the winning component.
    #[must_use]
    pub const fn requires(self, kind: NodeKind) -> bool {
        match self {
            Self::OriginalNodes => matches!(kind, NodeKind::Original),
            Self::AllNodes => true,
        }
    }
}

/// Configuration for a round.
///
/// `snap_radius` and `min_separation` are derived from `node_radius` when
/// left unset; use [`snap_radius`](Self::snap_radius) and
/// [`min_separation`](Self::min_separation) to read the effective values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Number of original points generated per round.
    pub point_count: usize,

    /// Visual radius of a drawn node.
    pub node_radius: f64,

    /// Maximum distance at which a pointer location binds to an existing
    /// node. Defaults to 1.5x `node_radius`.
    pub snap_radius: Option<f64>,

    /// Minimum pairwise distance between generated points. Defaults to
    /// 2x `node_radius`.
    pub min_separation: Option<f64>,

    /// Score multiplier selection.
    pub difficulty: Difficulty,

    /// Which nodes must be connected to win.
    pub win_rule: WinRule,

    /// Size of the play area.
    pub bounds: Bounds,

    /// Candidate draws per point before the separation is relaxed.
    pub max_placement_attempts: usize,
}

impl GameConfig {
    /// Default number of original points.
    pub const DEFAULT_POINT_COUNT: usize = 10;
    /// Default node radius.
    pub const DEFAULT_NODE_RADIUS: f64 = 15.0;
    /// Snap radius as a multiple of the node radius.
    pub const SNAP_RADIUS_FACTOR: f64 = 1.5;
    /// Minimum separation as a multiple of the node radius.
    pub const MIN_SEPARATION_FACTOR: f64 = 2.0;
    /// Default play area.
    pub const DEFAULT_BOUNDS: Bounds = Bounds::new(800.0, 600.0);
    /// Default candidate draws per point before relaxing separation.
    pub const DEFAULT_MAX_PLACEMENT_ATTEMPTS: usize = 1000;

    /// Effective snap radius.
    #[must_use]
    pub fn snap_radius(&self) -> f64 {
        self.snap_radius
            .unwrap_or(self.node_radius * Self::SNAP_RADIUS_FACTOR)
    }

    /// Effective minimum separation between generated points.
    #[must_use]
    pub fn min_separation(&self) -> f64 {
        self.min_separation
            .unwrap_or(self.node_radius * Self::MIN_SEPARATION_FACTOR)
    }

    /// Check the configuration for values no round can be built from.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] describing the first
    /// offending field.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.point_count < 2 {
            return Err(EngineError::InvalidConfig(format!(
                "point_count must be at least 2, got {}",
                self.point_count
            )));
        }
        if !(self.node_radius.is_finite() && self.node_radius > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "node_radius must be positive, got {}",
                self.node_radius
            )));
        }
        let snap = self.snap_radius();
        if !(snap.is_finite() && snap > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "snap_radius must be positive, got {snap}"
            )));
        }
        let separation = self.min_separation();
        if !(separation.is_finite() && separation >= 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "min_separation must be non-negative, got {separation}"
            )));
        }
        let Bounds { width, height } = self.bounds;
        let diameter = 2.0 * self.node_radius;
        if !(width.is_finite() && height.is_finite() && width > diameter && height > diameter) {
            return Err(EngineError::InvalidConfig(format!(
                "bounds {width}x{height} cannot hold a node of radius {}",
                self.node_radius
            )));
        }
        if self.max_placement_attempts == 0 {
            return Err(EngineError::InvalidConfig(
                "max_placement_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            point_count: Self::DEFAULT_POINT_COUNT,
            node_radius: Self::DEFAULT_NODE_RADIUS,
            snap_radius: None,
            min_separation: None,
            difficulty: Difficulty::default(),
            win_rule: WinRule::default(),
            bounds: Self::DEFAULT_BOUNDS,
            max_placement_attempts: Self::DEFAULT_MAX_PLACEMENT_ATTEMPTS,
        }
    }
}

/// Reasons the engine declines an input.
///
/// Every rejection leaves the round untouched. The render layer decides
/// whether to show feedback; for the player the line is simply not drawn.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The drag did not begin within the snap radius of any node.
    #[error("drag did not start on a node")]
    InvalidStart,

    /// Both ends of the drag resolved to the same node.
    #[error("segment start and end resolve to the same node")]
    DegenerateSegment,

    /// The round is already won and accepts no further segments.
    #[error("round is already complete")]
    RoundOver,

    /// No round has been started yet.
    #[error("no round in progress")]
    NoRound,

    /// The configuration cannot produce a playable round.
    #[error("invalid game configuration: {0}")]
    InvalidConfig(String),
}

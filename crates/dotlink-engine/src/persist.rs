//! Persistence seams: best score and the per-round action log.
//!
//! The engine never talks to storage or the network directly. A
//! [`Game`](crate::round::Game) reads and writes the best score through a
//! [`ScoreStore`] and reports every accepted segment (as a
//! [`RoundSnapshot`]) and every completed round to an [`EventSink`].
//! Identity and transport are the implementor's business.
//!
//! Both traits carry an associated error type. Failures are logged and
//! never interrupt play.

use std::convert::Infallible;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::connectivity::{Engine, EngineState};
use crate::round::RoundOutcome;
use crate::types::{NodeId, NodeKind, Point};

/// Serde support for `std::time::Duration` as fractional seconds.
pub(crate) mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// A node as seen by renderers and logs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapshotNode {
    /// Stable node id.
    pub id: NodeId,
    /// Node position.
    pub position: Point,
    /// Original or junction.
    pub kind: NodeKind,
    /// Dense component label; equal labels mean connected.
    pub component: usize,
}

/// A segment as seen by renderers and logs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSegment {
    /// Start node id.
    pub start: NodeId,
    /// End node id.
    pub end: NodeId,
    /// Start node position.
    pub from: Point,
    /// End node position.
    pub to: Point,
    /// Segment length.
    pub length: f64,
}

/// Point-in-time copy of a round, for rendering and the action log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSnapshot {
    /// Every node with its component label.
    pub nodes: Vec<SnapshotNode>,
    /// Every accepted segment in drawing order.
    pub segments: Vec<SnapshotSegment>,
    /// Sum of segment lengths.
    pub total_length: f64,
    /// Time since the round started (seconds).
    #[serde(with = "duration_serde")]
    pub elapsed: Duration,
    /// Engine state when captured.
    pub state: EngineState,
}

impl RoundSnapshot {
    /// Capture the current state of `engine`.
    #[must_use]
    pub fn capture(engine: &Engine, elapsed: Duration) -> Self {
        let labels = engine.component_labels();
        let store = engine.store();
        let nodes = store
            .iter()
            .map(|(id, node)| SnapshotNode {
                id,
                position: node.position,
                kind: node.kind,
                component: labels[id.index()],
            })
            .collect();
        let position = |id: NodeId| store.nodes()[id.index()].position;
        let segments = engine
            .segments()
            .iter()
            .map(|s| SnapshotSegment {
                start: s.start(),
                end: s.end(),
                from: position(s.start()),
                to: position(s.end()),
                length: s.length(),
            })
            .collect();

        Self {
            nodes,
            segments,
            total_length: engine.total_length(),
            elapsed,
            state: engine.state(),
        }
    }
}

/// Where the best score lives between rounds.
pub trait ScoreStore {
    /// Storage failure.
    type Error: std::error::Error;

    /// Read the stored best score, if any.
    ///
    /// # Errors
    ///
    /// Implementation-specific storage failure.
    fn load_best_score(&self) -> Result<Option<u64>, Self::Error>;

    /// Replace the stored best score.
    ///
    /// # Errors
    ///
    /// Implementation-specific storage failure.
    fn save_best_score(&mut self, score: u64) -> Result<(), Self::Error>;
}

/// Receiver of round events.
pub trait EventSink {
    /// Delivery failure.
    type Error: std::error::Error;

    /// A new round began; any per-round log should start fresh.
    ///
    /// # Errors
    ///
    /// Implementation-specific delivery failure.
    fn round_started(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// A segment was accepted; `snapshot` is the state right after it.
    ///
    /// # Errors
    ///
    /// Implementation-specific delivery failure.
    fn record_event(&mut self, snapshot: &RoundSnapshot) -> Result<(), Self::Error>;

    /// The round was won.
    ///
    /// # Errors
    ///
    /// Implementation-specific delivery failure.
    fn round_completed(&mut self, outcome: &RoundOutcome) -> Result<(), Self::Error> {
        let _ = outcome;
        Ok(())
    }
}

/// Best score held in memory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryScoreStore {
    best: Option<u64>,
}

impl MemoryScoreStore {
    /// Start with a known best score.
    #[must_use]
    pub const fn with_best(best: u64) -> Self {
        Self { best: Some(best) }
    }

    /// The stored best score.
    #[must_use]
    pub const fn best(&self) -> Option<u64> {
        self.best
    }
}

impl ScoreStore for MemoryScoreStore {
    type Error = Infallible;

    fn load_best_score(&self) -> Result<Option<u64>, Infallible> {
        Ok(self.best)
    }

    fn save_best_score(&mut self, score: u64) -> Result<(), Infallible> {
        self.best = Some(score);
        Ok(())
    }
}

/// A completed round: its snapshots in order plus the outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedRound {
    /// One snapshot per accepted segment.
    pub snapshots: Vec<RoundSnapshot>,
    /// Final score and timing.
    pub outcome: RoundOutcome,
}

/// In-memory action log.
///
/// Collects the snapshots of the round in progress, cleared when a new
/// round starts, and moves them into [`completed`](Self::completed) when
/// the round is won.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionLog {
    current: Vec<RoundSnapshot>,
    completed: Vec<CompletedRound>,
}

impl ActionLog {
    /// Snapshots of the round in progress.
    #[must_use]
    pub fn current(&self) -> &[RoundSnapshot] {
        &self.current
    }

    /// Finished rounds, oldest first.
    #[must_use]
    pub fn completed(&self) -> &[CompletedRound] {
        &self.completed
    }
}

impl EventSink for ActionLog {
    type Error = Infallible;

    fn round_started(&mut self) -> Result<(), Infallible> {
        self.current.clear();
        Ok(())
    }

    fn record_event(&mut self, snapshot: &RoundSnapshot) -> Result<(), Infallible> {
        self.current.push(snapshot.clone());
        Ok(())
    }

    fn round_completed(&mut self, outcome: &RoundOutcome) -> Result<(), Infallible> {
        self.completed.push(CompletedRound {
            snapshots: std::mem::take(&mut self.current),
            outcome: outcome.clone(),
        });
        Ok(())
    }
}

/// Sink that discards everything.
impl EventSink for () {
    type Error = Infallible;

    fn record_event(&mut self, _snapshot: &RoundSnapshot) -> Result<(), Infallible> {
        Ok(())
    }
}

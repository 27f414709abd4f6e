//! dotlink-engine: Pure connect-the-dots puzzle engine (sans-IO).
//!
//! A round scatters original points in the play area. The player drags
//! straight segments between them; a segment end that misses every node
//! becomes a new junction node that later segments can start from. The
//! round is won once every original point belongs to one connected
//! network, and is scored from total drawn length and elapsed time.
//!
//! Segment admission goes:
//! snap start -> snap or materialize end -> union -> win check ->
//! score and best-score update on win.
//!
//! This crate has **no I/O dependencies**. Time comes from a [`Clock`],
//! the best score from a [`ScoreStore`] and round events go to an
//! [`EventSink`]. Rendering reads [`RoundSnapshot`]s; see `dotlink-export`.

pub mod connectivity;
pub mod generate;
pub mod geometry;
pub mod persist;
pub mod round;
pub mod score;
pub mod snap;
pub mod store;
pub mod types;

pub use connectivity::{ComponentId, Engine, EngineState, SegmentAdded};
pub use generate::{generate_for_config, generate_points};
pub use persist::{
    ActionLog, CompletedRound, EventSink, MemoryScoreStore, RoundSnapshot, ScoreStore,
    SnapshotNode, SnapshotSegment,
};
pub use round::{DragPreview, Game, Gesture, GestureOutcome, Recorded, RoundOutcome, RoundState};
pub use score::{Clock, SystemClock, improves_on, score};
pub use snap::SnapResolver;
pub use store::PointStore;
pub use types::{
    Bounds, Difficulty, EngineError, GameConfig, Node, NodeId, NodeKind, Point, Segment, WinRule,
};

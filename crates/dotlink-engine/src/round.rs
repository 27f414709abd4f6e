//! Round lifecycle, scoring and gesture handling.
//!
//! A [`Game`] owns the collaborators that outlive a single round (clock,
//! best-score store, event sink) and the current [`RoundState`], which is
//! replaced wholesale on every start or reset. All mutation goes through
//! `&mut self` methods that finish before returning, so a gesture is
//! either fully committed or has no effect.
//!
//! # Gestures
//!
//! ```text
//! PointerDown on a node  -> drag begins (anchor = that node)
//! PointerMove            -> preview only, never reaches the engine
//! PointerUp              -> exactly one segment attempt, drag ends
//! ```
//!
//! A `PointerDown` away from every node is rejected with
//! [`EngineError::InvalidStart`] and starts no drag. After the round is
//! won every gesture is ignored until the next round.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::connectivity::{Engine, EngineState, SegmentAdded};
use crate::generate::generate_for_config;
use crate::persist::{EventSink, RoundSnapshot, ScoreStore, duration_serde};
use crate::score::{Clock, improves_on, score};
use crate::store::PointStore;
use crate::types::{Difficulty, EngineError, GameConfig, NodeId, Point};

/// Everything belonging to one round.
#[derive(Debug, Clone)]
pub struct RoundState<I> {
    engine: Engine,
    difficulty: Difficulty,
    started_at: I,
    outcome: Option<RoundOutcome>,
}

impl<I> RoundState<I> {
    /// The connectivity engine for this round.
    #[must_use]
    pub const fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Difficulty the round is scored at.
    #[must_use]
    pub const fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// When the round started.
    #[must_use]
    pub const fn started_at(&self) -> &I {
        &self.started_at
    }

    /// The result, once the round is won.
    #[must_use]
    pub const fn outcome(&self) -> Option<&RoundOutcome> {
        self.outcome.as_ref()
    }

    /// Whether the round is won.
    #[must_use]
    pub fn is_won(&self) -> bool {
        self.engine.state() == EngineState::Won
    }
}

/// Result of a won round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundOutcome {
    /// Final score; lower is better.
    pub score: u64,
    /// Total drawn length.
    pub total_length: f64,
    /// Time from round start to the winning segment (seconds).
    #[serde(with = "duration_serde")]
    pub elapsed: Duration,
    /// Difficulty the score was computed at.
    pub difficulty: Difficulty,
    /// Number of segments drawn.
    pub segment_count: usize,
    /// Number of junctions materialized.
    pub junction_count: usize,
    /// Best score after this round.
    pub best_score: Option<u64>,
    /// Whether this round set a new best.
    pub new_best: bool,
}

/// Result of [`Game::record_segment`].
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    /// The accepted segment.
    pub segment: SegmentAdded,
    /// Present when this segment won the round.
    pub outcome: Option<RoundOutcome>,
}

/// Pointer input in play-bounds coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Gesture {
    /// Pointer pressed.
    PointerDown {
        /// Pointer location.
        at: Point,
    },
    /// Pointer moved while pressed.
    PointerMove {
        /// Pointer location.
        at: Point,
    },
    /// Pointer released.
    PointerUp {
        /// Pointer location.
        at: Point,
    },
}

/// What a gesture did.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    /// A drag began on `node`.
    DragStarted {
        /// The node the drag is anchored to.
        node: NodeId,
    },
    /// The preview end point moved.
    PreviewMoved,
    /// The drag ended and a segment was committed.
    Committed(Recorded),
    /// The gesture was declined; nothing changed.
    Rejected(EngineError),
    /// The gesture had nothing to act on (no drag, or round over).
    Ignored,
}

/// Transient drag line for the render layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DragPreview {
    /// The node the drag started on.
    pub anchor: NodeId,
    /// Position of the anchor node.
    pub from: Point,
    /// Current pointer location.
    pub to: Point,
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    origin: Point,
    anchor: NodeId,
    current: Point,
}

/// A player session: configuration, collaborators and the current round.
pub struct Game<C: Clock, S: ScoreStore, E: EventSink> {
    config: GameConfig,
    clock: C,
    scores: S,
    events: E,
    round: Option<RoundState<C::Instant>>,
    drag: Option<Drag>,
    best_score: Option<u64>,
}

impl<C: Clock, S: ScoreStore, E: EventSink> Game<C, S, E> {
    /// Create a session. No round exists until one is started.
    pub const fn new(config: GameConfig, clock: C, scores: S, events: E) -> Self {
        Self {
            config,
            clock,
            scores,
            events,
            round: None,
            drag: None,
            best_score: None,
        }
    }

    /// Start a round with freshly generated original points.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if the configuration fails
    /// [`GameConfig::validate`].
    pub fn start_round<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<&RoundState<C::Instant>, EngineError> {
        self.config.validate()?;
        let points = generate_for_config(rng, &self.config);
        Ok(self.begin(points))
    }

    /// Start a round with the given original points, in order.
    ///
    /// `point_count` from the configuration is not consulted, but the
    /// layout must still hold at least two points.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if the configuration fails
    /// [`GameConfig::validate`] or fewer than two points are given. The
    /// current round is kept in that case.
    pub fn start_round_with_points(
        &mut self,
        points: impl IntoIterator<Item = Point>,
    ) -> Result<&RoundState<C::Instant>, EngineError> {
        self.config.validate()?;
        let points: Vec<Point> = points.into_iter().collect();
        if points.len() < 2 {
            return Err(EngineError::InvalidConfig(format!(
                "a round needs at least 2 points, got {}",
                points.len()
            )));
        }
        Ok(self.begin(points))
    }

    /// Discard the current round and any drag, then start a new round.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if the configuration fails
    /// [`GameConfig::validate`]; the old round is discarded regardless.
    pub fn reset<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<&RoundState<C::Instant>, EngineError> {
        self.round = None;
        self.drag = None;
        self.start_round(rng)
    }

    fn begin(&mut self, points: impl IntoIterator<Item = Point>) -> &RoundState<C::Instant> {
        self.drag = None;

        match self.scores.load_best_score() {
            Ok(best) => self.best_score = best,
            Err(e) => tracing::warn!(error = %e, "failed to load best score"),
        }
        if let Err(e) = self.events.round_started() {
            tracing::warn!(error = %e, "failed to report round start");
        }

        let store = PointStore::with_originals(points);
        tracing::info!(
            points = store.len(),
            difficulty = %self.config.difficulty,
            best_score = ?self.best_score,
            "round started",
        );
        let engine = Engine::new(store, self.config.snap_radius(), self.config.win_rule);
        self.round.insert(RoundState {
            engine,
            difficulty: self.config.difficulty,
            started_at: self.clock.now(),
            outcome: None,
        })
    }

    /// Commit a segment dragged from `raw_start` to `raw_end`.
    ///
    /// Every accepted segment is reported to the event sink as a
    /// snapshot. The segment that wins the round also scores it, updates
    /// the best score when it improves, and reports the outcome.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoRound`] before any round, otherwise whatever
    /// [`Engine::add_segment`] rejects with. Errors change nothing.
    pub fn record_segment(
        &mut self,
        raw_start: Point,
        raw_end: Point,
    ) -> Result<Recorded, EngineError> {
        let round = self.round.as_mut().ok_or(EngineError::NoRound)?;
        let segment = round.engine.add_segment(raw_start, raw_end)?;
        let elapsed = self.clock.elapsed(&round.started_at);

        let snapshot = RoundSnapshot::capture(&round.engine, elapsed);
        if let Err(e) = self.events.record_event(&snapshot) {
            tracing::warn!(error = %e, "failed to record round event");
        }

        if segment.state != EngineState::Won {
            return Ok(Recorded {
                segment,
                outcome: None,
            });
        }

        let total_length = round.engine.total_length();
        let mut outcome = RoundOutcome {
            score: score(total_length, elapsed, round.difficulty),
            total_length,
            elapsed,
            difficulty: round.difficulty,
            segment_count: round.engine.segments().len(),
            junction_count: round.engine.store().junction_count(),
            best_score: self.best_score,
            new_best: false,
        };

        if improves_on(outcome.score, self.best_score) {
            self.best_score = Some(outcome.score);
            outcome.best_score = self.best_score;
            outcome.new_best = true;
            if let Err(e) = self.scores.save_best_score(outcome.score) {
                tracing::warn!(error = %e, "failed to save best score");
            }
        }

        round.outcome = Some(outcome.clone());
        self.drag = None;

        tracing::info!(
            score = outcome.score,
            total_length = outcome.total_length,
            elapsed_secs = outcome.elapsed.as_secs_f64(),
            new_best = outcome.new_best,
            "round complete",
        );
        if let Err(e) = self.events.round_completed(&outcome) {
            tracing::warn!(error = %e, "failed to report round completion");
        }

        Ok(Recorded {
            segment,
            outcome: Some(outcome),
        })
    }

    /// Feed one pointer gesture through the drag state machine.
    pub fn handle_gesture(&mut self, gesture: Gesture) -> GestureOutcome {
        let Some(round) = self.round.as_ref() else {
            return GestureOutcome::Rejected(EngineError::NoRound);
        };
        if round.is_won() {
            self.drag = None;
            return GestureOutcome::Ignored;
        }

        match gesture {
            Gesture::PointerDown { at } => {
                let engine = &round.engine;
                match engine.resolver().resolve(engine.store(), at) {
                    Some(node) => {
                        self.drag = Some(Drag {
                            origin: at,
                            anchor: node,
                            current: at,
                        });
                        GestureOutcome::DragStarted { node }
                    }
                    None => {
                        self.drag = None;
                        GestureOutcome::Rejected(EngineError::InvalidStart)
                    }
                }
            }
            Gesture::PointerMove { at } => match self.drag.as_mut() {
                Some(drag) => {
                    drag.current = at;
                    GestureOutcome::PreviewMoved
                }
                None => GestureOutcome::Ignored,
            },
            Gesture::PointerUp { at } => match self.drag.take() {
                // The origin resolves to the same anchor: the store only
                // grows on commit, and a commit always ends the drag.
                Some(drag) => match self.record_segment(drag.origin, at) {
                    Ok(recorded) => GestureOutcome::Committed(recorded),
                    Err(e) => GestureOutcome::Rejected(e),
                },
                None => GestureOutcome::Ignored,
            },
        }
    }

    /// The drag line to draw, while a drag is in progress.
    #[must_use]
    pub fn preview(&self) -> Option<DragPreview> {
        let drag = self.drag?;
        let round = self.round.as_ref()?;
        let anchor = round.engine.store().node(drag.anchor)?;
        Some(DragPreview {
            anchor: drag.anchor,
            from: anchor.position,
            to: drag.current,
        })
    }

    /// Snapshot of the current round for rendering.
    ///
    /// Elapsed time freezes at the winning segment once the round is won.
    #[must_use]
    pub fn snapshot(&self) -> Option<RoundSnapshot> {
        let round = self.round.as_ref()?;
        let elapsed = round
            .outcome
            .as_ref()
            .map_or_else(|| self.clock.elapsed(&round.started_at), |o| o.elapsed);
        Some(RoundSnapshot::capture(&round.engine, elapsed))
    }

    /// The current round, if one was started.
    #[must_use]
    pub const fn round(&self) -> Option<&RoundState<C::Instant>> {
        self.round.as_ref()
    }

    /// Best score known to this session.
    #[must_use]
    pub const fn best_score(&self) -> Option<u64> {
        self.best_score
    }

    /// Session configuration.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// The session clock.
    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// The best-score store.
    #[must_use]
    pub const fn scores(&self) -> &S {
        &self.scores
    }

    /// The event sink.
    #[must_use]
    pub const fn events(&self) -> &E {
        &self.events
    }

    /// Take back the collaborators.
    pub fn into_parts(self) -> (C, S, E) {
        (self.clock, self.scores, self.events)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::persist::{ActionLog, MemoryScoreStore};

    #[derive(Debug, Default)]
    struct ManualClock {
        now: Cell<Duration>,
    }

    impl ManualClock {
        fn advance(&self, by: Duration) {
            self.now.set(self.now.get() + by);
        }
    }

    impl Clock for ManualClock {
        type Instant = Duration;

        fn now(&self) -> Duration {
            self.now.get()
        }

        fn elapsed(&self, since: &Duration) -> Duration {
            self.now.get().saturating_sub(*since)
        }
    }

    #[derive(Debug, Default)]
    struct BrokenStore;

    impl ScoreStore for BrokenStore {
        type Error = std::io::Error;

        fn load_best_score(&self) -> Result<Option<u64>, std::io::Error> {
            Err(std::io::Error::other("unreachable backend"))
        }

        fn save_best_score(&mut self, _score: u64) -> Result<(), std::io::Error> {
            Err(std::io::Error::other("unreachable backend"))
        }
    }

    type TestGame = Game<ManualClock, MemoryScoreStore, ActionLog>;

    fn config() -> GameConfig {
        GameConfig {
            point_count: 3,
            node_radius: 1.0,
            min_separation: Some(1.0),
            ..GameConfig::default()
        }
    }

    fn triangle_game(scores: MemoryScoreStore) -> TestGame {
        let mut game = Game::new(config(), ManualClock::default(), scores, ActionLog::default());
        game.start_round_with_points([
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
        ])
        .unwrap();
        game
    }

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn record_before_start_is_no_round() {
        let mut game: TestGame = Game::new(
            config(),
            ManualClock::default(),
            MemoryScoreStore::default(),
            ActionLog::default(),
        );
        assert_eq!(
            game.record_segment(p(0.0, 0.0), p(1.0, 1.0)),
            Err(EngineError::NoRound)
        );
        assert_eq!(
            game.handle_gesture(Gesture::PointerDown { at: p(0.0, 0.0) }),
            GestureOutcome::Rejected(EngineError::NoRound)
        );
        assert!(game.snapshot().is_none());
    }

    #[test]
    fn winning_segment_scores_the_round() {
        let mut game = triangle_game(MemoryScoreStore::default());
        let first = game.record_segment(p(0.0, 0.0), p(10.0, 0.0)).unwrap();
        assert!(first.outcome.is_none());

        game.clock().advance(Duration::from_secs(5));
        let second = game.record_segment(p(10.0, 0.0), p(10.0, 10.0)).unwrap();
        let outcome = second.outcome.unwrap();
        // (20 * 10 + 5) * 1.0
        assert_eq!(outcome.score, 205);
        assert!((outcome.total_length - 20.0).abs() < 1e-12);
        assert_eq!(outcome.segment_count, 2);
        assert_eq!(outcome.junction_count, 0);
        assert!(outcome.new_best);
        assert_eq!(outcome.best_score, Some(205));
        assert_eq!(game.scores().best(), Some(205));
        assert_eq!(game.round().unwrap().outcome(), Some(&outcome));
    }

    #[test]
    fn worse_score_keeps_existing_best() {
        let mut game = triangle_game(MemoryScoreStore::with_best(100));
        assert_eq!(game.best_score(), Some(100));
        game.record_segment(p(0.0, 0.0), p(10.0, 0.0)).unwrap();
        let outcome = game
            .record_segment(p(10.0, 0.0), p(10.0, 10.0))
            .unwrap()
            .outcome
            .unwrap();
        assert_eq!(outcome.score, 200);
        assert!(!outcome.new_best);
        assert_eq!(outcome.best_score, Some(100));
        assert_eq!(game.scores().best(), Some(100));
    }

    #[test]
    fn hard_difficulty_scales_score() {
        let mut game = Game::new(
            GameConfig {
                difficulty: Difficulty::Hard,
                ..config()
            },
            ManualClock::default(),
            MemoryScoreStore::default(),
            ActionLog::default(),
        );
        game.start_round_with_points([p(0.0, 0.0), p(10.0, 0.0)])
            .unwrap();
        game.clock().advance(Duration::from_secs(5));
        let outcome = game
            .record_segment(p(0.0, 0.0), p(10.0, 0.0))
            .unwrap()
            .outcome
            .unwrap();
        assert_eq!(outcome.score, 126);
        assert_eq!(outcome.difficulty, Difficulty::Hard);
    }

    #[test]
    fn events_follow_segments_and_completion() {
        let mut game = triangle_game(MemoryScoreStore::default());
        game.record_segment(p(0.0, 0.0), p(10.0, 0.0)).unwrap();
        assert_eq!(game.events().current().len(), 1);
        // Rejections are not logged.
        let _ = game.record_segment(p(500.0, 500.0), p(0.0, 0.0));
        assert_eq!(game.events().current().len(), 1);

        game.record_segment(p(10.0, 0.0), p(10.0, 10.0)).unwrap();
        let completed = game.events().completed();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].snapshots.len(), 2);
        assert_eq!(completed[0].snapshots[1].state, EngineState::Won);
        assert!(game.events().current().is_empty());
    }

    #[test]
    fn drag_gesture_commits_one_segment() {
        let mut game = triangle_game(MemoryScoreStore::default());
        assert_eq!(
            game.handle_gesture(Gesture::PointerDown { at: p(0.5, 0.5) }),
            GestureOutcome::DragStarted {
                node: NodeId::new(0)
            }
        );
        assert_eq!(
            game.handle_gesture(Gesture::PointerMove { at: p(6.0, 1.0) }),
            GestureOutcome::PreviewMoved
        );
        assert_eq!(
            game.preview(),
            Some(DragPreview {
                anchor: NodeId::new(0),
                from: p(0.0, 0.0),
                to: p(6.0, 1.0),
            })
        );
        // Moves never touch the engine.
        assert!(game.round().unwrap().engine().segments().is_empty());

        let outcome = game.handle_gesture(Gesture::PointerUp { at: p(10.0, 0.5) });
        let GestureOutcome::Committed(recorded) = outcome else {
            unreachable!("expected a commit, got {outcome:?}");
        };
        assert_eq!(recorded.segment.end, NodeId::new(1));
        assert!(game.preview().is_none());
        assert_eq!(game.round().unwrap().engine().segments().len(), 1);
    }

    #[test]
    fn pointer_down_in_empty_space_is_rejected() {
        let mut game = triangle_game(MemoryScoreStore::default());
        assert_eq!(
            game.handle_gesture(Gesture::PointerDown { at: p(500.0, 500.0) }),
            GestureOutcome::Rejected(EngineError::InvalidStart)
        );
        assert_eq!(
            game.handle_gesture(Gesture::PointerUp { at: p(10.0, 0.0) }),
            GestureOutcome::Ignored
        );
        assert!(game.round().unwrap().engine().segments().is_empty());
    }

    #[test]
    fn release_on_anchor_is_degenerate() {
        let mut game = triangle_game(MemoryScoreStore::default());
        game.handle_gesture(Gesture::PointerDown { at: p(0.0, 0.0) });
        assert_eq!(
            game.handle_gesture(Gesture::PointerUp { at: p(0.2, 0.1) }),
            GestureOutcome::Rejected(EngineError::DegenerateSegment)
        );
        assert!(game.preview().is_none());
    }

    #[test]
    fn gestures_after_win_are_ignored() {
        let mut game = triangle_game(MemoryScoreStore::default());
        game.record_segment(p(0.0, 0.0), p(10.0, 0.0)).unwrap();
        game.record_segment(p(10.0, 0.0), p(10.0, 10.0)).unwrap();
        assert_eq!(
            game.handle_gesture(Gesture::PointerDown { at: p(0.0, 0.0) }),
            GestureOutcome::Ignored
        );
        assert_eq!(
            game.record_segment(p(0.0, 0.0), p(10.0, 10.0)),
            Err(EngineError::RoundOver)
        );
    }

    #[test]
    fn snapshot_elapsed_freezes_at_win() {
        let mut game = triangle_game(MemoryScoreStore::default());
        game.clock().advance(Duration::from_secs(2));
        assert_eq!(game.snapshot().unwrap().elapsed, Duration::from_secs(2));
        game.record_segment(p(0.0, 0.0), p(10.0, 0.0)).unwrap();
        game.record_segment(p(10.0, 0.0), p(10.0, 10.0)).unwrap();
        game.clock().advance(Duration::from_secs(30));
        assert_eq!(game.snapshot().unwrap().elapsed, Duration::from_secs(2));
    }

    #[test]
    fn reset_discards_round_and_drag() {
        let mut game = triangle_game(MemoryScoreStore::default());
        game.record_segment(p(0.0, 0.0), p(10.0, 0.0)).unwrap();
        game.handle_gesture(Gesture::PointerDown { at: p(10.0, 10.0) });
        assert!(game.preview().is_some());

        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let round = game.reset(&mut rng).unwrap();
        assert_eq!(round.engine().store().original_count(), 3);
        assert!(round.engine().segments().is_empty());
        assert_eq!(round.engine().state(), EngineState::Idle);
        assert!(game.preview().is_none());
        assert!(game.events().current().is_empty());
    }

    #[test]
    fn invalid_config_refuses_to_start() {
        let mut game: TestGame = Game::new(
            GameConfig {
                point_count: 0,
                ..GameConfig::default()
            },
            ManualClock::default(),
            MemoryScoreStore::default(),
            ActionLog::default(),
        );
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(matches!(
            game.start_round(&mut rng),
            Err(EngineError::InvalidConfig(_))
        ));
        assert!(game.round().is_none());
    }

    #[test]
    fn storage_failures_do_not_stop_play() {
        let mut game = Game::new(config(), ManualClock::default(), BrokenStore, ());
        game.start_round_with_points([p(0.0, 0.0), p(10.0, 0.0)])
            .unwrap();
        assert_eq!(game.best_score(), None);
        let outcome = game
            .record_segment(p(0.0, 0.0), p(10.0, 0.0))
            .unwrap()
            .outcome
            .unwrap();
        assert!(outcome.new_best);
        // Cached in the session even though the store refused it.
        assert_eq!(game.best_score(), Some(outcome.score));
    }

    #[test]
    fn layouts_with_fewer_than_two_points_are_rejected() {
        let mut game = triangle_game(MemoryScoreStore::default());
        for layout in [vec![], vec![p(5.0, 5.0)]] {
            assert!(matches!(
                game.start_round_with_points(layout),
                Err(EngineError::InvalidConfig(_))
            ));
        }
        // The running round is untouched.
        let round = game.round().unwrap();
        assert_eq!(round.engine().store().original_count(), 3);
        assert_eq!(round.engine().state(), EngineState::Idle);
    }
}

//! Local JSON history: best score and completed rounds per player token.
//!
//! The file maps a player token to that player's best score and the
//! action log of every round they finished:
//!
//! ```json
//! {
//!   "last_player": "Zk3q9VwB0pLx7TfA",
//!   "players": {
//!     "Zk3q9VwB0pLx7TfA": { "best_score": 205, "rounds": [ ... ] }
//!   }
//! }
//! ```
//!
//! Every write is a read-modify-write of the whole file, so the best-score
//! store and the round recorder can both hold a [`History`] handle to the
//! same path. Concurrent writers are not coordinated; the last write wins.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use dotlink_engine::{
    ActionLog, CompletedRound, EventSink, RoundOutcome, RoundSnapshot, ScoreStore,
};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};

/// Length of a generated player token.
pub const TOKEN_LEN: usize = 16;

/// Errors reading or writing the history file.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// Reading or writing the file failed.
    #[error("history file {path}: {source}")]
    Io {
        /// The history file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not valid history JSON.
    #[error("history file {path} is malformed: {source}")]
    Json {
        /// The history file.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
}

/// One player's record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerHistory {
    /// Lowest score achieved so far.
    pub best_score: Option<u64>,
    /// Completed rounds, oldest first.
    #[serde(default)]
    pub rounds: Vec<CompletedRound>,
}

/// Whole-file contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryData {
    /// Token of the most recent player, reused when none is given.
    #[serde(default)]
    pub last_player: Option<String>,
    /// Records keyed by player token.
    #[serde(default)]
    pub players: BTreeMap<String, PlayerHistory>,
}

/// Generate a random alphanumeric player token.
pub fn generate_token<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..TOKEN_LEN)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect()
}

/// Handle to one player's entry in a history file.
#[derive(Debug, Clone)]
pub struct History {
    path: PathBuf,
    player: String,
}

impl History {
    /// Bind `player` to the history file at `path`.
    ///
    /// The file does not need to exist yet; it is created on first write.
    pub fn new(path: impl Into<PathBuf>, player: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            player: player.into(),
        }
    }

    /// The history file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The player token.
    #[must_use]
    pub fn player(&self) -> &str {
        &self.player
    }

    /// Read the whole file. A missing file reads as empty history.
    ///
    /// # Errors
    ///
    /// [`HistoryError::Io`] for read failures other than a missing file,
    /// [`HistoryError::Json`] if the contents do not parse.
    pub fn load(&self) -> Result<HistoryData, HistoryError> {
        read_history(&self.path)
    }

    /// This player's record, if the file has one.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load).
    pub fn player_history(&self) -> Result<Option<PlayerHistory>, HistoryError> {
        Ok(self.load()?.players.remove(&self.player))
    }

    /// Apply `f` to this player's record and write the file back.
    ///
    /// Also marks this player as the most recent one.
    ///
    /// # Errors
    ///
    /// Any [`load`](Self::load) error, or [`HistoryError::Io`] /
    /// [`HistoryError::Json`] from writing.
    pub fn update(&self, f: impl FnOnce(&mut PlayerHistory)) -> Result<(), HistoryError> {
        let mut data = self.load()?;
        f(data.players.entry(self.player.clone()).or_default());
        data.last_player = Some(self.player.clone());
        write_history(&self.path, &data)
    }
}

/// Token of the most recent player recorded at `path`, if any.
///
/// # Errors
///
/// Same as [`History::load`].
pub fn last_player(path: &Path) -> Result<Option<String>, HistoryError> {
    Ok(read_history(path)?.last_player)
}

/// The player to record as: `requested` if given, else the last player
/// recorded at `path`, else a freshly generated token.
///
/// # Errors
///
/// Same as [`History::load`]; only consulted when `requested` is `None`.
pub fn resolve_player<R: Rng + ?Sized>(
    path: &Path,
    requested: Option<&str>,
    rng: &mut R,
) -> Result<String, HistoryError> {
    if let Some(player) = requested {
        return Ok(player.to_owned());
    }
    Ok(last_player(path)?.unwrap_or_else(|| generate_token(rng)))
}

fn read_history(path: &Path) -> Result<HistoryData, HistoryError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HistoryData::default()),
        Err(source) => {
            return Err(HistoryError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_str(&text).map_err(|source| HistoryError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn write_history(path: &Path, data: &HistoryData) -> Result<(), HistoryError> {
    let json = serde_json::to_string_pretty(data).map_err(|source| HistoryError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, json).map_err(|source| HistoryError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl ScoreStore for History {
    type Error = HistoryError;

    fn load_best_score(&self) -> Result<Option<u64>, HistoryError> {
        Ok(self.player_history()?.and_then(|p| p.best_score))
    }

    fn save_best_score(&mut self, score: u64) -> Result<(), HistoryError> {
        self.update(|p| p.best_score = Some(score))
    }
}

/// Event sink for the CLI: keeps an in-memory [`ActionLog`] for this
/// run and, when a history file is configured, appends each completed
/// round to it.
#[derive(Debug, Default)]
pub struct RoundRecorder {
    log: ActionLog,
    history: Option<History>,
}

impl RoundRecorder {
    /// Record into memory and, if given, into `history`.
    #[must_use]
    pub fn new(history: Option<History>) -> Self {
        Self {
            log: ActionLog::default(),
            history,
        }
    }

    /// Rounds recorded during this run.
    #[must_use]
    pub const fn log(&self) -> &ActionLog {
        &self.log
    }
}

impl EventSink for RoundRecorder {
    type Error = HistoryError;

    fn round_started(&mut self) -> Result<(), HistoryError> {
        let Ok(()) = self.log.round_started();
        Ok(())
    }

    fn record_event(&mut self, snapshot: &RoundSnapshot) -> Result<(), HistoryError> {
        let Ok(()) = self.log.record_event(snapshot);
        Ok(())
    }

    fn round_completed(&mut self, outcome: &RoundOutcome) -> Result<(), HistoryError> {
        let Ok(()) = self.log.round_completed(outcome);
        let (Some(history), Some(round)) = (&self.history, self.log.completed().last()) else {
            return Ok(());
        };
        history.update(|p| p.rounds.push(round.clone()))
    }
}

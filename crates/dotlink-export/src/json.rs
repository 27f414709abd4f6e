//! JSON encoding of snapshots and action logs.
//!
//! Field names and units follow the serde derives in `dotlink-engine`:
//! durations are fractional seconds, states and node kinds are
//! lowercase strings.

use dotlink_engine::{CompletedRound, RoundSnapshot};

/// Errors from the JSON serializers.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encode a single snapshot as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`ExportError::Json`] if serialization fails.
pub fn snapshot_to_json(snapshot: &RoundSnapshot) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

/// Encode completed rounds, oldest first, as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`ExportError::Json`] if serialization fails.
pub fn action_log_to_json(rounds: &[CompletedRound]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(rounds)?)
}

/// Decode an action log written by [`action_log_to_json`].
///
/// # Errors
///
/// Returns [`ExportError::Json`] if `json` is not a valid action log.
pub fn action_log_from_json(json: &str) -> Result<Vec<CompletedRound>, ExportError> {
    Ok(serde_json::from_str(json)?)
}

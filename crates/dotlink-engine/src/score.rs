//! Scoring and elapsed-time measurement.
//!
//! A round's score grows with the drawn length and the time taken, scaled
//! by the difficulty factor. Lower is better.
//!
//! Time is read through the [`Clock`] trait so the engine stays free of
//! platform timers. [`SystemClock`] uses the `web-time` crate, which
//! maps to `performance.now()` on WASM and `std::time::Instant` on
//! native targets.

use std::time::Duration;

use crate::types::Difficulty;

/// Source of monotonic timestamps.
pub trait Clock {
    /// Opaque timestamp type.
    type Instant;

    /// Capture the current time.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// [`Clock`] implementation backed by [`web_time::Instant`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    type Instant = web_time::Instant;

    fn now(&self) -> web_time::Instant {
        web_time::Instant::now()
    }

    fn elapsed(&self, since: &web_time::Instant) -> Duration {
        since.elapsed()
    }
}

/// Weight of one unit of drawn length relative to one second.
pub const LENGTH_WEIGHT: f64 = 10.0;

/// Score a completed round:
/// `round((total_length * 10 + elapsed_seconds) * difficulty_factor)`.
///
/// Elapsed time counts fractional seconds. Negative or non-finite
/// intermediate values saturate to zero.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn score(total_length: f64, elapsed: Duration, difficulty: Difficulty) -> u64 {
    let raw = total_length.mul_add(LENGTH_WEIGHT, elapsed.as_secs_f64()) * difficulty.factor();
    // `as` saturates: NaN and negatives become 0.
    raw.round() as u64
}

/// Whether `candidate` beats the stored best (lower wins). Any score beats
/// no stored score.
#[must_use]
pub const fn improves_on(candidate: u64, best: Option<u64>) -> bool {
    match best {
        Some(best) => candidate < best,
        None => true,
    }
}

//! Original point generation by rejection sampling.
//!
//! A candidate is drawn uniformly inside the play bounds (shrunk by a
//! margin so drawn nodes stay fully visible) and kept only if it lies at
//! least `min_separation` from every point placed so far.
//!
//! Sampling is capped per point. When `max_attempts` candidates in a row
//! are rejected, the separation is halved and sampling continues; below
//! [`RELAX_FLOOR`] the separation drops to zero, so generation always
//! terminates even for infeasible configurations.

use rand::Rng;

use crate::types::{Bounds, GameConfig, Point};

/// Separation below which relaxation gives up on spacing entirely.
pub const RELAX_FLOOR: f64 = 1e-3;

/// Generate the original points for a round described by `config`.
pub fn generate_for_config<R: Rng + ?Sized>(rng: &mut R, config: &GameConfig) -> Vec<Point> {
    generate_points(
        rng,
        config.point_count,
        config.bounds,
        config.node_radius,
        config.min_separation(),
        config.max_placement_attempts,
    )
}

/// Generate `count` points inside `bounds` inset by `margin`, pairwise at
/// least `min_separation` apart where feasible.
pub fn generate_points<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    bounds: Bounds,
    margin: f64,
    min_separation: f64,
    max_attempts: usize,
) -> Vec<Point> {
    let (x_lo, x_hi) = inset(bounds.width, margin);
    let (y_lo, y_hi) = inset(bounds.height, margin);
    let attempts = max_attempts.max(1);

    let mut points: Vec<Point> = Vec::with_capacity(count);
    let mut separation = min_separation.max(0.0);

    while points.len() < count {
        let placed = (0..attempts).find_map(|_| {
            let candidate = Point::new(rng.gen_range(x_lo..=x_hi), rng.gen_range(y_lo..=y_hi));
            far_enough(&points, candidate, separation).then_some(candidate)
        });

        match placed {
            Some(p) => points.push(p),
            None => {
                let relaxed = separation / 2.0;
                let relaxed = if relaxed < RELAX_FLOOR { 0.0 } else { relaxed };
                tracing::warn!(
                    placed = points.len(),
                    count,
                    from = separation,
                    to = relaxed,
                    "could not place point, relaxing separation",
                );
                separation = relaxed;
            }
        }
    }

    points
}

/// Sampling interval along one axis; collapses to the centre when the
/// margin leaves no room.
fn inset(extent: f64, margin: f64) -> (f64, f64) {
    let lo = margin.max(0.0);
    let hi = extent - lo;
    if hi >= lo { (lo, hi) } else { (extent / 2.0, extent / 2.0) }
}

fn far_enough(points: &[Point], candidate: Point, separation: f64) -> bool {
    let separation_sq = separation * separation;
    points
        .iter()
        .all(|p| p.distance_squared(candidate) >= separation_sq)
}

//! Planar distance helpers.

use crate::types::Point;

/// Euclidean distance between two points.
#[must_use]
pub fn distance(p: Point, q: Point) -> f64 {
    p.distance(q)
}

/// Distance from `p` to the closed segment `a`–`b`.
///
/// Projects `p` onto the infinite line through `a` and `b` using the
/// parameter `t = ((p - a) · (b - a)) / |b - a|²`, clamps `t` to `[0, 1]`
/// and measures to the clamped projection. A degenerate segment
/// (`a == b`) measures to `a`.
#[must_use]
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let abx = b.x - a.x;
    let aby = b.y - a.y;
    let len_sq = abx.mul_add(abx, aby * aby);
    if len_sq == 0.0 {
        return p.distance(a);
    }

    let apx = p.x - a.x;
    let apy = p.y - a.y;
    let t = (apx.mul_add(abx, apy * aby) / len_sq).clamp(0.0, 1.0);
    let projection = Point::new(t.mul_add(abx, a.x), t.mul_add(aby, a.y));
    p.distance(projection)
}

#[cfg(test)]
mod tests {
    use geo::line_measures::Distance;
    use geo::{Euclidean, Line};

    use super::*;

    fn geo_distance(p: Point, a: Point, b: Point) -> f64 {
        let line = Line::new(geo::Coord { x: a.x, y: a.y }, geo::Coord { x: b.x, y: b.y });
        Euclidean.distance(&geo::Point::new(p.x, p.y), &line)
    }

    #[test]
    fn distance_is_euclidean() {
        assert!((distance(Point::new(1.0, 1.0), Point::new(4.0, 5.0)) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn perpendicular_foot_inside_segment() {
        let d = distance_to_segment(
            Point::new(5.0, 3.0),
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
        );
        assert!((d - 3.0).abs() < 1e-12);
    }

    #[test]
    fn projection_clamps_to_endpoints() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        // Beyond b: measured to b, not to the infinite line.
        let beyond = distance_to_segment(Point::new(13.0, 4.0), a, b);
        assert!((beyond - 5.0).abs() < 1e-12);
        // Before a.
        let before = distance_to_segment(Point::new(-3.0, -4.0), a, b);
        assert!((before - 5.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_segment_measures_to_endpoint() {
        let a = Point::new(2.0, 2.0);
        let d = distance_to_segment(Point::new(5.0, 6.0), a, a);
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[test]
    fn agrees_with_geo() {
        let cases = [
            (Point::new(1.0, 7.0), Point::new(-3.0, 2.0), Point::new(8.0, -1.5)),
            (Point::new(0.0, 0.0), Point::new(1.0, 1.0), Point::new(2.0, 2.0)),
            (Point::new(5.5, -2.0), Point::new(5.0, -10.0), Point::new(5.0, 10.0)),
            (Point::new(100.0, 40.0), Point::new(0.0, 0.0), Point::new(30.0, 40.0)),
        ];
        for (p, a, b) in cases {
            let ours = distance_to_segment(p, a, b);
            let theirs = geo_distance(p, a, b);
            assert!(
                (ours - theirs).abs() < 1e-9,
                "p={p:?} a={a:?} b={b:?}: ours={ours} geo={theirs}"
            );
        }
    }
}

//! Automatic player: grows one network from the first original point,
//! always drawing the shortest link to a point not yet in it.
//!
//! Each move is emitted as a down/move/up gesture triple so it goes
//! through exactly the same path as scripted or interactive input.

use dotlink_engine::{Engine, Gesture, NodeId, Point};

/// Gestures for the next link, or `None` once every original point is
/// connected.
#[must_use]
pub fn next_move(engine: &Engine) -> Option<[Gesture; 3]> {
    let (from, to) = shortest_link(engine)?;
    let mid = Point::new(f64::midpoint(from.x, to.x), f64::midpoint(from.y, to.y));
    Some([
        Gesture::PointerDown { at: from },
        Gesture::PointerMove { at: mid },
        Gesture::PointerUp { at: to },
    ])
}

/// Closest pair between the network containing the first original point
/// and any original point outside it. Ties go to the lowest ids.
fn shortest_link(engine: &Engine) -> Option<(Point, Point)> {
    let store = engine.store();
    let root = store.original_nodes().next()?;

    let (inside, outside): (Vec<NodeId>, Vec<NodeId>) = store
        .original_nodes()
        .partition(|&id| engine.same_component(root, id));
    let position = |id: NodeId| store.node(id).map(|n| n.position);

    let mut best: Option<(f64, Point, Point)> = None;
    for &a in &inside {
        let Some(pa) = position(a) else { continue };
        for &b in &outside {
            let Some(pb) = position(b) else { continue };
            let d = pa.distance_squared(pb);
            if best.is_none_or(|(bd, _, _)| d < bd) {
                best = Some((d, pa, pb));
            }
        }
    }
    best.map(|(_, a, b)| (a, b))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dotlink_engine::{EngineState, PointStore, WinRule};

    use super::*;

    fn engine(points: &[(f64, f64)]) -> Engine {
        let store = PointStore::with_originals(points.iter().map(|&(x, y)| Point::new(x, y)));
        Engine::new(store, 5.0, WinRule::OriginalNodes)
    }

    fn apply(engine: &mut Engine, gestures: [Gesture; 3]) {
        let [Gesture::PointerDown { at: from }, _, Gesture::PointerUp { at: to }] = gestures else {
            unreachable!("moves are always down/move/up");
        };
        engine.add_segment(from, to).unwrap();
    }

    #[test]
    fn picks_the_nearest_outside_point() {
        let e = engine(&[(0.0, 0.0), (100.0, 0.0), (30.0, 40.0)]);
        let [down, moved, up] = next_move(&e).unwrap();
        assert_eq!(down, Gesture::PointerDown { at: Point::new(0.0, 0.0) });
        assert_eq!(moved, Gesture::PointerMove { at: Point::new(15.0, 20.0) });
        assert_eq!(up, Gesture::PointerUp { at: Point::new(30.0, 40.0) });
    }

    #[test]
    fn connects_everything_with_n_minus_one_links() {
        let mut e = engine(&[(0.0, 0.0), (100.0, 0.0), (30.0, 40.0), (100.0, 100.0)]);
        let mut links = 0;
        while let Some(gestures) = next_move(&e) {
            apply(&mut e, gestures);
            links += 1;
        }
        assert_eq!(links, 3);
        assert_eq!(e.state(), EngineState::Won);
    }

    #[test]
    fn single_point_needs_no_moves() {
        assert!(next_move(&engine(&[(5.0, 5.0)])).is_none());
    }
}

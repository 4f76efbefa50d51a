//! Shortest paths over the committed segment graph. Each segment is a graph
//! node; its neighbor set is everything linked at either endpoint. All search
//! state lives in per-query maps keyed by segment id, so read-only queries
//! against the same city can run in parallel.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use ordered_float::NotNan;

use crate::{City, Segment, SegmentID};

/// Traversal cost of one segment, as an integer. Highways are cheaper per
/// unit length, modeling faster travel.
pub fn cost(seg: &Segment) -> usize {
    let multiplier = if seg.is_highway { 0.75 } else { 1.0 };
    (seg.length() * multiplier * 0.1).round() as usize
}

/// Straight-line midpoint distance, scaled the same way as `cost` so it
/// underestimates the remaining travel.
pub fn heuristic(seg: &Segment, goal: &Segment) -> f64 {
    seg.point_at(0.5).dist(goal.point_at(0.5)) * 0.1
}

/// Use with `BinaryHeap`. Since it's a max-heap, reverse the comparison to
/// pop the smallest cost first.
#[derive(PartialEq, Eq)]
struct Item<K: Ord> {
    cost: K,
    node: SegmentID,
}

impl<K: Ord> PartialOrd for Item<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord> Ord for Item<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

fn neighbors(city: &City, id: SegmentID) -> Vec<SegmentID> {
    let seg = city.get_s(id);
    seg.links_s.iter().chain(seg.links_e.iter()).copied().collect()
}

/// Classic Dijkstra, with early exit upon popping the goal. Returns the path
/// from `end` back to `start` inclusive, and the total cost of every segment
/// on it. An unreachable goal yields an empty path with zero cost; that's a
/// normal result, not an error.
pub fn dijkstra(city: &City, start: SegmentID, end: SegmentID) -> (Vec<SegmentID>, usize) {
    let mut dist_start: HashMap<SegmentID, usize> = HashMap::new();
    let mut prev: HashMap<SegmentID, SegmentID> = HashMap::new();
    let mut frontier: BinaryHeap<Item<usize>> = BinaryHeap::new();

    dist_start.insert(start, 0);
    frontier.push(Item {
        cost: 0,
        node: start,
    });

    while let Some(item) = frontier.pop() {
        if item.node == end {
            break;
        }
        // A stale queue entry, superseded by a later relaxation.
        if item.cost > *dist_start.get(&item.node).unwrap_or(&usize::MAX) {
            continue;
        }

        for next in neighbors(city, item.node) {
            let next_dist = item.cost + cost(city.get_s(next));
            if next_dist < *dist_start.get(&next).unwrap_or(&usize::MAX) {
                dist_start.insert(next, next_dist);
                prev.insert(next, item.node);
                frontier.push(Item {
                    cost: next_dist,
                    node: next,
                });
            }
        }
    }

    walk_back(city, start, end, &prev)
}

/// A* over the same graph, frontier ordered by distance-so-far plus the
/// midpoint heuristic. Also returns every node expanded before the goal, in
/// pop order, for diagnostic display.
pub fn astar(
    city: &City,
    start: SegmentID,
    end: SegmentID,
) -> (Vec<SegmentID>, usize, Vec<SegmentID>) {
    let goal = city.get_s(end);
    let mut dist_start: HashMap<SegmentID, usize> = HashMap::new();
    let mut prev: HashMap<SegmentID, SegmentID> = HashMap::new();
    let mut closed: HashSet<SegmentID> = HashSet::new();
    let mut searched: Vec<SegmentID> = Vec::new();
    let mut frontier: BinaryHeap<Item<NotNan<f64>>> = BinaryHeap::new();

    dist_start.insert(start, 0);
    frontier.push(Item {
        cost: NotNan::new(heuristic(city.get_s(start), goal)).unwrap(),
        node: start,
    });

    while let Some(item) = frontier.pop() {
        if item.node == end {
            break;
        }
        if !closed.insert(item.node) {
            continue;
        }
        searched.push(item.node);

        for next in neighbors(city, item.node) {
            if closed.contains(&next) {
                continue;
            }
            let next_dist = dist_start[&item.node] + cost(city.get_s(next));
            if next_dist < *dist_start.get(&next).unwrap_or(&usize::MAX) {
                dist_start.insert(next, next_dist);
                prev.insert(next, item.node);
                let estimate = next_dist as f64 + heuristic(city.get_s(next), goal);
                frontier.push(Item {
                    cost: NotNan::new(estimate).unwrap(),
                    node: next,
                });
            }
        }
    }

    let (path, total) = walk_back(city, start, end, &prev);
    (path, total, searched)
}

fn walk_back(
    city: &City,
    start: SegmentID,
    end: SegmentID,
    prev: &HashMap<SegmentID, SegmentID>,
) -> (Vec<SegmentID>, usize) {
    let mut path = Vec::new();
    let mut total = 0;
    if end == start || prev.contains_key(&end) {
        let mut current = Some(end);
        while let Some(id) = current {
            path.push(id);
            total += cost(city.get_s(id));
            current = prev.get(&id).copied();
        }
    }
    (path, total)
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    use geom::Pt2D;

    use crate::{GenerationParams, Heatmap, SnapType};

    use super::*;

    fn test_city(segments: Vec<(Pt2D, Pt2D, bool)>) -> City {
        let mut rng = XorShiftRng::seed_from_u64(0);
        let roads = segments
            .into_iter()
            .enumerate()
            .map(|(idx, (start, end, is_highway))| Segment {
                id: SegmentID(idx),
                start,
                end,
                is_highway,
                is_branch: false,
                t: 0,
                has_snapped: SnapType::No,
                parent: None,
                links_s: BTreeSet::new(),
                links_e: BTreeSet::new(),
                connected: true,
            })
            .collect();
        City {
            roads,
            sectors: BTreeMap::new(),
            population: Heatmap::new(&mut rng),
            params: GenerationParams::default(),
            seed: 0,
        }
    }

    fn link(city: &mut City, a: usize, b: usize, a_at_end: bool, b_at_end: bool) {
        if a_at_end {
            city.roads[a].links_e.insert(SegmentID(b));
        } else {
            city.roads[a].links_s.insert(SegmentID(b));
        }
        if b_at_end {
            city.roads[b].links_e.insert(SegmentID(a));
        } else {
            city.roads[b].links_s.insert(SegmentID(a));
        }
    }

    /// start -- a -- end and start -- b -- end, where the route through `a`
    /// is cheaper.
    fn diamond() -> City {
        let mut city = test_city(vec![
            (Pt2D::new(0.0, 0.0), Pt2D::new(100.0, 0.0), false), // 0: start
            (Pt2D::new(100.0, 0.0), Pt2D::new(200.0, 0.0), false), // 1: a, cost 10
            (Pt2D::new(100.0, 0.0), Pt2D::new(100.0, 300.0), false), // 2: b, cost 30
            (Pt2D::new(200.0, 0.0), Pt2D::new(300.0, 0.0), false), // 3: end
        ]);
        link(&mut city, 0, 1, true, false);
        link(&mut city, 0, 2, true, false);
        link(&mut city, 1, 3, true, false);
        link(&mut city, 2, 3, true, false);
        city
    }

    #[test]
    fn dijkstra_prefers_the_cheap_route() {
        let city = diamond();
        let (path, total) = dijkstra(&city, SegmentID(0), SegmentID(3));
        assert_eq!(path, vec![SegmentID(3), SegmentID(1), SegmentID(0)]);
        assert_eq!(total, 30);
    }

    #[test]
    fn astar_agrees_with_dijkstra() {
        let city = diamond();
        let (path, total, searched) = astar(&city, SegmentID(0), SegmentID(3));
        assert_eq!(path, vec![SegmentID(3), SegmentID(1), SegmentID(0)]);
        assert_eq!(total, 30);
        assert!(!searched.contains(&SegmentID(3)));
    }

    #[test]
    fn unreachable_goal_is_an_empty_path() {
        let city = test_city(vec![
            (Pt2D::new(0.0, 0.0), Pt2D::new(100.0, 0.0), false),
            (Pt2D::new(500.0, 500.0), Pt2D::new(600.0, 500.0), false),
        ]);

        let (path, total) = dijkstra(&city, SegmentID(0), SegmentID(1));
        assert!(path.is_empty());
        assert_eq!(total, 0);

        let (path, total, _) = astar(&city, SegmentID(0), SegmentID(1));
        assert!(path.is_empty());
        assert_eq!(total, 0);
    }

    #[test]
    fn trivial_path_to_self() {
        let city = diamond();
        let (path, total) = dijkstra(&city, SegmentID(0), SegmentID(0));
        assert_eq!(path, vec![SegmentID(0)]);
        assert_eq!(total, 10);
    }

    #[test]
    fn highways_are_cheaper() {
        let street = test_city(vec![(Pt2D::new(0.0, 0.0), Pt2D::new(100.0, 0.0), false)]);
        let highway = test_city(vec![(Pt2D::new(0.0, 0.0), Pt2D::new(100.0, 0.0), true)]);
        assert_eq!(cost(&street.roads[0]), 10);
        assert_eq!(cost(&highway.roads[0]), 8);
    }
}

//! Tracing the closed faces ("lots") of the committed planar graph: walk
//! forward from a segment, always taking the most extreme available turn in
//! one rotational direction, until arriving back where the walk began. Each
//! lot comes back as a loop of corner points. Every interior face is found
//! from one of its boundary segments; duplicate traces are suppressed by
//! remembering which segments were already consumed in each orientation.

use std::collections::BTreeSet;

use geom::{Angle, Pt2D};

use crate::{City, SegmentID};

#[derive(Clone, Copy, Debug, PartialEq)]
enum Turn {
    Left,
    Right,
}

pub fn find_lots(city: &City) -> Vec<Vec<Pt2D>> {
    let mut searched_left: BTreeSet<SegmentID> = BTreeSet::new();
    let mut searched_right: BTreeSet<SegmentID> = BTreeSet::new();
    let mut lots = Vec::new();

    for seg in &city.roads {
        if !searched_left.contains(&seg.id) {
            if let Some(lot) = find_lot(city, seg.id, Turn::Left, &mut searched_left, &mut searched_right) {
                lots.push(lot);
            }
        }
        if !searched_right.contains(&seg.id) {
            if let Some(lot) = find_lot(city, seg.id, Turn::Right, &mut searched_right, &mut searched_left) {
                lots.push(lot);
            }
        }
    }
    lots
}

/// One walk around a face, starting forward along `start`. `searched_main`
/// collects segments traversed forward, `searched_rev` those traversed
/// backward; a walk touching an already-consumed segment is a face that was
/// found before.
fn find_lot(
    city: &City,
    start: SegmentID,
    turn: Turn,
    searched_main: &mut BTreeSet<SegmentID>,
    searched_rev: &mut BTreeSet<SegmentID>,
) -> Option<Vec<Pt2D>> {
    let start_seg = city.get_s(start);
    if start_seg.links_s.is_empty() {
        return None;
    }

    let mut lot = vec![start_seg.start];
    let mut main_in_lot = BTreeSet::new();
    let mut rev_in_lot = BTreeSet::new();
    main_in_lot.insert(start);

    let mut visited: BTreeSet<(SegmentID, bool)> = BTreeSet::new();
    let mut curr = next_around(city, start, true, turn)?;
    let mut forward = city.get_s(curr).start == start_seg.end;

    while curr != start {
        if !visited.insert((curr, forward)) {
            // Wandered into a cycle that doesn't close back on the start.
            return None;
        }
        let curr_seg = city.get_s(curr);
        if forward {
            if searched_main.contains(&curr) {
                return None;
            }
            lot.push(curr_seg.start);
            main_in_lot.insert(curr);
        } else {
            if searched_rev.contains(&curr) {
                return None;
            }
            lot.push(curr_seg.end);
            rev_in_lot.insert(curr);
        }

        let next = next_around(city, curr, forward, turn)?;
        let junction = if forward { curr_seg.end } else { curr_seg.start };
        forward = city.get_s(next).start == junction;
        curr = next;
    }

    searched_main.extend(main_in_lot);
    searched_rev.extend(rev_in_lot);
    Some(lot)
}

/// At the junction reached by traveling along `curr` (forward or backward),
/// pick the neighbor continuing the walk. Right walks take the most
/// clockwise exit, left walks the most counter-clockwise, each excluding a
/// window of near-reversals.
fn next_around(city: &City, curr: SegmentID, forward: bool, turn: Turn) -> Option<SegmentID> {
    let seg = city.get_s(curr);
    let (junction, travel_dir, neighbors) = if forward {
        (seg.end, seg.dir(), &seg.links_e)
    } else {
        (seg.start, seg.dir().opposite(), &seg.links_s)
    };

    let mut best: Option<(SegmentID, f64)> = None;
    for &n in neighbors {
        if n == curr {
            continue;
        }
        let out_dir = match leaving_direction(city, n, junction) {
            Some(dir) => dir,
            None => continue,
        };
        let diff = out_dir.ccw_diff(travel_dir);
        let better = match turn {
            Turn::Right => diff >= 85.0 && best.map(|(_, d)| diff > d).unwrap_or(true),
            Turn::Left => diff <= 275.0 && best.map(|(_, d)| diff < d).unwrap_or(true),
        };
        if better {
            best = Some((n, diff));
        }
    }
    best.map(|(id, _)| id)
}

/// The direction a walk would leave `junction` along segment `n`, or None if
/// `n` doesn't actually touch the junction.
fn leaving_direction(city: &City, n: SegmentID, junction: Pt2D) -> Option<Angle> {
    let seg = city.get_s(n);
    if seg.start == junction {
        Some(seg.dir())
    } else if seg.end == junction {
        Some(seg.dir().opposite())
    } else {
        None
    }
}

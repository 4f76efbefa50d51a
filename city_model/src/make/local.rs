//! Local constraints: deciding whether a proposed segment is accepted as
//! drawn, snapped onto existing geometry, or rejected. The scan over nearby
//! committed segments picks the single highest-priority applicable action,
//! which is then applied in one place.

use std::collections::BTreeSet;

use geom::{trim_f64, Crossing, Pt2D};

use crate::make::{Growth, Proposal};
use crate::sectors;
use crate::{Segment, SegmentID, SnapType};

/// The best applicable snap, chosen by the scan. Priority order: a straight
/// crossing beats a vertex snap beats an extend-to-reach crossing.
#[derive(Debug)]
enum SnapAction {
    Cross {
        other: SegmentID,
        crossing: Crossing,
    },
    Vertex {
        other: SegmentID,
        at_end: bool,
    },
    ExtendCross {
        other: SegmentID,
        crossing: Crossing,
    },
}

impl Growth {
    /// Returns false if the proposal is rejected outright. On success the
    /// proposal may have been mutated (endpoint moved, links pre-populated)
    /// and an existing road may have been split.
    pub(crate) fn local_constraints(&mut self, prop: &mut Proposal) -> bool {
        if self.is_crowded(prop) {
            return false;
        }

        match self.scan(prop) {
            None => true,
            Some(SnapAction::Cross { other, crossing }) => {
                self.snap_to_cross(prop, other, &crossing, false)
            }
            Some(SnapAction::Vertex { other, at_end }) => {
                self.snap_to_vert(prop, other, at_end, false)
            }
            Some(SnapAction::ExtendCross { other, crossing }) => {
                self.snap_to_cross(prop, other, &crossing, true)
            }
        }
    }

    /// Nearly-parallel forks from the same junction are disallowed: compare
    /// the proposal against every sibling already linked at its parent's end.
    fn is_crowded(&self, prop: &Proposal) -> bool {
        let pid = match prop.parent {
            Some(pid) => pid,
            None => return false,
        };
        for &sib_id in &self.roads[pid.0].links_e {
            let sib = &self.roads[sib_id.0];
            let sib_angle = if sib.start == prop.start {
                sib.dir()
            } else if sib.end == prop.start {
                sib.dir().opposite()
            } else {
                // The junction set can hold segments touching the parent
                // somewhere else entirely; they can't crowd this one.
                continue;
            };
            if prop.dir().shortest_diff(sib_angle) < self.params.min_angle_diff {
                return true;
            }
        }
        false
    }

    /// One pass over all committed segments in the proposal's sectors,
    /// keeping the single best action. Among crossings, the nearest along the
    /// proposal wins; among extend candidates, the nearest past its end; among
    /// vertices, the closest endpoint.
    fn scan(&self, prop: &Proposal) -> Option<SnapAction> {
        let prop_line = prop.line();

        // 3 = cross, 2 = vertex, 1 = extend, 0 = nothing yet
        let mut priority = 0;
        let mut action = None;
        let mut best_cross_factor = 1.0;
        let mut best_extend_factor = f64::INFINITY;
        let mut best_vertex_dist = f64::INFINITY;

        let mut seen: BTreeSet<SegmentID> = BTreeSet::new();
        for key in sectors::from_endpoints(prop.start, prop.end, &self.params) {
            let ids = match self.sectors.get(&key) {
                Some(ids) => ids,
                None => continue,
            };
            for &other_id in ids {
                // Fringe duplication means revisits; each candidate is
                // considered once.
                if !seen.insert(other_id) {
                    continue;
                }
                let other = &self.roads[other_id.0];
                let crossing = prop_line.unbounded_crossing(&other.line());

                if let Some(c) = crossing {
                    if c.self_factor > 0.0 && c.self_factor < best_cross_factor {
                        best_cross_factor = c.self_factor;
                        priority = 3;
                        action = Some(SnapAction::Cross {
                            other: other_id,
                            crossing: c,
                        });
                    }
                }

                if priority <= 2 {
                    let d_end = other.end.dist(prop.end);
                    let d_start = other.start.dist(prop.end);
                    let (dist, at_end) = if d_end <= d_start {
                        (d_end, true)
                    } else {
                        (d_start, false)
                    };
                    if dist < self.params.snap_vertex_radius && dist < best_vertex_dist {
                        best_vertex_dist = dist;
                        priority = 2;
                        action = Some(SnapAction::Vertex {
                            other: other_id,
                            at_end,
                        });
                    }
                }

                if priority <= 1 {
                    if let Some(c) = crossing {
                        if c.self_factor > 1.0
                            && c.self_factor < best_extend_factor
                            && prop.end.dist(prop_line.percent_along(c.self_factor))
                                < self.params.snap_extend_radius
                        {
                            best_extend_factor = c.self_factor;
                            priority = 1;
                            action = Some(SnapAction::ExtendCross {
                                other: other_id,
                                crossing: c,
                            });
                        }
                    }
                }
            }
        }
        action
    }

    /// Resolve a crossing: reject shallow angles, fold near-vertex crossings
    /// onto the vertex, otherwise split the other road at the crossing point
    /// and shorten (or lengthen, for the extend case) the proposal to end
    /// there.
    fn snap_to_cross(
        &mut self,
        prop: &mut Proposal,
        other_id: SegmentID,
        crossing: &Crossing,
        is_extend: bool,
    ) -> bool {
        let diff = prop.dir().shortest_diff(self.roads[other_id.0].dir());
        // Fold to [0, 90]: a crossing has no orientation.
        let crossing_angle = diff.min((diff - 180.0).abs());
        if crossing_angle < self.params.min_angle_diff {
            return false;
        }

        // A crossing within rounding tolerance of either end of the other
        // road becomes a vertex snap; a true split there would leave a
        // degenerate sliver.
        let u = trim_f64(crossing.other_factor);
        if u <= 0.0 {
            return self.snap_to_vert(prop, other_id, false, true);
        }
        if u >= 1.0 {
            return self.snap_to_vert(prop, other_id, true, true);
        }
        // And a crossing at the proposal's own start would commit a
        // zero-length segment.
        if trim_f64(crossing.self_factor) <= 0.0 || crossing.pt.approx_eq(prop.start) {
            return false;
        }

        let half_id = self.split(other_id, crossing.pt);

        prop.links_e.insert(other_id);
        prop.links_e.insert(half_id);
        prop.end = crossing.pt;
        prop.has_snapped = if is_extend {
            SnapType::Extend
        } else {
            SnapType::Cross
        };
        true
    }

    /// Split a committed road at `at`. The original keeps its identity but
    /// now starts at the crossing point; a new segment covers the abandoned
    /// half, inheriting the old parent and junction links.
    fn split(&mut self, other_id: SegmentID, at: Pt2D) -> SegmentID {
        let old_start = self.roads[other_id.0].start;
        let old_parent = self.roads[other_id.0].parent;
        let old_is_highway = self.roads[other_id.0].is_highway;
        let old_is_branch = self.roads[other_id.0].is_branch;

        self.roads[other_id.0].start = at;
        self.roads[other_id.0].links_s.clear();

        // Unhook the truncated road from the junction at its old start; the
        // new half takes its place there.
        if let Some(pid) = old_parent {
            self.roads[pid.0].links_e.remove(&other_id);
            let parent_end = self.roads[pid.0].end;
            let junction: Vec<SegmentID> = self.roads[pid.0].links_e.iter().copied().collect();
            for n in junction {
                if self.roads[n.0].start == parent_end {
                    self.roads[n.0].links_s.remove(&other_id);
                } else if self.roads[n.0].end == parent_end {
                    self.roads[n.0].links_e.remove(&other_id);
                }
            }
        }

        let half_id = SegmentID(self.roads.len());
        let mut links_e = BTreeSet::new();
        links_e.insert(other_id);
        self.roads.push(Segment {
            id: half_id,
            start: old_start,
            end: at,
            is_highway: old_is_highway,
            is_branch: old_is_branch,
            t: 0,
            has_snapped: SnapType::No,
            parent: old_parent,
            links_s: BTreeSet::new(),
            links_e,
            connected: false,
        });
        self.connect_links(half_id);
        sectors::add(&self.roads[half_id.0], &mut self.sectors, &self.params);

        self.roads[other_id.0].is_branch = false;
        self.roads[other_id.0].parent = Some(half_id);
        self.roads[other_id.0].links_s.insert(half_id);

        half_id
    }

    /// Move the proposal's endpoint onto an existing vertex, unless doing so
    /// would crowd against the target road or anything already linked there.
    fn snap_to_vert(
        &mut self,
        prop: &mut Proposal,
        other_id: SegmentID,
        at_end: bool,
        too_close: bool,
    ) -> bool {
        let other = &self.roads[other_id.0];
        let (link_pt, links, other_angle) = if at_end {
            (other.end, other.links_e.clone(), other.dir())
        } else {
            (other.start, other.links_s.clone(), other.dir().opposite())
        };

        if prop.dir().shortest_diff(other_angle) < self.params.min_angle_diff {
            return false;
        }
        for &n in &links {
            let n_seg = &self.roads[n.0];
            let angle = if n_seg.end == link_pt {
                n_seg.dir()
            } else if n_seg.start == link_pt {
                n_seg.dir().opposite()
            } else {
                warn!("{} is linked at a vertex it doesn't touch", n);
                continue;
            };
            if prop.dir().shortest_diff(angle) < self.params.min_angle_diff {
                return false;
            }
        }

        prop.end = link_pt;
        prop.links_e.extend(links);
        prop.links_e.insert(other_id);
        prop.has_snapped = if too_close {
            SnapType::CrossTooClose
        } else {
            SnapType::End
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    use crate::{GenerationParams, Heatmap};

    use super::*;

    fn empty_growth() -> Growth {
        let mut rng = XorShiftRng::seed_from_u64(0);
        let heatmap = Heatmap::new(&mut rng);
        Growth {
            params: GenerationParams::default(),
            roads: Vec::new(),
            sectors: BTreeMap::new(),
            heatmap,
            rng,
        }
    }

    fn commit_new(growth: &mut Growth, start: Pt2D, end: Pt2D, parent: Option<SegmentID>) -> SegmentID {
        let prop = Proposal {
            start,
            end,
            is_highway: false,
            is_branch: false,
            t: 0,
            parent,
            links_e: BTreeSet::new(),
            has_snapped: SnapType::No,
        };
        growth.commit(prop)
    }

    #[test]
    fn shallow_fork_is_rejected() {
        let mut growth = empty_growth();
        let parent = commit_new(
            &mut growth,
            Pt2D::new(0.0, 0.0),
            Pt2D::new(100.0, 0.0),
            None,
        );
        let first = Proposal {
            start: Pt2D::new(100.0, 0.0),
            end: Pt2D::new(200.0, 0.0),
            is_highway: false,
            is_branch: false,
            t: 0,
            parent: Some(parent),
            links_e: BTreeSet::new(),
            has_snapped: SnapType::No,
        };
        let mut first = first;
        assert!(growth.local_constraints(&mut first));
        growth.commit(first);

        // 10 degrees off the committed sibling: under the 30 degree minimum.
        let mut shallow = Proposal {
            start: Pt2D::new(100.0, 0.0),
            end: Pt2D::new(100.0, 0.0).project_away(100.0, geom::Angle::degrees(10.0)),
            is_highway: false,
            is_branch: false,
            t: 0,
            parent: Some(parent),
            links_e: BTreeSet::new(),
            has_snapped: SnapType::No,
        };
        assert!(!growth.local_constraints(&mut shallow));

        // A perpendicular fork from the same junction is fine.
        let mut perp = Proposal {
            start: Pt2D::new(100.0, 0.0),
            end: Pt2D::new(100.0, 100.0),
            is_highway: false,
            is_branch: false,
            t: 0,
            parent: Some(parent),
            links_e: BTreeSet::new(),
            has_snapped: SnapType::No,
        };
        assert!(growth.local_constraints(&mut perp));
    }

    #[test]
    fn crossing_splits_the_other_road() {
        let mut growth = empty_growth();
        let target = commit_new(
            &mut growth,
            Pt2D::new(0.0, 0.0),
            Pt2D::new(200.0, 0.0),
            None,
        );

        // Crosses the target's interior at (100, 0) heading straight down.
        let mut prop = Proposal {
            start: Pt2D::new(100.0, 150.0),
            end: Pt2D::new(100.0, -150.0),
            is_highway: false,
            is_branch: false,
            t: 0,
            parent: None,
            links_e: BTreeSet::new(),
            has_snapped: SnapType::No,
        };
        assert!(growth.local_constraints(&mut prop));
        assert_eq!(prop.has_snapped, SnapType::Cross);
        assert!(prop.end.approx_eq(Pt2D::new(100.0, 0.0)));

        // The target was truncated in place; a fresh segment covers the
        // abandoned half, and together they span the original exactly.
        let half_id = SegmentID(1);
        assert_eq!(growth.roads.len(), 2);
        let target_seg = &growth.roads[target.0];
        let half = &growth.roads[half_id.0];
        assert_eq!(target_seg.start, Pt2D::new(100.0, 0.0));
        assert_eq!(target_seg.end, Pt2D::new(200.0, 0.0));
        assert_eq!(half.start, Pt2D::new(0.0, 0.0));
        assert_eq!(half.end, Pt2D::new(100.0, 0.0));
        assert_eq!(target_seg.parent, Some(half_id));
        assert!(target_seg.links_s.contains(&half_id));
        assert!(half.links_e.contains(&target));

        let committed = growth.commit(prop);
        let committed_seg = growth.roads[committed.0].clone();
        assert!(committed_seg.links_e.contains(&target));
        assert!(committed_seg.links_e.contains(&half_id));
        assert!(growth.roads[target.0].links_s.contains(&committed));
        assert!(growth.roads[half_id.0].links_e.contains(&committed));
    }

    #[test]
    fn shallow_crossing_is_rejected() {
        let mut growth = empty_growth();
        commit_new(
            &mut growth,
            Pt2D::new(0.0, 0.0),
            Pt2D::new(200.0, 0.0),
            None,
        );

        // Crosses at around 11 degrees: treated as a near-parallel overlap.
        let mut prop = Proposal {
            start: Pt2D::new(0.0, 20.0),
            end: Pt2D::new(200.0, -20.0),
            is_highway: false,
            is_branch: false,
            t: 0,
            parent: None,
            links_e: BTreeSet::new(),
            has_snapped: SnapType::No,
        };
        assert!(!growth.local_constraints(&mut prop));
    }

    #[test]
    fn endpoint_snaps_to_nearby_vertex() {
        let mut growth = empty_growth();
        let target = commit_new(
            &mut growth,
            Pt2D::new(0.0, 0.0),
            Pt2D::new(200.0, 0.0),
            None,
        );

        // Ends 30 units short of the target's end vertex, well within the
        // 50-unit snap radius, and roughly perpendicular.
        let mut prop = Proposal {
            start: Pt2D::new(200.0, 130.0),
            end: Pt2D::new(200.0, 30.0),
            is_highway: false,
            is_branch: false,
            t: 0,
            parent: None,
            links_e: BTreeSet::new(),
            has_snapped: SnapType::No,
        };
        assert!(growth.local_constraints(&mut prop));
        assert_eq!(prop.has_snapped, SnapType::End);
        assert_eq!(prop.end, Pt2D::new(200.0, 0.0));
        assert!(prop.links_e.contains(&target));
    }

    #[test]
    fn extend_reaches_a_road_just_past_the_end() {
        let mut growth = empty_growth();
        commit_new(
            &mut growth,
            Pt2D::new(300.0, 200.0),
            Pt2D::new(300.0, -200.0),
            None,
        );

        // Stops 30 units short of the vertical road; lengthening it within
        // the extend radius reaches a crossing. The crossing point is far
        // from either endpoint of the vertical road, so no vertex snap
        // interferes.
        let mut prop = Proposal {
            start: Pt2D::new(0.0, 0.0),
            end: Pt2D::new(270.0, 0.0),
            is_highway: false,
            is_branch: false,
            t: 0,
            parent: None,
            links_e: BTreeSet::new(),
            has_snapped: SnapType::No,
        };
        assert!(growth.local_constraints(&mut prop));
        assert_eq!(prop.has_snapped, SnapType::Extend);
        assert!(prop.end.approx_eq(Pt2D::new(300.0, 0.0)));
    }
}

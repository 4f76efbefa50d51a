//! Growing a road network from a single seed highway. A priority queue holds
//! proposed segments ordered by their tick; each one is tested against nearby
//! committed geometry (possibly getting snapped, or splitting an existing
//! road), committed, and then asked for follow-up proposals weighted by the
//! population field.

mod local;

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;

use geom::{Angle, Line, Pt2D};

use crate::sectors::{self, SectorKey};
use crate::{City, GenerationParams, Heatmap, Segment, SegmentID, SnapType};

/// A segment that hasn't been committed yet. Its endpoints are still mutable;
/// local constraints may move `end` and pre-populate `links_e` before commit.
#[derive(Clone, Debug)]
pub(crate) struct Proposal {
    pub start: Pt2D,
    pub end: Pt2D,
    pub is_highway: bool,
    pub is_branch: bool,
    /// Extra tick delay beyond the parent's.
    pub t: usize,
    pub parent: Option<SegmentID>,
    pub links_e: BTreeSet<SegmentID>,
    pub has_snapped: SnapType,
}

impl Proposal {
    fn seed_highway(params: &GenerationParams) -> Proposal {
        Proposal {
            start: Pt2D::new(0.0, 0.0),
            end: Pt2D::new(params.highway_length, 0.0),
            is_highway: true,
            is_branch: false,
            t: 0,
            parent: None,
            links_e: BTreeSet::new(),
            has_snapped: SnapType::No,
        }
    }

    /// A new proposal growing from `prev`'s end, rotated `offset_degs` from
    /// `prev`'s direction. Doesn't touch `prev`.
    fn continuation(
        prev: &Segment,
        length: f64,
        offset_degs: f64,
        is_highway: bool,
        is_branch: bool,
        delay: usize,
    ) -> Proposal {
        let dir = prev.dir().rotate_degs(offset_degs);
        Proposal {
            start: prev.end,
            end: prev.end.project_away(length, dir),
            is_highway,
            is_branch,
            t: delay,
            parent: None,
            links_e: BTreeSet::new(),
            has_snapped: SnapType::No,
        }
    }

    /// A straight-ish continuation of the same road class and length.
    fn extension(prev: &Segment, deviation_degs: f64) -> Proposal {
        Proposal::continuation(prev, prev.length(), deviation_degs, prev.is_highway, false, 0)
    }

    pub fn line(&self) -> Line {
        Line::new(self.start, self.end)
    }

    pub fn dir(&self) -> Angle {
        self.line().angle()
    }
}

/// Min-heap entry: proposals pop in ascending tick order, ties broken by
/// insertion order.
struct Queued {
    t: usize,
    seq: usize,
    proposal: Proposal,
}

impl PartialEq for Queued {
    fn eq(&self, other: &Queued) -> bool {
        self.t == other.t && self.seq == other.seq
    }
}
impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Queued) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    fn cmp(&self, other: &Queued) -> Ordering {
        // BinaryHeap is a max-heap; reverse to pop the smallest tick first.
        other.t.cmp(&self.t).then_with(|| other.seq.cmp(&self.seq))
    }
}

/// All the mutable state of one generation run. Exclusively owned by the
/// growth loop; nothing else writes to a city's contents after `generate`
/// returns.
pub(crate) struct Growth {
    pub params: GenerationParams,
    pub roads: Vec<Segment>,
    pub sectors: BTreeMap<SectorKey, Vec<SegmentID>>,
    pub heatmap: Heatmap,
    pub rng: XorShiftRng,
}

/// Grow a city from scratch. If `seed` is omitted, one is derived from the
/// clock and logged, so any run can be reproduced.
pub fn generate(seed: Option<u64>, params: GenerationParams) -> City {
    let seed = seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    });
    info!(
        "Generating up to {} segments with seed {}",
        params.max_segs, seed
    );

    let mut rng = XorShiftRng::seed_from_u64(seed);
    let heatmap = Heatmap::new(&mut rng);
    let mut growth = Growth {
        params,
        roads: Vec::new(),
        sectors: BTreeMap::new(),
        heatmap,
        rng,
    };

    let mut queue: BinaryHeap<Queued> = BinaryHeap::new();
    let mut seq = 0;
    queue.push(Queued {
        t: 0,
        seq,
        proposal: Proposal::seed_highway(&growth.params),
    });
    seq += 1;

    while growth.roads.len() < growth.params.max_segs {
        let mut prop = match queue.pop() {
            Some(queued) => queued.proposal,
            None => break,
        };

        if !growth.local_constraints(&mut prop) {
            continue;
        }
        let id = growth.commit(prop);

        for mut new_prop in growth.global_goals(id) {
            // Delayed branches interleave correctly: each proposal inherits
            // its parent's tick plus one, plus its own extra delay.
            new_prop.t = growth.roads[id.0].t + 1 + new_prop.t;
            queue.push(Queued {
                t: new_prop.t,
                seq,
                proposal: new_prop,
            });
            seq += 1;
        }
    }

    let highways = growth.roads.iter().filter(|s| s.is_highway).count();
    let branches = growth.roads.iter().filter(|s| s.is_branch).count();
    let snapped = growth
        .roads
        .iter()
        .filter(|s| s.has_snapped != SnapType::No)
        .count();
    info!(
        "Committed {} segments ({} highways, {} streets, {} branches, {} snapped)",
        growth.roads.len(),
        highways,
        growth.roads.len() - highways,
        branches,
        snapped
    );

    City {
        roads: growth.roads,
        sectors: growth.sectors,
        population: growth.heatmap,
        params: growth.params,
        seed,
    }
}

impl Growth {
    /// Finalize a proposal: give it the next arena id, reconcile links, and
    /// register it spatially. Its endpoints are immutable from here on.
    pub(crate) fn commit(&mut self, prop: Proposal) -> SegmentID {
        let id = SegmentID(self.roads.len());
        self.roads.push(Segment {
            id,
            start: prop.start,
            end: prop.end,
            is_highway: prop.is_highway,
            is_branch: prop.is_branch,
            t: prop.t,
            has_snapped: prop.has_snapped,
            parent: prop.parent,
            links_s: BTreeSet::new(),
            links_e: prop.links_e,
            connected: false,
        });
        self.connect_links(id);
        sectors::add(&self.roads[id.0], &mut self.sectors, &self.params);
        id
    }

    /// Record this segment's adjacency, bidirectionally, now that its
    /// geometry is final. Links through the parent's junction land in
    /// `links_s`; anything pre-populated in `links_e` by snapping gets the
    /// reverse edge by endpoint match.
    pub(crate) fn connect_links(&mut self, id: SegmentID) {
        debug_assert!(
            !self.roads[id.0].connected,
            "connect_links called twice on {}",
            id
        );
        let start = self.roads[id.0].start;
        let end = self.roads[id.0].end;

        if let Some(pid) = self.roads[id.0].parent {
            let junction: Vec<SegmentID> = self.roads[pid.0].links_e.iter().copied().collect();
            for n in junction {
                if start == self.roads[n.0].end {
                    self.roads[n.0].links_e.insert(id);
                } else if start == self.roads[n.0].start {
                    self.roads[n.0].links_s.insert(id);
                } else {
                    warn!(
                        "{} is at its parent's junction but touches neither endpoint of {}",
                        id, n
                    );
                    continue;
                }
                self.roads[id.0].links_s.insert(n);
            }
            self.roads[pid.0].links_e.insert(id);
            self.roads[id.0].links_s.insert(pid);
        }

        let pre_linked: Vec<SegmentID> = self.roads[id.0].links_e.iter().copied().collect();
        for n in pre_linked {
            if !self.roads[n.0].connected {
                warn!("{} is pre-linked to {}, which isn't connected yet", id, n);
                continue;
            }
            if end == self.roads[n.0].start {
                self.roads[n.0].links_s.insert(id);
            } else if end == self.roads[n.0].end {
                self.roads[n.0].links_e.insert(id);
            } else {
                warn!("{} ends at neither endpoint of {}", id, n);
            }
        }

        self.roads[id.0].connected = true;
    }

    /// Propose follow-up growth from a freshly committed segment. A segment
    /// that snapped to something terminates growth in that direction.
    fn global_goals(&mut self, id: SegmentID) -> Vec<Proposal> {
        let prev = self.roads[id.0].clone();
        let mut proposals = Vec::new();
        if prev.has_snapped != SnapType::No {
            return proposals;
        }

        let straight = Proposal::extension(&prev, 0.0);
        let straight_pop = self.heatmap.at_line(&straight.line());

        if prev.is_highway {
            let deviation = self.highway_deviation();
            let wiggle =
                Proposal::continuation(&prev, self.params.highway_length, deviation, true, false, 0);
            let wiggle_pop = self.heatmap.at_line(&wiggle.line());

            // Highways chase population: whichever of straight/wiggle sees
            // more of it wins.
            let ext_pop = if wiggle_pop > straight_pop {
                proposals.push(wiggle);
                wiggle_pop
            } else {
                proposals.push(straight);
                straight_pop
            };

            if ext_pop > self.params.highway_branch_pop
                && self.rng.gen::<f64>() < self.params.highway_branch_chance
            {
                let offset = 90.0 * self.random_sign() + self.branch_deviation();
                proposals.push(Proposal::continuation(
                    &prev,
                    self.params.highway_length,
                    offset,
                    true,
                    true,
                    0,
                ));
            }
        } else if straight_pop > self.rng.gen::<f64>() * self.params.street_extend_pop {
            // The randomized threshold avoids a hard population cutoff
            // producing visibly uniform grid density.
            proposals.push(straight);
        }

        if straight_pop > self.rng.gen::<f64>() * self.params.street_branch_pop
            && self.rng.gen::<f64>() < self.params.street_branch_chance
        {
            let offset = 90.0 * self.random_sign() + self.branch_deviation();
            // Cross-streets show up after the highway itself is further along.
            let delay = if prev.is_highway {
                self.params.street_branch_delay
            } else {
                0
            };
            proposals.push(Proposal::continuation(
                &prev,
                self.params.street_length,
                offset,
                false,
                true,
                delay,
            ));
        }

        for prop in &mut proposals {
            prop.parent = Some(id);
        }
        proposals
    }

    fn highway_deviation(&mut self) -> f64 {
        let max = self.params.highway_max_angle_dev;
        self.rng.gen_range(-max..=max)
    }

    fn branch_deviation(&mut self) -> f64 {
        let max = self.params.branch_max_angle_dev;
        self.rng.gen_range(-max..=max)
    }

    fn random_sign(&mut self) -> f64 {
        if self.rng.gen_bool(0.5) {
            1.0
        } else {
            -1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_params() -> GenerationParams {
        GenerationParams {
            max_segs: 50,
            ..GenerationParams::default()
        }
    }

    #[test]
    fn same_seed_same_city() {
        let city1 = generate(Some(42), small_params());
        let city2 = generate(Some(42), small_params());

        assert_eq!(city1.roads.len(), city2.roads.len());
        for (a, b) in city1.roads.iter().zip(city2.roads.iter()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.start, b.start);
            assert_eq!(a.end, b.end);
            assert_eq!(a.is_highway, b.is_highway);
        }
        for pt in [Pt2D::new(0.0, 0.0), Pt2D::new(1234.5, -678.9)] {
            assert_eq!(city1.population.at_point(pt), city2.population.at_point(pt));
        }
    }

    #[test]
    fn seeded_scenario() {
        let city = generate(Some(42), small_params());

        // The cap is checked at the top of each iteration, so one final
        // commit plus a split can overshoot by at most one.
        assert!(city.roads.len() <= 51, "got {} roads", city.roads.len());
        assert!(!city.roads.is_empty());

        // The seed highway. A later crossing may have split it and moved its
        // start, but its end never moves and it stays on the x axis.
        let first = &city.roads[0];
        assert_eq!(first.end, Pt2D::new(400.0, 0.0));
        assert!(first.start.y().abs() < 1e-6);
        assert!((0.0..400.0).contains(&first.start.x()));
        assert!(first.is_highway);

        for (idx, seg) in city.roads.iter().enumerate() {
            assert_eq!(seg.id, SegmentID(idx));
            assert!(seg.connected);
        }
    }

    #[test]
    fn links_are_symmetric_and_loop_free() {
        let city = generate(Some(42), small_params());

        for seg in &city.roads {
            assert!(!seg.links_s.contains(&seg.id), "{} links to itself", seg.id);
            assert!(!seg.links_e.contains(&seg.id), "{} links to itself", seg.id);

            for &n in seg.links_s.iter().chain(seg.links_e.iter()) {
                let other = city.get_s(n);
                assert!(
                    other.links_s.contains(&seg.id) || other.links_e.contains(&seg.id),
                    "{} links to {}, but not vice versa",
                    seg.id,
                    n
                );
            }
        }
    }

    #[test]
    fn sector_roundtrip() {
        let city = generate(Some(42), small_params());

        for seg in &city.roads {
            let keys = sectors::from_seg(seg, &city.params);
            let found = keys.iter().any(|key| {
                city.sectors
                    .get(key)
                    .map(|ids| ids.contains(&seg.id))
                    .unwrap_or(false)
            });
            assert!(found, "{} isn't registered in any of its sectors", seg.id);
        }
    }
}

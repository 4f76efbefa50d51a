//! The core model: a road network grown over an unbounded plane by a
//! priority-driven simulation, spatially indexed for local geometry queries,
//! and queryable with shortest-path searches. Rendering and input handling
//! live elsewhere; this crate only produces and answers questions about the
//! graph.

#[macro_use]
extern crate log;

pub mod blocks;
mod heatmap;
mod make;
pub mod pathfind;
pub mod sectors;
mod segment;
mod util;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use geom::Pt2D;

pub use crate::heatmap::Heatmap;
pub use crate::make::generate;
pub use crate::sectors::SectorKey;
pub use crate::segment::{Segment, SegmentID, SnapType};
pub use crate::util::{deserialize_btreemap, serialize_btreemap};

/// All the numeric knobs steering generation, supplied at startup. Defaults
/// produce a network of around a thousand segments with visible
/// highway/street structure.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Stop growing once this many segments are committed.
    pub max_segs: usize,

    pub highway_length: f64,
    pub street_length: f64,

    /// Minimum population for a highway extension to consider branching.
    pub highway_branch_pop: f64,
    pub highway_branch_chance: f64,
    /// Cap on the randomized population threshold for street branching.
    pub street_branch_pop: f64,
    pub street_branch_chance: f64,
    /// Cap on the randomized population threshold for street extension.
    pub street_extend_pop: f64,
    /// Cross-streets branching off a highway wait this many ticks.
    pub street_branch_delay: usize,

    /// Maximum random angular wiggle of a highway extension, in degrees.
    pub highway_max_angle_dev: f64,
    /// Maximum random deviation of a branch from perpendicular, in degrees.
    pub branch_max_angle_dev: f64,

    /// Two roads meeting below this angle (degrees) are rejected as
    /// near-parallel.
    pub min_angle_diff: f64,
    pub snap_vertex_radius: f64,
    pub snap_extend_radius: f64,

    /// Side length of a spatial-hash cell.
    pub sector_size: f64,
    /// Boundary fringe when both endpoints share one sector.
    pub min_dist_edge_contained: f64,
    /// Boundary fringe when a segment spans sectors.
    pub min_dist_edge_cross: f64,
}

impl Default for GenerationParams {
    fn default() -> GenerationParams {
        GenerationParams {
            max_segs: 1_000,
            highway_length: 400.0,
            street_length: 300.0,
            highway_branch_pop: 0.1,
            highway_branch_chance: 0.1,
            street_branch_pop: 0.1,
            street_branch_chance: 0.8,
            street_extend_pop: 0.1,
            street_branch_delay: 5,
            highway_max_angle_dev: 15.0,
            branch_max_angle_dev: 3.0,
            min_angle_diff: 30.0,
            snap_vertex_radius: 50.0,
            snap_extend_radius: 50.0,
            sector_size: 500.0,
            min_dist_edge_contained: 60.0,
            min_dist_edge_cross: 250.0,
        }
    }
}

/// A finished road network. Built once per `generate` call and read-only
/// afterwards; pathfinding and rendering only ever borrow it.
#[derive(Clone, Serialize, Deserialize)]
pub struct City {
    /// In commit order. `SegmentID` indexes into this.
    pub roads: Vec<Segment>,
    #[serde(
        serialize_with = "serialize_btreemap",
        deserialize_with = "deserialize_btreemap"
    )]
    pub sectors: BTreeMap<SectorKey, Vec<SegmentID>>,
    pub population: Heatmap,
    pub params: GenerationParams,
    /// The seed that produced this city, for reproducing it.
    pub seed: u64,
}

impl City {
    pub fn get_s(&self, id: SegmentID) -> &Segment {
        &self.roads[id.0]
    }

    /// The road whose midpoint is nearest `pt`, if any is within `max_dist`.
    /// Meant for hit-testing from a UI layer.
    pub fn closest_road(&self, pt: Pt2D, max_dist: f64) -> Option<SegmentID> {
        let mut closest: Option<(SegmentID, f64)> = None;
        for seg in &self.roads {
            let dist = pt.dist(seg.point_at(0.5));
            if dist < max_dist && closest.map(|(_, d)| dist < d).unwrap_or(true) {
                closest = Some((seg.id, dist));
            }
        }
        closest.map(|(id, _)| id)
    }
}

//! A spatial hash over fixed-size square cells. Segments register under every
//! cell their endpoints touch, with some fringe duplication near cell
//! boundaries so that geometry close to an edge is discoverable from the
//! adjacent cell too. Queries dedupe by id; duplicate registration is
//! intentional redundancy, not a bug.

use std::collections::{BTreeMap, BTreeSet};

use geom::Pt2D;

use crate::{GenerationParams, Segment, SegmentID};

pub type SectorKey = (i32, i32);

pub fn containing_sector(pt: Pt2D, sector_size: f64) -> SectorKey {
    (
        (pt.x() / sector_size).floor() as i32,
        (pt.y() / sector_size).floor() as i32,
    )
}

/// The home sector of `pt`, plus neighboring sectors whenever the point lies
/// within `fringe` of a cell edge. Near a corner this includes the diagonal
/// neighbor, so up to 4 sectors come back.
pub fn from_point(pt: Pt2D, fringe: f64, sector_size: f64) -> BTreeSet<SectorKey> {
    let home = containing_sector(pt, sector_size);
    let mut sectors = BTreeSet::new();
    sectors.insert(home);

    let off_x = pt.x().rem_euclid(sector_size);
    let off_y = pt.y().rem_euclid(sector_size);

    let dx = if off_x < fringe {
        Some(-1)
    } else if sector_size - off_x < fringe {
        Some(1)
    } else {
        None
    };
    let dy = if off_y < fringe {
        Some(-1)
    } else if sector_size - off_y < fringe {
        Some(1)
    } else {
        None
    };

    if let Some(dx) = dx {
        sectors.insert((home.0 + dx, home.1));
    }
    if let Some(dy) = dy {
        sectors.insert((home.0, home.1 + dy));
    }
    if let (Some(dx), Some(dy)) = (dx, dy) {
        sectors.insert((home.0 + dx, home.1 + dy));
    }
    sectors
}

/// All sectors a segment must be registered under. Uses a wider fringe when
/// the endpoints land in different sectors, since the body of the segment can
/// pass close to cells neither endpoint is in.
pub fn from_seg(seg: &Segment, params: &GenerationParams) -> BTreeSet<SectorKey> {
    from_endpoints(seg.start, seg.end, params)
}

pub fn from_endpoints(start: Pt2D, end: Pt2D, params: &GenerationParams) -> BTreeSet<SectorKey> {
    let size = params.sector_size;
    let start_sector = containing_sector(start, size);
    let end_sector = containing_sector(end, size);

    let fringe = if start_sector == end_sector {
        params.min_dist_edge_contained
    } else {
        params.min_dist_edge_cross
    };

    let mut sectors = from_point(start, fringe, size);
    sectors.extend(from_point(end, fringe, size));

    // A segment spanning sectors diagonally can thread the gap between two
    // diagonally-adjacent cells without either endpoint's fringe covering the
    // other two corners of the rectangle. Patch them in explicitly.
    if start_sector.0 != end_sector.0 && start_sector.1 != end_sector.1 {
        sectors.insert((start_sector.0, end_sector.1));
        sectors.insert((end_sector.0, start_sector.1));
    }

    sectors
}

pub fn add(
    seg: &Segment,
    sectors: &mut BTreeMap<SectorKey, Vec<SegmentID>>,
    params: &GenerationParams,
) {
    for key in from_seg(seg, params) {
        sectors.entry(key).or_insert_with(Vec::new).push(seg.id);
    }
}

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use geom::{Angle, Line, Pt2D};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentID(pub usize);

impl fmt::Display for SegmentID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Segment({0})", self.0)
    }
}

/// How a segment's endpoint was reconciled against existing geometry when it
/// was committed. Anything other than `No` stops further growth from that end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapType {
    No,
    /// Crossed another road within its own length; the other road was split.
    Cross,
    /// The endpoint landed near an existing vertex and was moved onto it.
    End,
    /// Reached another road only by being lengthened.
    Extend,
    /// A crossing fell too close to an existing vertex to justify a split, so
    /// it was folded onto the vertex instead.
    CrossTooClose,
}

/// A committed road. Lives in `City::roads`; `id` is the index there, assigned
/// in commit order. Endpoints are final, except that splitting an existing
/// road moves its `start` to the crossing point.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentID,
    pub start: Pt2D,
    pub end: Pt2D,
    pub is_highway: bool,
    pub is_branch: bool,
    /// Proposal-order delay counter; lower was processed first.
    pub t: usize,
    pub has_snapped: SnapType,
    /// The segment that spawned this one. Only used during construction and
    /// splitting, never for traversal.
    pub parent: Option<SegmentID>,
    /// Committed neighbors touching `start`.
    pub links_s: BTreeSet<SegmentID>,
    /// Committed neighbors touching `end`.
    pub links_e: BTreeSet<SegmentID>,
    /// True once links have been reconciled at commit time.
    pub connected: bool,
}

impl Segment {
    pub fn line(&self) -> Line {
        Line::new(self.start, self.end)
    }

    /// Direction in degrees, `[0, 360)`.
    pub fn dir(&self) -> Angle {
        self.line().angle()
    }

    pub fn length(&self) -> f64 {
        self.line().length()
    }

    pub fn point_at(&self, factor: f64) -> Pt2D {
        self.line().percent_along(factor)
    }
}

impl PartialEq for Segment {
    fn eq(&self, other: &Segment) -> bool {
        self.id == other.id
    }
}

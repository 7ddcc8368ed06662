use std::fmt;

use anya_core::SphericalPoint;

/// Index of an expanded node in the search arena.
pub type NodeId = usize;

// ---------------------------------------------------------------------------
// Index-space frame
// ---------------------------------------------------------------------------

/// A fractional position in lattice index space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct Coord {
    pub(crate) row: f64,
    pub(crate) col: f64,
}

impl Coord {
    #[inline]
    pub(crate) const fn new(row: f64, col: f64) -> Self {
        Self { row, col }
    }
}

/// An interval `[left, right]` of columns on lattice row `row`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct Interval {
    pub(crate) row: isize,
    pub(crate) left: f64,
    pub(crate) right: f64,
}

/// A node's root and interval in index space. The geographic fields of
/// [`SearchNode`] are derived from this.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct Frame {
    pub(crate) root: Coord,
    pub(crate) interval: Interval,
}

impl Frame {
    /// Whether the root lies on the interval's own row.
    #[inline]
    pub(crate) fn is_flat(&self) -> bool {
        (self.root.row - self.interval.row as f64).abs() < 1e-9
    }
}

const QUANTUM: f64 = 1e6;

#[inline]
fn quantize(v: f64) -> i64 {
    (v * QUANTUM).round() as i64
}

/// Signature for duplicate suppression: one interval seen from one root.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct IntervalKey {
    row: isize,
    left: i64,
    right: i64,
    root: RootKey,
}

impl From<&Frame> for IntervalKey {
    fn from(f: &Frame) -> Self {
        Self {
            row: f.interval.row,
            left: quantize(f.interval.left),
            right: quantize(f.interval.right),
            root: RootKey::from(f.root),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct RootKey {
    row: i64,
    col: i64,
}

impl From<Coord> for RootKey {
    fn from(c: Coord) -> Self {
        Self {
            row: quantize(c.row),
            col: quantize(c.col),
        }
    }
}

// ---------------------------------------------------------------------------
// SearchNode
// ---------------------------------------------------------------------------

/// One frontier state: everything visible from `root` through the interval
/// between `left` and `right`.
#[derive(Clone, Debug)]
pub struct SearchNode {
    /// Point the path bends through.
    pub root: SphericalPoint,
    pub right: SphericalPoint,
    pub left: SphericalPoint,
    /// Path length from the start to `root`, in degrees.
    pub g: f64,
    /// Lower bound on the remaining length through the interval to the goal.
    pub h: f64,
    pub parent: Option<NodeId>,
    pub(crate) frame: Frame,
}

impl SearchNode {
    #[inline]
    pub fn f(&self) -> f64 {
        self.g + self.h
    }

    /// Queue order: smaller `f` first, larger `g` first among equal `f`.
    pub fn comes_before(&self, other: &Self) -> bool {
        let (fa, fb) = (self.f(), other.f());
        if fa == fb { self.g > other.g } else { fa < fb }
    }
}

impl fmt::Display for SearchNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SearchNode({}, [{}, {}], {:.5}, {:.5}, {:.5})",
            self.root,
            self.right,
            self.left,
            self.f(),
            self.g,
            self.h
        )
    }
}

//! Row scans in lattice index space.
//!
//! Lattice row `y` is the line between tile rows `y - 1` and `y`; lattice column
//! `x` the line between tile columns `x - 1` and `x`. Fractional positions are
//! plain `f64` pairs `(row, col)`.

use crate::grid::Grid;

/// Tolerance for deciding that an index-space coordinate is a lattice line.
pub(crate) const INDEX_EPSILON: f64 = 1e-9;

/// Whether `v` lies on a lattice line.
#[inline]
pub fn is_integral(v: f64) -> bool {
    (v - v.round()).abs() < INDEX_EPSILON
}

impl Grid {
    /// The lattice span `[start, end]` of the run of equal tiles holding tile
    /// `(cell_row, col)`, or `None` off the grid.
    pub fn run_span(&self, cell_row: isize, col: isize) -> Option<(isize, isize)> {
        if cell_row < 0 || col < 0 {
            return None;
        }
        let (r, c) = (cell_row as usize, col as usize);
        Some((self.left_endpoint(r, c)? + 1, self.right_endpoint(r, c)?))
    }

    /// Like [`run_span`](Self::run_span), but `None` for blocked tiles too.
    pub fn free_run(&self, cell_row: isize, col: isize) -> Option<(isize, isize)> {
        if self.is_blocked(cell_row, col) {
            return None;
        }
        self.run_span(cell_row, col)
    }

    /// Lattice column where the run of equal tiles holding `(cell_row, col)`
    /// ends. Rows off the grid never change state.
    fn run_end(&self, cell_row: isize, col: isize) -> isize {
        if cell_row < 0 || cell_row as usize >= self.height() {
            return self.width() as isize;
        }
        self.right_endpoint(cell_row as usize, col as usize)
            .unwrap_or(self.width() as isize)
    }

    fn run_start(&self, cell_row: isize, col: isize) -> isize {
        if cell_row < 0 || cell_row as usize >= self.height() {
            return 0;
        }
        self.left_endpoint(cell_row as usize, col as usize)
            .map_or(0, |l| l + 1)
    }

    /// The first point right of `x` on lattice row `row` where either adjoining
    /// tile row changes state.
    pub fn next_corner_right(&self, row: isize, x: f64) -> f64 {
        let col = if is_integral(x) {
            x.round() as isize
        } else {
            x.floor() as isize
        };
        if col >= self.width() as isize {
            return self.width() as f64;
        }
        self.run_end(row - 1, col).min(self.run_end(row, col)) as f64
    }

    /// The first point left of `x` on lattice row `row` where either adjoining
    /// tile row changes state.
    pub fn next_corner_left(&self, row: isize, x: f64) -> f64 {
        let col = if is_integral(x) {
            x.round() as isize - 1
        } else {
            x.floor() as isize
        };
        if col < 0 {
            return 0.0;
        }
        self.run_start(row - 1, col).max(self.run_start(row, col)) as f64
    }

    /// Whether a move along lattice row `row` from `lo` to `hi` keeps a free
    /// tile on at least one side. `[lo, hi]` must not straddle a corner.
    pub fn is_row_traversable(&self, row: isize, lo: f64, hi: f64) -> bool {
        if hi - lo <= INDEX_EPSILON {
            return false;
        }
        let mid = ((lo + hi) / 2.0).floor() as isize;
        !self.is_blocked(row - 1, mid) || !self.is_blocked(row, mid)
    }

    /// Whether every tile of `cell_row` touched by the column span `[lo, hi]`
    /// is free. A degenerate span on a lattice column needs either neighbour
    /// free.
    pub fn is_free_span(&self, cell_row: isize, lo: f64, hi: f64) -> bool {
        if hi - lo <= INDEX_EPSILON {
            if is_integral(lo) {
                let x = lo.round() as isize;
                return !self.is_blocked(cell_row, x - 1) || !self.is_blocked(cell_row, x);
            }
            return !self.is_blocked(cell_row, lo.floor() as isize);
        }
        let first = (lo + INDEX_EPSILON).floor() as isize;
        match self.free_run(cell_row, first) {
            Some((_, end)) => end as f64 >= hi - INDEX_EPSILON,
            None => false,
        }
    }

    /// Whether lattice corner `(row, col)` touches exactly two diagonally
    /// opposite blocked tiles.
    pub fn is_ambiguous_corner(&self, row: isize, col: isize) -> bool {
        let nw = self.is_blocked(row - 1, col - 1);
        let ne = self.is_blocked(row - 1, col);
        let sw = self.is_blocked(row, col - 1);
        let se = self.is_blocked(row, col);
        (nw && se && !ne && !sw) || (ne && sw && !nw && !se)
    }
}

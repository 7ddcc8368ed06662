use anya_core::{Result, is_integral};

use crate::node::Interval;
use crate::search::{Anchor, SearchInstance};

impl SearchInstance<'_> {
    /// Push the first frontier around the start point.
    ///
    /// A start on a lattice row looks into both adjoining strips and along the
    /// row itself. A start strictly inside a strip looks at the rows bounding
    /// that strip.
    pub(crate) fn seed(&mut self, origin: &Anchor) -> Result<()> {
        let grid = self.grid;
        let (sr, sc) = (origin.at.row, origin.at.col);

        if is_integral(sr) {
            let y = sr.round() as isize;
            for (cells, target) in [(y - 1, y - 1), (y, y + 1)] {
                if is_integral(sc) {
                    let x = sc.round() as isize;
                    if let Some((lo, _)) = grid.free_run(cells, x - 1) {
                        self.push_split(origin, target, lo as f64, sc, None)?;
                    }
                    if let Some((_, hi)) = grid.free_run(cells, x) {
                        self.push_split(origin, target, sc, hi as f64, None)?;
                    }
                } else if let Some((lo, hi)) = grid.free_run(cells, sc.floor() as isize) {
                    self.push_split(origin, target, lo as f64, hi as f64, None)?;
                }
            }

            let right = grid.next_corner_right(y, sc);
            if grid.is_row_traversable(y, sc, right) {
                let interval = Interval {
                    row: y,
                    left: sc,
                    right,
                };
                self.push_node(origin, interval, None)?;
            }
            let left = grid.next_corner_left(y, sc);
            if grid.is_row_traversable(y, left, sc) {
                let interval = Interval {
                    row: y,
                    left,
                    right: sc,
                };
                self.push_node(origin, interval, None)?;
            }
            return Ok(());
        }

        let cells = sr.floor() as isize;
        let cols = if is_integral(sc) {
            let x = sc.round() as isize;
            vec![x - 1, x]
        } else {
            vec![sc.floor() as isize]
        };
        let mut runs: Vec<(isize, isize)> = cols
            .into_iter()
            .filter_map(|c| grid.free_run(cells, c))
            .collect();
        runs.dedup();
        for (lo, hi) in runs {
            for target in [cells, cells + 1] {
                self.push_split(origin, target, lo as f64, hi as f64, None)?;
            }
        }
        Ok(())
    }
}

use anya_core::{Result, is_integral};

use crate::node::{Coord, Frame, Interval, NodeId};
use crate::search::{Anchor, EPS, SearchInstance};

impl SearchInstance<'_> {
    /// Generate the successors of the expanded node `id`.
    pub(crate) fn expand(&mut self, id: NodeId, root: &Anchor, frame: &Frame) -> Result<()> {
        if frame.is_flat() {
            self.expand_flat(id, root, frame)
        } else {
            self.expand_cone(id, root, frame)
        }
    }

    /// Lattice corner `(row, col)` as a new root reached from `from`.
    fn corner(&self, from: &Anchor, row: isize, col: isize) -> Option<Anchor> {
        let point = self.grid.lattice_point(row as usize, col as usize)?;
        Some(Anchor {
            point,
            at: Coord::new(row as f64, col as f64),
            g: from.g + self.dist(&from.point, &point),
        })
    }

    /// A root off the interval row: project the interval one row further and
    /// turn at endpoint corners where an obstacle hides part of the next strip.
    fn expand_cone(&mut self, id: NodeId, root: &Anchor, frame: &Frame) -> Result<()> {
        let grid = self.grid;
        let iv = frame.interval;
        let rt = frame.root;
        let y = iv.row;
        let yf = y as f64;
        let dir: isize = if yf > rt.row { 1 } else { -1 };
        let next_row = y + dir;
        let (prev_cells, next_cells) = if dir > 0 { (y - 1, y) } else { (y, y - 1) };
        let scale = (next_row as f64 - rt.row) / (yf - rt.row);
        let project = |x: f64| rt.col + (x - rt.col) * scale;
        let (l, r) = (iv.left, iv.right);

        // Everything still in sight of the current root.
        if next_row >= 0 && next_row <= grid.height() as isize {
            let (pl, pr) = (project(l), project(r));
            let span_hi = r.max(pr).min(grid.width() as f64);
            let mut col = (l.min(pl).max(0.0) + EPS).floor() as isize;
            while (col as f64) < span_hi - EPS {
                let Some((start, end)) = grid.run_span(next_cells, col) else {
                    break;
                };
                if !grid.is_blocked(next_cells, col) {
                    let (a, b) = (start as f64, end as f64);
                    let lo = a.max(project(l.max(a)));
                    let hi = b.min(project(r.min(b)));
                    self.push_split(root, next_row, lo, hi, Some(id))?;
                }
                col = end;
            }
        }

        // Turning points.
        for e in [l, r] {
            if !is_integral(e) {
                continue;
            }
            let ei = e.round() as isize;
            let e = ei as f64;
            if grid.is_ambiguous_corner(y, ei) {
                continue;
            }
            let Some(corner) = self.corner(root, y, ei) else {
                continue;
            };
            let pe = project(e);

            // The obstacle behind the interval ends here.
            if grid.is_blocked(prev_cells, ei - 1) && !grid.is_blocked(next_cells, ei - 1) {
                let lo = grid.next_corner_left(y, e);
                if grid.is_row_traversable(y, lo, e) {
                    let flat = Interval {
                        row: y,
                        left: lo,
                        right: e,
                    };
                    self.push_node(&corner, flat, Some(id))?;
                }
                if let Some((a, b)) = grid.free_run(next_cells, ei - 1) {
                    self.push_split(&corner, next_row, a as f64, pe.min(b as f64), Some(id))?;
                }
            }
            if grid.is_blocked(prev_cells, ei) && !grid.is_blocked(next_cells, ei) {
                let hi = grid.next_corner_right(y, e);
                if grid.is_row_traversable(y, e, hi) {
                    let flat = Interval {
                        row: y,
                        left: e,
                        right: hi,
                    };
                    self.push_node(&corner, flat, Some(id))?;
                }
                if let Some((a, b)) = grid.free_run(next_cells, ei) {
                    self.push_split(&corner, next_row, pe.max(a as f64), b as f64, Some(id))?;
                }
            }

            // An obstacle in the next strip starts or ends here, casting a
            // shadow the corner can see into.
            if pe > e + EPS
                && grid.is_blocked(next_cells, ei - 1)
                && !grid.is_blocked(next_cells, ei)
            {
                if let Some((_, b)) = grid.free_run(next_cells, ei) {
                    self.push_split(&corner, next_row, e, pe.min(b as f64), Some(id))?;
                }
            }
            if pe < e - EPS
                && grid.is_blocked(next_cells, ei)
                && !grid.is_blocked(next_cells, ei - 1)
            {
                if let Some((a, _)) = grid.free_run(next_cells, ei - 1) {
                    self.push_split(&corner, next_row, pe.max(a as f64), e, Some(id))?;
                }
            }
        }
        Ok(())
    }

    /// A root on the interval row: keep sliding along the row, and turn into
    /// a strip once the obstacle on that side ends at the far corner.
    fn expand_flat(&mut self, id: NodeId, root: &Anchor, frame: &Frame) -> Result<()> {
        let grid = self.grid;
        let iv = frame.interval;
        let y = iv.row;
        let rightward = frame.root.col <= iv.left + EPS;
        let far = if rightward { iv.right } else { iv.left };
        if !is_integral(far) {
            return Ok(());
        }
        let pi = far.round() as isize;
        let p = pi as f64;
        if grid.is_ambiguous_corner(y, pi) {
            return Ok(());
        }

        let onward = if rightward {
            let next = grid.next_corner_right(y, p);
            grid.is_row_traversable(y, p, next).then_some(Interval {
                row: y,
                left: p,
                right: next,
            })
        } else {
            let next = grid.next_corner_left(y, p);
            grid.is_row_traversable(y, next, p).then_some(Interval {
                row: y,
                left: next,
                right: p,
            })
        };
        if let Some(interval) = onward {
            self.push_node(root, interval, Some(id))?;
        }

        let Some(corner) = self.corner(root, y, pi) else {
            return Ok(());
        };
        let (behind, ahead) = if rightward { (pi - 1, pi) } else { (pi, pi - 1) };
        for (cells, target) in [(y - 1, y - 1), (y, y + 1)] {
            if !grid.is_blocked(cells, behind) || grid.is_blocked(cells, ahead) {
                continue;
            }
            if let Some((a, b)) = grid.free_run(cells, ahead) {
                if rightward {
                    self.push_split(&corner, target, p, b as f64, Some(id))?;
                } else {
                    self.push_split(&corner, target, a as f64, p, Some(id))?;
                }
            }
        }
        Ok(())
    }
}

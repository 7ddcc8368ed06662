//! Point location: how a geographic point relates to a grid's lattice.

use crate::error::{Error, Result};
use crate::geom::SphericalPoint;
use crate::grid::{Grid, LatticeIndex};

/// The seven ways a point can sit relative to the lattice.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LocationKind {
    /// A corner touching one or three blocked tiles.
    OnUnambiguousCorner,
    /// A corner touching exactly two diagonally opposite blocked tiles.
    OnAmbiguousCorner,
    /// A corner with no blocked tiles, or two blocked tiles on one side.
    OnGridNonCorner,
    OnHorizontalEdge,
    OnVerticalEdge,
    InsideTile,
    Invalid,
}

/// A tile index that may fall outside the matrix, as corners on the grid
/// boundary implicate off-grid tiles.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileIndex {
    pub row: isize,
    pub col: isize,
}

impl TileIndex {
    #[inline]
    pub const fn new(row: isize, col: isize) -> Self {
        Self { row, col }
    }
}

/// Result of [`Grid::classify`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointLocation {
    pub kind: LocationKind,
    /// Blocked tiles implicated by the classification. `None` marks an invalid
    /// location.
    pub blocked_tiles: Option<Vec<TileIndex>>,
    /// Nearest lattice point, or the input itself when it is off the grid.
    pub closest: SphericalPoint,
}

impl PointLocation {
    fn invalid(closest: SphericalPoint) -> Self {
        Self {
            kind: LocationKind::Invalid,
            blocked_tiles: None,
            closest,
        }
    }

    fn new(kind: LocationKind, blocked: Vec<TileIndex>, closest: SphericalPoint) -> Self {
        Self {
            kind,
            blocked_tiles: Some(blocked),
            closest,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.kind != LocationKind::Invalid
    }
}

impl Grid {
    /// Classify `p` against the lattice.
    ///
    /// Lattice membership is decided on coordinates rounded to the configured
    /// precision. Tiles outside the matrix count as blocked.
    pub fn classify(&self, p: &SphericalPoint) -> Result<PointLocation> {
        if !self.config().bounds.contains(p.lat(), p.lon()) {
            return Ok(PointLocation::invalid(*p));
        }
        if let Some(at) = self.lattice_index(p) {
            let closest = self
                .lattice_point(at.row, at.col)
                .ok_or_else(|| Error::Invariant(format!("lattice index {at:?} has no point")))?;
            return Ok(self.classify_corner(at, closest));
        }

        let (_, closest) = self.closest_lattice_point(p)?;
        let (row_f, col_f) = self.fractional_index(p);
        let cell_row = clamp_cell(row_f, self.height());
        let cell_col = clamp_cell(col_f, self.width());
        let on_column = self.column_at_lat(p.lat());
        let on_row = self.row_at_lon(p.lon());

        let loc = match (on_column, on_row) {
            (Some(j), None) => {
                let j = j as isize;
                self.classify_edge(
                    LocationKind::OnVerticalEdge,
                    [TileIndex::new(cell_row, j - 1), TileIndex::new(cell_row, j)],
                    closest,
                )
            }
            (None, Some(i)) => {
                let i = i as isize;
                self.classify_edge(
                    LocationKind::OnHorizontalEdge,
                    [TileIndex::new(i - 1, cell_col), TileIndex::new(i, cell_col)],
                    closest,
                )
            }
            (None, None) => {
                if self.is_blocked(cell_row, cell_col) {
                    PointLocation::invalid(closest)
                } else {
                    PointLocation::new(LocationKind::InsideTile, Vec::new(), closest)
                }
            }
            (Some(j), Some(i)) => self.classify_corner(LatticeIndex::new(i, j), closest),
        };
        log::trace!("classified {} as {:?}", p, loc.kind);
        Ok(loc)
    }

    /// Corners on the trailing row or column are read as the last tile row or
    /// column, as the lattice has one more line than there are tiles.
    fn classify_corner(&self, at: LatticeIndex, closest: SphericalPoint) -> PointLocation {
        let i = at.row.min(self.height() - 1) as isize;
        let j = at.col.min(self.width() - 1) as isize;
        let bottom_left = TileIndex::new(i - 1, j);
        let bottom_right = TileIndex::new(i - 1, j - 1);
        let top_left = TileIndex::new(i, j);
        let top_right = TileIndex::new(i, j - 1);
        let around = [bottom_left, bottom_right, top_left, top_right];
        let blocked: Vec<TileIndex> = around
            .into_iter()
            .filter(|t| self.is_blocked(t.row, t.col))
            .collect();

        let is = |t: TileIndex| blocked.contains(&t);
        match blocked.len() {
            4 => PointLocation::invalid(closest),
            1 | 3 => PointLocation::new(LocationKind::OnUnambiguousCorner, blocked, closest),
            2 if (is(bottom_left) && is(top_right)) || (is(bottom_right) && is(top_left)) => {
                PointLocation::new(LocationKind::OnAmbiguousCorner, blocked, closest)
            }
            _ => PointLocation::new(LocationKind::OnGridNonCorner, Vec::new(), closest),
        }
    }

    fn classify_edge(
        &self,
        kind: LocationKind,
        sides: [TileIndex; 2],
        closest: SphericalPoint,
    ) -> PointLocation {
        let blocked: Vec<TileIndex> = sides
            .into_iter()
            .filter(|t| self.is_blocked(t.row, t.col))
            .collect();
        if blocked.len() == 2 {
            PointLocation::invalid(closest)
        } else {
            PointLocation::new(kind, blocked, closest)
        }
    }

    /// The lattice point nearest to `p` by great-circle distance. Ties go to
    /// the first point in row-major order.
    pub fn closest_lattice_point(
        &self,
        p: &SphericalPoint,
    ) -> Result<(LatticeIndex, SphericalPoint)> {
        let metric = self.config().metric;
        let mut best: Option<(f64, LatticeIndex, SphericalPoint)> = None;
        for (idx, q) in self.lattice_points() {
            let d = p.distance_with(&q, metric);
            if best.is_none_or(|(bd, _, _)| d < bd) {
                best = Some((d, idx, q));
            }
        }
        best.map(|(_, idx, q)| (idx, q))
            .ok_or_else(|| Error::Invariant(format!("no closest lattice point for {p}")))
    }
}

/// Tile index holding fractional coordinate `v`, clamped to `[0, n - 1]`.
fn clamp_cell(v: f64, n: usize) -> isize {
    (v.floor() as isize).clamp(0, n as isize - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GeoBounds, GeoConfig};
    use claims::{assert_none, assert_ok};

    /// 4x4 grid over lat [0, 4] x lon [0, 4]: corner (i, j) is (lat j, lon 4 - i).
    fn grid(blocked: &[(usize, usize)]) -> Grid {
        let mut tiles = vec![vec![false; 4]; 4];
        for &(r, c) in blocked {
            tiles[r][c] = true;
        }
        let cfg = GeoConfig::default().with_bounds(GeoBounds::new(0.0, 4.0, 0.0, 4.0).unwrap());
        Grid::new(cfg, 4, 4, tiles).unwrap()
    }

    fn classify(g: &Grid, lat: f64, lon: f64) -> PointLocation {
        assert_ok!(g.classify(&SphericalPoint::new(lat, lon).unwrap()))
    }

    fn tiles(v: &[(isize, isize)]) -> Option<Vec<TileIndex>> {
        Some(v.iter().map(|&(r, c)| TileIndex::new(r, c)).collect())
    }

    // -----------------------------------------------------------------------
    // Corners
    // -----------------------------------------------------------------------

    #[test]
    fn free_corner() {
        let loc = classify(&grid(&[]), 2.0, 2.0);
        assert_eq!(loc.kind, LocationKind::OnGridNonCorner);
        assert_eq!(loc.blocked_tiles, Some(vec![]));
        assert_eq!(loc.closest, SphericalPoint::new(2.0, 2.0).unwrap());
    }

    #[test]
    fn one_blocked() {
        let loc = classify(&grid(&[(1, 2)]), 2.0, 2.0);
        assert_eq!(loc.kind, LocationKind::OnUnambiguousCorner);
        assert_eq!(loc.blocked_tiles, tiles(&[(1, 2)]));
    }

    #[test]
    fn diagonal_pair() {
        let loc = classify(&grid(&[(1, 2), (2, 1)]), 2.0, 2.0);
        assert_eq!(loc.kind, LocationKind::OnAmbiguousCorner);
        assert_eq!(loc.blocked_tiles, tiles(&[(1, 2), (2, 1)]));

        let loc = classify(&grid(&[(1, 1), (2, 2)]), 2.0, 2.0);
        assert_eq!(loc.kind, LocationKind::OnAmbiguousCorner);
        assert_eq!(loc.blocked_tiles, tiles(&[(1, 1), (2, 2)]));
    }

    #[test]
    fn adjacent_pair() {
        let loc = classify(&grid(&[(1, 2), (1, 1)]), 2.0, 2.0);
        assert_eq!(loc.kind, LocationKind::OnGridNonCorner);
        assert_eq!(loc.blocked_tiles, Some(vec![]));
    }

    #[test]
    fn three_blocked() {
        let loc = classify(&grid(&[(1, 2), (1, 1), (2, 2)]), 2.0, 2.0);
        assert_eq!(loc.kind, LocationKind::OnUnambiguousCorner);
        assert_eq!(loc.blocked_tiles, tiles(&[(1, 2), (1, 1), (2, 2)]));
    }

    #[test]
    fn all_blocked() {
        let loc = classify(&grid(&[(1, 2), (1, 1), (2, 2), (2, 1)]), 2.0, 2.0);
        assert_eq!(loc.kind, LocationKind::Invalid);
        assert_none!(&loc.blocked_tiles);
        assert!(!loc.is_valid());
    }

    #[test]
    fn grid_corner_sees_off_grid_tiles() {
        // Lattice (0, 0) is (lat 0, lon 4).
        let loc = classify(&grid(&[]), 0.0, 4.0);
        assert_eq!(loc.kind, LocationKind::OnUnambiguousCorner);
        assert_eq!(loc.blocked_tiles, tiles(&[(-1, 0), (-1, -1), (0, -1)]));
    }

    #[test]
    fn trailing_corners_read_the_last_tiles() {
        // Lattice (4, 4) is (lat 4, lon 0) and reads as corner (3, 3).
        let loc = classify(&grid(&[]), 4.0, 0.0);
        assert_eq!(loc.kind, LocationKind::OnGridNonCorner);
        assert_eq!(loc.blocked_tiles, Some(vec![]));

        let loc = classify(&grid(&[(3, 3)]), 4.0, 0.0);
        assert_eq!(loc.kind, LocationKind::OnUnambiguousCorner);
        assert_eq!(loc.blocked_tiles, tiles(&[(3, 3)]));

        // Lattice (4, 2) reads as corner (3, 2).
        let loc = classify(&grid(&[(2, 2), (3, 1)]), 2.0, 0.0);
        assert_eq!(loc.kind, LocationKind::OnAmbiguousCorner);
        assert_eq!(loc.blocked_tiles, tiles(&[(2, 2), (3, 1)]));

        // Lattice (2, 4) reads as corner (2, 3).
        let loc = classify(&grid(&[(1, 3), (1, 2), (2, 3), (2, 2)]), 4.0, 2.0);
        assert_eq!(loc.kind, LocationKind::Invalid);
    }

    #[test]
    fn out_of_bounds() {
        let g = grid(&[]);
        let p = SphericalPoint::new(5.0, 1.0).unwrap();
        let loc = assert_ok!(g.classify(&p));
        assert_eq!(loc.kind, LocationKind::Invalid);
        assert_none!(&loc.blocked_tiles);
        assert_eq!(loc.closest, p);
    }

    // -----------------------------------------------------------------------
    // Edges and interiors
    // -----------------------------------------------------------------------

    #[test]
    fn vertical_edge() {
        let loc = classify(&grid(&[]), 2.0, 2.4);
        assert_eq!(loc.kind, LocationKind::OnVerticalEdge);
        assert_eq!(loc.blocked_tiles, Some(vec![]));
        assert_eq!(loc.closest, SphericalPoint::new(2.0, 2.0).unwrap());

        let loc = classify(&grid(&[(1, 2)]), 2.0, 2.4);
        assert_eq!(loc.blocked_tiles, tiles(&[(1, 2)]));

        let loc = classify(&grid(&[(1, 1), (1, 2)]), 2.0, 2.4);
        assert_eq!(loc.kind, LocationKind::Invalid);
    }

    #[test]
    fn edge_tiles_follow_the_matched_line() {
        // On a world 2x4 grid the nearest corner to (45, 90) is the pole at
        // lattice (0, 4), one column past the edge the point lies on.
        let world = |blocked: &[(usize, usize)]| {
            let mut t = vec![vec![false; 4]; 2];
            for &(r, c) in blocked {
                t[r][c] = true;
            }
            Grid::new(GeoConfig::default(), 2, 4, t).unwrap()
        };

        let loc = classify(&world(&[]), 45.0, 90.0);
        assert_eq!(loc.kind, LocationKind::OnVerticalEdge);
        assert_eq!(loc.blocked_tiles, Some(vec![]));

        let loc = classify(&world(&[(0, 3)]), 45.0, 90.0);
        assert_eq!(loc.kind, LocationKind::OnVerticalEdge);
        assert_eq!(loc.blocked_tiles, tiles(&[(0, 3)]));

        let loc = classify(&world(&[(0, 2), (0, 3)]), 45.0, 90.0);
        assert_eq!(loc.kind, LocationKind::Invalid);
    }

    #[test]
    fn horizontal_edge() {
        let loc = classify(&grid(&[(2, 2)]), 2.5, 2.0);
        assert_eq!(loc.kind, LocationKind::OnHorizontalEdge);
        assert_eq!(loc.blocked_tiles, tiles(&[(2, 2)]));

        let loc = classify(&grid(&[(1, 2)]), 2.5, 2.0);
        assert_eq!(loc.blocked_tiles, tiles(&[(1, 2)]));
    }

    #[test]
    fn inside_tile() {
        let loc = classify(&grid(&[]), 2.5, 2.5);
        assert_eq!(loc.kind, LocationKind::InsideTile);
        assert_eq!(loc.blocked_tiles, Some(vec![]));

        let loc = classify(&grid(&[(1, 2)]), 2.5, 2.5);
        assert_eq!(loc.kind, LocationKind::Invalid);
    }

    #[test]
    fn nearest_lattice_point() {
        let g = grid(&[]);
        let loc = classify(&g, 2.1, 2.9);
        assert_eq!(loc.kind, LocationKind::InsideTile);
        assert_eq!(loc.closest, g.lattice_point(1, 2).unwrap());
    }
}

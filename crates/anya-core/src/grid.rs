//! The tile matrix and the lattice of corner points derived from it.

use std::collections::HashMap;

use crate::config::GeoConfig;
use crate::error::{Error, Result};
use crate::geom::SphericalPoint;
use crate::scan::is_integral;

/// Row/column index of a lattice corner, `row <= height`, `col <= width`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LatticeIndex {
    pub row: usize,
    pub col: usize,
}

impl LatticeIndex {
    #[inline]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// A blocked/free tile matrix spread over a geographic rectangle.
///
/// Lattice corner `(i, j)` sits at latitude `min_lat + j / width * lat_span` and
/// longitude `max_lon - i / height * lon_span`, rounded to the configured
/// precision: columns advance in latitude, rows in longitude. Tile `(i, j)` is
/// the cell bounded by corners `(i, j)` and `(i + 1, j + 1)`.
///
/// A `Grid` is immutable once built and can be shared freely between searches.
#[derive(Clone, Debug)]
pub struct Grid {
    config: GeoConfig,
    width: usize,
    height: usize,
    /// Row-major, `true` = blocked.
    tiles: Vec<bool>,
    /// Row-major `(height + 1) x (width + 1)`.
    points: Vec<SphericalPoint>,
    lat_lon_index: HashMap<(i64, i64), LatticeIndex>,
    left_endpoints: Vec<isize>,
    right_endpoints: Vec<isize>,
}

impl Grid {
    /// Build a grid from a row-major tile matrix (`true` = blocked).
    pub fn new(
        config: GeoConfig,
        height: usize,
        width: usize,
        tiles: Vec<Vec<bool>>,
    ) -> Result<Self> {
        if height == 0 || width == 0 {
            return Err(Error::EmptyGrid { height, width });
        }
        if tiles.len() != height {
            return Err(Error::RowCount {
                expected: height,
                found: tiles.len(),
            });
        }
        let mut flat = Vec::with_capacity(height * width);
        for (row, r) in tiles.into_iter().enumerate() {
            if r.len() != width {
                return Err(Error::ColumnCount {
                    row,
                    expected: width,
                    found: r.len(),
                });
            }
            flat.extend(r);
        }

        let mut grid = Self {
            config,
            width,
            height,
            tiles: flat,
            points: Vec::with_capacity((height + 1) * (width + 1)),
            lat_lon_index: HashMap::with_capacity((height + 1) * (width + 1)),
            left_endpoints: Vec::new(),
            right_endpoints: Vec::new(),
        };
        grid.build_lattice()?;
        grid.build_endpoints();

        log::debug!(
            "built {}x{} grid, {} blocked tiles",
            height,
            width,
            grid.tiles.iter().filter(|&&b| b).count()
        );
        Ok(grid)
    }

    fn build_lattice(&mut self) -> Result<()> {
        let b = self.config.bounds;
        for i in 0..=self.height {
            for j in 0..=self.width {
                let lat = self.lattice_lat(j);
                let lon = self.lattice_lon(i);
                let p = SphericalPoint::new(lat, lon)?;
                let key = (self.config.key(lat), self.config.key(lon));
                if self.lat_lon_index.insert(key, LatticeIndex::new(i, j)).is_some() {
                    return Err(Error::Bounds(format!(
                        "lattice spacing over [{}, {}] x [{}, {}] is finer than {} decimal places",
                        b.min_lat, b.max_lat, b.min_lon, b.max_lon, self.config.decimal_places
                    )));
                }
                self.points.push(p);
            }
        }
        Ok(())
    }

    /// For every row, record where each run of equal tiles is bounded.
    fn build_endpoints(&mut self) {
        let (w, h) = (self.width, self.height);
        self.left_endpoints = vec![-1; w * h];
        self.right_endpoints = vec![w as isize; w * h];
        for i in 0..h {
            let row = &self.tiles[i * w..(i + 1) * w];
            let left = &mut self.left_endpoints[i * w..(i + 1) * w];
            for j in 1..w {
                left[j] = if row[j] != row[j - 1] {
                    j as isize - 1
                } else {
                    left[j - 1]
                };
            }
            let right = &mut self.right_endpoints[i * w..(i + 1) * w];
            for j in (0..w.saturating_sub(1)).rev() {
                right[j] = if row[j] != row[j + 1] {
                    j as isize + 1
                } else {
                    right[j + 1]
                };
            }
        }
    }

    #[inline]
    fn lattice_lat(&self, col: usize) -> f64 {
        let b = self.config.bounds;
        self.config
            .round(b.min_lat + (col as f64 / self.width as f64) * b.lat_span())
    }

    #[inline]
    fn lattice_lon(&self, row: usize) -> f64 {
        let b = self.config.bounds;
        self.config
            .round(b.max_lon - (row as f64 / self.height as f64) * b.lon_span())
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn config(&self) -> &GeoConfig {
        &self.config
    }

    /// Tile state at `(row, col)`, `None` outside the matrix.
    pub fn tile(&self, row: usize, col: usize) -> Option<bool> {
        (row < self.height && col < self.width).then(|| self.tiles[row * self.width + col])
    }

    /// Whether the tile is blocked. Tiles outside the matrix count as blocked.
    #[inline]
    pub fn is_blocked(&self, row: isize, col: isize) -> bool {
        if row < 0 || col < 0 {
            return true;
        }
        self.tile(row as usize, col as usize).unwrap_or(true)
    }

    pub fn lattice_point(&self, row: usize, col: usize) -> Option<SphericalPoint> {
        (row <= self.height && col <= self.width)
            .then(|| self.points[row * (self.width + 1) + col])
    }

    /// All lattice points in row-major order.
    pub fn lattice_points(&self) -> impl Iterator<Item = (LatticeIndex, SphericalPoint)> + '_ {
        let stride = self.width + 1;
        self.points
            .iter()
            .enumerate()
            .map(move |(k, &p)| (LatticeIndex::new(k / stride, k % stride), p))
    }

    /// Index of the lattice point `p` falls on at the configured precision.
    pub fn lattice_index(&self, p: &SphericalPoint) -> Option<LatticeIndex> {
        let key = (self.config.key(p.lat()), self.config.key(p.lon()));
        self.lat_lon_index.get(&key).copied()
    }

    /// Last tile of the run before the one holding `(row, col)`; -1 when the
    /// run starts at the grid edge.
    pub fn left_endpoint(&self, row: usize, col: usize) -> Option<isize> {
        (row < self.height && col < self.width).then(|| self.left_endpoints[row * self.width + col])
    }

    /// First tile of the run after the one holding `(row, col)`; `width` when
    /// the run reaches the grid edge.
    pub fn right_endpoint(&self, row: usize, col: usize) -> Option<isize> {
        (row < self.height && col < self.width)
            .then(|| self.right_endpoints[row * self.width + col])
    }

    // -----------------------------------------------------------------------
    // Index space
    // -----------------------------------------------------------------------

    /// Lattice column whose latitude matches `lat` at the configured precision.
    pub fn column_at_lat(&self, lat: f64) -> Option<usize> {
        let b = self.config.bounds;
        let j = ((lat - b.min_lat) / b.lat_span() * self.width as f64).round();
        if !(0.0..=self.width as f64).contains(&j) {
            return None;
        }
        let j = j as usize;
        (self.config.key(self.lattice_lat(j)) == self.config.key(lat)).then_some(j)
    }

    /// Lattice row whose longitude matches `lon` at the configured precision.
    pub fn row_at_lon(&self, lon: f64) -> Option<usize> {
        let b = self.config.bounds;
        let i = ((b.max_lon - lon) / b.lon_span() * self.height as f64).round();
        if !(0.0..=self.height as f64).contains(&i) {
            return None;
        }
        let i = i as usize;
        (self.config.key(self.lattice_lon(i)) == self.config.key(lon)).then_some(i)
    }

    /// Fractional `(row, col)` of `p` in lattice index space.
    ///
    /// Coordinates that fall on a lattice line snap to it exactly.
    pub fn fractional_index(&self, p: &SphericalPoint) -> (f64, f64) {
        let b = self.config.bounds;
        let row = match self.row_at_lon(p.lon()) {
            Some(i) => i as f64,
            None => (b.max_lon - p.lon()) / b.lon_span() * self.height as f64,
        };
        let col = match self.column_at_lat(p.lat()) {
            Some(j) => j as f64,
            None => (p.lat() - b.min_lat) / b.lat_span() * self.width as f64,
        };
        (row, col)
    }

    /// The point at fractional lattice position `(row, col)`, clamped to the
    /// grid. Integral coordinates land exactly on lattice lines.
    pub fn point_at(&self, row: f64, col: f64) -> Result<SphericalPoint> {
        let row = row.clamp(0.0, self.height as f64);
        let col = col.clamp(0.0, self.width as f64);
        if is_integral(row) && is_integral(col) {
            let (i, j) = (row.round() as usize, col.round() as usize);
            return self.lattice_point(i, j).ok_or_else(|| {
                Error::Invariant(format!("lattice point ({i}, {j}) missing"))
            });
        }
        let b = self.config.bounds;
        let lat = if is_integral(col) {
            self.lattice_lat(col.round() as usize)
        } else {
            b.min_lat + col / self.width as f64 * b.lat_span()
        };
        let lon = if is_integral(row) {
            self.lattice_lon(row.round() as usize)
        } else {
            b.max_lon - row / self.height as f64 * b.lon_span()
        };
        SphericalPoint::new(lat, lon)
    }
}

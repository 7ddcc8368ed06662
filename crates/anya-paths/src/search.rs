use std::collections::HashMap;

use anya_core::{Grid, Result, SphericalPoint, is_integral};

use crate::heap::PriorityQueue;
use crate::node::{Coord, Frame, Interval, IntervalKey, NodeId, RootKey, SearchNode};

/// Tolerance for index-space comparisons.
pub(crate) const EPS: f64 = 1e-9;

/// Outcome of [`SearchInstance::find_path`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PathStatus {
    Found,
    NotFound,
}

/// A path and its length. `NotFound` results carry an empty path and an
/// infinite cost.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathResult {
    pub status: PathStatus,
    /// Start, every bend point, then the goal.
    pub path: Vec<SphericalPoint>,
    /// Total great-circle length in degrees.
    pub cost: f64,
}

impl PathResult {
    fn not_found() -> Self {
        Self {
            status: PathStatus::NotFound,
            path: Vec::new(),
            cost: f64::INFINITY,
        }
    }

    #[inline]
    pub fn is_found(&self) -> bool {
        self.status == PathStatus::Found
    }
}

/// Counters from the last [`SearchInstance::find_path`] call.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchStats {
    pub expanded: usize,
    pub generated: usize,
    /// Nodes dropped as duplicates or dominated by a cheaper root.
    pub pruned: usize,
}

/// A root: the point sight lines start from, with the cost to reach it.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Anchor {
    pub(crate) point: SphericalPoint,
    pub(crate) at: Coord,
    pub(crate) g: f64,
}

type NodeOrder = fn(&SearchNode, &SearchNode) -> bool;

/// One any-angle query over a shared [`Grid`].
///
/// The instance owns its open list and node arena; any number of instances
/// can run over the same grid.
pub struct SearchInstance<'g> {
    pub(crate) grid: &'g Grid,
    start: SphericalPoint,
    end: SphericalPoint,
    pub(crate) goal_at: Coord,
    open: PriorityQueue<SearchNode, NodeOrder>,
    /// Expanded nodes. `SearchNode::parent` indexes into this.
    closed: Vec<SearchNode>,
    best_g: HashMap<IntervalKey, f64>,
    root_g: HashMap<RootKey, f64>,
    final_node: Option<SearchNode>,
    expansion_limit: Option<usize>,
    stats: SearchStats,
}

impl<'g> SearchInstance<'g> {
    pub fn new(grid: &'g Grid, start: SphericalPoint, end: SphericalPoint) -> Self {
        Self {
            grid,
            start,
            end,
            goal_at: Coord::new(0.0, 0.0),
            open: PriorityQueue::new(SearchNode::comes_before as NodeOrder),
            closed: Vec::new(),
            best_g: HashMap::new(),
            root_g: HashMap::new(),
            final_node: None,
            expansion_limit: None,
            stats: SearchStats::default(),
        }
    }

    /// Give up with [`PathStatus::NotFound`] after `limit` expansions.
    pub fn with_expansion_limit(mut self, limit: usize) -> Self {
        self.expansion_limit = Some(limit);
        self
    }

    #[inline]
    pub fn start(&self) -> SphericalPoint {
        self.start
    }

    #[inline]
    pub fn end(&self) -> SphericalPoint {
        self.end
    }

    #[inline]
    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// The terminal node of the last successful search.
    pub fn final_node(&self) -> Option<&SearchNode> {
        self.final_node.as_ref()
    }

    fn reset(&mut self) {
        self.open.clear();
        self.closed.clear();
        self.best_g.clear();
        self.root_g.clear();
        self.final_node = None;
        self.stats = SearchStats::default();
    }

    /// Run the search.
    ///
    /// An unreachable goal, or a start or goal that is off the grid or inside
    /// an obstacle, gives [`PathStatus::NotFound`]. Errors are reserved for
    /// broken invariants.
    pub fn find_path(&mut self) -> Result<PathResult> {
        self.reset();

        let start_loc = self.grid.classify(&self.start)?;
        let end_loc = self.grid.classify(&self.end)?;
        if !start_loc.is_valid() || !end_loc.is_valid() {
            log::debug!(
                "no path from {} to {}: start {:?}, goal {:?}",
                self.start,
                self.end,
                start_loc.kind,
                end_loc.kind
            );
            return Ok(PathResult::not_found());
        }
        if self.same_point(&self.start, &self.end) {
            return Ok(PathResult {
                status: PathStatus::Found,
                path: vec![self.start],
                cost: 0.0,
            });
        }

        let (sr, sc) = self.grid.fractional_index(&self.start);
        let (gr, gc) = self.grid.fractional_index(&self.end);
        self.goal_at = Coord::new(gr, gc);
        log::debug!("searching {} -> {}", self.start, self.end);

        let origin = Anchor {
            point: self.start,
            at: Coord::new(sr, sc),
            g: 0.0,
        };
        self.seed(&origin)?;

        while let Some(node) = self.open.pop() {
            let root_best = self.root_g.get(&RootKey::from(node.frame.root)).copied();
            if root_best.is_some_and(|best| best < node.g - self.cost_eps()) {
                self.stats.pruned += 1;
                continue;
            }
            if self
                .expansion_limit
                .is_some_and(|limit| self.stats.expanded >= limit)
            {
                log::warn!(
                    "expansion budget of {} exhausted before reaching {}",
                    self.stats.expanded,
                    self.end
                );
                return Ok(PathResult::not_found());
            }
            self.stats.expanded += 1;
            log::trace!("expanding {node}");

            let anchor = Anchor {
                point: node.root,
                at: node.frame.root,
                g: node.g,
            };
            let frame = node.frame;
            let id = self.closed.len();
            self.closed.push(node);

            if self.observes_goal(&frame) {
                let g = anchor.g + self.dist(&anchor.point, &self.end);
                let result = self.finish(id, g);
                log::debug!(
                    "found path of {} points, cost {:.5} ({:?})",
                    result.path.len(),
                    result.cost,
                    self.stats
                );
                return Ok(result);
            }
            self.expand(id, &anchor, &frame)?;
        }

        log::debug!("no path to {} ({:?})", self.end, self.stats);
        Ok(PathResult::not_found())
    }

    /// Record the terminal node and walk its parents back to the start.
    fn finish(&mut self, parent: NodeId, g: f64) -> PathResult {
        let goal = self.end;
        let terminal = SearchNode {
            root: goal,
            right: goal,
            left: goal,
            g,
            h: 0.0,
            parent: Some(parent),
            frame: Frame {
                root: self.goal_at,
                interval: Interval {
                    row: self.goal_at.row.round() as isize,
                    left: self.goal_at.col,
                    right: self.goal_at.col,
                },
            },
        };

        let mut path = vec![goal];
        let mut cur = terminal.parent;
        while let Some(i) = cur {
            let n = &self.closed[i];
            if !path.last().is_some_and(|p| self.same_point(p, &n.root)) {
                path.push(n.root);
            }
            cur = n.parent;
        }
        path.reverse();

        self.final_node = Some(terminal);
        PathResult {
            status: PathStatus::Found,
            path,
            cost: g,
        }
    }

    // -----------------------------------------------------------------------
    // Node generation
    // -----------------------------------------------------------------------

    #[inline]
    pub(crate) fn dist(&self, a: &SphericalPoint, b: &SphericalPoint) -> f64 {
        a.distance_with(b, self.grid.config().metric)
    }

    #[inline]
    fn cost_eps(&self) -> f64 {
        self.grid.config().epsilon
    }

    #[inline]
    fn same_point(&self, a: &SphericalPoint, b: &SphericalPoint) -> bool {
        a.is_close(b, self.cost_eps())
    }

    /// Push a node for `interval` seen from `root`, unless an equal or cheaper
    /// one exists or the root is already known to be reachable more cheaply.
    pub(crate) fn push_node(
        &mut self,
        root: &Anchor,
        interval: Interval,
        parent: Option<NodeId>,
    ) -> Result<()> {
        let eps = self.cost_eps();
        let frame = Frame {
            root: root.at,
            interval,
        };
        let key = IntervalKey::from(&frame);
        if self.best_g.get(&key).is_some_and(|&g| g <= root.g + eps) {
            self.stats.pruned += 1;
            return Ok(());
        }
        let root_key = RootKey::from(root.at);
        match self.root_g.get(&root_key) {
            Some(&g) if g < root.g - eps => {
                self.stats.pruned += 1;
                return Ok(());
            }
            Some(&g) if g <= root.g => {}
            _ => {
                self.root_g.insert(root_key, root.g);
            }
        }
        self.best_g.insert(key, root.g);

        let row = interval.row as f64;
        let left = self.grid.point_at(row, interval.left)?;
        let right = self.grid.point_at(row, interval.right)?;
        let h = self.h_value(root, &frame, &left, &right)?;
        self.open.push(SearchNode {
            root: root.point,
            right,
            left,
            g: root.g,
            h,
            parent,
            frame,
        });
        self.stats.generated += 1;
        Ok(())
    }

    /// Push `[lo, hi]` on lattice row `row`, cut at every corner along the row.
    pub(crate) fn push_split(
        &mut self,
        root: &Anchor,
        row: isize,
        lo: f64,
        hi: f64,
        parent: Option<NodeId>,
    ) -> Result<()> {
        if row < 0 || row > self.grid.height() as isize {
            return Ok(());
        }
        let lo = lo.max(0.0);
        let hi = hi.min(self.grid.width() as f64);
        let mut cur = lo;
        while hi - cur > EPS {
            let next = self.grid.next_corner_right(row, cur).min(hi);
            let interval = Interval {
                row,
                left: cur,
                right: next,
            };
            self.push_node(root, interval, parent)?;
            cur = next;
        }
        Ok(())
    }

    /// Lower bound on the cost from `root` through the interval to the goal.
    fn h_value(
        &self,
        root: &Anchor,
        frame: &Frame,
        left: &SphericalPoint,
        right: &SphericalPoint,
    ) -> Result<f64> {
        let goal = &self.end;
        // Straight to the goal: from an endpoint, or within the root's own strip.
        if self.same_point(&root.point, left)
            || self.same_point(&root.point, right)
            || self.sees_goal_in_strip(frame.root)
        {
            return Ok(self.dist(&root.point, goal));
        }
        let via = |p: &SphericalPoint| self.dist(&root.point, p) + self.dist(p, goal);
        let endpoints = via(left).min(via(right));

        let iv = frame.interval;
        let y = iv.row as f64;
        let t = self.goal_at;
        let within = |x: f64| x >= iv.left - EPS && x <= iv.right + EPS;

        if frame.is_flat() {
            if within(t.col) {
                return Ok(endpoints.min(via(&self.grid.point_at(y, t.col)?)));
            }
            return Ok(endpoints);
        }

        // Mirror a goal on the root's side of the row to the far side.
        let rt = frame.root;
        let reflected = (t.row - y) * (y - rt.row) < 0.0;
        let target_row = if reflected { 2.0 * y - t.row } else { t.row };
        let x = rt.col + (t.col - rt.col) * (y - rt.row) / (target_row - rt.row);
        if !within(x) {
            return Ok(endpoints);
        }
        if !reflected {
            return Ok(self.dist(&root.point, goal));
        }
        let p = self.grid.point_at(y, x.clamp(iv.left, iv.right))?;
        Ok(endpoints.min(via(&p)))
    }

    /// Whether the goal is visible from the node's root through its interval,
    /// either before the interval row or within the next strip beyond it.
    fn observes_goal(&self, frame: &Frame) -> bool {
        let t = self.goal_at;
        let iv = frame.interval;
        let y = iv.row as f64;
        let within = |x: f64| x >= iv.left - EPS && x <= iv.right + EPS;

        if (t.row - y).abs() < EPS && within(t.col) {
            return true;
        }
        let rt = frame.root;
        if self.sees_goal_in_strip(rt) {
            return true;
        }
        if frame.is_flat() {
            return false;
        }

        let dir = (y - rt.row).signum();
        let goal_depth = (t.row - rt.row) * dir;
        if goal_depth <= EPS {
            return false;
        }
        let x = rt.col + (t.col - rt.col) * (y - rt.row) / (t.row - rt.row);
        if !within(x) {
            return false;
        }
        let row_depth = (y - rt.row) * dir;
        if goal_depth <= row_depth + EPS {
            return true;
        }
        if goal_depth - row_depth > 1.0 + EPS {
            return false;
        }
        if is_integral(x) && self.grid.is_ambiguous_corner(iv.row, x.round() as isize) {
            return false;
        }
        let next_cells = if dir > 0.0 { iv.row } else { iv.row - 1 };
        self.grid.is_free_span(next_cells, x.min(t.col), x.max(t.col))
    }

    /// Whether the goal shares a strip with `root` and the straight segment
    /// between them crosses only free tiles.
    fn sees_goal_in_strip(&self, root: Coord) -> bool {
        let t = self.goal_at;
        let strip = if is_integral(root.row) {
            let y = root.row.round();
            // Along the row itself is a flat move.
            if (t.row - y).abs() < EPS {
                return false;
            }
            if t.row > y { y } else { y - 1.0 }
        } else {
            root.row.floor()
        };
        if t.row < strip - EPS || t.row > strip + 1.0 + EPS {
            return false;
        }
        self.grid
            .is_free_span(strip as isize, root.col.min(t.col), root.col.max(t.col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anya_core::io::MapFile;
    use anya_core::{DistanceMetric, GeoBounds, GeoConfig};
    use claims::{assert_ok, assert_some};
    use rand::rngs::StdRng;
    use rand::{RngExt, SeedableRng};

    /// 3x3 grid over lat [0, 3] x lon [0, 3]: corner (i, j) is (lat j, lon 3 - i).
    fn grid3(blocked: &[(usize, usize)]) -> Grid {
        let mut tiles = vec![vec![false; 3]; 3];
        for &(r, c) in blocked {
            tiles[r][c] = true;
        }
        let cfg = GeoConfig::default().with_bounds(GeoBounds::new(0.0, 3.0, 0.0, 3.0).unwrap());
        Grid::new(cfg, 3, 3, tiles).unwrap()
    }

    fn corner(g: &Grid, i: usize, j: usize) -> SphericalPoint {
        g.lattice_point(i, j).unwrap()
    }

    fn at(g: &Grid, row: f64, col: f64) -> SphericalPoint {
        g.point_at(row, col).unwrap()
    }

    fn pt(lat: f64, lon: f64) -> SphericalPoint {
        SphericalPoint::new(lat, lon).unwrap()
    }

    fn search(g: &Grid, s: SphericalPoint, t: SphericalPoint) -> PathResult {
        assert_ok!(SearchInstance::new(g, s, t).find_path())
    }

    fn length(path: &[SphericalPoint]) -> f64 {
        path.windows(2).map(|w| w[0].distance(&w[1])).sum()
    }

    // -----------------------------------------------------------------------
    // Straight paths
    // -----------------------------------------------------------------------

    #[test]
    fn free_grid_diagonal() {
        let g = grid3(&[]);
        let (s, t) = (corner(&g, 0, 0), corner(&g, 3, 3));
        let res = search(&g, s, t);
        assert!(res.is_found());
        assert_eq!(res.path, vec![s, t]);
        assert!((res.cost - s.distance(&t)).abs() < 1e-9);
    }

    #[test]
    fn along_the_boundary_row() {
        let g = grid3(&[]);
        let (s, t) = (corner(&g, 0, 0), corner(&g, 0, 3));
        let res = search(&g, s, t);
        assert_eq!(res.path, vec![s, t]);
        assert!((res.cost - s.distance(&t)).abs() < 1e-9);
    }

    #[test]
    fn between_tile_interiors() {
        let g = grid3(&[]);
        let (s, t) = (pt(0.5, 2.5), pt(2.5, 0.5));
        let res = search(&g, s, t);
        assert_eq!(res.path, vec![s, t]);
        assert!((res.cost - s.distance(&t)).abs() < 1e-9);
    }

    #[test]
    fn within_one_strip() {
        let cfg = GeoConfig::default().with_bounds(GeoBounds::new(0.0, 4.0, 0.0, 1.0).unwrap());
        let g = Grid::new(cfg, 1, 4, vec![vec![false; 4]]).unwrap();
        let (s, t) = (pt(2.5, 0.5), pt(0.2, 0.5));
        let res = search(&g, s, t);
        assert_eq!(res.path, vec![s, t]);
        assert!((res.cost - s.distance(&t)).abs() < 1e-9);
    }

    #[test]
    fn start_is_goal() {
        let g = grid3(&[]);
        let s = pt(1.5, 1.5);
        let res = search(&g, s, s);
        assert_eq!(res.status, PathStatus::Found);
        assert_eq!(res.path, vec![s]);
        assert_eq!(res.cost, 0.0);
    }

    // -----------------------------------------------------------------------
    // Detours
    // -----------------------------------------------------------------------

    #[test]
    fn detour_around_center_tile() {
        let g = grid3(&[(1, 1)]);
        let (s, t) = (corner(&g, 0, 0), corner(&g, 3, 3));
        let res = search(&g, s, t);
        assert!(res.is_found());
        assert_eq!(res.path.len(), 3);
        let (a, b) = (corner(&g, 1, 2), corner(&g, 2, 1));
        assert!(res.path[1] == a || res.path[1] == b);
        assert!(res.cost > s.distance(&t));

        let via_a = s.distance(&a) + a.distance(&t);
        let via_b = s.distance(&b) + b.distance(&t);
        assert!((res.cost - via_a.min(via_b)).abs() < 1e-9);
        assert!((res.cost - length(&res.path)).abs() < 1e-9);
    }

    #[test]
    fn under_a_hanging_wall() {
        // Column 1 blocked in the top two rows: the path dips below it.
        let g = grid3(&[(0, 1), (1, 1)]);
        let (s, t) = (corner(&g, 0, 0), corner(&g, 0, 3));
        let res = search(&g, s, t);
        assert_eq!(
            res.path,
            vec![s, corner(&g, 2, 1), corner(&g, 2, 2), t]
        );
        assert!((res.cost - length(&res.path)).abs() < 1e-9);
    }

    #[test]
    fn full_wall() {
        let g = grid3(&[(0, 1), (1, 1), (2, 1)]);
        let res = search(&g, corner(&g, 0, 0), corner(&g, 3, 3));
        assert_eq!(res.status, PathStatus::NotFound);
        assert!(res.path.is_empty());
        assert!(res.cost.is_infinite());
    }

    #[test]
    fn goal_inside_obstacle() {
        let g = grid3(&[(1, 1)]);
        let res = search(&g, corner(&g, 0, 0), pt(1.5, 1.5));
        assert_eq!(res.status, PathStatus::NotFound);
    }

    #[test]
    fn start_off_grid() {
        let g = grid3(&[]);
        let res = search(&g, pt(10.0, 1.0), corner(&g, 0, 0));
        assert_eq!(res.status, PathStatus::NotFound);
    }

    // -----------------------------------------------------------------------
    // Instance state
    // -----------------------------------------------------------------------

    #[test]
    fn expansion_budget() {
        let g = grid3(&[(1, 1)]);
        let mut inst =
            SearchInstance::new(&g, corner(&g, 0, 0), corner(&g, 3, 3)).with_expansion_limit(0);
        let res = assert_ok!(inst.find_path());
        assert_eq!(res.status, PathStatus::NotFound);
        assert_eq!(inst.stats().expanded, 0);
    }

    #[test]
    fn rerun_and_final_node() {
        let g = grid3(&[(1, 1)]);
        let (s, t) = (corner(&g, 0, 0), corner(&g, 3, 3));
        let mut inst = SearchInstance::new(&g, s, t);
        let first = assert_ok!(inst.find_path());
        let stats = inst.stats();
        assert!(stats.expanded > 0);
        assert!(stats.generated >= stats.expanded);

        let second = assert_ok!(inst.find_path());
        assert_eq!(first, second);
        assert_eq!(inst.stats(), stats);

        let last = assert_some!(inst.final_node());
        assert_eq!(last.root, t);
        assert_eq!(last.g, second.cost);
        assert_eq!(last.h, 0.0);
    }

    #[test]
    fn haversine_metric() {
        let cfg = GeoConfig::default()
            .with_bounds(GeoBounds::new(0.0, 3.0, 0.0, 3.0).unwrap())
            .with_metric(DistanceMetric::Haversine);
        let g = Grid::new(cfg, 3, 3, vec![vec![false; 3]; 3]).unwrap();
        let (s, t) = (corner(&g, 0, 0), corner(&g, 3, 3));
        let res = search(&g, s, t);
        assert!((res.cost - s.hav_distance(&t)).abs() < 1e-9);
    }

    #[test]
    fn shared_grid_across_threads() {
        let g = grid3(&[(1, 1)]);
        let (s, t) = (corner(&g, 0, 0), corner(&g, 3, 3));
        let expected = search(&g, s, t);
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| SearchInstance::new(&g, s, t).find_path().unwrap()))
                .collect();
            for h in handles {
                assert_eq!(h.join().unwrap(), expected);
            }
        });
    }

    #[test]
    fn from_map_file() {
        let map: MapFile = "type octile\nheight 3\nwidth 3\n0 1 0\n0 1 0\n0 0 0\n"
            .parse()
            .unwrap();
        let cfg = GeoConfig::default().with_bounds(GeoBounds::new(0.0, 3.0, 0.0, 3.0).unwrap());
        let g = map.into_grid(cfg).unwrap();
        let res = search(&g, corner(&g, 0, 0), corner(&g, 0, 3));
        assert_eq!(res.path.len(), 4);
    }

    #[test]
    fn goal_beside_a_turn_corner() {
        // 1-degree tiles, tile (1, 1) blocked. The goal lies in strip 1 just
        // past corner (1, 2), which the start reaches by sliding along row 1.
        let cfg = GeoConfig::default().with_bounds(GeoBounds::new(0.0, 4.0, 0.0, 3.0).unwrap());
        let mut tiles = vec![vec![false; 4]; 3];
        tiles[1][1] = true;
        let g = Grid::new(cfg, 3, 4, tiles).unwrap();
        let (s, t) = (corner(&g, 1, 0), at(&g, 1.25, 2.3));
        let res = search(&g, s, t);
        assert_eq!(res.path, vec![s, corner(&g, 1, 2), t]);
        assert!((res.cost - length(&res.path)).abs() < 1e-9);
    }

    // -----------------------------------------------------------------------
    // Pinch corners
    // -----------------------------------------------------------------------

    /// 2x2 grid over lat [0, 2] x lon [0, 2] with tiles (0, 0) and (1, 1)
    /// blocked: corner (1, 1) is a diagonal pinch.
    fn pinch() -> Grid {
        let cfg = GeoConfig::default().with_bounds(GeoBounds::new(0.0, 2.0, 0.0, 2.0).unwrap());
        Grid::new(cfg, 2, 2, vec![vec![true, false], vec![false, true]]).unwrap()
    }

    #[test]
    fn no_squeezing_through_a_pinch() {
        let g = pinch();
        let res = search(&g, at(&g, 0.5, 1.5), at(&g, 1.5, 0.5));
        assert_eq!(res.status, PathStatus::NotFound);
    }

    #[test]
    fn no_sliding_past_a_pinch() {
        let g = pinch();
        let res = search(&g, at(&g, 1.0, 0.5), at(&g, 1.0, 1.5));
        assert_eq!(res.status, PathStatus::NotFound);
    }

    #[test]
    fn start_on_a_pinch() {
        let g = pinch();
        let s = corner(&g, 1, 1);
        for t in [at(&g, 1.5, 0.5), at(&g, 0.5, 1.5)] {
            let res = search(&g, s, t);
            assert_eq!(res.path, vec![s, t]);
            assert!((res.cost - s.distance(&t)).abs() < 1e-9);
        }
    }

    // -----------------------------------------------------------------------
    // Visibility graph
    // -----------------------------------------------------------------------

    /// Whether the straight index-space segment from `a` to `b` keeps to free
    /// tiles or traversable lattice lines and misses every pinch corner.
    fn in_sight(g: &Grid, a: (f64, f64), b: (f64, f64)) -> bool {
        let (dr, dc) = (b.0 - a.0, b.1 - a.1);
        let mut cuts = vec![0.0, 1.0];
        for (from, d) in [(a.0, dr), (a.1, dc)] {
            if d.abs() < 1e-12 {
                continue;
            }
            let (lo, hi) = (from.min(from + d), from.max(from + d));
            let mut k = lo.ceil();
            while k <= hi {
                cuts.push((k - from) / d);
                k += 1.0;
            }
        }
        cuts.sort_by(f64::total_cmp);
        cuts.dedup_by(|x, y| (*x - *y).abs() < 1e-12);
        let point = |t: f64| (a.0 + dr * t, a.1 + dc * t);

        for &t in &cuts[1..cuts.len() - 1] {
            let (r, c) = point(t);
            if is_integral(r)
                && is_integral(c)
                && g.is_ambiguous_corner(r.round() as isize, c.round() as isize)
            {
                return false;
            }
        }
        cuts.windows(2).all(|w| {
            let (r, c) = point((w[0] + w[1]) / 2.0);
            let (i, j) = (r.floor() as isize, c.floor() as isize);
            if is_integral(r) {
                let y = r.round() as isize;
                !g.is_blocked(y - 1, j) || !g.is_blocked(y, j)
            } else if is_integral(c) {
                let x = c.round() as isize;
                !g.is_blocked(i, x - 1) || !g.is_blocked(i, x)
            } else {
                !g.is_blocked(i, j)
            }
        })
    }

    /// Shortest cost from `s` to `t` over the visibility graph of both points
    /// and every usable lattice corner.
    fn visibility_graph_cost(g: &Grid, s: SphericalPoint, t: SphericalPoint) -> f64 {
        let mut nodes = vec![(s, g.fractional_index(&s)), (t, g.fractional_index(&t))];
        for i in 0..=g.height() {
            for j in 0..=g.width() {
                let (r, c) = (i as isize, j as isize);
                let around = [(r - 1, c - 1), (r - 1, c), (r, c - 1), (r, c)];
                let enclosed = around.iter().all(|&(a, b)| g.is_blocked(a, b));
                if enclosed || g.is_ambiguous_corner(r, c) {
                    continue;
                }
                nodes.push((corner(g, i, j), (i as f64, j as f64)));
            }
        }

        let n = nodes.len();
        let mut best = vec![f64::INFINITY; n];
        let mut done = vec![false; n];
        best[0] = 0.0;
        while let Some(u) = (0..n)
            .filter(|&u| !done[u] && best[u].is_finite())
            .min_by(|&a, &b| best[a].total_cmp(&best[b]))
        {
            if u == 1 {
                break;
            }
            done[u] = true;
            for v in 0..n {
                if !done[v] && in_sight(g, nodes[u].1, nodes[v].1) {
                    best[v] = best[v].min(best[u] + nodes[u].0.distance(&nodes[v].0));
                }
            }
        }
        best[1]
    }

    #[test]
    fn visibility_graph_agrees_on_small_cases() {
        let g = grid3(&[(1, 1)]);
        let (s, t) = (corner(&g, 0, 0), corner(&g, 3, 3));
        let expected = visibility_graph_cost(&g, s, t);
        assert!((search(&g, s, t).cost - expected).abs() < 1e-9);

        let g = pinch();
        assert!(visibility_graph_cost(&g, at(&g, 0.5, 1.5), at(&g, 1.5, 0.5)).is_infinite());
    }

    #[test]
    fn shortest_on_random_grids() {
        let mut rng = StdRng::seed_from_u64(42);
        let offsets = [0.25, 0.5, 0.75];
        for _ in 0..300 {
            let h: usize = rng.random_range(1..=5);
            let w: usize = rng.random_range(2..=6);
            let tiles: Vec<Vec<bool>> = (0..h)
                .map(|_| (0..w).map(|_| rng.random_range(0..10) < 3).collect())
                .collect();
            let free: Vec<(usize, usize)> = (0..h)
                .flat_map(|r| (0..w).map(move |c| (r, c)))
                .filter(|&(r, c)| !tiles[r][c])
                .collect();
            if free.is_empty() {
                continue;
            }

            // Tenth-of-a-degree tiles near the equator.
            let bounds = GeoBounds::new(0.0, 0.1 * w as f64, 0.0, 0.1 * h as f64).unwrap();
            let cfg = GeoConfig::default().with_bounds(bounds);
            let g = Grid::new(cfg, h, w, tiles.clone()).unwrap();
            let inside = |rng: &mut StdRng| {
                let (r, c) = free[rng.random_range(0..free.len())];
                let dr = offsets[rng.random_range(0..offsets.len())];
                let dc = offsets[rng.random_range(0..offsets.len())];
                at(&g, r as f64 + dr, c as f64 + dc)
            };
            let (s, t) = (inside(&mut rng), inside(&mut rng));
            if s == t {
                continue;
            }

            let expected = visibility_graph_cost(&g, s, t);
            let res = search(&g, s, t);
            if expected.is_infinite() {
                assert_eq!(res.status, PathStatus::NotFound, "{s} -> {t} on {tiles:?}");
            } else {
                assert!(res.is_found(), "{s} -> {t} on {tiles:?}");
                assert!(
                    (res.cost - expected).abs() < 1e-5,
                    "{s} -> {t} on {tiles:?}: {} vs {expected}",
                    res.cost
                );
                assert!((res.cost - length(&res.path)).abs() < 1e-9);
            }
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn result_serializes() {
        let g = grid3(&[]);
        let res = search(&g, corner(&g, 0, 0), corner(&g, 3, 3));
        let json = serde_json::to_string(&res).unwrap();
        let back: PathResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.status, res.status);
        assert_eq!(back.path, res.path);
        assert!((back.cost - res.cost).abs() < 1e-12);
    }
}

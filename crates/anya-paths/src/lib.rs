//! Any-angle shortest paths over spherical grids.
//!
//! [`SearchInstance`] runs an interval-based search (in the style of Anya) over
//! an [`anya_core::Grid`]: frontiers are intervals of a lattice row seen from a
//! root point, projected row by row using the grid's interval-endpoint tables.
//! Visibility is decided in lattice index space; path lengths and the heuristic
//! use great-circle distance.
//!
//! ```no_run
//! use anya_core::{GeoConfig, SphericalPoint, io::MapFile};
//! use anya_paths::SearchInstance;
//!
//! # fn main() -> anya_core::Result<()> {
//! let grid = MapFile::open("arena.map")?.into_grid(GeoConfig::default())?;
//! let start = SphericalPoint::new(-10.0, 20.0)?;
//! let end = SphericalPoint::new(15.0, -40.0)?;
//! let result = SearchInstance::new(&grid, start, end).find_path()?;
//! println!("{:?} {:.3}", result.status, result.cost);
//! # Ok(())
//! # }
//! ```

mod expand;
mod heap;
mod initial;
mod node;
mod search;

pub use heap::PriorityQueue;
pub use node::{NodeId, SearchNode};
pub use search::{PathResult, PathStatus, SearchInstance, SearchStats};

//! Spherical grid model for any-angle pathfinding.
//!
//! This crate provides the geometry and map representation the search in
//! `anya-paths` runs over:
//!
//! - [`SphericalPoint`]: a validated latitude/longitude pair with its unit-sphere
//!   projection, great-circle distances and great-circle intersection.
//! - [`Grid`]: a blocked/free tile matrix, the lattice of corner points derived from
//!   it, per-row interval-endpoint tables and the point-location classifier
//!   ([`Grid::classify`]).
//! - [`GeoConfig`]: tolerance, rounding precision, lattice bounds and distance
//!   metric, built once and shared by reference.
//! - [`io`]: readers for octile map files and scenario files.

mod config;
mod error;
mod geom;
mod grid;
pub mod io;
mod location;
mod scan;

pub use config::{
    DECIMAL_PLACES, DistanceMetric, EPSILON, GeoBounds, GeoConfig, MAX_LAT, MAX_LON, MIN_LAT,
    MIN_LON,
};
pub use error::{Error, Result};
pub use geom::{Cartesian, SphericalPoint};
pub use grid::{Grid, LatticeIndex};
pub use location::{LocationKind, PointLocation, TileIndex};
pub use scan::is_integral;

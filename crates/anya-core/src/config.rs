//! Geometry constants and the shared [`GeoConfig`].

use crate::error::{Error, Result};

/// Default comparison tolerance, in degrees.
pub const EPSILON: f64 = 1e-6;
/// Default rounding precision for lattice coordinates and lookup keys.
pub const DECIMAL_PLACES: u32 = 5;

pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Great-circle distance formula.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DistanceMetric {
    /// Spherical law of cosines.
    #[default]
    Cosine,
    /// Haversine formula, better conditioned for tiny separations.
    Haversine,
}

// ---------------------------------------------------------------------------
// GeoBounds
// ---------------------------------------------------------------------------

/// The geographic rectangle a grid's lattice is spread over.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl GeoBounds {
    /// The whole globe.
    pub const WORLD: Self = Self {
        min_lat: MIN_LAT,
        max_lat: MAX_LAT,
        min_lon: MIN_LON,
        max_lon: MAX_LON,
    };

    /// Create bounds, checking ordering and the valid coordinate ranges.
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Result<Self> {
        let in_lat = |v: f64| (MIN_LAT..=MAX_LAT).contains(&v);
        let in_lon = |v: f64| (MIN_LON..=MAX_LON).contains(&v);
        if !in_lat(min_lat) || !in_lat(max_lat) {
            return Err(Error::Bounds(format!(
                "latitude range [{min_lat}, {max_lat}] exceeds [-90, 90]"
            )));
        }
        if !in_lon(min_lon) || !in_lon(max_lon) {
            return Err(Error::Bounds(format!(
                "longitude range [{min_lon}, {max_lon}] exceeds [-180, 180]"
            )));
        }
        if min_lat >= max_lat || min_lon >= max_lon {
            return Err(Error::Bounds(format!(
                "empty rectangle lat [{min_lat}, {max_lat}] lon [{min_lon}, {max_lon}]"
            )));
        }
        Ok(Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        })
    }

    #[inline]
    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    #[inline]
    pub fn lon_span(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Whether (lat, lon) lies inside the closed rectangle.
    #[inline]
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lon..=self.max_lon).contains(&lon)
    }
}

impl Default for GeoBounds {
    fn default() -> Self {
        Self::WORLD
    }
}

// ---------------------------------------------------------------------------
// GeoConfig
// ---------------------------------------------------------------------------

/// Process-wide geometry settings. Build once, pass by reference.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoConfig {
    /// Tolerance for coordinate and cost comparisons made by the search.
    /// `SphericalPoint`'s `==` always uses [`EPSILON`].
    pub epsilon: f64,
    pub decimal_places: u32,
    pub bounds: GeoBounds,
    pub metric: DistanceMetric,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            epsilon: EPSILON,
            decimal_places: DECIMAL_PLACES,
            bounds: GeoBounds::WORLD,
            metric: DistanceMetric::Cosine,
        }
    }
}

impl GeoConfig {
    pub fn with_bounds(mut self, bounds: GeoBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    #[inline]
    fn scale(&self) -> f64 {
        10f64.powi(self.decimal_places as i32)
    }

    /// Round `v` to the configured number of decimal places.
    pub fn round(&self, v: f64) -> f64 {
        let s = self.scale();
        (v * s).round() / s
    }

    /// Integer lookup key for a coordinate: `v` rounded and scaled.
    ///
    /// Two coordinates share a key exactly when they print identically at the
    /// configured precision.
    pub fn key(&self, v: f64) -> i64 {
        (v * self.scale()).round() as i64
    }
}

//! Spherical geometry: [`SphericalPoint`] and its [`Cartesian`] projection.

use std::fmt;
use std::ops::Neg;

use crate::config::{DistanceMetric, EPSILON, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Cartesian
// ---------------------------------------------------------------------------

/// A 3D vector. Points on the unit sphere have norm 1.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cartesian {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Cartesian {
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Unit vector for a latitude/longitude pair given in degrees.
    pub fn from_lat_lon(lat: f64, lon: f64) -> Self {
        let (sin_lat, cos_lat) = lat.to_radians().sin_cos();
        let (sin_lon, cos_lon) = lon.to_radians().sin_cos();
        Self::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat)
    }

    #[inline]
    pub fn dot(self, o: Self) -> f64 {
        self.x * o.x + self.y * o.y + self.z * o.z
    }

    #[inline]
    pub fn cross(self, o: Self) -> Self {
        Self::new(
            self.y * o.z - self.z * o.y,
            self.z * o.x - self.x * o.z,
            self.x * o.y - self.y * o.x,
        )
    }

    #[inline]
    pub fn norm_squared(self) -> f64 {
        self.dot(self)
    }

    #[inline]
    pub fn norm(self) -> f64 {
        self.norm_squared().sqrt()
    }

    /// The vector scaled to unit length, or `None` for a (near) zero vector.
    pub fn normalized(self) -> Option<Self> {
        let n = self.norm();
        if n < EPSILON {
            return None;
        }
        Some(Self::new(self.x / n, self.y / n, self.z / n))
    }
}

impl Neg for Cartesian {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

// ---------------------------------------------------------------------------
// SphericalPoint
// ---------------------------------------------------------------------------

/// A geographic point in degrees with its cached unit-sphere projection.
///
/// Equality is tolerant: coordinates within [`EPSILON`] compare equal, and any
/// two points at the same pole are equal whatever their longitude.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "LatLon", into = "LatLon")
)]
pub struct SphericalPoint {
    lat: f64,
    lon: f64,
    cartesian: Cartesian,
}

impl SphericalPoint {
    /// Create a point, rejecting latitudes outside [-90, 90] and longitudes
    /// outside [-180, 180].
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        check_lat(lat)?;
        check_lon(lon)?;
        Ok(Self {
            lat,
            lon,
            cartesian: Cartesian::from_lat_lon(lat, lon),
        })
    }

    /// Recover a point from a direction vector of any non-trivial length.
    pub fn from_cartesian(v: Cartesian) -> Result<Self> {
        let m = v.norm();
        if m < EPSILON {
            return Err(Error::DegenerateVector(m));
        }
        let lat = (v.z / m).clamp(-1.0, 1.0).asin().to_degrees();
        let lon = v.y.atan2(v.x).to_degrees();
        Self::new(lat, lon)
    }

    #[inline]
    pub fn lat(&self) -> f64 {
        self.lat
    }

    #[inline]
    pub fn lon(&self) -> f64 {
        self.lon
    }

    #[inline]
    pub fn to_cartesian(&self) -> Cartesian {
        self.cartesian
    }

    pub fn set_lat(&mut self, lat: f64) -> Result<()> {
        check_lat(lat)?;
        self.lat = lat;
        self.cartesian = Cartesian::from_lat_lon(self.lat, self.lon);
        Ok(())
    }

    pub fn set_lon(&mut self, lon: f64) -> Result<()> {
        check_lon(lon)?;
        self.lon = lon;
        self.cartesian = Cartesian::from_lat_lon(self.lat, self.lon);
        Ok(())
    }

    /// Tolerant equality with an explicit tolerance.
    pub fn is_close(&self, other: &Self, eps: f64) -> bool {
        if (self.lat - other.lat).abs() >= eps {
            return false;
        }
        let at_pole = |lat: f64| (lat.abs() - MAX_LAT).abs() < eps;
        if at_pole(self.lat) && at_pole(other.lat) {
            return true;
        }
        (self.lon - other.lon).abs() < eps
    }

    /// Central angle in degrees by the spherical law of cosines.
    pub fn cos_distance(&self, other: &Self) -> f64 {
        let (p1, p2) = (self.lat.to_radians(), other.lat.to_radians());
        let dl = (other.lon - self.lon).to_radians();
        let c = p1.sin() * p2.sin() + p1.cos() * p2.cos() * dl.cos();
        c.clamp(-1.0, 1.0).acos().to_degrees()
    }

    /// Central angle in degrees by the haversine formula.
    pub fn hav_distance(&self, other: &Self) -> f64 {
        let (p1, p2) = (self.lat.to_radians(), other.lat.to_radians());
        let dp = p2 - p1;
        let dl = (other.lon - self.lon).to_radians();
        let a = (dp / 2.0).sin().powi(2) + p1.cos() * p2.cos() * (dl / 2.0).sin().powi(2);
        2.0 * a.clamp(0.0, 1.0).sqrt().asin().to_degrees()
    }

    /// Great-circle distance in degrees; exactly zero for equal points.
    #[inline]
    pub fn distance(&self, other: &Self) -> f64 {
        self.distance_with(other, DistanceMetric::Cosine)
    }

    pub fn distance_with(&self, other: &Self, metric: DistanceMetric) -> f64 {
        if self == other {
            return 0.0;
        }
        match metric {
            DistanceMetric::Cosine => self.cos_distance(other),
            DistanceMetric::Haversine => self.hav_distance(other),
        }
    }

    /// The diametrically opposite point.
    pub fn antipode(&self) -> Self {
        let lon = if self.lon > 0.0 {
            self.lon - 180.0
        } else {
            self.lon + 180.0
        };
        Self {
            lat: -self.lat,
            lon,
            cartesian: -self.cartesian,
        }
    }

    /// Intersections of the great circle through `p1`, `p2` with the one
    /// through `p3`, `p4`.
    ///
    /// The two circles meet at a pair of antipodal points, both returned.
    /// `None` when either pair does not define a circle or the circles coincide.
    pub fn great_circle_intersection(
        p1: &Self,
        p2: &Self,
        p3: &Self,
        p4: &Self,
    ) -> Option<(Self, Self)> {
        let n1 = p1.cartesian.cross(p2.cartesian);
        let n2 = p3.cartesian.cross(p4.cartesian);
        let line = n1.cross(n2);
        if line.norm_squared() < EPSILON * EPSILON {
            return None;
        }
        let p = Self::from_cartesian(line.normalized()?).ok()?;
        Some((p, p.antipode()))
    }
}

/// Tolerant equality at the fixed [`EPSILON`]. Use [`SphericalPoint::is_close`]
/// for another tolerance.
impl PartialEq for SphericalPoint {
    fn eq(&self, other: &Self) -> bool {
        self.is_close(other, EPSILON)
    }
}

impl fmt::Display for SphericalPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat, self.lon)
    }
}

fn check_lat(lat: f64) -> Result<()> {
    if (MIN_LAT..=MAX_LAT).contains(&lat) {
        Ok(())
    } else {
        Err(Error::Latitude(lat))
    }
}

fn check_lon(lon: f64) -> Result<()> {
    if (MIN_LON..=MAX_LON).contains(&lon) {
        Ok(())
    } else {
        Err(Error::Longitude(lon))
    }
}

// --- serde ---

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct LatLon {
    lat: f64,
    lon: f64,
}

#[cfg(feature = "serde")]
impl TryFrom<LatLon> for SphericalPoint {
    type Error = Error;
    fn try_from(v: LatLon) -> Result<Self> {
        Self::new(v.lat, v.lon)
    }
}

#[cfg(feature = "serde")]
impl From<SphericalPoint> for LatLon {
    fn from(p: SphericalPoint) -> Self {
        Self {
            lat: p.lat,
            lon: p.lon,
        }
    }
}

//! # Geodetic transform
//!
//! Conversion of Earth-Centred Earth-Fixed (ECEF) cartesian positions to geodetic latitude,
//! longitude and ellipsoidal height, using Bowring's closed-form approximation on a reference
//! ellipsoid (WGS84 unless told otherwise).
//!
//! ## Formulas
//! -----------------
//! With `a` the semi-major axis and `f` the flattening:
//!
//! ```text
//! b   = a (1 − f)              e²  = f (2 − f)            e'² = e² a² / b²
//! p   = √(x² + y²)
//! θ   = atan2(z a, p b)
//! φ   = atan2(z + e'² b sin³θ, p − e² a cos³θ)
//! λ   = atan2(y, x)
//! N   = a / √(1 − e² sin²φ)
//! h   = p / cos φ − N
//! ```
//!
//! There is no iteration and no special case: a point on the polar axis gets `λ = 0°`
//! from the `atan2` convention, and even the geocentre yields finite numbers.
//!
//! ## Usage
//! -----------------
//! ```rust
//! use snxroster::geodesy::to_geodetic;
//!
//! let (lat, lon, h) = to_geodetic(4075580.396, 931854.312, 4801568.031);
//! assert!((lat - 49.1442).abs() < 1e-4);
//! assert!((lon - 12.8789).abs() < 1e-4);
//! assert!((h - 665.92).abs() < 1e-2);
//! ```
use nalgebra::Vector3;
use tracing::{debug, warn};

use crate::{
    constants::{Degree, Meter, Radian, WGS84_INVERSE_FLATTENING, WGS84_SEMI_MAJOR_AXIS},
    station::ParseResult,
};

/// Geodetic position on a reference ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geodetic {
    pub latitude: Degree,
    pub longitude: Degree,
    pub height: Meter,
}

/// Reference ellipsoid of revolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    /// Equatorial radius, meters
    pub semi_major_axis: Meter,
    /// Flattening `f = (a − b) / a`
    pub flattening: f64,
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Ellipsoid::WGS84
    }
}

impl Ellipsoid {
    pub const WGS84: Ellipsoid = Ellipsoid {
        semi_major_axis: WGS84_SEMI_MAJOR_AXIS,
        flattening: 1.0 / WGS84_INVERSE_FLATTENING,
    };

    /// Polar radius `b = a (1 − f)`
    pub fn semi_minor_axis(&self) -> Meter {
        self.semi_major_axis * (1.0 - self.flattening)
    }

    /// First eccentricity squared `e² = f (2 − f)`
    pub fn eccentricity_squared(&self) -> f64 {
        self.flattening * (2.0 - self.flattening)
    }

    /// Second eccentricity squared `e'² = e² a² / b²`
    pub fn second_eccentricity_squared(&self) -> f64 {
        let b = self.semi_minor_axis();
        self.eccentricity_squared() * self.semi_major_axis.powi(2) / b.powi(2)
    }

    /// Radius of curvature in the prime vertical.
    ///
    /// Arguments
    /// -----------------
    /// * `latitude`: geodetic latitude in **radians**.
    ///
    /// Return
    /// ----------
    /// * `N(φ) = a / √(1 − e² sin²φ)`, meters.
    pub fn prime_vertical_radius(&self, latitude: Radian) -> Meter {
        self.semi_major_axis / (1.0 - self.eccentricity_squared() * latitude.sin().powi(2)).sqrt()
    }

    /// Convert an ECEF position to geodetic coordinates (Bowring, single pass).
    ///
    /// Arguments
    /// -----------------
    /// * `ecef`: cartesian position in meters.
    ///
    /// Return
    /// ----------
    /// * The [`Geodetic`] position, angles in degrees, height in meters above the ellipsoid.
    ///
    /// See also
    /// ------------
    /// * [`Ellipsoid::geodetic_to_ecef`] – the exact inverse.
    pub fn ecef_to_geodetic(&self, ecef: &Vector3<Meter>) -> Geodetic {
        let a = self.semi_major_axis;
        let b = self.semi_minor_axis();
        let e2 = self.eccentricity_squared();
        let ep2 = self.second_eccentricity_squared();

        let p = (ecef.x.powi(2) + ecef.y.powi(2)).sqrt();
        let theta = (ecef.z * a).atan2(p * b);

        let latitude =
            (ecef.z + ep2 * b * theta.sin().powi(3)).atan2(p - e2 * a * theta.cos().powi(3));
        let longitude = ecef.y.atan2(ecef.x);
        let height = p / latitude.cos() - self.prime_vertical_radius(latitude);

        Geodetic {
            latitude: latitude.to_degrees(),
            longitude: longitude.to_degrees(),
            height,
        }
    }

    /// Convert a geodetic position back to ECEF meters.
    ///
    /// ```text
    /// X = (N + h) cos φ cos λ
    /// Y = (N + h) cos φ sin λ
    /// Z = (N (1 − e²) + h) sin φ
    /// ```
    pub fn geodetic_to_ecef(&self, geodetic: &Geodetic) -> Vector3<Meter> {
        let lat = geodetic.latitude.to_radians();
        let lon = geodetic.longitude.to_radians();
        let n = self.prime_vertical_radius(lat);

        Vector3::new(
            (n + geodetic.height) * lat.cos() * lon.cos(),
            (n + geodetic.height) * lat.cos() * lon.sin(),
            (n * (1.0 - self.eccentricity_squared()) + geodetic.height) * lat.sin(),
        )
    }
}

/// WGS84 ECEF → geodetic conversion.
///
/// Arguments
/// -----------------
/// * `x`, `y`, `z`: ECEF coordinates in meters.
///
/// Return
/// ----------
/// * `(latitude, longitude, height)` in degrees, degrees and meters.
pub fn to_geodetic(x: Meter, y: Meter, z: Meter) -> (Degree, Degree, Meter) {
    let geodetic = Ellipsoid::WGS84.ecef_to_geodetic(&Vector3::new(x, y, z));
    (geodetic.latitude, geodetic.longitude, geodetic.height)
}

/// Fills the geodetic fields of every station of a [`ParseResult`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Transformer {
    ellipsoid: Ellipsoid,
}

impl Transformer {
    pub fn new(ellipsoid: Ellipsoid) -> Self {
        Transformer { ellipsoid }
    }

    /// Transform all stations of `parsed`.
    ///
    /// Stations missing an ECEF component are dropped with a warning.
    pub fn transform(&self, parsed: ParseResult) -> ParseResult {
        let epoch = parsed.epoch();
        let stations = parsed.into_iter().filter_map(|mut station| {
            if !station.is_complete() {
                warn!(
                    station = %station.station_id,
                    missing = ?station.missing_axes(),
                    "station dropped: incomplete ECEF position"
                );
                return None;
            }

            let geodetic = self.ellipsoid.ecef_to_geodetic(&station.ecef());
            station.latitude = geodetic.latitude;
            station.longitude = geodetic.longitude;
            station.height = geodetic.height;
            debug!(
                station = %station.station_id,
                latitude = station.latitude,
                longitude = station.longitude,
                height = station.height,
                "station transformed"
            );
            Some(station)
        });

        ParseResult::from_stations(epoch, stations)
    }
}

//! # Constants and type definitions for snxroster
//!
//! This module centralizes the **reference ellipsoid parameters**, the **SINEX block markers**,
//! the **GNSS product conventions** and the common type aliases used throughout the crate.
//!
//! ## Overview
//!
//! - WGS84 defining parameters (semi-major axis, inverse flattening)
//! - Time constants (seconds per day, GPS time origin)
//! - SINEX `SOLUTION/ESTIMATE` block markers
//! - Identifiers for stations and scenarios
//!
//! These definitions are shared by the parser, the geodetic transform, the reconciler
//! and the retrieval helpers.

// -------------------------------------------------------------------------------------------------
// Reference ellipsoid
// -------------------------------------------------------------------------------------------------

/// WGS84 semi-major axis (equatorial radius) in meters
pub const WGS84_SEMI_MAJOR_AXIS: f64 = 6_378_137.0;

/// WGS84 inverse flattening (1/f)
pub const WGS84_INVERSE_FLATTENING: f64 = 298.257223563;

// -------------------------------------------------------------------------------------------------
// Time
// -------------------------------------------------------------------------------------------------

/// Number of seconds in a day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Number of days in a GPS week
pub const DAYS_PER_WEEK: i64 = 7;

/// Gregorian date (UTC) of the GPS time origin, start of GPS week 0
pub const GPS_EPOCH_DATE: (i32, u8, u8) = (1980, 1, 6);

/// Timestamp layout used by the station store (`YYYY-MM-DD HH:MM:SS`, UTC)
pub const STORE_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// -------------------------------------------------------------------------------------------------
// SINEX markers
// -------------------------------------------------------------------------------------------------

/// Line prefix opening a solution estimate block
pub const ESTIMATE_BLOCK_START: &str = "+SOLUTION/ESTIMATE";

/// Line prefix closing a solution estimate block
pub const ESTIMATE_BLOCK_END: &str = "-SOLUTION/ESTIMATE";

// -------------------------------------------------------------------------------------------------
// Archive conventions
// -------------------------------------------------------------------------------------------------

/// Default base URL of the IGS weekly products archive
pub const DEFAULT_PRODUCTS_URL: &str = "https://cddis.nasa.gov/archive/gnss/products";

/// Host that performs the Earthdata login on behalf of the archive
pub const DEFAULT_AUTH_HOST: &str = "urs.earthdata.nasa.gov";

/// Root of the daily observation tree whose listing gives the station allow-list
pub const DAILY_DATA_ROOT: &str = "LOCAL/FREE/CDIS/DATA/DAILY";

/// Maximum number of HTTP redirects followed by the archive client
pub const MAX_REDIRECTS: usize = 10;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in radians
pub type Radian = f64;
/// Distance in meters
pub type Meter = f64;
/// Lowercase 4-character station code (e.g. `"brst"`)
pub type StationId = String;
/// Analysis scenario identifier (e.g. `"011888"`)
pub type ScenarioId = String;

//! # Constants and unit conventions
//!
//! Numeric constants shared by the sidereal-time and projection code, and the
//! unit aliases used at every function boundary of the crate.
//!
//! Angles are carried as plain `f64` but always through one of the aliases below,
//! so a signature states its unit: `Degree` for anything on sky or on the detector,
//! `Radian` only inside trigonometric helpers, `Hour` for sidereal time.

use nalgebra::Point2;

// -------------------------------------------------------------------------------------------------
// Numeric constants
// -------------------------------------------------------------------------------------------------

/// 2π, one full turn in radians
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Arcseconds → radians
pub const RADSEC: f64 = std::f64::consts::PI / 648000.0;

/// MJD epoch of J2000.0 (2000-01-01 12:00:00 TT)
pub const T2000: f64 = 51544.5;

/// Days in a Julian century
pub const DAYS_PER_CENTURY: f64 = 36525.0;

/// Ratio of the sidereal rotation rate to the mean solar day
pub const SIDEREAL_RATE: f64 = 1.00273790934;

/// Degrees of rotation per sidereal hour
pub const DEG_PER_HOUR: f64 = 15.0;

// -------------------------------------------------------------------------------------------------
// Unit aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in arcseconds
pub type ArcSec = f64;
/// Angle in radians
pub type Radian = f64;
/// Sidereal time in hours
pub type Hour = f64;
/// Length on the detector in pixels
pub type Pixel = f64;
/// Plate scale, arcseconds per detector pixel
pub type ArcSecPerPixel = f64;
/// Wavelength in micrometers
pub type Micron = f64;
/// Modified Julian Date (days)
pub type MJD = f64;

/// Detector pixel coordinates `(x, y)`
pub type PixelPosition = Point2<Pixel>;

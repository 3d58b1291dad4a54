use hifitime::Epoch;
use log::debug;
use std::str::FromStr;

use crate::constants::{Degree, Hour, Radian, DAYS_PER_CENTURY, DPI, MJD, SIDEREAL_RATE, T2000};
use crate::earth_orientation::equequ;
use crate::planner_errors::PlannerError;

/// Parse an ISO-8601 calendar instant into an [`Epoch`].
///
/// Strings without an explicit time scale are read as UTC. Minute precision
/// (`YYYY-MM-DDTHH:MM`) is accepted and completed with zero seconds; fractional
/// seconds are kept.
///
/// Argument
/// --------
/// * `input`: the date-time string, e.g. `"2019-05-17T10:40:00"`
///
/// Return
/// ------
/// * the parsed epoch, or [`PlannerError::InvalidTime`] if the string is not a calendar instant
pub fn parse_instant(input: &str) -> Result<Epoch, PlannerError> {
    let trimmed = input.trim();
    let normalized = if is_minute_precision(trimmed) {
        format!("{trimmed}:00")
    } else {
        trimmed.to_string()
    };

    Epoch::from_str(&normalized).map_err(|err| PlannerError::InvalidTime {
        input: input.to_string(),
        reason: err.to_string(),
    })
}

fn is_minute_precision(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 16
        && matches!(bytes[10], b'T' | b' ')
        && bytes[13] == b':'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| matches!(i, 4 | 7 | 10 | 13) || b.is_ascii_digit())
}

/// Compute the Greenwich Mean Sidereal Time (GMST) in radians.
///
/// IAU 1982 polynomial for the mean sidereal time at 0h UT1, plus the rotation
/// accumulated during the fraction of the day.
///
/// # Arguments
/// * `tjm` - Modified Julian Date (UT1 time scale)
///
/// # Returns
/// * GMST angle in radians, normalized to the interval [0, 2π).
pub fn gmst(tjm: MJD) -> Radian {
    // GMST at 0h UT1, in seconds of time
    const C0: f64 = 24110.54841;
    const C1: f64 = 8640184.812866;
    const C2: f64 = 9.3104e-2;
    const C3: f64 = -6.2e-6;

    let t = (tjm.floor() - T2000) / DAYS_PER_CENTURY;
    let gmst0 = (((C3 * t + C2) * t + C1) * t + C0) * DPI / 86400.0;

    (gmst0 + tjm.fract() * DPI * SIDEREAL_RATE).rem_euclid(DPI)
}

/// Local apparent sidereal time at a given east longitude, in hours.
///
/// The Greenwich apparent sidereal time is GMST plus the equation of the equinoxes;
/// the site longitude then shifts it to the local meridian. UT1 is taken equal to UTC,
/// which bounds the error to under 0.9 s of time.
///
/// Arguments
/// ---------
/// * `epoch`: the instant of observation
/// * `longitude`: site longitude in degrees, east positive
///
/// Return
/// ------
/// * local apparent sidereal time in `[0, 24)` hours
pub fn local_apparent_sidereal_time(epoch: &Epoch, longitude: Degree) -> Hour {
    let gast = gmst(epoch.to_mjd_utc_days()) + equequ(epoch.to_mjd_tt_days());
    let last = (gast + longitude.to_radians()).rem_euclid(DPI);
    let hours = last * 24.0 / DPI;

    debug!("LAST at {epoch} for longitude {longitude}°: {hours:.6} h");
    hours
}

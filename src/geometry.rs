//! # Observation geometry
//!
//! Sky-rotation geometry for an alt-az or derotator-equipped telescope:
//!
//! 1. **Sidereal time and parallactic angle** for a site, a sky position and an instant
//!    ([`parallactic_angle`](crate::geometry::parallactic_angle)).
//! 2. **Correction pipeline** folding the parallactic angle together with the instrument and
//!    target rotation terms into a detector-frame position angle
//!    ([`detector_position_angle`](crate::geometry::detector_position_angle)).
//!
//! ## Conventions
//!
//! - All inputs and outputs are in **degrees**, except sidereal time which is in **hours**.
//! - The hour angle is the raw difference `LAST·15 − RA`; no wrap is applied because only its
//!   sine and cosine are used.
//! - The parallactic angle lies in `(−180°, 180°]`. The detector position angle is a plain
//!   linear combination and is **not** wrapped: values may differ from a canonical range by a
//!   multiple of 360°. Callers that display it should wrap it themselves.
//!
//! ## Formula
//!
//! ```text
//! q = atan2( sin H, cos δ · tan φ − sin δ · cos H )
//! ```
//!
//! with `H` the hour angle, `δ` the declination and `φ` the site latitude. At the poles
//! `tan φ` diverges and the call fails with [`PlannerError::DegenerateGeometry`].

use hifitime::Epoch;

use crate::constants::{Degree, Hour, DEG_PER_HOUR};
use crate::planner_errors::PlannerError;
use crate::sites::SiteLocation;
use crate::time::local_apparent_sidereal_time;

/// Distance from ±90° latitude under which `tan φ` is considered undefined.
const POLE_TOLERANCE: Degree = 1e-9;

/// Below this magnitude both atan2 arguments vanish together and the angle is undefined.
const ATAN2_TOLERANCE: f64 = 1e-12;

/// Sidereal quantities derived for one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SiderealGeometry {
    /// Local apparent sidereal time, hours in `[0, 24)`.
    pub sidereal_time: Hour,
    /// Hour angle of the target, degrees (unwrapped).
    pub hour_angle: Degree,
    /// Parallactic angle, degrees in `(−180, 180]`.
    pub parallactic_angle: Degree,
}

/// Hour angle of a target from the local sidereal time.
pub fn hour_angle(sidereal_time: Hour, ra: Degree) -> Degree {
    sidereal_time * DEG_PER_HOUR - ra
}

/// Parallactic angle from an hour angle, a declination and a site latitude.
///
/// Arguments
/// ---------
/// * `hour_angle`: target hour angle in degrees (any value, no wrap needed)
/// * `dec`: target declination in degrees
/// * `latitude`: site latitude in degrees
///
/// Return
/// ------
/// * the parallactic angle in degrees, in `(−180, 180]`
///
/// Errors
/// ------
/// * [`PlannerError::DegenerateGeometry`] when the latitude is at a pole, when an input is not
///   finite, or when both atan2 arguments vanish (target on the pole or at the zenith).
pub fn parallactic_angle_from_hour_angle(
    hour_angle: Degree,
    dec: Degree,
    latitude: Degree,
) -> Result<Degree, PlannerError> {
    if !(hour_angle.is_finite() && dec.is_finite() && latitude.is_finite()) {
        return Err(PlannerError::DegenerateGeometry(format!(
            "non-finite input (hour angle {hour_angle}, dec {dec}, latitude {latitude})"
        )));
    }
    if 90.0 - latitude.abs() < POLE_TOLERANCE {
        return Err(PlannerError::DegenerateGeometry(format!(
            "site latitude {latitude}° is at a pole, tan(latitude) is undefined"
        )));
    }

    let ha = hour_angle.to_radians();
    let dec = dec.to_radians();
    let lat = latitude.to_radians();

    let num = ha.sin();
    let den = dec.cos() * lat.tan() - dec.sin() * ha.cos();

    if num.abs() < ATAN2_TOLERANCE && den.abs() < ATAN2_TOLERANCE {
        return Err(PlannerError::DegenerateGeometry(
            "parallactic angle undefined: target at the zenith or the celestial pole".into(),
        ));
    }

    let q = num.atan2(den).to_degrees();
    // atan2(-0, x<0) gives -180; keep the half-open range
    Ok(if q == -180.0 { 180.0 } else { q })
}

/// Compute sidereal time, hour angle and parallactic angle of a target seen from a site.
///
/// Arguments
/// ---------
/// * `site`: observing site (longitude east positive, latitude in degrees)
/// * `ra`, `dec`: target right ascension and declination in degrees
/// * `epoch`: the instant of observation
///
/// Return
/// ------
/// * the [`SiderealGeometry`] at `epoch`
///
/// Errors
/// ------
/// * [`PlannerError::DegenerateGeometry`], see [`parallactic_angle_from_hour_angle`].
pub fn parallactic_angle(
    site: &SiteLocation,
    ra: Degree,
    dec: Degree,
    epoch: &Epoch,
) -> Result<SiderealGeometry, PlannerError> {
    let sidereal_time = local_apparent_sidereal_time(epoch, site.longitude());
    let hour_angle = hour_angle(sidereal_time, ra);
    let parallactic_angle = parallactic_angle_from_hour_angle(hour_angle, dec, site.latitude())?;

    Ok(SiderealGeometry {
        sidereal_time,
        hour_angle,
        parallactic_angle,
    })
}

/// Position angle of the companion in the detector frame.
///
/// ```text
/// result = target_position_angle + instrument_rotation_offset − (extra_rotation + parallactic_angle)
/// ```
///
/// Shifting either of the first two terms by δ shifts the result by +δ; shifting either of
/// the last two by δ shifts it by −δ. The result is not wrapped.
pub fn detector_position_angle(
    target_position_angle: Degree,
    instrument_rotation_offset: Degree,
    extra_rotation: Degree,
    parallactic_angle: Degree,
) -> Degree {
    target_position_angle + instrument_rotation_offset - (extra_rotation + parallactic_angle)
}

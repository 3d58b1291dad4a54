use crate::constants::{ArcSec, Radian, DAYS_PER_CENTURY, MJD, RADSEC, T2000};

/// Julian centuries elapsed since J2000.0.
fn centuries_since_j2000(tjm: MJD) -> f64 {
    (tjm - T2000) / DAYS_PER_CENTURY
}

/// Compute the mean obliquity of the ecliptic (IAU 1976 model).
///
/// Arguments
/// ---------
/// * `tjm`: Modified Julian Date (TT scale).
///
/// Returns
/// --------
/// * Mean obliquity ε₀ in radians.
///
/// The cubic polynomial in Julian centuries from J2000 is evaluated with Horner's scheme:
///
/// ```text
/// ε₀ = 84381.448″ − 46.8150″·T − 0.00059″·T² + 0.001813″·T³
/// ```
pub fn obleq(tjm: MJD) -> Radian {
    const EPS0: ArcSec = 84381.448;
    const EPS1: ArcSec = -46.8150;
    const EPS2: ArcSec = -0.00059;
    const EPS3: ArcSec = 0.001813;

    let t = centuries_since_j2000(tjm);
    (((EPS3 * t + EPS2) * t + EPS1) * t + EPS0) * RADSEC
}

/// Low-order IAU 1980 nutation in longitude and obliquity.
///
/// Only the four dominant periodic terms are kept (lunar node, twice the mean longitude of
/// the Sun, twice the mean longitude of the Moon, twice the node). The truncation error is
/// below 0.5″ in Δψ, far under what the equation of the equinoxes needs for a
/// sidereal-time accuracy of a few milliseconds.
///
/// Arguments
/// ---------
/// * `tjm`: Modified Julian Date (TT scale).
///
/// Returns
/// --------
/// * `(Δψ, Δε)` in arcseconds.
pub fn nutation(tjm: MJD) -> (ArcSec, ArcSec) {
    let t = centuries_since_j2000(tjm);

    // Longitude of the Moon's ascending node, mean longitudes of Sun and Moon (degrees)
    let node = (125.04452 - 1934.136261 * t).to_radians();
    let sun = (280.4665 + 36000.7698 * t).to_radians();
    let moon = (218.3165 + 481267.8813 * t).to_radians();

    let dpsi = -17.20 * node.sin() - 1.32 * (2.0 * sun).sin() - 0.23 * (2.0 * moon).sin()
        + 0.21 * (2.0 * node).sin();
    let deps = 9.20 * node.cos() + 0.57 * (2.0 * sun).cos() + 0.10 * (2.0 * moon).cos()
        - 0.09 * (2.0 * node).cos();

    (dpsi, deps)
}

/// Equation of the equinoxes, the gap between apparent and mean sidereal time.
///
/// ```text
/// Eq_eq = Δψ · cos(ε₀ + Δε)
/// ```
///
/// # Arguments
/// * `tjm` - Modified Julian Date (TT scale)
///
/// # Returns
/// * Equation of the equinoxes in **radians**.
pub fn equequ(tjm: MJD) -> Radian {
    let (dpsi, deps) = nutation(tjm);
    let true_obliquity = obleq(tjm) + deps * RADSEC;
    dpsi * RADSEC * true_obliquity.cos()
}

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::{ArcSec, Degree, DEG_PER_HOUR};
use crate::planner_errors::PlannerError;
use crate::resolver::NameResolver;

/// Celestial reference frame of a sky position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frame {
    #[default]
    Icrs,
    Fk5,
    Fk4,
}

/// Equatorial sky position, stored in degrees whatever the input unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyCoord {
    frame: Frame,
    ra: Degree,
    dec: Degree,
}

impl SkyCoord {
    /// Sky position from right ascension and declination in degrees, ICRS frame.
    ///
    /// Errors
    /// ----------
    /// * [`PlannerError::InvalidConfiguration`] if a value is not finite or `|dec| > 90`.
    pub fn new(ra: Degree, dec: Degree) -> Result<Self, PlannerError> {
        if !(ra.is_finite() && dec.is_finite()) {
            return Err(PlannerError::InvalidConfiguration(format!(
                "sky coordinates must be finite, got ra={ra}, dec={dec}"
            )));
        }
        if dec.abs() > 90.0 {
            return Err(PlannerError::InvalidConfiguration(format!(
                "declination must lie in [-90, 90], got {dec}"
            )));
        }
        Ok(SkyCoord {
            frame: Frame::Icrs,
            ra,
            dec,
        })
    }

    /// Sky position from a right ascension in hours and a declination in degrees.
    pub fn from_hours(ra_hours: f64, dec: Degree) -> Result<Self, PlannerError> {
        SkyCoord::new(ra_hours * DEG_PER_HOUR, dec)
    }

    /// Sky position from sexagesimal strings.
    ///
    /// Arguments
    /// ---------
    /// * `ra`: right ascension as `HH MM SS.SS` (spaces or colons)
    /// * `dec`: declination as `±DD MM SS.S` (spaces or colons)
    pub fn from_sexagesimal(ra: &str, dec: &str) -> Result<Self, PlannerError> {
        let invalid = |what: &str, text: &str| {
            PlannerError::InvalidConfiguration(format!("cannot parse {what} '{text}'"))
        };

        let (h, m, s, _) = split_sexagesimal(ra).ok_or_else(|| invalid("right ascension", ra))?;
        let (d, am, asec, negative) =
            split_sexagesimal(dec).ok_or_else(|| invalid("declination", dec))?;

        let ra_deg = (h + m / 60.0 + s / 3600.0) * DEG_PER_HOUR;
        let sign = if negative { -1.0 } else { 1.0 };
        let dec_deg = sign * (d + am / 60.0 + asec / 3600.0);

        SkyCoord::new(ra_deg, dec_deg)
    }

    /// Same position, expressed as belonging to another frame.
    pub fn with_frame(self, frame: Frame) -> Self {
        SkyCoord { frame, ..self }
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn ra(&self) -> Degree {
        self.ra
    }

    pub fn dec(&self) -> Degree {
        self.dec
    }
}

static SEXAGESIMAL: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^\s*([+-]?)(\d+(?:\.\d*)?)[\s:]+(\d+(?:\.\d*)?)[\s:]+(\d+(?:\.\d*)?)\s*$").ok()
});

/// Split `"[±]A B C"` (or `A:B:C`) into its three magnitudes and the leading sign.
fn split_sexagesimal(text: &str) -> Option<(f64, f64, f64, bool)> {
    let caps = SEXAGESIMAL.as_ref()?.captures(text)?;

    let negative = &caps[1] == "-";
    let first: f64 = caps[2].parse().ok()?;
    let second: f64 = caps[3].parse().ok()?;
    let third: f64 = caps[4].parse().ok()?;

    if !(0.0..60.0).contains(&second) || !(0.0..60.0).contains(&third) {
        return None;
    }
    Some((first, second, third, negative))
}

/// A star with a faint companion.
///
/// # Fields
///
/// * `name` - identifier, also the library key once lowercased
/// * `sky_coords` - position of the host star
/// * `position_angle` - bearing of the companion on sky, degrees east of north
/// * `separation` - companion–star distance in arcseconds
/// * `delta_mag` - optional brightness contrast
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    name: String,
    sky_coords: SkyCoord,
    position_angle: Degree,
    separation: ArcSec,
    delta_mag: Option<f64>,
}

impl Target {
    /// Create a target with every field supplied.
    ///
    /// Errors
    /// ----------
    /// * [`PlannerError::InvalidConfiguration`] if the name is blank, the position angle is
    ///   not finite, or the separation is negative or not finite.
    pub fn new(
        name: impl Into<String>,
        sky_coords: SkyCoord,
        position_angle: Degree,
        separation: ArcSec,
        delta_mag: Option<f64>,
    ) -> Result<Self, PlannerError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(PlannerError::InvalidConfiguration(
                "target name cannot be empty".into(),
            ));
        }
        if !position_angle.is_finite() {
            return Err(PlannerError::InvalidConfiguration(format!(
                "position angle of '{name}' must be finite"
            )));
        }
        if !(separation >= 0.0 && separation.is_finite()) {
            return Err(PlannerError::InvalidConfiguration(format!(
                "separation of '{name}' must be non-negative, got {separation}"
            )));
        }
        if delta_mag.is_some_and(|m| !m.is_finite()) {
            return Err(PlannerError::InvalidConfiguration(format!(
                "delta magnitude of '{name}' must be finite"
            )));
        }

        Ok(Target {
            name,
            sky_coords,
            position_angle,
            separation,
            delta_mag,
        })
    }

    /// Create a target whose sky position comes from a celestial name resolver.
    ///
    /// A failed resolution is returned as is; no default position is substituted.
    pub fn from_resolver(
        name: &str,
        resolver: &dyn NameResolver,
        position_angle: Degree,
        separation: ArcSec,
        delta_mag: Option<f64>,
    ) -> Result<Self, PlannerError> {
        let sky_coords = resolver.resolve(name)?;
        Target::new(name, sky_coords, position_angle, separation, delta_mag)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sky_coords(&self) -> &SkyCoord {
        &self.sky_coords
    }

    pub fn ra(&self) -> Degree {
        self.sky_coords.ra
    }

    pub fn dec(&self) -> Degree {
        self.sky_coords.dec
    }

    pub fn position_angle(&self) -> Degree {
        self.position_angle
    }

    pub fn separation(&self) -> ArcSec {
        self.separation
    }

    pub fn delta_mag(&self) -> Option<f64> {
        self.delta_mag
    }
}

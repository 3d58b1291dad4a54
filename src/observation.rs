//! # Observations
//!
//! An [`Observation`](crate::observation::Observation) ties one instrument, one of its vAPP
//! masks, one target and an instant together. It is never persisted and stores no geometry:
//! sidereal time, parallactic angle, detector position angle and projected companion
//! positions are recomputed on every call.
//!
//! Over a [`TimeWindow`](crate::time_series::TimeWindow),
//! [`Observation::track`](crate::observation::Observation::track) produces one
//! [`TrackPoint`](crate::observation::TrackPoint) per sample: the two companion tracks,
//! one around each PSF anchor, that a figure would draw.
//!
//! ```rust
//! use vapp_planner::legacy::LegacyInstrument;
//! use vapp_planner::observation::Observation;
//! use vapp_planner::target::{SkyCoord, Target};
//! use vapp_planner::time::parse_instant;
//! use vapp_planner::time_series::TimeWindow;
//!
//! let (instrument, vapp) = LegacyInstrument::Charis.setup(0.0)?;
//! let target = Target::new(
//!     "HD206893",
//!     SkyCoord::new(326.34168735931195, -12.783352171281424)?,
//!     65.0,
//!     0.257,
//!     None,
//! )?;
//! let observation = Observation::new(
//!     instrument,
//!     vapp,
//!     target,
//!     parse_instant("2019-05-17T10:40:00")?,
//!     None,
//! )?;
//!
//! let window = TimeWindow::parse("2019-05-17T10:40:00", "2019-05-17T12:10:00", 5)?;
//! let track = observation.track(&window)?;
//! assert_eq!(track.len(), 5);
//! # Ok::<(), vapp_planner::planner_errors::PlannerError>(())
//! ```

use std::fmt;
use std::str::FromStr;

use hifitime::Epoch;
use itertools::Itertools;

use crate::aperture::ApertureCircle;
use crate::constants::{Degree, Hour, Micron, PixelPosition};
use crate::geometry::{detector_position_angle, parallactic_angle, SiderealGeometry};
use crate::instrument::Instrument;
use crate::planner_errors::PlannerError;
use crate::target::Target;
use crate::time_series::TimeWindow;
use crate::vapp::Vapp;

/// One instrument, one mask, one target, one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    instrument: Instrument,
    vapp: Vapp,
    target: Target,
    time: Epoch,
    wavelength: Option<Micron>,
}

impl Observation {
    /// Compose an observation.
    ///
    /// Errors
    /// ----------
    /// * [`PlannerError::InvalidConfiguration`] if `vapp` is not one of the instrument's masks,
    ///   or if `wavelength` is given and not strictly positive.
    pub fn new(
        instrument: Instrument,
        vapp: Vapp,
        target: Target,
        time: Epoch,
        wavelength: Option<Micron>,
    ) -> Result<Self, PlannerError> {
        if !instrument.uses_mask(vapp.name()) {
            return Err(PlannerError::InvalidConfiguration(format!(
                "vAPP '{}' is not mounted on instrument '{}' (masks: {})",
                vapp.name(),
                instrument.name(),
                instrument.mask_names().iter().join(", ")
            )));
        }
        if let Some(w) = wavelength {
            if !(w > 0.0 && w.is_finite()) {
                return Err(PlannerError::InvalidConfiguration(format!(
                    "wavelength must be positive, got {w}"
                )));
            }
        }

        Ok(Observation {
            instrument,
            vapp,
            target,
            time,
            wavelength,
        })
    }

    /// The same observation at another instant.
    pub fn at(&self, time: Epoch) -> Observation {
        Observation {
            time,
            ..self.clone()
        }
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn vapp(&self) -> &Vapp {
        &self.vapp
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn time(&self) -> Epoch {
        self.time
    }

    pub fn wavelength(&self) -> Option<Micron> {
        self.wavelength
    }

    /// Sidereal time, hour angle and parallactic angle at the observation instant.
    pub fn sidereal_geometry(&self) -> Result<SiderealGeometry, PlannerError> {
        parallactic_angle(
            self.instrument.site()?,
            self.target.ra(),
            self.target.dec(),
            &self.time,
        )
    }

    /// Local apparent sidereal time in hours.
    pub fn sidereal_time(&self) -> Result<Hour, PlannerError> {
        Ok(self.sidereal_geometry()?.sidereal_time)
    }

    pub fn hour_angle(&self) -> Result<Degree, PlannerError> {
        Ok(self.sidereal_geometry()?.hour_angle)
    }

    pub fn parallactic_angle(&self) -> Result<Degree, PlannerError> {
        Ok(self.sidereal_geometry()?.parallactic_angle)
    }

    /// Companion position angle in the detector frame (not wrapped).
    pub fn detector_position_angle(&self) -> Result<Degree, PlannerError> {
        Ok(self.detector_angle_for(self.parallactic_angle()?))
    }

    fn detector_angle_for(&self, parallactic: Degree) -> Degree {
        detector_position_angle(
            self.target.position_angle(),
            self.instrument.derotator_offset(),
            self.instrument.manual_offset(),
            parallactic,
        )
    }

    /// Circles of radius separation / plate scale around both anchors.
    pub fn apertures(&self) -> Result<[ApertureCircle; 2], PlannerError> {
        let [a1, a2] = *self.vapp.anchors();
        let separation = self.target.separation();
        let scale = self.instrument.plate_scale();
        Ok([
            ApertureCircle::new(a1, separation, scale)?,
            ApertureCircle::new(a2, separation, scale)?,
        ])
    }

    /// Expected companion pixel position next to each PSF copy.
    pub fn companion_positions(&self) -> Result<[PixelPosition; 2], PlannerError> {
        let angle = self.detector_position_angle()?;
        let [c1, c2] = self.apertures()?;
        Ok([c1.point_at(angle), c2.point_at(angle)])
    }

    /// Follow the companion across every sample of `window`.
    pub fn track(&self, window: &TimeWindow) -> Result<Vec<TrackPoint>, PlannerError> {
        let site = *self.instrument.site()?;
        let [c1, c2] = self.apertures()?;

        window
            .samples()
            .enumerate()
            .map(|(index, time)| {
                let geometry =
                    parallactic_angle(&site, self.target.ra(), self.target.dec(), &time)?;
                let angle = self.detector_angle_for(geometry.parallactic_angle);
                Ok(TrackPoint {
                    index,
                    time,
                    sidereal_time: geometry.sidereal_time,
                    parallactic_angle: geometry.parallactic_angle,
                    detector_position_angle: angle,
                    positions: [c1.point_at(angle), c2.point_at(angle)],
                })
            })
            .collect()
    }
}

/// Companion geometry at one sample of a window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    pub index: usize,
    pub time: Epoch,
    pub sidereal_time: Hour,
    pub parallactic_angle: Degree,
    pub detector_position_angle: Degree,
    /// Projected companion next to anchor 1 and anchor 2.
    pub positions: [PixelPosition; 2],
}

impl TrackPoint {
    /// Legend label of the sample, e.g. `"3: 11:25"`.
    pub fn label(&self, format: TimeFormat) -> String {
        let time = match format {
            TimeFormat::Utc => {
                let (_, _, _, hour, minute, _, _) = self.time.to_gregorian_utc();
                format!("{hour:02}:{minute:02}")
            }
            TimeFormat::Lst => {
                let hours = self.sidereal_time.floor();
                let minutes = ((self.sidereal_time - hours) * 60.0).floor();
                format!("{}:{:02}", hours as u32, minutes as u32)
            }
        };
        format!("{}: {time}", self.index)
    }
}

/// Clock used to label track samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeFormat {
    #[default]
    Utc,
    Lst,
}

impl FromStr for TimeFormat {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UTC" => Ok(TimeFormat::Utc),
            "LST" => Ok(TimeFormat::Lst),
            _ => Err(PlannerError::InvalidConfiguration(format!(
                "Time format should be either 'UTC' or 'LST', got '{s}'"
            ))),
        }
    }
}

impl fmt::Display for TimeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeFormat::Utc => f.write_str("UTC"),
            TimeFormat::Lst => f.write_str("LST"),
        }
    }
}

//! # Fixed instrument profiles
//!
//! Three instruments were historically wired in with hard-coded site, plate scale,
//! rotation offset, PSF anchors and reference PSF image. They form a closed set:
//! [`LegacyInstrument`] enumerates it, [`LegacyProfile`] holds one record per member, and
//! parsing any other identifier is an [`PlannerError::InvalidConfiguration`].
//!
//! A profile is not a second kind of instrument. [`LegacyInstrument::instrument`] and
//! [`LegacyInstrument::vapp`] convert it into the regular [`Instrument`] and [`Vapp`]
//! entities used everywhere else.
//!
//! ```rust
//! use vapp_planner::legacy::LegacyInstrument;
//!
//! let charis: LegacyInstrument = "CHARIS".parse()?;
//! let (instrument, vapp) = charis.setup(0.0)?;
//! assert_eq!(instrument.plate_scale(), 0.015);
//! assert_eq!(vapp.anchors()[0].x, 62.0);
//! # Ok::<(), vapp_planner::planner_errors::PlannerError>(())
//! ```

use std::fmt;
use std::str::FromStr;

use nalgebra::Point2;

use crate::constants::{ArcSecPerPixel, Degree};
use crate::instrument::Instrument;
use crate::planner_errors::PlannerError;
use crate::sites::SiteLocation;
use crate::vapp::{Vapp, VappOptics};

/// The closed set of instruments with a fixed profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegacyInstrument {
    MagAO,
    Charis,
    Lbt,
}

/// Hard-coded parameters of one legacy instrument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegacyProfile {
    pub longitude: Degree,
    pub latitude: Degree,
    pub plate_scale: ArcSecPerPixel,
    pub rotation_offset: Degree,
    pub anchor_1: (f64, f64),
    pub anchor_2: (f64, f64),
    pub psf_model_path: &'static str,
}

const MAGAO: LegacyProfile = LegacyProfile {
    longitude: -70.6917,
    latitude: -29.015,
    plate_scale: 0.016,
    rotation_offset: 180. + 1.8,
    anchor_1: (110., 476.),
    anchor_2: (262., 160.),
    psf_model_path: "data/MagAO_model.npy",
};

const CHARIS: LegacyProfile = LegacyProfile {
    longitude: -155.476667,
    latitude: 19.825556,
    plate_scale: 0.015,
    rotation_offset: -113.,
    anchor_1: (62., 119.),
    anchor_2: (140., 84.),
    psf_model_path: "data/CHARIS_model.npy",
};

const LBT: LegacyProfile = LegacyProfile {
    longitude: -109.889064,
    latitude: 32.701308,
    plate_scale: 0.0107,
    rotation_offset: 0.,
    anchor_1: (140., 232.),
    anchor_2: (140., 48.),
    psf_model_path: "data/LBT_model.npy",
};

impl LegacyInstrument {
    pub const ALL: [LegacyInstrument; 3] = [
        LegacyInstrument::MagAO,
        LegacyInstrument::Charis,
        LegacyInstrument::Lbt,
    ];

    /// Canonical identifier, as the profile table spells it.
    pub fn identifier(&self) -> &'static str {
        match self {
            LegacyInstrument::MagAO => "MagAO",
            LegacyInstrument::Charis => "CHARIS",
            LegacyInstrument::Lbt => "LBT",
        }
    }

    pub fn profile(&self) -> &'static LegacyProfile {
        match self {
            LegacyInstrument::MagAO => &MAGAO,
            LegacyInstrument::Charis => &CHARIS,
            LegacyInstrument::Lbt => &LBT,
        }
    }

    /// Name of the single vAPP mask each legacy instrument carries.
    pub fn mask_name(&self) -> String {
        format!("{}_vAPP", self.identifier())
    }

    /// The profile as a regular [`Instrument`].
    ///
    /// Arguments
    /// ---------
    /// * `manual_offset`: extra rotation in degrees, added on top of the fixed offset
    pub fn instrument(&self, manual_offset: Degree) -> Result<Instrument, PlannerError> {
        let profile = self.profile();
        Instrument::new(
            self.identifier(),
            SiteLocation::new(profile.longitude, profile.latitude)?,
            [self.mask_name()],
            profile.plate_scale,
            profile.rotation_offset,
            manual_offset,
        )
    }

    /// The profile's mask, with its two anchors.
    pub fn vapp(&self) -> Result<Vapp, PlannerError> {
        let profile = self.profile();
        Vapp::new(
            self.mask_name(),
            VappOptics::default(),
            [
                Point2::new(profile.anchor_1.0, profile.anchor_1.1),
                Point2::new(profile.anchor_2.0, profile.anchor_2.1),
            ],
        )
    }

    /// Instrument and mask together, ready for an observation.
    pub fn setup(&self, manual_offset: Degree) -> Result<(Instrument, Vapp), PlannerError> {
        Ok((self.instrument(manual_offset)?, self.vapp()?))
    }
}

impl FromStr for LegacyInstrument {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LegacyInstrument::ALL
            .into_iter()
            .find(|i| i.identifier().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                PlannerError::InvalidConfiguration(format!(
                    "Instrument should be either 'MagAO', 'CHARIS', or 'LBT', got '{s}'"
                ))
            })
    }
}

impl fmt::Display for LegacyInstrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

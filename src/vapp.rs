use nalgebra::Point2;

use crate::constants::{Degree, Micron, PixelPosition};
use crate::planner_errors::PlannerError;

/// Spectral band a mask is designed for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavelengthRange {
    pub min: Micron,
    pub max: Micron,
}

impl WavelengthRange {
    pub fn new(min: Micron, max: Micron) -> Result<Self, PlannerError> {
        if !(min.is_finite() && max.is_finite() && 0.0 < min && min < max) {
            return Err(PlannerError::InvalidConfiguration(format!(
                "wavelength range must satisfy 0 < min < max, got [{min}, {max}]"
            )));
        }
        Ok(WavelengthRange { min, max })
    }

    pub fn contains(&self, wavelength: Micron) -> bool {
        (self.min..=self.max).contains(&wavelength)
    }
}

/// Optical description of a vAPP mask. Every field is optional.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VappOptics {
    pub pupil: Option<String>,
    pub phase_pattern: Option<String>,
    pub retardance: Option<f64>,
    pub wavelength_range: Option<WavelengthRange>,
    pub pattern_rotation: Option<Degree>,
}

/// A vector-apodizing phase plate coronagraph.
///
/// The mask splits the light into two PSF copies; `anchors` are their pixel positions on
/// the detector.
#[derive(Debug, Clone, PartialEq)]
pub struct Vapp {
    name: String,
    optics: VappOptics,
    anchors: [PixelPosition; 2],
}

impl Vapp {
    pub fn new(
        name: impl Into<String>,
        optics: VappOptics,
        anchors: [PixelPosition; 2],
    ) -> Result<Self, PlannerError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(PlannerError::InvalidConfiguration(
                "vAPP name cannot be empty".into(),
            ));
        }
        if anchors.iter().any(|a| !(a.x.is_finite() && a.y.is_finite())) {
            return Err(PlannerError::InvalidConfiguration(format!(
                "anchor positions of vAPP '{name}' must be finite"
            )));
        }
        Ok(Vapp {
            name,
            optics,
            anchors,
        })
    }

    /// Build a mask whose anchors come from the fixed per-mask table.
    ///
    /// Errors
    /// ----------
    /// * [`PlannerError::InvalidConfiguration`] if the mask type has no known anchors.
    pub fn with_known_anchors(
        name: impl Into<String>,
        optics: VappOptics,
    ) -> Result<Self, PlannerError> {
        let name = name.into();
        let anchors = known_anchors(&name).ok_or_else(|| {
            PlannerError::InvalidConfiguration(format!(
                "no anchor positions known for vAPP '{name}'"
            ))
        })?;
        Vapp::new(name, optics, anchors)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn optics(&self) -> &VappOptics {
        &self.optics
    }

    /// Pixel positions of the two PSF copies.
    pub fn anchors(&self) -> &[PixelPosition; 2] {
        &self.anchors
    }
}

// (mask aliases, anchor 1, anchor 2)
type AnchorEntry = (&'static [&'static str], (f64, f64), (f64, f64));

const KNOWN_ANCHORS: &[AnchorEntry] = &[
    (&["magao_vapp", "magao"], (110.0, 476.0), (262.0, 160.0)),
    (&["charis_vapp", "charis", "180"], (62.0, 119.0), (140.0, 84.0)),
    (&["lbt_vapp", "lbt", "lmircam_vapp"], (140.0, 232.0), (140.0, 48.0)),
];

/// Fixed anchor positions of the mask types the planner knows, looked up case-insensitively.
pub fn known_anchors(mask_name: &str) -> Option<[PixelPosition; 2]> {
    let key = mask_name.trim().to_lowercase();
    KNOWN_ANCHORS
        .iter()
        .find(|(aliases, _, _)| aliases.contains(&key.as_str()))
        .map(|(_, a1, a2)| [Point2::new(a1.0, a1.1), Point2::new(a2.0, a2.1)])
}

#[cfg(test)]
mod vapp_test {
    use super::*;

    #[test]
    fn test_known_anchors() {
        let anchors = known_anchors("MagAO_vAPP").unwrap();
        assert_eq!(anchors[0], Point2::new(110.0, 476.0));
        assert_eq!(anchors[1], Point2::new(262.0, 160.0));
        assert_eq!(
            known_anchors("180").unwrap(),
            known_anchors("CHARIS_vAPP").unwrap()
        );
        assert!(known_anchors("unknown").is_none());
    }

    #[test]
    fn test_with_known_anchors() {
        let vapp = Vapp::with_known_anchors("180", VappOptics::default()).unwrap();
        assert_eq!(vapp.name(), "180");
        assert_eq!(vapp.anchors()[1], Point2::new(140.0, 84.0));

        assert!(matches!(
            Vapp::with_known_anchors("prototype", VappOptics::default()),
            Err(PlannerError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_wavelength_range() {
        let band = WavelengthRange::new(2.0, 2.4).unwrap();
        assert!(band.contains(2.2));
        assert!(!band.contains(3.9));
        assert!(WavelengthRange::new(2.4, 2.0).is_err());
        assert!(WavelengthRange::new(0.0, 2.0).is_err());
    }

    #[test]
    fn test_invalid_vapp() {
        let anchors = [Point2::new(0.0, 0.0), Point2::new(f64::NAN, 1.0)];
        assert!(Vapp::new("broken", VappOptics::default(), anchors).is_err());
        let anchors = [Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)];
        assert!(Vapp::new("", VappOptics::default(), anchors).is_err());
    }
}

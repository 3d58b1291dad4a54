use crate::constants::{ArcSecPerPixel, Degree};
use crate::planner_errors::PlannerError;
use crate::sites::{Location, SiteLocation, SiteRegistry};

/// A camera behind a vAPP-equipped telescope.
///
/// # Fields
///
/// * `name` - identifier, also the library key once lowercased
/// * `location` - observing site, possibly unresolved
/// * `mask_names` - vAPP masks usable with this instrument, unique and in insertion order
/// * `plate_scale` - arcseconds per pixel, strictly positive
/// * `derotator_offset` - fixed rotation bias of the optical train, degrees
/// * `manual_offset` - additional user-supplied rotation, degrees
#[derive(Debug, Clone, PartialEq)]
pub struct Instrument {
    name: String,
    location: Location,
    mask_names: Vec<String>,
    plate_scale: ArcSecPerPixel,
    derotator_offset: Degree,
    manual_offset: Degree,
}

impl Instrument {
    /// Create an instrument with every field supplied.
    ///
    /// Mask names are deduplicated case-insensitively, keeping the first spelling.
    ///
    /// Errors
    /// ----------
    /// * [`PlannerError::InvalidConfiguration`] for a blank name, a blank mask name, a
    ///   non-positive plate scale or a non-finite offset.
    pub fn new(
        name: impl Into<String>,
        location: impl Into<Location>,
        mask_names: impl IntoIterator<Item = impl Into<String>>,
        plate_scale: ArcSecPerPixel,
        derotator_offset: Degree,
        manual_offset: Degree,
    ) -> Result<Self, PlannerError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(PlannerError::InvalidConfiguration(
                "instrument name cannot be empty".into(),
            ));
        }
        if !(plate_scale > 0.0 && plate_scale.is_finite()) {
            return Err(PlannerError::InvalidConfiguration(format!(
                "plate scale of '{name}' must be positive, got {plate_scale}"
            )));
        }
        if !(derotator_offset.is_finite() && manual_offset.is_finite()) {
            return Err(PlannerError::InvalidConfiguration(format!(
                "rotation offsets of '{name}' must be finite"
            )));
        }

        let mut unique: Vec<String> = Vec::new();
        for mask in mask_names {
            let mask = mask.into();
            if mask.trim().is_empty() {
                return Err(PlannerError::InvalidConfiguration(format!(
                    "instrument '{name}' lists an empty vAPP name"
                )));
            }
            if !unique.iter().any(|m| m.eq_ignore_ascii_case(&mask)) {
                unique.push(mask);
            }
        }

        Ok(Instrument {
            name,
            location: location.into(),
            mask_names: unique,
            plate_scale,
            derotator_offset,
            manual_offset,
        })
    }

    /// Create an instrument whose location is given as an observatory name.
    ///
    /// The name goes through `registry`; when it cannot be resolved it is kept verbatim and
    /// the instrument is still built (see [`Location::resolve`]).
    pub fn at_site(
        name: impl Into<String>,
        site_name: &str,
        registry: &dyn SiteRegistry,
        mask_names: impl IntoIterator<Item = impl Into<String>>,
        plate_scale: ArcSecPerPixel,
        derotator_offset: Degree,
        manual_offset: Degree,
    ) -> Result<Self, PlannerError> {
        Instrument::new(
            name,
            Location::resolve(registry, site_name),
            mask_names,
            plate_scale,
            derotator_offset,
            manual_offset,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// The resolved site, or [`PlannerError::NotFound`] if the location is unresolved.
    pub fn site(&self) -> Result<&SiteLocation, PlannerError> {
        self.location.site()
    }

    pub fn mask_names(&self) -> &[String] {
        &self.mask_names
    }

    /// Whether `mask` is one of this instrument's vAPPs (case-insensitive).
    pub fn uses_mask(&self, mask: &str) -> bool {
        self.mask_names.iter().any(|m| m.eq_ignore_ascii_case(mask))
    }

    pub fn plate_scale(&self) -> ArcSecPerPixel {
        self.plate_scale
    }

    pub fn derotator_offset(&self) -> Degree {
        self.derotator_offset
    }

    pub fn manual_offset(&self) -> Degree {
        self.manual_offset
    }
}

//! # Observing sites
//!
//! Geographic site locations and the site-database collaborator used to turn an
//! observatory name into a longitude/latitude pair.
//!
//! - [`SiteLocation`](crate::sites::SiteLocation) – NaN-free geodetic longitude/latitude in degrees.
//! - [`Location`](crate::sites::Location) – what an instrument actually stores: either a resolved
//!   site or the literal text a lookup could not resolve.
//! - [`SiteRegistry`](crate::sites::SiteRegistry) – the lookup seam; [`KnownSites`](crate::sites::KnownSites)
//!   is the built-in table.
//!
//! An unresolved location is kept as data so the instrument definition survives, but every
//! geometric query on it fails with [`PlannerError::NotFound`] instead of falling back to an
//! arbitrary site.

use log::warn;
use ordered_float::NotNan;

use crate::constants::Degree;
use crate::planner_errors::{LookupKind, PlannerError};

/// Geodetic position of an observing site.
///
/// Units
/// -----
/// * `longitude`: degrees, east positive, any finite value.
/// * `latitude`: degrees in `[-90, 90]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SiteLocation {
    longitude: NotNan<f64>,
    latitude: NotNan<f64>,
}

impl SiteLocation {
    /// Build a site from geodetic coordinates in degrees.
    ///
    /// Errors
    /// ----------
    /// * [`PlannerError::NaNValue`] if either coordinate is NaN.
    /// * [`PlannerError::InvalidConfiguration`] if the latitude is outside `[-90, 90]`
    ///   or the longitude is infinite.
    pub fn new(longitude: Degree, latitude: Degree) -> Result<Self, PlannerError> {
        let longitude = NotNan::new(longitude)?;
        let latitude = NotNan::new(latitude)?;

        if !longitude.is_finite() {
            return Err(PlannerError::InvalidConfiguration(format!(
                "site longitude must be finite, got {longitude}"
            )));
        }
        if latitude.abs() > 90.0 {
            return Err(PlannerError::InvalidConfiguration(format!(
                "site latitude must lie in [-90, 90], got {latitude}"
            )));
        }

        Ok(SiteLocation {
            longitude,
            latitude,
        })
    }

    pub fn longitude(&self) -> Degree {
        self.longitude.into_inner()
    }

    pub fn latitude(&self) -> Degree {
        self.latitude.into_inner()
    }
}

/// Where an instrument sits.
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    /// A resolved geodetic position.
    Geodetic(SiteLocation),
    /// Site text that the registry could not resolve, kept verbatim.
    Unresolved(String),
}

impl Location {
    /// Resolve a site name through `registry`.
    ///
    /// A failed lookup is not an error here: the raw text is retained as
    /// [`Location::Unresolved`] and the failure surfaces later, when a geometric
    /// quantity is requested through [`Location::site`].
    pub fn resolve(registry: &dyn SiteRegistry, name: &str) -> Location {
        match registry.site(name) {
            Ok(site) => Location::Geodetic(site),
            Err(err) => {
                warn!("Keeping '{name}' as an unresolved location: {err}");
                Location::Unresolved(name.to_string())
            }
        }
    }

    /// The resolved site.
    ///
    /// Errors
    /// ----------
    /// * [`PlannerError::NotFound`] with kind `site` for an unresolved location.
    pub fn site(&self) -> Result<&SiteLocation, PlannerError> {
        match self {
            Location::Geodetic(site) => Ok(site),
            Location::Unresolved(name) => Err(PlannerError::not_found(LookupKind::Site, name)),
        }
    }
}

impl From<SiteLocation> for Location {
    fn from(site: SiteLocation) -> Self {
        Location::Geodetic(site)
    }
}

/// Observatory-name → site lookup.
pub trait SiteRegistry {
    /// Look up a site by name, case-insensitively.
    fn site(&self, name: &str) -> Result<SiteLocation, PlannerError>;
}

struct KnownSite {
    aliases: &'static [&'static str],
    longitude: Degree,
    latitude: Degree,
}

const KNOWN_SITES: &[KnownSite] = &[
    KnownSite {
        aliases: &["las campanas observatory", "lco", "magellan"],
        longitude: -70.6917,
        latitude: -29.015,
    },
    KnownSite {
        aliases: &["subaru", "subaru telescope", "maunakea", "mauna kea"],
        longitude: -155.476667,
        latitude: 19.825556,
    },
    KnownSite {
        aliases: &["lbt", "large binocular telescope", "mount graham"],
        longitude: -109.889064,
        latitude: 32.701308,
    },
    KnownSite {
        aliases: &["paranal", "paranal observatory", "vlt"],
        longitude: -70.404983,
        latitude: -24.627439,
    },
    KnownSite {
        aliases: &["keck", "w. m. keck observatory", "keck observatory"],
        longitude: -155.478333,
        latitude: 19.828333,
    },
    KnownSite {
        aliases: &["gemini south", "gemini_south", "cerro pachon"],
        longitude: -70.736693,
        latitude: -30.240750,
    },
];

/// Built-in table of the observatories the planner ships with.
#[derive(Debug, Clone, Copy, Default)]
pub struct KnownSites;

impl KnownSites {
    /// Every alias the table answers to, lowercase.
    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        KNOWN_SITES.iter().flat_map(|s| s.aliases.iter().copied())
    }
}

impl SiteRegistry for KnownSites {
    fn site(&self, name: &str) -> Result<SiteLocation, PlannerError> {
        let key = name.trim().to_lowercase();
        let known = KNOWN_SITES
            .iter()
            .find(|s| s.aliases.contains(&key.as_str()))
            .ok_or_else(|| PlannerError::not_found(LookupKind::Site, name))?;
        SiteLocation::new(known.longitude, known.latitude)
    }
}

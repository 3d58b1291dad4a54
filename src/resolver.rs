//! # Celestial name resolution
//!
//! Turning an object name such as `"PDS 70"` into a sky position is delegated to an
//! astronomical database. The planner only consumes it through the [`NameResolver`] trait:
//!
//! - [`SesameResolver`] queries the CDS Sesame service (SIMBAD, NED, VizieR) over HTTP and
//!   reads the `%J` line of its plain-text answer (J2000 right ascension and declination in
//!   decimal degrees).
//! - [`CatalogResolver`] answers from an in-memory table, for offline use and tests.
//!
//! A name the database does not know is reported as [`PlannerError::NotFound`] with kind
//! `celestial object`; transport failures keep their own error variant so the caller can
//! decide whether a retry makes sense.

use std::collections::HashMap;
use std::time::Duration;

use log::info;
use ureq::Agent;

use crate::planner_errors::{LookupKind, PlannerError};
use crate::target::{Frame, SkyCoord};

/// Default CDS Sesame endpoint, plain-text output from all services.
pub const SESAME_URL: &str = "https://cds.unistra.fr/cgi-bin/nph-sesame/-oI/A";

/// Object name → sky position.
pub trait NameResolver {
    fn resolve(&self, name: &str) -> Result<SkyCoord, PlannerError>;
}

/// HTTP client for the CDS Sesame name resolver.
#[derive(Debug, Clone)]
pub struct SesameResolver {
    http_client: Agent,
    base_url: String,
}

impl SesameResolver {
    /// Resolver against `base_url` with a global request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        let agent: Agent = config.into();

        SesameResolver {
            http_client: agent,
            base_url: base_url.into(),
        }
    }

    fn query_url(&self, name: &str) -> String {
        format!("{}?{}", self.base_url, urlencoding::encode(name.trim()))
    }
}

impl Default for SesameResolver {
    fn default() -> Self {
        SesameResolver::new(SESAME_URL, Duration::from_secs(10))
    }
}

impl NameResolver for SesameResolver {
    fn resolve(&self, name: &str) -> Result<SkyCoord, PlannerError> {
        let url = self.query_url(name);
        info!("Resolving '{name}' with {url}");

        let body = self
            .http_client
            .get(url.as_str())
            .call()?
            .body_mut()
            .read_to_string()?;

        parse_sesame_response(name, &body)
    }
}

/// Extract the J2000 position from a Sesame plain-text answer.
///
/// The position line looks like `%J 212.04213 -41.39803 = 14:08:10.11 -41:23:52.9`.
fn parse_sesame_response(name: &str, body: &str) -> Result<SkyCoord, PlannerError> {
    let line = body
        .lines()
        .find_map(|l| l.trim_start().strip_prefix("%J "))
        .ok_or_else(|| PlannerError::not_found(LookupKind::CelestialObject, name))?;

    let mut fields = line.split_whitespace();
    let mut next_number = || -> Result<f64, PlannerError> {
        fields
            .next()
            .and_then(|f| f.parse().ok())
            .ok_or_else(|| {
                PlannerError::InvalidConfiguration(format!(
                    "malformed position line for '{name}': {line}"
                ))
            })
    };
    let ra = next_number()?;
    let dec = next_number()?;

    Ok(SkyCoord::new(ra, dec)?.with_frame(Frame::Icrs))
}

/// Fixed table of known objects, matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct CatalogResolver {
    entries: HashMap<String, SkyCoord>,
}

impl CatalogResolver {
    pub fn from_entries<N: AsRef<str>>(entries: impl IntoIterator<Item = (N, SkyCoord)>) -> Self {
        CatalogResolver {
            entries: entries
                .into_iter()
                .map(|(name, coords)| (name.as_ref().trim().to_lowercase(), coords))
                .collect(),
        }
    }

    pub fn insert(&mut self, name: &str, coords: SkyCoord) {
        self.entries.insert(name.trim().to_lowercase(), coords);
    }
}

impl NameResolver for CatalogResolver {
    fn resolve(&self, name: &str) -> Result<SkyCoord, PlannerError> {
        self.entries
            .get(&name.trim().to_lowercase())
            .copied()
            .ok_or_else(|| PlannerError::not_found(LookupKind::CelestialObject, name))
    }
}

#[cfg(test)]
mod resolver_test {
    use super::*;

    const PDS70_ANSWER: &str = "# PDS 70\t#Q22870421\n\
        #=Sc=Simbad (via url):    1\n\
        %@ 3\n\
        %I.0 PDS 70\n\
        %C.0 TT*\n\
        %J 212.04213 -41.39803 = 14:08:10.11 -41:23:52.9\n\
        %J.E [0.02 0.02 90] A 2020yCat.1350....0G\n";

    #[test]
    fn test_parse_sesame_position() {
        let coords = parse_sesame_response("PDS 70", PDS70_ANSWER).unwrap();
        assert_eq!(coords.ra(), 212.04213);
        assert_eq!(coords.dec(), -41.39803);
        assert_eq!(coords.frame(), Frame::Icrs);
    }

    #[test]
    fn test_parse_sesame_unknown_object() {
        let answer = "# NoSuchStar\t#Q22870422\n#! *** Nothing found *** \n";
        let err = parse_sesame_response("NoSuchStar", answer).unwrap_err();
        assert_eq!(
            err,
            PlannerError::NotFound {
                kind: LookupKind::CelestialObject,
                name: "NoSuchStar".into()
            }
        );
    }

    #[test]
    fn test_parse_sesame_malformed_position() {
        let answer = "%J abc -41.39803\n";
        assert!(matches!(
            parse_sesame_response("PDS 70", answer),
            Err(PlannerError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_query_url_is_encoded() {
        let resolver = SesameResolver::new("http://localhost/sesame", Duration::from_secs(1));
        assert_eq!(
            resolver.query_url(" Theta 1 Ori B "),
            "http://localhost/sesame?Theta%201%20Ori%20B"
        );
        assert_eq!(
            resolver.query_url("BD+20 307"),
            "http://localhost/sesame?BD%2B20%20307"
        );
    }

    #[test]
    fn test_catalog_resolver_is_case_insensitive() {
        let mut resolver = CatalogResolver::default();
        resolver.insert("HD 206893", SkyCoord::new(326.3417, -12.7834).unwrap());
        assert_eq!(resolver.resolve("hd 206893").unwrap().ra(), 326.3417);
        assert!(resolver.resolve("HD 1").is_err());
    }
}

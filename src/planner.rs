//! # Planner
//!
//! [`Planner`] is the entry point tying the pieces together:
//!
//! ```text
//! Planner
//! ├── config    (PlannerConfig)
//! ├── store     (LibraryStore: targets / instruments / vapps)
//! └── resolver  (NameResolver, Sesame by default)
//! ```
//!
//! Entities are loaded by name from the library, and [`Planner::observation`] composes
//! an instrument, one of its masks and a target at a given time into an [`Observation`].
//!
//! ```rust,no_run
//! use vapp_planner::planner::Planner;
//! use vapp_planner::time::parse_instant;
//!
//! let planner = Planner::from_env()?;
//! let obs = planner.observation("CHARIS", "180", "HR 8799", parse_instant("2019-05-17T10:40")?)?;
//! println!("{:?}", obs.companion_positions()?);
//! # Ok::<(), vapp_planner::planner_errors::PlannerError>(())
//! ```

use hifitime::Epoch;
use log::info;

use crate::config::PlannerConfig;
use crate::constants::{ArcSec, Degree};
use crate::instrument::Instrument;
use crate::library::LibraryStore;
use crate::observation::Observation;
use crate::planner_errors::PlannerError;
use crate::resolver::{NameResolver, SesameResolver};
use crate::target::Target;
use crate::vapp::Vapp;

pub struct Planner {
    config: PlannerConfig,
    store: LibraryStore,
    resolver: Box<dyn NameResolver + Send + Sync>,
}

impl Planner {
    /// Planner over the configured library, resolving names through CDS Sesame.
    pub fn new(config: PlannerConfig) -> Self {
        let resolver = SesameResolver::new(config.sesame_url.clone(), config.http_timeout);
        Planner {
            store: LibraryStore::new(config.library_root.clone()),
            config,
            resolver: Box::new(resolver),
        }
    }

    /// Planner configured from the environment, see [`PlannerConfig::from_env`].
    pub fn from_env() -> Result<Self, PlannerError> {
        Ok(Planner::new(PlannerConfig::from_env()?))
    }

    /// Replace the celestial name resolver.
    pub fn with_resolver(mut self, resolver: impl NameResolver + Send + Sync + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Replace the library store, e.g. to use another site registry.
    pub fn with_store(mut self, store: LibraryStore) -> Self {
        self.store = store;
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn store(&self) -> &LibraryStore {
        &self.store
    }

    pub fn target(&self, name: &str) -> Result<Target, PlannerError> {
        self.store.load_target(name)
    }

    pub fn instrument(&self, name: &str) -> Result<Instrument, PlannerError> {
        self.store.load_instrument(name)
    }

    pub fn vapp(&self, name: &str) -> Result<Vapp, PlannerError> {
        self.store.load_vapp(name)
    }

    /// Every mask the instrument lists, loaded from the library.
    pub fn masks_for(&self, instrument: &Instrument) -> Result<Vec<Vapp>, PlannerError> {
        self.store.load_masks(instrument)
    }

    pub fn save_target(&self, target: &Target) -> Result<(), PlannerError> {
        self.store.save(target).map(|_| ())
    }

    pub fn save_instrument(&self, instrument: &Instrument) -> Result<(), PlannerError> {
        self.store.save(instrument).map(|_| ())
    }

    pub fn save_vapp(&self, vapp: &Vapp) -> Result<(), PlannerError> {
        self.store.save(vapp).map(|_| ())
    }

    /// Build a target whose position comes from the name resolver, and store it.
    ///
    /// Arguments
    /// ---------
    /// * `name`: object name understood by the resolver, also the library key
    /// * `position_angle`: companion bearing on sky, degrees east of north
    /// * `separation`: companion distance in arcseconds
    /// * `delta_mag`: optional contrast in magnitudes
    pub fn resolve_target(
        &self,
        name: &str,
        position_angle: Degree,
        separation: ArcSec,
        delta_mag: Option<f64>,
    ) -> Result<Target, PlannerError> {
        let target = Target::from_resolver(
            name,
            self.resolver.as_ref(),
            position_angle,
            separation,
            delta_mag,
        )?;
        self.save_target(&target)?;
        info!(
            "Resolved '{name}' at ra={:.6}, dec={:.6}",
            target.ra(),
            target.dec()
        );
        Ok(target)
    }

    /// Compose an observation from library entries.
    ///
    /// Return
    /// ----------
    /// * the observation, or the first lookup / composition error encountered
    pub fn observation(
        &self,
        instrument: &str,
        vapp: &str,
        target: &str,
        time: Epoch,
    ) -> Result<Observation, PlannerError> {
        let instrument = self.instrument(instrument)?;
        let vapp = self.vapp(vapp)?;
        let target = self.target(target)?;
        Observation::new(instrument, vapp, target, time, None)
    }
}

#[cfg(test)]
mod planner_test {
    use super::*;
    use crate::planner_errors::LookupKind;
    use crate::resolver::CatalogResolver;
    use crate::sites::SiteLocation;
    use crate::target::SkyCoord;
    use crate::vapp::VappOptics;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    fn planner() -> (TempDir, Planner) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let catalog = CatalogResolver::from_entries([(
            "HR 8799",
            SkyCoord::from_sexagesimal("23 07 28.7157", "+21 08 03.302").unwrap(),
        )]);
        let planner = Planner::new(PlannerConfig::with_library_root(root)).with_resolver(catalog);
        (dir, planner)
    }

    fn charis() -> Instrument {
        let site = SiteLocation::new(-155.476667, 19.825556).unwrap();
        Instrument::new("CHARIS", site, ["180"], 0.015, -113.0, 0.0).unwrap()
    }

    #[test]
    fn test_observation_from_library() {
        let (_dir, planner) = planner();
        planner.save_instrument(&charis()).unwrap();
        planner
            .save_vapp(&Vapp::with_known_anchors("180", VappOptics::default()).unwrap())
            .unwrap();
        planner.resolve_target("HR 8799", 45.0, 1.7, Some(11.0)).unwrap();

        let time = crate::time::parse_instant("2019-05-17T10:40").unwrap();
        let obs = planner.observation("charis", "180", "hr 8799", time).unwrap();
        assert_eq!(obs.target().separation(), 1.7);
        assert_eq!(planner.masks_for(obs.instrument()).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_pieces() {
        let (_dir, planner) = planner();
        planner.save_instrument(&charis()).unwrap();

        let time = crate::time::parse_instant("2019-05-17T10:40").unwrap();
        let err = planner.observation("CHARIS", "180", "HR 8799", time).unwrap_err();
        assert_eq!(
            err,
            PlannerError::NotFound {
                kind: LookupKind::Vapp,
                name: "180".into()
            }
        );

        let err = planner.resolve_target("Vega", 0.0, 1.0, None).unwrap_err();
        assert!(matches!(
            err,
            PlannerError::NotFound {
                kind: LookupKind::CelestialObject,
                ..
            }
        ));
        assert!(planner.target("vega").is_err());
    }
}

//! # Library store
//!
//! Name-keyed persistence for reusable [`Target`], [`Instrument`] and [`Vapp`] definitions.
//!
//! ## Layout
//!
//! One pretty-printed JSON record per entity:
//!
//! ```text
//! <root>/
//! ├── targets/<lowercase-name>.json
//! ├── instruments/<lowercase-name>.json
//! └── vapps/<lowercase-name>.json
//! ```
//!
//! ## Record shapes
//!
//! ```text
//! target     { version, name, sky_coords { frame, ra, dec }, position_angle, separation, delta_mag }
//! instrument { version, name, location { lon, lat } | "site name", vAPPs, plate_scale,
//!              derotator_offset, manual_offset }
//! vapp       { version, name, pupil, phase_pattern, retardance, wavelength_range,
//!              pattern_rotation, anchors }
//! ```
//!
//! `version` defaults to 1 when absent. A string `location` is resolved through the store's
//! [`SiteRegistry`] on load. A vAPP record without `anchors` takes the fixed anchors of its
//! mask type.
//!
//! ## Semantics
//!
//! - Lookups lowercase the requested name, so `"PDS70"`, `"pds70"` and `"pdS70"` hit the same
//!   record.
//! - A missing record is [`PlannerError::NotFound`]; a record that does not parse or whose
//!   values break an entity invariant is [`PlannerError::Corrupt`].
//! - Saving replaces the record atomically (temporary file + rename). Last write wins; there
//!   is no locking between concurrent writers.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use nalgebra::Point2;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::constants::{ArcSec, ArcSecPerPixel, Degree};
use crate::instrument::Instrument;
use crate::planner_errors::PlannerError;
use crate::sites::{KnownSites, Location, SiteLocation, SiteRegistry};
use crate::target::{Frame, SkyCoord, Target};
use crate::vapp::{known_anchors, Vapp, VappOptics, WavelengthRange};

/// Newest record layout this crate writes and understands.
pub const RECORD_VERSION: u32 = 1;

const RECORD_EXTENSION: &str = "json";

fn default_version() -> u32 {
    RECORD_VERSION
}

/// The entity families the library stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Target,
    Instrument,
    Vapp,
}

impl RecordKind {
    /// Directory holding the records of this kind.
    pub fn namespace(&self) -> &'static str {
        match self {
            RecordKind::Target => "targets",
            RecordKind::Instrument => "instruments",
            RecordKind::Vapp => "vapps",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RecordKind::Target => "target",
            RecordKind::Instrument => "instrument",
            RecordKind::Vapp => "vAPP",
        };
        f.write_str(label)
    }
}

/// An entity that can round-trip through a library record.
pub trait LibraryEntity: Sized {
    const KIND: RecordKind;
    type Record: Serialize + DeserializeOwned;

    fn name(&self) -> &str;
    fn to_record(&self) -> Self::Record;
    fn from_record(record: Self::Record, sites: &dyn SiteRegistry) -> Result<Self, PlannerError>;
}

// -------------------------------------------------------------------------------------------------
// Records
// -------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkyCoordsRecord {
    #[serde(default)]
    pub frame: Frame,
    pub ra: Degree,
    pub dec: Degree,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetRecord {
    #[serde(default = "default_version")]
    pub version: u32,
    pub name: String,
    pub sky_coords: SkyCoordsRecord,
    pub position_angle: Degree,
    pub separation: ArcSec,
    pub delta_mag: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocationRecord {
    Geodetic { lon: Degree, lat: Degree },
    Named(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentRecord {
    #[serde(default = "default_version")]
    pub version: u32,
    pub name: String,
    pub location: LocationRecord,
    #[serde(rename = "vAPPs")]
    pub vapps: Vec<String>,
    pub plate_scale: ArcSecPerPixel,
    pub derotator_offset: Degree,
    pub manual_offset: Degree,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VappRecord {
    #[serde(default = "default_version")]
    pub version: u32,
    pub name: String,
    pub pupil: Option<String>,
    pub phase_pattern: Option<String>,
    pub retardance: Option<f64>,
    pub wavelength_range: Option<[f64; 2]>,
    pub pattern_rotation: Option<Degree>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchors: Option<[[f64; 2]; 2]>,
}

impl LibraryEntity for Target {
    const KIND: RecordKind = RecordKind::Target;
    type Record = TargetRecord;

    fn name(&self) -> &str {
        Target::name(self)
    }

    fn to_record(&self) -> TargetRecord {
        let coords = self.sky_coords();
        TargetRecord {
            version: RECORD_VERSION,
            name: self.name().to_string(),
            sky_coords: SkyCoordsRecord {
                frame: coords.frame(),
                ra: coords.ra(),
                dec: coords.dec(),
            },
            position_angle: self.position_angle(),
            separation: self.separation(),
            delta_mag: self.delta_mag(),
        }
    }

    fn from_record(record: TargetRecord, _sites: &dyn SiteRegistry) -> Result<Self, PlannerError> {
        let coords = SkyCoord::new(record.sky_coords.ra, record.sky_coords.dec)?
            .with_frame(record.sky_coords.frame);
        Target::new(
            record.name,
            coords,
            record.position_angle,
            record.separation,
            record.delta_mag,
        )
    }
}

impl LibraryEntity for Instrument {
    const KIND: RecordKind = RecordKind::Instrument;
    type Record = InstrumentRecord;

    fn name(&self) -> &str {
        Instrument::name(self)
    }

    fn to_record(&self) -> InstrumentRecord {
        let location = match self.location() {
            Location::Geodetic(site) => LocationRecord::Geodetic {
                lon: site.longitude(),
                lat: site.latitude(),
            },
            Location::Unresolved(text) => LocationRecord::Named(text.clone()),
        };
        InstrumentRecord {
            version: RECORD_VERSION,
            name: self.name().to_string(),
            location,
            vapps: self.mask_names().to_vec(),
            plate_scale: self.plate_scale(),
            derotator_offset: self.derotator_offset(),
            manual_offset: self.manual_offset(),
        }
    }

    fn from_record(
        record: InstrumentRecord,
        sites: &dyn SiteRegistry,
    ) -> Result<Self, PlannerError> {
        let location = match record.location {
            LocationRecord::Geodetic { lon, lat } => Location::Geodetic(SiteLocation::new(lon, lat)?),
            LocationRecord::Named(text) => Location::resolve(sites, &text),
        };
        Instrument::new(
            record.name,
            location,
            record.vapps,
            record.plate_scale,
            record.derotator_offset,
            record.manual_offset,
        )
    }
}

impl LibraryEntity for Vapp {
    const KIND: RecordKind = RecordKind::Vapp;
    type Record = VappRecord;

    fn name(&self) -> &str {
        Vapp::name(self)
    }

    fn to_record(&self) -> VappRecord {
        let optics = self.optics();
        let [a1, a2] = self.anchors();
        VappRecord {
            version: RECORD_VERSION,
            name: self.name().to_string(),
            pupil: optics.pupil.clone(),
            phase_pattern: optics.phase_pattern.clone(),
            retardance: optics.retardance,
            wavelength_range: optics.wavelength_range.map(|r| [r.min, r.max]),
            pattern_rotation: optics.pattern_rotation,
            anchors: Some([[a1.x, a1.y], [a2.x, a2.y]]),
        }
    }

    fn from_record(record: VappRecord, _sites: &dyn SiteRegistry) -> Result<Self, PlannerError> {
        let optics = VappOptics {
            pupil: record.pupil,
            phase_pattern: record.phase_pattern,
            retardance: record.retardance,
            wavelength_range: record
                .wavelength_range
                .map(|[min, max]| WavelengthRange::new(min, max))
                .transpose()?,
            pattern_rotation: record.pattern_rotation,
        };
        let anchors = match record.anchors {
            Some([a1, a2]) => [Point2::new(a1[0], a1[1]), Point2::new(a2[0], a2[1])],
            None => known_anchors(&record.name).ok_or_else(|| {
                PlannerError::InvalidConfiguration(
                    "no anchors in the record and none known for this mask type".into(),
                )
            })?,
        };
        Vapp::new(record.name, optics, anchors)
    }
}

// -------------------------------------------------------------------------------------------------
// Store
// -------------------------------------------------------------------------------------------------

/// Directory-backed library of named entities.
#[derive(Clone)]
pub struct LibraryStore {
    root: Utf8PathBuf,
    sites: Arc<dyn SiteRegistry + Send + Sync>,
}

impl fmt::Debug for LibraryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibraryStore")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl LibraryStore {
    /// Store rooted at `root`, resolving site names with the built-in [`KnownSites`].
    ///
    /// The directory is created lazily on the first save.
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        LibraryStore::with_sites(root, Arc::new(KnownSites))
    }

    pub fn with_sites(
        root: impl Into<Utf8PathBuf>,
        sites: Arc<dyn SiteRegistry + Send + Sync>,
    ) -> Self {
        LibraryStore {
            root: root.into(),
            sites,
        }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn sites(&self) -> &dyn SiteRegistry {
        self.sites.as_ref()
    }

    /// Path of the record for `name` of the given kind.
    ///
    /// Errors
    /// ----------
    /// * [`PlannerError::InvalidConfiguration`] if the name is blank or would escape the
    ///   kind's directory.
    pub fn record_path(&self, kind: RecordKind, name: &str) -> Result<Utf8PathBuf, PlannerError> {
        let key = record_key(name)?;
        Ok(self
            .root
            .join(kind.namespace())
            .join(format!("{key}.{RECORD_EXTENSION}")))
    }

    /// Load an entity by name, case-insensitively.
    ///
    /// Return
    /// ----------
    /// * the entity, [`PlannerError::NotFound`] when no record exists, or
    ///   [`PlannerError::Corrupt`] when the record cannot be turned into the entity
    pub fn load<E: LibraryEntity>(&self, name: &str) -> Result<E, PlannerError> {
        let path = self.record_path(E::KIND, name)?;
        debug!("Loading {} '{name}' from {path}", E::KIND);

        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(PlannerError::not_found(E::KIND, name));
            }
            Err(err) => return Err(err.into()),
        };

        let corrupt = |reason: String| PlannerError::Corrupt {
            kind: E::KIND,
            name: name.to_string(),
            reason,
        };

        let version = serde_json::from_str::<RecordHeader>(&text)
            .map_err(|err| corrupt(err.to_string()))?
            .version;
        if version > RECORD_VERSION {
            return Err(corrupt(format!(
                "record version {version} is newer than supported version {RECORD_VERSION}"
            )));
        }

        let record: E::Record =
            serde_json::from_str(&text).map_err(|err| corrupt(err.to_string()))?;
        let entity =
            E::from_record(record, self.sites()).map_err(|err| corrupt(err.to_string()))?;

        let stored_key = record_key(entity.name()).map_err(|err| corrupt(err.to_string()))?;
        if stored_key != record_key(name)? {
            return Err(corrupt(format!(
                "record is named '{}', which does not match its file",
                entity.name()
            )));
        }
        Ok(entity)
    }

    /// Write an entity under its lowercased name, replacing any previous record.
    ///
    /// Return
    /// ----------
    /// * the path written
    pub fn save<E: LibraryEntity>(&self, entity: &E) -> Result<Utf8PathBuf, PlannerError> {
        let path = self.record_path(E::KIND, entity.name())?;
        let dir = self.root.join(E::KIND.namespace());
        fs::create_dir_all(&dir)?;

        let mut json = serde_json::to_string_pretty(&entity.to_record())?;
        json.push('\n');

        let tmp = path.with_extension(format!("{RECORD_EXTENSION}.tmp"));
        if let Err(err) = fs::write(&tmp, json).and_then(|()| fs::rename(&tmp, &path)) {
            let _ = fs::remove_file(&tmp);
            return Err(err.into());
        }

        debug!("Saved {} '{}' to {path}", E::KIND, entity.name());
        Ok(path)
    }

    /// Whether a record of this kind exists for `name`.
    pub fn contains(&self, kind: RecordKind, name: &str) -> Result<bool, PlannerError> {
        Ok(self.record_path(kind, name)?.is_file())
    }

    /// Keys of every stored record of a kind, sorted.
    pub fn list(&self, kind: RecordKind) -> Result<Vec<String>, PlannerError> {
        let dir = self.root.join(kind.namespace());
        let entries = match dir.read_dir_utf8() {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.into_path();
            if path.extension() == Some(RECORD_EXTENSION) {
                if let Some(stem) = path.file_stem() {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn load_target(&self, name: &str) -> Result<Target, PlannerError> {
        self.load(name)
    }

    pub fn load_instrument(&self, name: &str) -> Result<Instrument, PlannerError> {
        self.load(name)
    }

    pub fn load_vapp(&self, name: &str) -> Result<Vapp, PlannerError> {
        self.load(name)
    }

    /// Load every vAPP an instrument lists, in order.
    ///
    /// Any mask missing from the store fails the whole call with its [`PlannerError::NotFound`].
    pub fn load_masks(&self, instrument: &Instrument) -> Result<Vec<Vapp>, PlannerError> {
        instrument
            .mask_names()
            .iter()
            .map(|mask| self.load_vapp(mask))
            .collect()
    }
}

#[derive(Deserialize)]
struct RecordHeader {
    #[serde(default = "default_version")]
    version: u32,
}

/// Lowercased record key, refusing names that are not a single path component.
fn record_key(name: &str) -> Result<String, PlannerError> {
    let key = name.trim().to_lowercase();
    let escapes = key.is_empty()
        || key == "."
        || key == ".."
        || key.contains(['/', '\\'])
        || key.chars().any(char::is_control);
    if escapes {
        return Err(PlannerError::InvalidConfiguration(format!(
            "'{name}' cannot be used as a library name"
        )));
    }
    Ok(key)
}

#[cfg(test)]
mod library_test {
    use super::*;
    use crate::planner_errors::LookupKind;
    use tempfile::TempDir;

    fn store() -> (TempDir, LibraryStore) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, LibraryStore::new(root))
    }

    fn test_target() -> Target {
        Target::new("Test", SkyCoord::new(10.0, 20.0).unwrap(), 30.0, 0.1, Some(5.0)).unwrap()
    }

    #[test]
    fn test_record_key() {
        assert_eq!(record_key(" PZ Tel ").unwrap(), "pz tel");
        for bad in ["", "  ", "..", "a/b", "a\\b"] {
            assert!(matches!(
                record_key(bad),
                Err(PlannerError::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn test_target_round_trip_any_case() {
        let (_dir, store) = store();
        let path = store.save(&test_target()).unwrap();
        assert!(path.ends_with("targets/test.json"));

        for key in ["test", "TEST", "Test"] {
            let loaded: Target = store.load(key).unwrap();
            assert_eq!(loaded, test_target());
        }
    }

    #[test]
    fn test_missing_record_is_not_found() {
        let (_dir, store) = store();
        let err = store.load_target("Nothing").unwrap_err();
        assert_eq!(
            err,
            PlannerError::NotFound {
                kind: LookupKind::Target,
                name: "Nothing".into()
            }
        );
    }

    #[test]
    fn test_last_write_wins() {
        let (_dir, store) = store();
        store.save(&test_target()).unwrap();
        let moved =
            Target::new("TEST", SkyCoord::new(11.0, 21.0).unwrap(), 31.0, 0.2, None).unwrap();
        store.save(&moved).unwrap();

        assert_eq!(store.load_target("test").unwrap(), moved);
        assert_eq!(store.list(RecordKind::Target).unwrap(), vec!["test"]);
    }

    #[test]
    fn test_corrupt_records() {
        let (_dir, store) = store();
        let dir = store.root().join("targets");
        fs::create_dir_all(&dir).unwrap();

        // missing separation
        fs::write(
            dir.join("broken.json"),
            r#"{"name": "broken", "sky_coords": {"ra": 1.0, "dec": 2.0}, "position_angle": 3.0, "delta_mag": null}"#,
        )
        .unwrap();
        assert!(matches!(
            store.load_target("broken"),
            Err(PlannerError::Corrupt { kind: RecordKind::Target, .. })
        ));

        // not JSON at all
        fs::write(dir.join("garbage.json"), "name: garbage").unwrap();
        assert!(matches!(
            store.load_target("garbage"),
            Err(PlannerError::Corrupt { .. })
        ));

        // well formed but breaks an invariant
        fs::write(
            dir.join("negative.json"),
            r#"{"name": "negative", "sky_coords": {"ra": 1.0, "dec": 2.0}, "position_angle": 3.0, "separation": -1.0, "delta_mag": null}"#,
        )
        .unwrap();
        assert!(matches!(
            store.load_target("negative"),
            Err(PlannerError::Corrupt { .. })
        ));

        // written by a future version
        fs::write(
            dir.join("future.json"),
            r#"{"version": 9, "name": "future", "sky_coords": {"ra": 1.0, "dec": 2.0}, "position_angle": 3.0, "separation": 1.0, "delta_mag": null}"#,
        )
        .unwrap();
        assert!(matches!(
            store.load_target("future"),
            Err(PlannerError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_instrument_with_named_location() {
        let (_dir, store) = store();
        let dir = store.root().join("instruments");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("magao.json"),
            r#"{
                "name": "MagAO",
                "location": "las campanas observatory",
                "vAPPs": ["MagAO_vAPP"],
                "plate_scale": 0.016,
                "derotator_offset": 181.8,
                "manual_offset": 0.0
            }"#,
        )
        .unwrap();

        let magao = store.load_instrument("magao").unwrap();
        assert_eq!(magao.site().unwrap().latitude(), -29.015);
        assert_eq!(magao.mask_names(), ["MagAO_vAPP"]);
    }

    #[test]
    fn test_unresolved_location_round_trips_as_text() {
        let (_dir, store) = store();
        let instrument = Instrument::new(
            "Homemade",
            Location::Unresolved("backyard".into()),
            ["grey"],
            0.02,
            0.0,
            3.0,
        )
        .unwrap();
        store.save(&instrument).unwrap();

        let text = fs::read_to_string(store.record_path(RecordKind::Instrument, "homemade").unwrap())
            .unwrap();
        assert!(text.contains("\"location\": \"backyard\""));
        assert_eq!(store.load_instrument("HOMEMADE").unwrap(), instrument);
    }

    #[test]
    fn test_vapp_without_anchors_uses_known_mask() {
        let (_dir, store) = store();
        let dir = store.root().join("vapps");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("180.json"),
            r#"{"name": "180", "pupil": null, "phase_pattern": null, "retardance": null,
                "wavelength_range": [1.15, 2.39], "pattern_rotation": null}"#,
        )
        .unwrap();
        fs::write(
            dir.join("prototype.json"),
            r#"{"name": "prototype", "pupil": null, "phase_pattern": null, "retardance": null,
                "wavelength_range": null, "pattern_rotation": null}"#,
        )
        .unwrap();

        let vapp = store.load_vapp("180").unwrap();
        assert_eq!(vapp.anchors(), &known_anchors("180").unwrap());
        assert_eq!(vapp.optics().wavelength_range.unwrap().max, 2.39);

        assert!(matches!(
            store.load_vapp("prototype"),
            Err(PlannerError::Corrupt { kind: RecordKind::Vapp, .. })
        ));
    }

    #[test]
    fn test_load_masks() {
        let (_dir, store) = store();
        let vapp = Vapp::with_known_anchors("MagAO_vAPP", VappOptics::default()).unwrap();
        store.save(&vapp).unwrap();

        let site = SiteLocation::new(-70.6917, -29.015).unwrap();
        let magao = Instrument::new("MagAO", site, ["MagAO_vAPP"], 0.016, 181.8, 0.0).unwrap();
        assert_eq!(store.load_masks(&magao).unwrap(), vec![vapp]);

        let both =
            Instrument::new("MagAO", site, ["MagAO_vAPP", "grey"], 0.016, 181.8, 0.0).unwrap();
        assert!(matches!(
            store.load_masks(&both),
            Err(PlannerError::NotFound { kind: LookupKind::Vapp, .. })
        ));
    }

    #[test]
    fn test_record_name_must_match_file() {
        let (_dir, store) = store();
        let dir = store.root().join("targets");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("foo.json"),
            r#"{"name": "Bar", "sky_coords": {"ra": 1.0, "dec": 2.0}, "position_angle": 3.0, "separation": 1.0, "delta_mag": null}"#,
        )
        .unwrap();

        assert!(matches!(
            store.load_target("foo"),
            Err(PlannerError::Corrupt { kind: RecordKind::Target, .. })
        ));
        assert!(store.list(RecordKind::Target).unwrap().contains(&"foo".to_string()));
        assert!(!store.contains(RecordKind::Target, "bar").unwrap());
    }

    #[test]
    fn test_failed_save_leaves_no_temporary_file() {
        let (_dir, store) = store();
        // a non-empty directory where the record should go makes the rename fail
        let blocker = store.record_path(RecordKind::Target, "test").unwrap();
        fs::create_dir_all(blocker.join("inner")).unwrap();

        assert!(matches!(
            store.save(&test_target()),
            Err(PlannerError::IoError(_))
        ));
        let tmp = blocker.with_extension("json.tmp");
        assert!(!tmp.exists());
    }

    #[test]
    fn test_list_empty_store() {
        let (_dir, store) = store();
        assert!(store.list(RecordKind::Vapp).unwrap().is_empty());
        assert!(!store.contains(RecordKind::Vapp, "180").unwrap());
    }
}

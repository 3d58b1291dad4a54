#![allow(dead_code)]

use camino::Utf8PathBuf;
use tempfile::TempDir;
use vapp_planner::instrument::Instrument;
use vapp_planner::library::LibraryStore;
use vapp_planner::sites::SiteLocation;
use vapp_planner::target::{SkyCoord, Target};
use vapp_planner::vapp::{Vapp, VappOptics};

/// Empty library in a temporary directory, removed when the guard drops.
pub fn temp_store() -> (TempDir, LibraryStore) {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    (dir, LibraryStore::new(root))
}

pub fn charis() -> Instrument {
    let maunakea = SiteLocation::new(-155.476667, 19.825556).unwrap();
    Instrument::new("CHARIS", maunakea, ["180"], 0.015, -113.0, 0.0).unwrap()
}

pub fn charis_vapp() -> Vapp {
    Vapp::with_known_anchors("180", VappOptics::default()).unwrap()
}

/// HR 8799 with its outermost companion.
pub fn hr8799() -> Target {
    let coords = SkyCoord::from_sexagesimal("23 07 28.7157", "+21 08 03.302").unwrap();
    Target::new("HR 8799", coords, 65.0, 1.7, Some(11.0)).unwrap()
}

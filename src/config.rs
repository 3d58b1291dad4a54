use std::env;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;
use log::debug;

use crate::planner_errors::PlannerError;
use crate::resolver::SESAME_URL;

/// Environment variable overriding the library location.
pub const LIBRARY_ENV_VAR: &str = "VAPP_PLANNER_LIBRARY";

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the planner keeps its library and how it reaches remote services.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerConfig {
    pub library_root: Utf8PathBuf,
    pub http_timeout: Duration,
    pub sesame_url: String,
}

impl PlannerConfig {
    /// Configuration with an explicit library root and default network settings.
    pub fn with_library_root(library_root: impl Into<Utf8PathBuf>) -> Self {
        PlannerConfig {
            library_root: library_root.into(),
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            sesame_url: SESAME_URL.to_string(),
        }
    }

    /// Configuration taken from the environment.
    ///
    /// The library root is `$VAPP_PLANNER_LIBRARY` when set, otherwise
    /// `<user data dir>/vapp_planner/library`.
    ///
    /// Errors
    /// ----------
    /// * [`PlannerError::InvalidConfiguration`] if neither is available, or the data directory
    ///   is not valid UTF-8.
    pub fn from_env() -> Result<Self, PlannerError> {
        let root = library_root_from(env::var(LIBRARY_ENV_VAR).ok(), BaseDirs::new())?;
        debug!("Library root: {root}");
        Ok(PlannerConfig::with_library_root(root))
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    pub fn sesame(mut self, url: impl Into<String>) -> Self {
        self.sesame_url = url.into();
        self
    }
}

fn library_root_from(
    from_env: Option<String>,
    base_dirs: Option<BaseDirs>,
) -> Result<Utf8PathBuf, PlannerError> {
    if let Some(root) = from_env.filter(|r| !r.trim().is_empty()) {
        return Ok(Utf8PathBuf::from(root));
    }

    let base_dirs = base_dirs.ok_or_else(|| {
        PlannerError::InvalidConfiguration(format!(
            "no home directory found, set {LIBRARY_ENV_VAR}"
        ))
    })?;
    let data_dir = Utf8Path::from_path(base_dirs.data_dir()).ok_or_else(|| {
        PlannerError::InvalidConfiguration(format!(
            "data directory is not valid UTF-8, set {LIBRARY_ENV_VAR}"
        ))
    })?;
    Ok(data_dir.join("vapp_planner").join("library"))
}

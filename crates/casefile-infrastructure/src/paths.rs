//! Path management for casefile configuration and data files.
//!
//! Platform directories are resolved via `AppPaths` from the version-migrate
//! crate.
//!
//! ```text
//! ~/.config/casefile/          # Config directory
//! └── config.toml              # CaseFileConfig
//!
//! ~/.local/share/casefile/     # Data directory (overridable)
//! └── case_file.json           # Local durable cache
//! ```

use std::path::{Path, PathBuf};

use version_migrate::AppPaths;

use casefile_core::CaseError;
use casefile_core::error::Result;

const APP_NAME: &str = "casefile";
const CONFIG_FILE: &str = "config.toml";
const CASE_FILE: &str = "case_file.json";

pub struct CaseFilePaths;

impl CaseFilePaths {
    fn app_paths() -> AppPaths {
        AppPaths::new(APP_NAME)
    }

    pub fn config_dir() -> Result<PathBuf> {
        Self::app_paths()
            .config_dir()
            .map_err(|e| CaseError::config(format!("Cannot resolve config directory: {e}")))
    }

    pub fn data_dir() -> Result<PathBuf> {
        Self::app_paths()
            .data_dir()
            .map_err(|e| CaseError::config(format!("Cannot resolve data directory: {e}")))
    }

    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Local cache file under `data_dir`.
    pub fn case_file_in(data_dir: &Path) -> PathBuf {
        data_dir.join(CASE_FILE)
    }
}

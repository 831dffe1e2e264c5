//! Configuration loading.
//!
//! Reads `config.toml` (explicit path, else the platform config directory),
//! then applies `CASEFILE_*` environment overrides.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use casefile_core::config::{CaseFileConfig, RemoteConfig};
use casefile_core::error::Result;

use crate::paths::CaseFilePaths;

pub const ENV_DATA_DIR: &str = "CASEFILE_DATA_DIR";
pub const ENV_DEBOUNCE_MS: &str = "CASEFILE_DEBOUNCE_MS";
pub const ENV_REMOTE_URL: &str = "CASEFILE_REMOTE_URL";
pub const ENV_USER_ID: &str = "CASEFILE_USER_ID";
pub const ENV_ACCESS_TOKEN: &str = "CASEFILE_ACCESS_TOKEN";

pub struct ConfigService;

impl ConfigService {
    /// Loads configuration with process environment overrides applied.
    pub fn load(explicit_path: Option<&Path>) -> Result<CaseFileConfig> {
        let config = match explicit_path {
            Some(path) => Self::load_file(path)?,
            None => match CaseFilePaths::config_file() {
                Ok(path) => Self::load_file(&path)?,
                Err(e) => {
                    tracing::warn!(error = %e, "Using default configuration");
                    CaseFileConfig::default()
                }
            },
        };
        Ok(apply_env_overrides(config, |key| std::env::var(key).ok()))
    }

    /// Parses a TOML file; a missing file yields defaults.
    pub fn load_file(path: &Path) -> Result<CaseFileConfig> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                return Ok(CaseFileConfig::default());
            }
            Err(e) => return Err(e.into()),
        };
        Ok(toml::from_str(&content)?)
    }

    /// Directory holding the local cache.
    pub fn data_dir(config: &CaseFileConfig) -> Result<PathBuf> {
        match &config.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => CaseFilePaths::data_dir(),
        }
    }
}

/// Applies `CASEFILE_*` overrides read through `lookup`.
pub fn apply_env_overrides<F>(mut config: CaseFileConfig, lookup: F) -> CaseFileConfig
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.is_empty()) {
        config.data_dir = Some(PathBuf::from(dir));
    }
    if let Some(raw) = lookup(ENV_DEBOUNCE_MS) {
        match raw.parse::<u64>() {
            Ok(ms) => config.debounce_ms = ms,
            Err(e) => tracing::warn!(value = %raw, error = %e, "Ignoring invalid debounce override"),
        }
    }

    let url = lookup(ENV_REMOTE_URL);
    let user_id = lookup(ENV_USER_ID);
    let token = lookup(ENV_ACCESS_TOKEN);
    if url.is_some() || user_id.is_some() || token.is_some() {
        let remote = config.remote.get_or_insert_with(RemoteConfig::default);
        if let Some(url) = url {
            remote.base_url = url;
        }
        if let Some(user_id) = user_id {
            remote.user_id = user_id;
        }
        if let Some(token) = token {
            remote.access_token = token;
        }
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ConfigService::load_file(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, CaseFileConfig::default());
    }

    #[test]
    fn test_invalid_toml_is_serialization_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "debounce_ms = [").unwrap();
        let err = ConfigService::load_file(&path).unwrap_err();
        assert!(matches!(err, casefile_core::CaseError::Serialization { .. }));
    }

    #[test]
    fn test_env_overrides_complete_remote_session() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "debounce_ms = 200\n[remote]\nbase_url = \"https://api.example.com\"\n",
        )
        .unwrap();
        let config = ConfigService::load_file(&path).unwrap();
        assert!(config.session().is_none());

        let config = apply_env_overrides(
            config,
            env(&[
                (ENV_USER_ID, "user-7"),
                (ENV_ACCESS_TOKEN, "secret"),
                (ENV_DEBOUNCE_MS, "50"),
                (ENV_DATA_DIR, "/var/lib/casefile"),
            ]),
        );
        assert_eq!(config.debounce_ms, 50);
        assert_eq!(config.data_dir, Some(PathBuf::from("/var/lib/casefile")));
        assert_eq!(config.session().unwrap().user_id, "user-7");
    }

    #[test]
    fn test_invalid_debounce_override_is_ignored() {
        let config = apply_env_overrides(
            CaseFileConfig::default(),
            env(&[(ENV_DEBOUNCE_MS, "soon")]),
        );
        assert_eq!(config.debounce_ms, 1500);
        assert!(config.remote.is_none());
    }
}

pub mod clear;
pub mod export;
pub mod show;
pub mod validate;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};

use casefile_application::PersistenceCoordinator;
use casefile_core::config::CaseFileConfig;
use casefile_core::repository::{LocalCaseCache, PersistedCase};
use casefile_infrastructure::{
    CaseFileCodec, CaseFilePaths, ConfigService, FileLocalCaseCache, HttpRemoteCaseStore,
};

/// Resolved configuration and the local cache every command works against.
pub struct Context {
    pub config: CaseFileConfig,
    pub codec: Arc<CaseFileCodec>,
    pub cache: Arc<FileLocalCaseCache>,
}

impl Context {
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = ConfigService::load(config_path).context("Failed to load configuration")?;
        let data_dir = ConfigService::data_dir(&config).context("Failed to resolve data directory")?;
        let cache = FileLocalCaseCache::new(CaseFilePaths::case_file_in(&data_dir));
        tracing::debug!(path = %cache.path().display(), "Using local case file");

        Ok(Self {
            config,
            codec: Arc::new(CaseFileCodec::new()?),
            cache: Arc::new(cache),
        })
    }

    /// Raw blob of the local cache, if any.
    pub fn read_blob(&self) -> Result<Option<String>> {
        self.cache
            .load()
            .with_context(|| format!("Failed to read {}", self.cache.path().display()))
    }

    /// Decoded and repaired local case, or defaults when nothing is cached.
    pub fn read_case(&self) -> Result<PersistedCase> {
        match self.read_blob()? {
            Some(blob) => Ok(self.codec.decode(&blob)?),
            None => Ok(PersistedCase::default()),
        }
    }

    /// Coordinator over the local cache, plus the remote store when a session is configured.
    pub fn coordinator(&self) -> PersistenceCoordinator {
        let coordinator = PersistenceCoordinator::new(self.codec.clone(), self.cache.clone());
        match (self.config.active_remote(), self.config.session()) {
            (Some(remote), Some(session)) => {
                let store =
                    HttpRemoteCaseStore::new(remote.base_url.clone(), Some(remote.access_token.clone()));
                coordinator.with_remote(Arc::new(store), session, self.config.debounce())
            }
            _ => coordinator,
        }
    }
}

//! Workspace configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::repository::UserSession;

pub const DEFAULT_DEBOUNCE_MS: u64 = 1500;

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

/// Connection settings of the optional remote store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub access_token: String,
}

impl RemoteConfig {
    pub fn is_complete(&self) -> bool {
        !self.base_url.trim().is_empty()
            && !self.user_id.trim().is_empty()
            && !self.access_token.trim().is_empty()
    }
}

/// Root configuration, read from `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseFileConfig {
    /// Overrides the platform data directory holding the local cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// Quiet period before a remote write fires.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteConfig>,
}

impl Default for CaseFileConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            remote: None,
        }
    }
}

impl CaseFileConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Remote settings, only when every field is present.
    pub fn active_remote(&self) -> Option<&RemoteConfig> {
        self.remote.as_ref().filter(|r| r.is_complete())
    }

    pub fn session(&self) -> Option<UserSession> {
        self.active_remote().map(|r| UserSession {
            user_id: r.user_id.clone(),
        })
    }
}

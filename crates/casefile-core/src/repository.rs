//! Persistence backend traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::case::CaseData;
use crate::error::Result;
use crate::stage::Stage;

/// Everything that is written to a backend: the case plus the stage to resume at.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedCase {
    pub case: CaseData,
    pub stage: Stage,
}

impl PersistedCase {
    pub fn new(case: CaseData, stage: Stage) -> Self {
        Self { case, stage }
    }
}

/// An authenticated user that owns a remote record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    pub user_id: String,
}

/// One row of the remote per-user document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCaseRecord {
    pub user_id: String,
    /// Serialized versioned case blob.
    pub content: String,
    pub updated_at: DateTime<Utc>,
}

/// Local durable cache holding a single serialized case blob.
///
/// Synchronous: local writes are attempted on every change before control
/// returns to the caller.
pub trait LocalCaseCache: Send + Sync {
    fn load(&self) -> Result<Option<String>>;

    fn save(&self, blob: &str) -> Result<()>;

    fn clear(&self) -> Result<()>;
}

/// Optional remote per-user document store.
#[async_trait]
pub trait RemoteCaseStore: Send + Sync {
    /// Returns `None` when the user has no stored record.
    async fn load(&self, user_id: &str) -> Result<Option<RemoteCaseRecord>>;

    async fn save(&self, record: RemoteCaseRecord) -> Result<()>;

    async fn delete(&self, user_id: &str) -> Result<()>;
}

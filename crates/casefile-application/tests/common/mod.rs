#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use casefile_application::{CaseWorkspace, PersistenceCoordinator};
use casefile_core::CaseError;
use casefile_core::case::ANALYSIS_SERVICE;
use casefile_core::error::Result;
use casefile_core::repository::{LocalCaseCache, RemoteCaseRecord, RemoteCaseStore};
use casefile_core::service::{AnalysisRequest, AnalysisService, SuggestionService};
use casefile_core::suggestion::SUGGESTION_SERVICE;
use casefile_infrastructure::CaseFileCodec;

pub const RETALIATION_RESPONSE: &str = r#"{
    "statedAllegations": [{"claim": "Retaliation", "summary": "Demoted after reporting"}],
    "responseStrategies": [{"id": "s1", "title": "Collect emails", "evidenceToGather": ["HR thread"]}],
    "investigationQuestions": ["Who approved the demotion?"]
}"#;

#[derive(Default)]
pub struct MemoryCache {
    pub blob: Mutex<Option<String>>,
}

impl LocalCaseCache for MemoryCache {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.blob.lock().unwrap().clone())
    }

    fn save(&self, blob: &str) -> Result<()> {
        *self.blob.lock().unwrap() = Some(blob.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.blob.lock().unwrap() = None;
        Ok(())
    }
}

/// Remote store that records every save.
#[derive(Default)]
pub struct FakeRemote {
    pub record: Mutex<Option<RemoteCaseRecord>>,
    pub saves: Mutex<Vec<RemoteCaseRecord>>,
    pub deletes: AtomicUsize,
    pub fail_loads: bool,
    /// Time each save takes to complete.
    pub save_delay: Duration,
}

impl FakeRemote {
    pub fn failing() -> Self {
        Self {
            fail_loads: true,
            ..Default::default()
        }
    }

    pub fn slow(save_delay: Duration) -> Self {
        Self {
            save_delay,
            ..Default::default()
        }
    }

    pub fn with_content(user_id: &str, content: &str) -> Self {
        let remote = Self::default();
        *remote.record.lock().unwrap() = Some(RemoteCaseRecord {
            user_id: user_id.to_string(),
            content: content.to_string(),
            updated_at: chrono::Utc::now(),
        });
        remote
    }

    pub fn saved_contents(&self) -> Vec<String> {
        self.saves
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.content.clone())
            .collect()
    }
}

#[async_trait]
impl RemoteCaseStore for FakeRemote {
    async fn load(&self, user_id: &str) -> Result<Option<RemoteCaseRecord>> {
        if self.fail_loads {
            return Err(CaseError::service("remote_store", "connection refused"));
        }
        Ok(self
            .record
            .lock()
            .unwrap()
            .clone()
            .filter(|r| r.user_id == user_id))
    }

    async fn save(&self, record: RemoteCaseRecord) -> Result<()> {
        if !self.save_delay.is_zero() {
            tokio::time::sleep(self.save_delay).await;
        }
        *self.record.lock().unwrap() = Some(record.clone());
        self.saves.lock().unwrap().push(record);
        Ok(())
    }

    async fn delete(&self, _user_id: &str) -> Result<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        *self.record.lock().unwrap() = None;
        Ok(())
    }
}

/// Analysis service returning a fixed outcome and counting calls.
pub struct ScriptedAnalysis {
    pub response: Option<String>,
    pub calls: AtomicUsize,
}

impl ScriptedAnalysis {
    pub fn replying(response: &str) -> Self {
        Self {
            response: Some(response.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisService for ScriptedAnalysis {
    async fn analyze(&self, _request: AnalysisRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response
            .clone()
            .ok_or_else(|| CaseError::service(ANALYSIS_SERVICE, "503 service unavailable"))
    }
}

pub struct ScriptedSuggestion {
    pub response: Option<String>,
}

#[async_trait]
impl SuggestionService for ScriptedSuggestion {
    async fn suggest(
        &self,
        section_title: &str,
        _section_content_json: &str,
        _case_context: &str,
    ) -> Result<String> {
        self.response
            .as_ref()
            .map(|text| format!("{section_title}: {text}"))
            .ok_or_else(|| CaseError::service(SUGGESTION_SERVICE, "timeout"))
    }
}

pub fn codec() -> Arc<CaseFileCodec> {
    Arc::new(CaseFileCodec::new().unwrap())
}

pub async fn open_workspace(
    cache: Arc<MemoryCache>,
    analysis: Arc<ScriptedAnalysis>,
    suggestion: Option<&str>,
) -> CaseWorkspace {
    let persistence = PersistenceCoordinator::new(codec(), cache);
    let suggestion = Arc::new(ScriptedSuggestion {
        response: suggestion.map(str::to_string),
    });
    let (workspace, _) = CaseWorkspace::open(persistence, analysis, suggestion).await;
    workspace
}

//! Case workspace use case.
//!
//! `CaseWorkspace` owns the single in-memory working copy of the case and the
//! stage controller. Every mutation derives the next `CaseData` from the
//! current snapshot, replaces it, and hands it to the persistence coordinator.

use std::sync::Arc;

use chrono::Utc;

use casefile_core::board::{self, EvidenceItem};
use casefile_core::case::{
    ArbitrationAnalysis, CaseData, ComparatorAnalysis, IntakeFields, Message, UploadedEvidence,
    parse_analysis_response,
};
use casefile_core::discovery::merge_discovered;
use casefile_core::error::{CaseError, Result};
use casefile_core::repository::PersistedCase;
use casefile_core::service::{AnalysisRequest, AnalysisService, SuggestionService};
use casefile_core::stage::{Stage, StageController};
use casefile_core::suggestion;

use crate::discovery_scan::ScanReport;
use crate::persistence::{LoadSource, PersistenceCoordinator};

/// Inputs of one suggestion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionRequest {
    pub section_key: String,
    pub section_title: String,
    pub section_content_json: String,
    pub case_context: String,
}

pub struct CaseWorkspace {
    case: CaseData,
    stage: StageController,
    persistence: PersistenceCoordinator,
    analysis_service: Arc<dyn AnalysisService>,
    suggestion_service: Arc<dyn SuggestionService>,
    clear_armed: bool,
    last_error: Option<CaseError>,
}

impl CaseWorkspace {
    /// Loads the saved workspace and resumes at its stage.
    pub async fn open(
        persistence: PersistenceCoordinator,
        analysis_service: Arc<dyn AnalysisService>,
        suggestion_service: Arc<dyn SuggestionService>,
    ) -> (Self, LoadSource) {
        let loaded = persistence.load().await;
        let PersistedCase { case, stage } = loaded.persisted;
        let stage = StageController::resume(stage, case.analysis.is_some());

        tracing::info!(source = %loaded.source, stage = %stage.stage(), "Workspace opened");
        let workspace = Self {
            case,
            stage,
            persistence,
            analysis_service,
            suggestion_service,
            clear_armed: false,
            last_error: None,
        };
        (workspace, loaded.source)
    }

    pub fn case(&self) -> &CaseData {
        &self.case
    }

    pub fn stage(&self) -> Stage {
        self.stage.stage()
    }

    /// Error of the last failed service call, for a user-visible banner.
    pub fn last_error(&self) -> Option<&CaseError> {
        self.last_error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    pub fn persistence(&self) -> &PersistenceCoordinator {
        &self.persistence
    }

    fn snapshot(&self) -> PersistedCase {
        PersistedCase::new(self.case.clone(), self.stage.stage())
    }

    /// Replaces the working copy and persists it.
    fn commit(&mut self, next: CaseData) {
        self.clear_armed = false;
        self.case = next.touched(Utc::now());
        self.persistence.persist(&self.snapshot());
    }

    fn record_failure(&mut self, error: CaseError) -> CaseError {
        tracing::warn!(error = %error, stage = %self.stage.stage(), "Service call failed");
        self.last_error = Some(error.clone());
        error
    }

    // ============================================================================
    // Stage
    // ============================================================================

    pub fn update_intake(&mut self, intake: IntakeFields) {
        let next = self.case.with_intake(intake);
        self.commit(next);
    }

    pub fn navigate(&mut self, to: Stage) -> Result<()> {
        self.stage.navigate(to)?;
        self.clear_armed = false;
        self.persistence.persist(&self.snapshot());
        Ok(())
    }

    /// Enters `analyzing` and returns the request to send.
    ///
    /// A second call while a request is in flight is rejected.
    pub fn begin_analysis(&mut self) -> Result<AnalysisRequest> {
        self.stage.begin_analysis(&self.case.intake)?;
        self.clear_armed = false;
        self.last_error = None;
        Ok(AnalysisRequest::from(&self.case.intake))
    }

    /// Commits a successful analysis or reverts to `intake`.
    ///
    /// Nothing from a failed or malformed response is kept.
    pub fn complete_analysis(&mut self, outcome: Result<String>) -> Result<()> {
        if !self.stage.is_analyzing() {
            return Err(CaseError::InvalidTransition {
                from: self.stage.stage().to_string(),
                to: Stage::Investigation.to_string(),
            });
        }

        let parsed = outcome.and_then(|raw| parse_analysis_response(&raw));
        match parsed {
            Ok(result) => {
                let allegations = result.stated_allegations.len();
                self.stage.analysis_succeeded()?;
                let next = self.case.with_analysis(result);
                self.commit(next);
                tracing::info!(allegations, "Analysis committed");
                Ok(())
            }
            Err(e) => {
                self.stage.analysis_failed()?;
                self.persistence.persist(&self.snapshot());
                Err(self.record_failure(e))
            }
        }
    }

    /// Runs the full analysis round trip.
    pub async fn analyze(&mut self) -> Result<()> {
        let request = self.begin_analysis()?;
        let outcome = self.analysis_service.analyze(request).await;
        self.complete_analysis(outcome)
    }

    // ============================================================================
    // Board
    // ============================================================================

    pub fn add_evidence(&mut self, item: EvidenceItem, column_id: Option<&str>) -> Result<String> {
        let (board, id) = board::add_evidence(&self.case.board, item, column_id)?;
        let next = self.case.with_board(board);
        self.commit(next);
        Ok(id)
    }

    pub fn move_card(
        &mut self,
        card_id: &str,
        from_column_id: &str,
        from_index: usize,
        to_column_id: &str,
        to_index: usize,
    ) -> Result<()> {
        let board = board::move_card(
            &self.case.board,
            card_id,
            from_column_id,
            from_index,
            to_column_id,
            to_index,
        )?;
        if board != self.case.board {
            let next = self.case.with_board(board);
            self.commit(next);
        }
        Ok(())
    }

    /// Deletes a card and every reference to it.
    pub fn remove_evidence(&mut self, evidence_id: &str) -> Result<()> {
        let next = self.case.remove_evidence(evidence_id)?;
        self.commit(next);
        Ok(())
    }

    pub fn add_column(&mut self, title: &str) -> Result<String> {
        let (board, id) = board::add_column(&self.case.board, title)?;
        let next = self.case.with_board(board);
        self.commit(next);
        Ok(id)
    }

    pub fn rename_column(&mut self, column_id: &str, title: &str) -> Result<()> {
        let board = board::rename_column(&self.case.board, column_id, title)?;
        let next = self.case.with_board(board);
        self.commit(next);
        Ok(())
    }

    pub fn delete_column(&mut self, column_id: &str) -> Result<()> {
        let board = board::delete_column(&self.case.board, column_id)?;
        let next = self.case.with_board(board);
        self.commit(next);
        Ok(())
    }

    /// Folds every relevant scan result into the board. Returns the number of
    /// new cards.
    pub fn apply_discovery(&mut self, report: &ScanReport) -> usize {
        let before = self.case.board.card_count();
        let board = report
            .items
            .iter()
            .fold(self.case.board.clone(), |board, item| merge_discovered(&board, item));
        let added = board.card_count() - before;
        if added > 0 {
            let next = self.case.with_board(board);
            self.commit(next);
        }
        tracing::info!(added, skipped = report.items.len() - added, "Applied discovery results");
        added
    }

    // ============================================================================
    // Suggestions
    // ============================================================================

    /// Clears the section's previous text (keeping notes) and returns the
    /// request to send.
    pub fn begin_suggestion(
        &mut self,
        section_key: &str,
        section_title: &str,
        section_content_json: &str,
    ) -> SuggestionRequest {
        let cache = suggestion::begin_suggestion(&self.case.suggestions, section_key);
        let next = self.case.with_suggestions(cache);
        self.commit(next);
        SuggestionRequest {
            section_key: section_key.to_string(),
            section_title: section_title.to_string(),
            section_content_json: section_content_json.to_string(),
            case_context: self.case_context(),
        }
    }

    /// Stores the generated text. On failure the text stays empty.
    pub fn complete_suggestion(&mut self, section_key: &str, outcome: Result<String>) -> Result<()> {
        match outcome {
            Ok(text) => {
                let cache = suggestion::complete_suggestion(&self.case.suggestions, section_key, &text);
                let next = self.case.with_suggestions(cache);
                self.commit(next);
                Ok(())
            }
            Err(e) => Err(self.record_failure(e)),
        }
    }

    pub async fn request_suggestion(
        &mut self,
        section_key: &str,
        section_title: &str,
        section_content_json: &str,
    ) -> Result<()> {
        let request = self.begin_suggestion(section_key, section_title, section_content_json);
        let outcome = self
            .suggestion_service
            .suggest(
                &request.section_title,
                &request.section_content_json,
                &request.case_context,
            )
            .await;
        self.complete_suggestion(section_key, outcome)
    }

    pub fn update_user_notes(&mut self, section_key: &str, notes: &str) {
        let cache = suggestion::update_user_notes(&self.case.suggestions, section_key, notes);
        let next = self.case.with_suggestions(cache);
        self.commit(next);
    }

    fn case_context(&self) -> String {
        let mut context = self.case.intake.complaint.trim().to_string();
        if let Some(analysis) = &self.case.analysis {
            let claims: Vec<&str> = analysis
                .stated_allegations
                .iter()
                .map(|a| a.claim.as_str())
                .collect();
            if !claims.is_empty() {
                context.push_str("\nAllegations: ");
                context.push_str(&claims.join("; "));
            }
        }
        context
    }

    // ============================================================================
    // Case modules
    // ============================================================================

    pub fn link_evidence_to_strategy(&mut self, strategy_id: &str, evidence_id: &str) -> Result<()> {
        let next = self.case.link_evidence_to_strategy(strategy_id, evidence_id)?;
        self.commit(next);
        Ok(())
    }

    pub fn append_message(&mut self, allegation_id: &str, message: Message) -> Result<()> {
        let next = self.case.append_message(allegation_id, message)?;
        self.commit(next);
        Ok(())
    }

    pub fn add_timeline_event(
        &mut self,
        date: &str,
        title: &str,
        description: &str,
        evidence_ids: Vec<String>,
    ) -> Result<String> {
        let (next, id) = self
            .case
            .add_timeline_event(date, title, description, evidence_ids)?;
        self.commit(next);
        Ok(id)
    }

    pub fn add_damage_item(
        &mut self,
        category: &str,
        description: &str,
        amount_cents: i64,
    ) -> Result<String> {
        let (next, id) = self.case.add_damage_item(category, description, amount_cents)?;
        self.commit(next);
        Ok(id)
    }

    pub fn add_mood_entry(&mut self, date: &str, rating: u8, note: &str) -> Result<String> {
        let (next, id) = self.case.add_mood_entry(date, rating, note)?;
        self.commit(next);
        Ok(id)
    }

    pub fn add_character_evidence(
        &mut self,
        trait_name: &str,
        description: &str,
        source: &str,
    ) -> Result<String> {
        let (next, id) = self
            .case
            .add_character_evidence(trait_name, description, source)?;
        self.commit(next);
        Ok(id)
    }

    pub fn upload_evidence(&mut self, file_name: &str, bytes: &[u8]) -> String {
        let upload = UploadedEvidence::from_bytes(file_name, bytes, Utc::now());
        let id = upload.id.clone();
        let next = self.case.add_uploaded_evidence(upload);
        self.commit(next);
        id
    }

    pub fn set_comparator_analysis(&mut self, analysis: ComparatorAnalysis) {
        let next = self.case.with_comparator_analysis(analysis);
        self.commit(next);
    }

    pub fn set_arbitration_analysis(&mut self, analysis: ArbitrationAnalysis) {
        let next = self.case.with_arbitration_analysis(analysis);
        self.commit(next);
    }

    // ============================================================================
    // Clear all
    // ============================================================================

    /// First confirmation of "clear all". Any other mutation disarms it.
    pub fn arm_clear(&mut self) {
        tracing::info!("Clear-all armed");
        self.clear_armed = true;
    }

    pub fn is_clear_armed(&self) -> bool {
        self.clear_armed
    }

    /// Second confirmation: erases both copies and resets to defaults.
    pub async fn confirm_clear(&mut self) -> Result<()> {
        if !self.clear_armed {
            return Err(CaseError::validation(
                "clear",
                "clear-all must be armed before it is confirmed",
            ));
        }
        if self.stage.is_analyzing() {
            return Err(CaseError::AnalysisInFlight);
        }
        self.clear_armed = false;

        self.persistence.clear_all().await?;
        self.case = CaseData::default();
        self.stage.reset();
        self.last_error = None;
        tracing::info!("Case file cleared");
        Ok(())
    }

    /// Flushes the pending remote write and stops background work.
    pub async fn close(self) {
        self.persistence.shutdown().await;
    }
}

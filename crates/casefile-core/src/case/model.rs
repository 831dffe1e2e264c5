//! Case file root aggregate and its auxiliary modules.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use super::analysis::AnalysisResult;
use crate::board::{self, BoardState};
use crate::error::{CaseError, Result};
use crate::suggestion::SuggestionCache;

/// Free-text intake fields entered by the user before analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntakeFields {
    pub complaint: String,
    pub job_description: String,
    pub duties: String,
    pub character_profile: String,
    pub handbook_reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_url: Option<String>,
}

impl IntakeFields {
    /// True when there is nothing to analyze.
    pub fn is_blank(&self) -> bool {
        self.complaint.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// One turn of the per-allegation conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub id: String,
    pub date: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Board evidence referenced by this event.
    #[serde(default)]
    pub evidence_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DamageItem {
    pub id: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub amount_cents: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DamagesModule {
    #[serde(default)]
    pub items: Vec<DamageItem>,
}

impl DamagesModule {
    /// Sum of all items, saturating at `i64::MAX`.
    pub fn total_cents(&self) -> i64 {
        self.items
            .iter()
            .fold(0i64, |total, item| total.saturating_add(item.amount_cents))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparator {
    pub name: String,
    pub role: String,
    pub treatment: String,
    pub difference: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparatorAnalysis {
    #[serde(default)]
    pub comparators: Vec<Comparator>,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArbitrationAnalysis {
    pub clause_found: bool,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub enforceability_notes: String,
}

/// A self-reported mood log entry. `rating` must be within `1..=5`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodEntry {
    pub id: String,
    pub date: String,
    pub rating: u8,
    #[serde(default)]
    pub note: String,
}

pub const MOOD_RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterEvidence {
    pub id: String,
    pub trait_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub source: String,
}

/// Raw file uploaded by the user, kept inline as base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedEvidence {
    pub id: String,
    pub file_name: String,
    pub mime_type: String,
    pub size: u64,
    pub content_base64: String,
    pub uploaded_at: DateTime<Utc>,
}

impl UploadedEvidence {
    /// Builds an upload from raw bytes, inferring the MIME type from the name.
    pub fn from_bytes(file_name: impl Into<String>, bytes: &[u8], uploaded_at: DateTime<Utc>) -> Self {
        let file_name = file_name.into();
        let mime_type = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            id: format!("upload-{}", Uuid::new_v4()),
            file_name,
            mime_type,
            size: bytes.len() as u64,
            content_base64: BASE64.encode(bytes),
            uploaded_at,
        }
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        BASE64.decode(&self.content_base64).map_err(|e| CaseError::Serialization {
            format: "base64".to_string(),
            message: e.to_string(),
        })
    }
}

/// The root persisted aggregate of one user's workspace.
///
/// `board` is the live evidence board. `analysis.board` is the board as
/// produced at analysis time and seeds `board` when an analysis is committed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseData {
    #[serde(default)]
    pub intake: IntakeFields,
    #[serde(default)]
    pub analysis: Option<AnalysisResult>,
    #[serde(default)]
    pub board: BoardState,
    #[serde(default)]
    pub suggestions: SuggestionCache,
    #[serde(default)]
    pub timeline: Vec<TimelineEvent>,
    #[serde(default)]
    pub damages: DamagesModule,
    #[serde(default)]
    pub comparator_analysis: Option<ComparatorAnalysis>,
    #[serde(default)]
    pub arbitration_analysis: Option<ArbitrationAnalysis>,
    #[serde(default)]
    pub mood_log: Vec<MoodEntry>,
    #[serde(default)]
    pub character_evidence: Vec<CharacterEvidence>,
    #[serde(default)]
    pub uploaded_evidence: Vec<UploadedEvidence>,
    #[serde(default)]
    pub last_saved_at: Option<DateTime<Utc>>,
}

impl CaseData {
    pub fn with_intake(&self, intake: IntakeFields) -> Self {
        Self {
            intake,
            ..self.clone()
        }
    }

    pub fn with_board(&self, board: BoardState) -> Self {
        Self {
            board,
            ..self.clone()
        }
    }

    pub fn with_suggestions(&self, suggestions: SuggestionCache) -> Self {
        Self {
            suggestions,
            ..self.clone()
        }
    }

    /// Replaces the analysis wholesale and rebuilds the live board from it.
    ///
    /// Existing cards are carried over (see [`board::carry_evidence`]) so
    /// timeline links stay valid. Strategy links go away with the old
    /// strategies.
    pub fn with_analysis(&self, analysis: AnalysisResult) -> Self {
        Self {
            board: board::carry_evidence(&self.board, &analysis.board),
            analysis: Some(analysis),
            ..self.clone()
        }
    }

    pub fn touched(&self, at: DateTime<Utc>) -> Self {
        Self {
            last_saved_at: Some(at),
            ..self.clone()
        }
    }

    /// Deletes an evidence card and every reference to it.
    ///
    /// Scrubs the live board, the analysis board, every strategy's
    /// evidence-to-gather links and every timeline event.
    pub fn remove_evidence(&self, evidence_id: &str) -> Result<Self> {
        let mut next = self.with_board(board::remove_evidence(&self.board, evidence_id)?);

        if let Some(analysis) = next.analysis.as_mut() {
            if analysis.board.evidence.contains_key(evidence_id) {
                analysis.board = board::remove_evidence(&analysis.board, evidence_id)?;
            }
            for strategy in &mut analysis.response_strategies {
                strategy.evidence_to_gather.retain(|id| id != evidence_id);
            }
        }
        for event in &mut next.timeline {
            event.evidence_ids.retain(|id| id != evidence_id);
        }

        tracing::debug!(evidence_id, "Removed evidence with cascading references");
        Ok(next)
    }

    /// Links a board card to a response strategy's evidence-to-gather list.
    pub fn link_evidence_to_strategy(&self, strategy_id: &str, evidence_id: &str) -> Result<Self> {
        if !self.board.evidence.contains_key(evidence_id) {
            return Err(CaseError::not_found("evidence", evidence_id));
        }
        let mut next = self.clone();
        let strategy = next
            .analysis
            .as_mut()
            .and_then(|a| a.response_strategies.iter_mut().find(|s| s.id == strategy_id))
            .ok_or_else(|| CaseError::not_found("strategy", strategy_id))?;
        if !strategy.evidence_to_gather.iter().any(|id| id == evidence_id) {
            strategy.evidence_to_gather.push(evidence_id.to_string());
        }
        Ok(next)
    }

    /// Appends a conversation turn to an allegation.
    pub fn append_message(&self, allegation_id: &str, message: Message) -> Result<Self> {
        if message.content.trim().is_empty() {
            return Err(CaseError::validation("message.content", "must not be empty"));
        }
        let mut next = self.clone();
        let allegation = next
            .analysis
            .as_mut()
            .and_then(|a| a.stated_allegations.iter_mut().find(|al| al.id == allegation_id))
            .ok_or_else(|| CaseError::not_found("allegation", allegation_id))?;
        allegation
            .conversation
            .get_or_insert_with(Vec::new)
            .push(message);
        Ok(next)
    }

    /// Adds a timeline event. Referenced evidence must exist on the board.
    pub fn add_timeline_event(
        &self,
        date: &str,
        title: &str,
        description: &str,
        evidence_ids: Vec<String>,
    ) -> Result<(Self, String)> {
        if title.trim().is_empty() {
            return Err(CaseError::validation("timeline.title", "must not be empty"));
        }
        if let Some(missing) = evidence_ids
            .iter()
            .find(|id| !self.board.evidence.contains_key(*id))
        {
            return Err(CaseError::not_found("evidence", missing.clone()));
        }

        let id = new_id("event");
        let mut next = self.clone();
        next.timeline.push(TimelineEvent {
            id: id.clone(),
            date: date.to_string(),
            title: title.trim().to_string(),
            description: description.to_string(),
            evidence_ids,
        });
        next.timeline.sort_by(|a, b| a.date.cmp(&b.date));
        Ok((next, id))
    }

    pub fn add_damage_item(
        &self,
        category: &str,
        description: &str,
        amount_cents: i64,
    ) -> Result<(Self, String)> {
        if amount_cents < 0 {
            return Err(CaseError::validation(
                "damages.amountCents",
                "must not be negative",
            ));
        }
        let id = new_id("damage");
        let mut next = self.clone();
        next.damages.items.push(DamageItem {
            id: id.clone(),
            category: category.to_string(),
            description: description.to_string(),
            amount_cents,
        });
        Ok((next, id))
    }

    pub fn add_mood_entry(&self, date: &str, rating: u8, note: &str) -> Result<(Self, String)> {
        if !MOOD_RATING_RANGE.contains(&rating) {
            return Err(CaseError::validation(
                "moodLog.rating",
                format!("{rating} is outside 1..=5"),
            ));
        }
        let id = new_id("mood");
        let mut next = self.clone();
        next.mood_log.push(MoodEntry {
            id: id.clone(),
            date: date.to_string(),
            rating,
            note: note.to_string(),
        });
        Ok((next, id))
    }

    pub fn add_character_evidence(
        &self,
        trait_name: &str,
        description: &str,
        source: &str,
    ) -> Result<(Self, String)> {
        if trait_name.trim().is_empty() {
            return Err(CaseError::validation(
                "characterEvidence.traitName",
                "must not be empty",
            ));
        }
        let id = new_id("trait");
        let mut next = self.clone();
        next.character_evidence.push(CharacterEvidence {
            id: id.clone(),
            trait_name: trait_name.trim().to_string(),
            description: description.to_string(),
            source: source.to_string(),
        });
        Ok((next, id))
    }

    pub fn add_uploaded_evidence(&self, upload: UploadedEvidence) -> Self {
        let mut next = self.clone();
        next.uploaded_evidence.push(upload);
        next
    }

    pub fn with_comparator_analysis(&self, analysis: ComparatorAnalysis) -> Self {
        Self {
            comparator_analysis: Some(analysis),
            ..self.clone()
        }
    }

    pub fn with_arbitration_analysis(&self, analysis: ArbitrationAnalysis) -> Self {
        Self {
            arbitration_analysis: Some(analysis),
            ..self.clone()
        }
    }
}

fn new_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4())
}

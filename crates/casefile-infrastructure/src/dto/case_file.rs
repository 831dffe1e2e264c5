//! Case file DTOs and migrations
//!
//! ## Version History
//! - **1.0.0**: Legacy shape. Intake fields at the top level, optional board,
//!   suggestions as arbitrary JSON values, obsolete `draftLetter` and
//!   `selectedAllegationIndex` fields.
//! - **1.1.0**: Intake grouped under `intake`, suggestions normalized, board
//!   always present, obsolete fields gone.
//! - **2.0.0**: Adds the persisted `stage` and the auxiliary modules.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use version_migrate::{FromDomain, IntoDomain, MigratesTo, Versioned};

use casefile_core::board::BoardState;
use casefile_core::case::{
    AnalysisResult, ArbitrationAnalysis, CaseData, CharacterEvidence, ComparatorAnalysis,
    DamagesModule, IntakeFields, MoodEntry, TimelineEvent, UploadedEvidence,
};
use casefile_core::error::Result;
use casefile_core::repository::PersistedCase;
use casefile_core::stage::Stage;
use casefile_core::suggestion::{SuggestionCache, deserialize_lenient, migrate_suggestions};

/// Entity name the case file migration path is registered under.
pub const CASE_FILE_ENTITY: &str = "case_file";

// ============================================================================
// V1.0.0 (legacy)
// ============================================================================

/// Case file DTO V1.0.0
#[derive(Debug, Clone, Default, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.0.0")]
#[serde(rename_all = "camelCase", default)]
pub struct CaseFileV1_0_0 {
    pub complaint: String,
    pub job_description: String,
    pub duties: String,
    pub character_profile: String,
    pub handbook_reference: String,
    pub reference_url: Option<String>,
    pub analysis: Option<AnalysisResult>,
    pub board: Option<BoardState>,
    /// Records were either bare strings or objects.
    pub suggestions: BTreeMap<String, Value>,
    /// Obsolete: letters are no longer stored in the case.
    pub draft_letter: Option<String>,
    /// Obsolete: UI selection state.
    pub selected_allegation_index: Option<usize>,
    pub last_saved_at: Option<DateTime<Utc>>,
}

// ============================================================================
// V1.1.0
// ============================================================================

/// Case file DTO V1.1.0
#[derive(Debug, Clone, Default, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.1.0")]
#[serde(rename_all = "camelCase")]
pub struct CaseFileV1_1_0 {
    #[serde(default)]
    pub intake: IntakeFields,
    #[serde(default)]
    pub analysis: Option<AnalysisResult>,
    #[serde(default)]
    pub board: BoardState,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub suggestions: SuggestionCache,
    #[serde(default)]
    pub last_saved_at: Option<DateTime<Utc>>,
}

// ============================================================================
// V2.0.0
// ============================================================================

/// Case file DTO V2.0.0
#[derive(Debug, Clone, Default, Serialize, Deserialize, Versioned)]
#[versioned(version = "2.0.0")]
#[serde(rename_all = "camelCase")]
pub struct CaseFileV2_0_0 {
    #[serde(default, deserialize_with = "deserialize_stage")]
    pub stage: Stage,
    #[serde(default)]
    pub intake: IntakeFields,
    #[serde(default)]
    pub analysis: Option<AnalysisResult>,
    #[serde(default)]
    pub board: BoardState,
    #[serde(default, deserialize_with = "deserialize_lenient")]
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

/// Unknown stage names resume at `intake`.
fn deserialize_stage<'de, D>(deserializer: D) -> std::result::Result<Stage, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .and_then(|name| name.parse::<Stage>().ok())
        .unwrap_or_default())
}

// ============================================================================
// Migration implementations
// ============================================================================

/// Migration from CaseFileV1_0_0 to CaseFileV1_1_0.
/// Normalizes suggestions, drops obsolete fields and backfills the board.
impl MigratesTo<CaseFileV1_1_0> for CaseFileV1_0_0 {
    fn migrate(self) -> CaseFileV1_1_0 {
        let board = self
            .board
            .or_else(|| self.analysis.as_ref().map(|a| a.board.clone()))
            .unwrap_or_default();

        CaseFileV1_1_0 {
            intake: IntakeFields {
                complaint: self.complaint,
                job_description: self.job_description,
                duties: self.duties,
                character_profile: self.character_profile,
                handbook_reference: self.handbook_reference,
                reference_url: self.reference_url,
            },
            analysis: self.analysis,
            board,
            suggestions: migrate_suggestions(&self.suggestions),
            last_saved_at: self.last_saved_at,
        }
    }
}

/// Migration from CaseFileV1_1_0 to CaseFileV2_0_0.
/// Adds the stage and empty auxiliary modules.
impl MigratesTo<CaseFileV2_0_0> for CaseFileV1_1_0 {
    fn migrate(self) -> CaseFileV2_0_0 {
        let stage = if self.analysis.is_some() {
            Stage::Investigation
        } else {
            Stage::Intake
        };
        CaseFileV2_0_0 {
            stage,
            intake: self.intake,
            analysis: self.analysis,
            board: self.board,
            suggestions: self.suggestions,
            last_saved_at: self.last_saved_at,
            ..Default::default()
        }
    }
}

/// Convert CaseFileV2_0_0 DTO to domain model.
impl IntoDomain<PersistedCase> for CaseFileV2_0_0 {
    fn into_domain(self) -> PersistedCase {
        PersistedCase {
            stage: self.stage,
            case: CaseData {
                intake: self.intake,
                analysis: self.analysis,
                board: self.board,
                suggestions: self.suggestions,
                timeline: self.timeline,
                damages: self.damages,
                comparator_analysis: self.comparator_analysis,
                arbitration_analysis: self.arbitration_analysis,
                mood_log: self.mood_log,
                character_evidence: self.character_evidence,
                uploaded_evidence: self.uploaded_evidence,
                last_saved_at: self.last_saved_at,
            },
        }
    }
}

/// Convert domain model to CaseFileV2_0_0 DTO for persistence.
impl FromDomain<PersistedCase> for CaseFileV2_0_0 {
    fn from_domain(persisted: PersistedCase) -> Self {
        let case = persisted.case;
        CaseFileV2_0_0 {
            stage: persisted.stage,
            intake: case.intake,
            analysis: case.analysis,
            board: case.board,
            suggestions: case.suggestions,
            timeline: case.timeline,
            damages: case.damages,
            comparator_analysis: case.comparator_analysis,
            arbitration_analysis: case.arbitration_analysis,
            mood_log: case.mood_log,
            character_evidence: case.character_evidence,
            uploaded_evidence: case.uploaded_evidence,
            last_saved_at: case.last_saved_at,
        }
    }
}

// ============================================================================
// Migrator factory
// ============================================================================

/// Creates and configures a Migrator instance for case file blobs.
///
/// # Migration Path
///
/// - V1.0.0 → V1.1.0: Normalizes suggestions, removes obsolete fields, backfills the board
/// - V1.1.0 → V2.0.0: Adds stage and auxiliary modules
/// - V2.0.0 → PersistedCase: Converts DTO to domain model
pub fn create_case_file_migrator() -> Result<version_migrate::Migrator> {
    let mut migrator = version_migrate::Migrator::builder().build();

    let case_file_path = version_migrate::Migrator::define(CASE_FILE_ENTITY)
        .from::<CaseFileV1_0_0>()
        .step::<CaseFileV1_1_0>()
        .step::<CaseFileV2_0_0>()
        .into_with_save::<PersistedCase>();

    migrator.register(case_file_path)?;

    Ok(migrator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_v1_0_0_to_v1_1_0_normalizes_legacy_fields() {
        let legacy: CaseFileV1_0_0 = serde_json::from_value(json!({
            "complaint": "Fired after reporting",
            "suggestions": {"complaint": "be specific", "duties": 7},
            "draftLetter": "Dear HR",
            "selectedAllegationIndex": 2
        }))
        .unwrap();

        let migrated: CaseFileV1_1_0 = legacy.migrate();
        assert_eq!(migrated.intake.complaint, "Fired after reporting");
        assert_eq!(
            migrated.suggestions["complaint"].as_ref().unwrap().suggestion_text,
            "be specific"
        );
        assert_eq!(migrated.suggestions["duties"], None);
        assert_eq!(migrated.board, BoardState::default());

        let value = serde_json::to_value(&migrated).unwrap();
        assert!(value.get("draftLetter").is_none());
        assert!(value.get("selectedAllegationIndex").is_none());
    }

    #[test]
    fn test_v1_0_0_board_backfilled_from_analysis() {
        let analysis = AnalysisResult::from_allegations(vec![
            casefile_core::case::Allegation::new("a0", "Retaliation"),
        ]);
        let legacy = CaseFileV1_0_0 {
            analysis: Some(analysis.clone()),
            ..Default::default()
        };
        let migrated: CaseFileV1_1_0 = legacy.migrate();
        assert_eq!(migrated.board, analysis.board);
    }

    #[test]
    fn test_v1_1_0_to_v2_0_0_sets_stage() {
        let with_analysis = CaseFileV1_1_0 {
            analysis: Some(AnalysisResult::from_allegations(vec![])),
            ..Default::default()
        };
        let migrated: CaseFileV2_0_0 = with_analysis.migrate();
        assert_eq!(migrated.stage, Stage::Investigation);
        assert!(migrated.timeline.is_empty());

        let fresh: CaseFileV2_0_0 = CaseFileV1_1_0::default().migrate();
        assert_eq!(fresh.stage, Stage::Intake);
    }

    #[test]
    fn test_unknown_stage_resumes_at_intake() {
        let dto: CaseFileV2_0_0 = serde_json::from_value(json!({"stage": "drafting"})).unwrap();
        assert_eq!(dto.stage, Stage::Intake);
    }

    #[test]
    fn test_migrator_loads_legacy_blob() {
        let migrator = create_case_file_migrator().unwrap();
        let value = json!({
            "version": "1.0.0",
            "complaint": "X",
            "suggestions": {"complaint": "legacy text"}
        });
        let persisted: PersistedCase = migrator.load_flat_from(CASE_FILE_ENTITY, value).unwrap();
        assert_eq!(persisted.case.intake.complaint, "X");
        assert_eq!(persisted.stage, Stage::Intake);
        assert_eq!(
            persisted.case.suggestions["complaint"].as_ref().unwrap().user_notes,
            ""
        );
    }

    #[test]
    fn test_migrator_saves_latest_version() {
        let migrator = create_case_file_migrator().unwrap();
        let json = migrator
            .save_domain_flat(CASE_FILE_ENTITY, PersistedCase::default())
            .unwrap();
        assert!(json.contains("\"version\":\"2.0.0\""));
    }
}

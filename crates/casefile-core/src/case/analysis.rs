//! Analysis results and the strict schema of the analysis service response.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::model::Message;
use crate::board::BoardState;
use crate::error::{CaseError, Result};

pub const ANALYSIS_SERVICE: &str = "analysis";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allegation {
    pub id: String,
    pub claim: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub evidence_mentioned: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<Vec<Message>>,
}

impl Allegation {
    pub fn new(id: impl Into<String>, claim: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            claim: claim.into(),
            summary: String::new(),
            evidence_mentioned: Vec::new(),
            strength_score: None,
            conversation: None,
        }
    }
}

/// A claim the user did not state but the facts may support.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnstatedClaim {
    pub claim: String,
    #[serde(default)]
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseStrategy {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Descriptions of evidence the service recommends collecting.
    #[serde(default)]
    pub suggested_evidence: Vec<String>,
    /// Board evidence ids the user linked to this strategy.
    #[serde(default)]
    pub evidence_to_gather: Vec<String>,
}

impl ResponseStrategy {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            suggested_evidence: Vec::new(),
            evidence_to_gather: Vec::new(),
        }
    }
}

/// Output of one successful analysis. Replaced wholesale on re-analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub stated_allegations: Vec<Allegation>,
    #[serde(default)]
    pub unstated_claims: Vec<UnstatedClaim>,
    #[serde(default)]
    pub response_strategies: Vec<ResponseStrategy>,
    #[serde(default)]
    pub investigation_questions: Vec<String>,
    #[serde(default)]
    pub conference_questions: Vec<String>,
    #[serde(default)]
    pub letter_prompts: Vec<String>,
    #[serde(default)]
    pub board: BoardState,
}

impl AnalysisResult {
    /// Builds a result whose board has one empty column per allegation.
    pub fn from_allegations(stated_allegations: Vec<Allegation>) -> Self {
        let board = BoardState::for_allegations(stated_allegations.iter().map(|a| a.claim.as_str()));
        Self {
            stated_allegations,
            unstated_claims: Vec::new(),
            response_strategies: Vec::new(),
            investigation_questions: Vec::new(),
            conference_questions: Vec::new(),
            letter_prompts: Vec::new(),
            board,
        }
    }
}

// ============================================================================
// Service response schema
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct AnalysisResponse {
    stated_allegations: Vec<AllegationResponse>,
    #[serde(default)]
    unstated_claims: Vec<UnstatedClaimResponse>,
    #[serde(default)]
    response_strategies: Vec<StrategyResponse>,
    #[serde(default)]
    investigation_questions: Vec<String>,
    #[serde(default)]
    conference_questions: Vec<String>,
    #[serde(default)]
    letter_prompts: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct AllegationResponse {
    #[serde(default)]
    id: String,
    claim: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    evidence_mentioned: Vec<String>,
    #[serde(default)]
    strength_score: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct UnstatedClaimResponse {
    claim: String,
    #[serde(default)]
    rationale: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct StrategyResponse {
    #[serde(default)]
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    evidence_to_gather: Vec<String>,
}

/// Parses and validates the raw analysis service body.
///
/// Any shape mismatch or failed check is a [`CaseError::ServiceFailure`]; no
/// partial result is ever returned.
pub fn parse_analysis_response(raw: &str) -> Result<AnalysisResult> {
    let response: AnalysisResponse = serde_json::from_str(raw).map_err(|e| {
        CaseError::service(ANALYSIS_SERVICE, format!("unparseable response: {e}"))
    })?;

    let mut seen = HashSet::new();
    let mut allegations = Vec::with_capacity(response.stated_allegations.len());
    for (index, raw) in response.stated_allegations.into_iter().enumerate() {
        if raw.claim.trim().is_empty() {
            return Err(CaseError::service(
                ANALYSIS_SERVICE,
                format!("allegation {index} has an empty claim"),
            ));
        }
        if let Some(score) = raw.strength_score {
            if !(0.0..=10.0).contains(&score) {
                return Err(CaseError::service(
                    ANALYSIS_SERVICE,
                    format!("allegation {index} has out-of-range strength score {score}"),
                ));
            }
        }
        let id = if raw.id.trim().is_empty() {
            format!("allegation-{index}")
        } else {
            raw.id.trim().to_string()
        };
        if !seen.insert(id.clone()) {
            return Err(CaseError::service(
                ANALYSIS_SERVICE,
                format!("duplicate allegation id '{id}'"),
            ));
        }
        allegations.push(Allegation {
            id,
            claim: raw.claim.trim().to_string(),
            summary: raw.summary,
            evidence_mentioned: raw.evidence_mentioned,
            strength_score: raw.strength_score,
            conversation: None,
        });
    }

    let mut result = AnalysisResult::from_allegations(allegations);
    result.unstated_claims = response
        .unstated_claims
        .into_iter()
        .map(|c| UnstatedClaim {
            claim: c.claim,
            rationale: c.rationale,
        })
        .collect();
    result.response_strategies = response
        .response_strategies
        .into_iter()
        .enumerate()
        .map(|(index, s)| ResponseStrategy {
            id: if s.id.trim().is_empty() {
                format!("strategy-{index}")
            } else {
                s.id
            },
            title: s.title,
            description: s.description,
            suggested_evidence: s.evidence_to_gather,
            evidence_to_gather: Vec::new(),
        })
        .collect();
    result.investigation_questions = response.investigation_questions;
    result.conference_questions = response.conference_questions;
    result.letter_prompts = response.letter_prompts;

    Ok(result)
}

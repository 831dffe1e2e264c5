//! External collaborator interfaces for analysis and suggestions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::case::IntakeFields;
use crate::error::Result;

/// Input of the analysis service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub complaint: String,
    pub job_description: String,
    pub duties: String,
    pub character_profile: String,
    pub handbook_reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_url: Option<String>,
}

impl From<&IntakeFields> for AnalysisRequest {
    fn from(intake: &IntakeFields) -> Self {
        Self {
            complaint: intake.complaint.clone(),
            job_description: intake.job_description.clone(),
            duties: intake.duties.clone(),
            character_profile: intake.character_profile.clone(),
            handbook_reference: intake.handbook_reference.clone(),
            reference_url: intake
                .reference_url
                .clone()
                .filter(|url| !url.trim().is_empty()),
        }
    }
}

/// Generative legal-analysis service.
///
/// Returns the raw JSON body. Parsing and validation happen in
/// [`crate::case::parse_analysis_response`].
#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn analyze(&self, request: AnalysisRequest) -> Result<String>;
}

/// Generates improvement text for one case section.
#[async_trait]
pub trait SuggestionService: Send + Sync {
    async fn suggest(
        &self,
        section_title: &str,
        section_content_json: &str,
        case_context: &str,
    ) -> Result<String>;
}

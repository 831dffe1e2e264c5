use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use colored::Colorize;

use casefile_application::CaseWorkspace;
use casefile_core::CaseError;
use casefile_core::case::ANALYSIS_SERVICE;
use casefile_core::error;
use casefile_core::service::{AnalysisRequest, AnalysisService, SuggestionService};
use casefile_core::suggestion::SUGGESTION_SERVICE;

use super::Context;

/// Stand-in for the generative services, which the CLI never calls.
struct Offline;

#[async_trait]
impl AnalysisService for Offline {
    async fn analyze(&self, _request: AnalysisRequest) -> error::Result<String> {
        Err(CaseError::service(ANALYSIS_SERVICE, "not available from the command line"))
    }
}

#[async_trait]
impl SuggestionService for Offline {
    async fn suggest(
        &self,
        _section_title: &str,
        _section_content_json: &str,
        _case_context: &str,
    ) -> error::Result<String> {
        Err(CaseError::service(SUGGESTION_SERVICE, "not available from the command line"))
    }
}

pub async fn run(context: &Context, confirm: bool, confirm_again: bool) -> Result<()> {
    if !(confirm && confirm_again) {
        anyhow::bail!("clearing erases the case file; pass both --confirm and --confirm-again");
    }

    let (mut workspace, source) =
        CaseWorkspace::open(context.coordinator(), Arc::new(Offline), Arc::new(Offline)).await;
    let remote = workspace.persistence().session().is_some();

    workspace.arm_clear();
    let result = workspace.confirm_clear().await;
    workspace.close().await;
    result?;

    println!("{} (loaded from {source})", "✓ Case file cleared".green());
    if remote {
        println!("  remote copy deleted");
    }
    Ok(())
}

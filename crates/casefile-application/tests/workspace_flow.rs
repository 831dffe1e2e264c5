mod common;

use std::sync::Arc;

use casefile_application::ScanReport;
use casefile_core::board::{EvidenceItem, EvidenceType, UNCATEGORIZED_COLUMN_ID};
use casefile_core::case::{IntakeFields, collect_issues};
use casefile_core::discovery::DiscoveredItem;
use casefile_core::repository::LocalCaseCache;
use casefile_core::stage::Stage;
use casefile_core::CaseError;

use common::{
    MemoryCache, RETALIATION_RESPONSE, ScriptedAnalysis, codec, open_workspace,
};

fn intake(complaint: &str) -> IntakeFields {
    IntakeFields {
        complaint: complaint.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_intake_to_board_scenario() {
    let cache = Arc::new(MemoryCache::default());
    let analysis = Arc::new(ScriptedAnalysis::replying(RETALIATION_RESPONSE));
    let mut workspace = open_workspace(cache.clone(), analysis.clone(), None).await;
    assert_eq!(workspace.stage(), Stage::Intake);

    workspace.update_intake(intake("X"));
    workspace.analyze().await.unwrap();
    assert_eq!(workspace.stage(), Stage::Investigation);
    assert_eq!(analysis.call_count(), 1);

    let board = &workspace.case().board;
    assert_eq!(board.column_order, ["uncategorized", "allegation-0"]);
    assert_eq!(board.columns["allegation-0"].title, "Retaliation");
    assert!(board.columns["allegation-0"].evidence_ids.is_empty());

    let id = workspace
        .add_evidence(
            EvidenceItem::new("Email body", "Manager email", EvidenceType::Email),
            None,
        )
        .unwrap();
    assert_eq!(
        workspace.case().board.columns[UNCATEGORIZED_COLUMN_ID].evidence_ids,
        [id.clone()]
    );

    workspace
        .move_card(&id, UNCATEGORIZED_COLUMN_ID, 0, "allegation-0", 0)
        .unwrap();
    let board = &workspace.case().board;
    assert!(board.columns[UNCATEGORIZED_COLUMN_ID].evidence_ids.is_empty());
    assert_eq!(board.columns["allegation-0"].evidence_ids, [id.clone()]);

    // Every mutation reaches the local cache.
    let blob = cache.load().unwrap().unwrap();
    let saved = codec().decode(&blob).unwrap();
    assert_eq!(saved.stage, Stage::Investigation);
    assert_eq!(saved.case.board, workspace.case().board);
    assert!(saved.case.last_saved_at.is_some());
}

#[tokio::test]
async fn test_second_analyze_while_in_flight_is_rejected() {
    let analysis = Arc::new(ScriptedAnalysis::replying(RETALIATION_RESPONSE));
    let mut workspace = open_workspace(Arc::default(), analysis.clone(), None).await;
    workspace.update_intake(intake("Demoted after HR complaint"));

    let request = workspace.begin_analysis().unwrap();
    assert_eq!(request.complaint, "Demoted after HR complaint");
    assert_eq!(workspace.stage(), Stage::Analyzing);

    let err = workspace.analyze().await.unwrap_err();
    assert!(matches!(err, CaseError::AnalysisInFlight));
    assert_eq!(analysis.call_count(), 0);
    assert_eq!(workspace.stage(), Stage::Analyzing);

    workspace
        .complete_analysis(Ok(RETALIATION_RESPONSE.to_string()))
        .unwrap();
    assert_eq!(workspace.stage(), Stage::Investigation);
}

#[tokio::test]
async fn test_failed_analysis_reverts_to_intake() {
    let analysis = Arc::new(ScriptedAnalysis::failing());
    let mut workspace = open_workspace(Arc::default(), analysis.clone(), None).await;
    workspace.update_intake(intake("Unpaid overtime"));

    let err = workspace.analyze().await.unwrap_err();
    assert!(err.is_service_failure());
    assert_eq!(workspace.stage(), Stage::Intake);
    assert_eq!(workspace.case().intake.complaint, "Unpaid overtime");
    assert!(workspace.case().analysis.is_none());
    assert!(workspace.last_error().is_some());
}

#[tokio::test]
async fn test_malformed_analysis_commits_nothing() {
    let analysis = Arc::new(ScriptedAnalysis::replying(r#"{"statedAllegations": "many"}"#));
    let mut workspace = open_workspace(Arc::default(), analysis, None).await;
    workspace.update_intake(intake("X"));

    assert!(workspace.analyze().await.unwrap_err().is_service_failure());
    assert_eq!(workspace.stage(), Stage::Intake);
    assert!(workspace.case().analysis.is_none());
    assert_eq!(workspace.case().board.column_order, [UNCATEGORIZED_COLUMN_ID]);
}

#[tokio::test]
async fn test_blank_intake_blocks_analysis() {
    let analysis = Arc::new(ScriptedAnalysis::replying(RETALIATION_RESPONSE));
    let mut workspace = open_workspace(Arc::default(), analysis.clone(), None).await;

    assert!(workspace.analyze().await.unwrap_err().is_validation());
    assert_eq!(analysis.call_count(), 0);
    assert_eq!(workspace.stage(), Stage::Intake);
}

#[tokio::test]
async fn test_tabs_require_analysis() {
    let analysis = Arc::new(ScriptedAnalysis::replying(RETALIATION_RESPONSE));
    let mut workspace = open_workspace(Arc::default(), analysis, None).await;

    assert!(workspace.navigate(Stage::Evidence).is_err());

    workspace.update_intake(intake("X"));
    workspace.analyze().await.unwrap();
    workspace.navigate(Stage::Letter).unwrap();
    assert_eq!(workspace.stage(), Stage::Letter);
}

#[tokio::test]
async fn test_removing_evidence_clears_strategy_links() {
    let analysis = Arc::new(ScriptedAnalysis::replying(RETALIATION_RESPONSE));
    let mut workspace = open_workspace(Arc::default(), analysis, None).await;
    workspace.update_intake(intake("X"));
    workspace.analyze().await.unwrap();

    let id = workspace
        .add_evidence(
            EvidenceItem::new("", "Performance review", EvidenceType::Document),
            Some("allegation-0"),
        )
        .unwrap();
    workspace.link_evidence_to_strategy("s1", &id).unwrap();
    workspace
        .add_timeline_event("2024-03-01", "Review delivered", "", vec![id.clone()])
        .unwrap();

    workspace.remove_evidence(&id).unwrap();

    let case = workspace.case();
    assert!(!case.board.evidence.contains_key(&id));
    assert!(case.board.column_of(&id).is_none());
    let strategy = &case.analysis.as_ref().unwrap().response_strategies[0];
    assert!(strategy.evidence_to_gather.is_empty());
    assert_eq!(strategy.suggested_evidence, ["HR thread"]);
    assert!(case.timeline[0].evidence_ids.is_empty());
}

#[tokio::test]
async fn test_deleting_column_moves_cards_to_uncategorized() {
    let mut workspace =
        open_workspace(Arc::default(), Arc::new(ScriptedAnalysis::failing()), None).await;
    let column = workspace.add_column("Witnesses").unwrap();
    let a = workspace
        .add_evidence(EvidenceItem::new("", "A", EvidenceType::Statement), Some(&column))
        .unwrap();
    let b = workspace
        .add_evidence(EvidenceItem::new("", "B", EvidenceType::Statement), Some(&column))
        .unwrap();
    let loose = workspace
        .add_evidence(EvidenceItem::new("", "C", EvidenceType::Other), None)
        .unwrap();

    workspace.delete_column(&column).unwrap();
    let board = &workspace.case().board;
    assert!(!board.columns.contains_key(&column));
    assert!(!board.column_order.contains(&column));
    assert_eq!(board.columns[UNCATEGORIZED_COLUMN_ID].evidence_ids, [loose, a, b]);

    let err = workspace.delete_column(UNCATEGORIZED_COLUMN_ID).unwrap_err();
    assert!(matches!(err, CaseError::ReservedColumn(_)));
}

#[tokio::test]
async fn test_suggestion_success_and_failure_keep_notes() {
    let analysis = Arc::new(ScriptedAnalysis::failing());
    let mut workspace = open_workspace(Arc::default(), analysis.clone(), Some("Ask for the memo")).await;
    workspace.update_user_notes("investigation", "Check badge logs");

    workspace
        .request_suggestion("investigation", "Investigation", "{}")
        .await
        .unwrap();
    let entry = workspace.case().suggestions["investigation"].clone().unwrap();
    assert_eq!(entry.suggestion_text, "Investigation: Ask for the memo");
    assert_eq!(entry.user_notes, "Check badge logs");

    let mut offline = open_workspace(Arc::default(), analysis, None).await;
    offline.update_user_notes("letter", "Keep it short");
    let err = offline
        .request_suggestion("letter", "Letter", "{}")
        .await
        .unwrap_err();
    assert!(err.is_service_failure());
    let entry = offline.case().suggestions["letter"].clone().unwrap();
    assert!(entry.suggestion_text.is_empty());
    assert_eq!(entry.user_notes, "Keep it short");
}

#[tokio::test]
async fn test_discovery_results_merge_once() {
    let mut workspace =
        open_workspace(Arc::default(), Arc::new(ScriptedAnalysis::failing()), None).await;
    let report = ScanReport {
        items: vec![DiscoveredItem {
            external_id: "drive-42".to_string(),
            name: "Complaint.eml".to_string(),
            content: "From: HR".to_string(),
            category: "email".to_string(),
            relevance_type: "supporting".to_string(),
            justification: "acknowledges the complaint".to_string(),
            date: "2024-02-11".to_string(),
        }],
        processed: 1,
        total: 1,
        ..Default::default()
    };

    assert_eq!(workspace.apply_discovery(&report), 1);
    let after_first = workspace.case().board.clone();
    assert_eq!(workspace.apply_discovery(&report), 0);
    assert_eq!(workspace.case().board, after_first);
    assert_eq!(
        after_first.columns[UNCATEGORIZED_COLUMN_ID].evidence_ids,
        ["ext-drive-42"]
    );
}

#[tokio::test]
async fn test_clear_all_requires_two_confirmations() {
    let cache = Arc::new(MemoryCache::default());
    let analysis = Arc::new(ScriptedAnalysis::replying(RETALIATION_RESPONSE));
    let mut workspace = open_workspace(cache.clone(), analysis, None).await;
    workspace.update_intake(intake("X"));
    workspace.analyze().await.unwrap();

    assert!(workspace.confirm_clear().await.unwrap_err().is_validation());
    assert!(workspace.case().analysis.is_some());

    workspace.arm_clear();
    workspace.add_column("Late addition").unwrap();
    assert!(!workspace.is_clear_armed());
    assert!(workspace.confirm_clear().await.is_err());

    workspace.arm_clear();
    workspace.confirm_clear().await.unwrap();
    assert_eq!(workspace.stage(), Stage::Intake);
    assert_eq!(*workspace.case(), Default::default());
    assert!(cache.load().unwrap().is_none());
}

#[tokio::test]
async fn test_reanalysis_keeps_cards_and_links() {
    let analysis = Arc::new(ScriptedAnalysis::replying(RETALIATION_RESPONSE));
    let mut workspace = open_workspace(Arc::default(), analysis.clone(), None).await;
    workspace.update_intake(intake("X"));
    workspace.analyze().await.unwrap();

    let filed = workspace
        .add_evidence(
            EvidenceItem::new("", "Demotion letter", EvidenceType::Document),
            Some("allegation-0"),
        )
        .unwrap();
    let custom = workspace.add_column("Witnesses").unwrap();
    let witness = workspace
        .add_evidence(
            EvidenceItem::new("", "Coworker statement", EvidenceType::Statement),
            Some(&custom),
        )
        .unwrap();
    workspace
        .add_timeline_event("2024-03-01", "Demoted", "", vec![filed.clone(), witness.clone()])
        .unwrap();

    workspace.analyze().await.unwrap();
    assert_eq!(analysis.call_count(), 2);

    let case = workspace.case();
    assert!(collect_issues(case).is_empty());
    assert_eq!(case.board.columns["allegation-0"].evidence_ids, [filed.clone()]);
    assert_eq!(case.board.columns[UNCATEGORIZED_COLUMN_ID].evidence_ids, [witness.clone()]);
    assert!(!case.board.columns.contains_key(&custom));
    assert_eq!(case.timeline[0].evidence_ids, [filed, witness]);
}

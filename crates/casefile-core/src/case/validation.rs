//! Whole-case validation and load-time repair.

use std::collections::HashSet;

use super::model::{CaseData, MOOD_RATING_RANGE};
use crate::board::{check_board, repair_board};
use crate::error::{CaseError, Result, ValidationIssue};

/// Collects every invariant violation in `data` without short-circuiting.
pub fn collect_issues(data: &CaseData) -> Vec<ValidationIssue> {
    let mut issues = check_board(&data.board, "board");

    if let Some(analysis) = &data.analysis {
        let mut ids = HashSet::new();
        for (index, allegation) in analysis.stated_allegations.iter().enumerate() {
            if !ids.insert(allegation.id.as_str()) {
                issues.push(ValidationIssue::new(
                    format!("analysis.statedAllegations[{index}].id"),
                    format!("duplicate allegation id '{}'", allegation.id),
                ));
            }
        }

        let mut strategy_ids = HashSet::new();
        for (index, strategy) in analysis.response_strategies.iter().enumerate() {
            if !strategy_ids.insert(strategy.id.as_str()) {
                issues.push(ValidationIssue::new(
                    format!("analysis.responseStrategies[{index}].id"),
                    format!("duplicate strategy id '{}'", strategy.id),
                ));
            }
            for evidence_id in &strategy.evidence_to_gather {
                if !data.board.evidence.contains_key(evidence_id) {
                    issues.push(ValidationIssue::new(
                        format!("analysis.responseStrategies[{index}].evidenceToGather"),
                        format!("dangling evidence id '{evidence_id}'"),
                    ));
                }
            }
        }

        issues.extend(check_board(&analysis.board, "analysis.board"));
    }

    for (index, event) in data.timeline.iter().enumerate() {
        for evidence_id in &event.evidence_ids {
            if !data.board.evidence.contains_key(evidence_id) {
                issues.push(ValidationIssue::new(
                    format!("timeline[{index}].evidenceIds"),
                    format!("dangling evidence id '{evidence_id}'"),
                ));
            }
        }
    }

    for (index, entry) in data.mood_log.iter().enumerate() {
        if !MOOD_RATING_RANGE.contains(&entry.rating) {
            issues.push(ValidationIssue::new(
                format!("moodLog[{index}].rating"),
                format!("{} is outside 1..=5", entry.rating),
            ));
        }
    }

    issues
}

/// Returns the case unchanged when it satisfies every invariant.
pub fn validate_case_data(data: CaseData) -> Result<CaseData> {
    let issues = collect_issues(&data);
    if issues.is_empty() {
        Ok(data)
    } else {
        Err(CaseError::Validation(issues))
    }
}

/// Drops dangling references and restores board invariants.
///
/// Applied to every loaded case. Each repair is logged at `error` since it
/// means a persisted snapshot was corrupt.
pub fn repair_case_data(mut data: CaseData) -> (CaseData, Vec<String>) {
    let (board, mut repairs) = repair_board(std::mem::take(&mut data.board));
    data.board = board;

    if let Some(analysis) = data.analysis.as_mut() {
        let (analysis_board, analysis_repairs) = repair_board(std::mem::take(&mut analysis.board));
        analysis.board = analysis_board;
        repairs.extend(analysis_repairs.into_iter().map(|r| format!("analysis board: {r}")));

        for strategy in &mut analysis.response_strategies {
            let evidence = &data.board.evidence;
            strategy.evidence_to_gather.retain(|id| {
                let keep = evidence.contains_key(id);
                if !keep {
                    repairs.push(format!(
                        "dropped dangling evidence '{id}' from strategy '{}'",
                        strategy.id
                    ));
                }
                keep
            });
        }
    }

    for event in &mut data.timeline {
        let evidence = &data.board.evidence;
        event.evidence_ids.retain(|id| {
            let keep = evidence.contains_key(id);
            if !keep {
                repairs.push(format!(
                    "dropped dangling evidence '{id}' from timeline event '{}'",
                    event.id
                ));
            }
            keep
        });
    }

    let before = data.mood_log.len();
    data.mood_log.retain(|entry| MOOD_RATING_RANGE.contains(&entry.rating));
    if data.mood_log.len() != before {
        repairs.push(format!(
            "dropped {} mood entries with out-of-range ratings",
            before - data.mood_log.len()
        ));
    }

    for repair in &repairs {
        tracing::error!(repair = %repair, "Repaired corrupt case data");
    }
    (data, repairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{EvidenceItem, EvidenceType};
    use crate::case::analysis::{Allegation, AnalysisResult, ResponseStrategy};

    fn sample_case() -> CaseData {
        let mut analysis = AnalysisResult::from_allegations(vec![Allegation::new("a0", "Retaliation")]);
        analysis.response_strategies = vec![ResponseStrategy::new("s1", "Collect")];
        let mut case = CaseData::default().with_analysis(analysis);
        case.board.evidence.insert(
            "e1".into(),
            EvidenceItem::new("body", "", EvidenceType::Email).with_id("e1"),
        );
        case.board
            .columns
            .get_mut("uncategorized")
            .unwrap()
            .evidence_ids
            .push("e1".into());
        case
    }

    #[test]
    fn test_valid_case_passes() {
        let case = sample_case();
        assert_eq!(validate_case_data(case.clone()).unwrap(), case);
    }

    #[test]
    fn test_collects_all_issues() {
        let mut case = sample_case();
        case.board
            .columns
            .get_mut("allegation-0")
            .unwrap()
            .evidence_ids
            .push("e1".into());
        case.analysis.as_mut().unwrap().response_strategies[0]
            .evidence_to_gather
            .push("gone".into());
        case.analysis
            .as_mut()
            .unwrap()
            .stated_allegations
            .push(Allegation::new("a0", "Duplicate"));

        let err = validate_case_data(case).unwrap_err();
        let CaseError::Validation(issues) = err else {
            panic!("expected validation error");
        };
        assert!(issues.len() >= 3, "{issues:?}");
        assert!(issues.iter().any(|i| i.path.starts_with("analysis.responseStrategies[0]")));
        assert!(issues.iter().any(|i| i.message.contains("duplicate allegation id")));
    }

    #[test]
    fn test_repair_drops_dangling_references() {
        let mut case = sample_case();
        case.board
            .columns
            .get_mut("allegation-0")
            .unwrap()
            .evidence_ids
            .push("e1".into());
        case.analysis.as_mut().unwrap().response_strategies[0]
            .evidence_to_gather = vec!["e1".into(), "gone".into()];

        let (repaired, repairs) = repair_case_data(case);
        assert!(!repairs.is_empty());
        assert!(collect_issues(&repaired).is_empty());
        assert_eq!(
            repaired.analysis.unwrap().response_strategies[0].evidence_to_gather,
            ["e1"]
        );
        assert_eq!(repaired.board.columns["uncategorized"].evidence_ids, ["e1"]);
        assert!(repaired.board.columns["allegation-0"].evidence_ids.is_empty());
    }

    #[test]
    fn test_repair_of_valid_case_is_noop() {
        let case = sample_case();
        let (repaired, repairs) = repair_case_data(case.clone());
        assert!(repairs.is_empty());
        assert_eq!(repaired, case);
    }
}

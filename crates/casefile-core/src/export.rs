//! Stateless JSON and plain-text export of a case.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::case::CaseData;
use crate::error::Result;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExportSection {
    #[default]
    All,
    Board,
    Analysis,
    Timeline,
    Damages,
    Suggestions,
}

/// Pretty-printed JSON of the whole case or one section.
pub fn export_json(case: &CaseData, section: ExportSection) -> Result<String> {
    let json = match section {
        ExportSection::All => serde_json::to_string_pretty(case)?,
        ExportSection::Board => serde_json::to_string_pretty(&case.board)?,
        ExportSection::Analysis => serde_json::to_string_pretty(&case.analysis)?,
        ExportSection::Timeline => serde_json::to_string_pretty(&case.timeline)?,
        ExportSection::Damages => serde_json::to_string_pretty(&case.damages)?,
        ExportSection::Suggestions => serde_json::to_string_pretty(&case.suggestions)?,
    };
    Ok(json)
}

/// Plain-text case summary.
pub fn export_text(case: &CaseData) -> String {
    let mut out = String::new();

    section(&mut out, "INTAKE");
    field(&mut out, "Complaint", &case.intake.complaint);
    field(&mut out, "Job description", &case.intake.job_description);
    field(&mut out, "Duties", &case.intake.duties);
    field(&mut out, "Character profile", &case.intake.character_profile);
    field(&mut out, "Handbook reference", &case.intake.handbook_reference);

    if let Some(analysis) = &case.analysis {
        section(&mut out, "ALLEGATIONS");
        for (index, allegation) in analysis.stated_allegations.iter().enumerate() {
            let _ = writeln!(out, "{}. {}", index + 1, allegation.claim);
            if !allegation.summary.is_empty() {
                let _ = writeln!(out, "   {}", allegation.summary);
            }
        }

        if !analysis.response_strategies.is_empty() {
            section(&mut out, "STRATEGIES");
            for strategy in &analysis.response_strategies {
                let _ = writeln!(out, "- {}", strategy.title);
                for evidence_id in &strategy.evidence_to_gather {
                    let label = case
                        .board
                        .evidence
                        .get(evidence_id)
                        .map_or(evidence_id.as_str(), |e| e.description.as_str());
                    let _ = writeln!(out, "    * {label}");
                }
            }
        }
    }

    section(&mut out, "EVIDENCE BOARD");
    for column in case.board.ordered_columns() {
        let _ = writeln!(out, "[{}] ({})", column.title, column.evidence_ids.len());
        for evidence_id in &column.evidence_ids {
            if let Some(item) = case.board.evidence.get(evidence_id) {
                let _ = writeln!(
                    out,
                    "  - ({}) {}{}",
                    item.evidence_type,
                    item.description,
                    if item.date.is_empty() {
                        String::new()
                    } else {
                        format!(" [{}]", item.date)
                    }
                );
            }
        }
    }

    if !case.timeline.is_empty() {
        section(&mut out, "TIMELINE");
        for event in &case.timeline {
            let _ = writeln!(out, "{}  {}", event.date, event.title);
        }
    }

    if !case.damages.items.is_empty() {
        section(&mut out, "DAMAGES");
        for item in &case.damages.items {
            let _ = writeln!(out, "- {}: {}", item.category, format_cents(item.amount_cents));
        }
        let _ = writeln!(out, "Total: {}", format_cents(case.damages.total_cents()));
    }

    out
}

fn section(out: &mut String, title: &str) {
    if !out.is_empty() {
        out.push('\n');
    }
    let _ = writeln!(out, "== {title} ==");
}

fn field(out: &mut String, label: &str, value: &str) {
    if !value.trim().is_empty() {
        let _ = writeln!(out, "{label}: {}", value.trim());
    }
}

fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!("{sign}${}.{:02}", cents / 100, cents % 100)
}

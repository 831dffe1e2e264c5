use anyhow::Result;
use colored::Colorize;

use super::Context;

pub fn run(context: &Context) -> Result<()> {
    let persisted = context.read_case()?;
    let case = &persisted.case;

    println!("{} {}", "Stage:".bold(), persisted.stage.to_string().cyan());
    match case.last_saved_at {
        Some(at) => println!("{} {}", "Last saved:".bold(), at.to_rfc3339()),
        None => println!("{} {}", "Last saved:".bold(), "never".dimmed()),
    }

    let complaint = case.intake.complaint.trim();
    if complaint.is_empty() {
        println!("{} {}", "Complaint:".bold(), "(empty)".dimmed());
    } else {
        println!("{} {}", "Complaint:".bold(), complaint);
    }

    if let Some(analysis) = &case.analysis {
        println!(
            "{} {} allegations, {} strategies",
            "Analysis:".bold(),
            analysis.stated_allegations.len(),
            analysis.response_strategies.len()
        );
    } else {
        println!("{} {}", "Analysis:".bold(), "none".dimmed());
    }

    println!();
    println!("{} ({} cards)", "Evidence board".bold().underline(), case.board.card_count());
    for column in case.board.ordered_columns() {
        println!("  {} {}", column.title.yellow(), format!("({})", column.evidence_ids.len()).dimmed());
        for evidence_id in &column.evidence_ids {
            if let Some(item) = case.board.evidence.get(evidence_id) {
                println!("    - {} {}", format!("[{}]", item.evidence_type).green(), item.description);
            }
        }
    }

    println!();
    println!(
        "{} timeline {}, damages {}, mood {}, character {}, uploads {}, suggestions {}",
        "Modules:".bold(),
        case.timeline.len(),
        case.damages.items.len(),
        case.mood_log.len(),
        case.character_evidence.len(),
        case.uploaded_evidence.len(),
        case.suggestions.len()
    );

    Ok(())
}

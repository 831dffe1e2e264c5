use anyhow::Result;
use colored::Colorize;

use casefile_core::case::collect_issues;

use super::Context;

/// Reports invariant violations in the stored case, before any load-time repair.
pub fn run(context: &Context) -> Result<()> {
    let Some(blob) = context.read_blob()? else {
        println!("{}", "No case file stored".dimmed());
        return Ok(());
    };

    let persisted = context.codec.decode_unrepaired(&blob)?;
    let issues = collect_issues(&persisted.case);
    if issues.is_empty() {
        println!("{}", "✓ Case file is consistent".green());
        return Ok(());
    }

    println!("{}", format!("✗ {} issue(s) found:", issues.len()).red());
    for issue in &issues {
        println!("  {} {}", issue.path.yellow(), issue.message);
    }
    anyhow::bail!("case file failed validation")
}

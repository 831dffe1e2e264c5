use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result};
use colored::Colorize;

use casefile_core::export::{ExportSection, export_json, export_text};

use super::Context;
use crate::ExportFormat;

pub fn run(
    context: &Context,
    format: ExportFormat,
    section: ExportSection,
    output: Option<&Path>,
) -> Result<()> {
    let persisted = context.read_case()?;
    let rendered = match format {
        ExportFormat::Json => export_json(&persisted.case, section)?,
        ExportFormat::Text => {
            if section != ExportSection::All {
                tracing::warn!(section = %section, "Text export always covers the whole case");
            }
            export_text(&persisted.case)
        }
    };

    match output {
        Some(path) => {
            fs::write(path, &rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("{} {}", "✓ Exported to".green(), path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use casefile_core::export::ExportSection;

mod commands;

#[derive(Parser)]
#[command(name = "casefile")]
#[command(about = "Casefile CLI - inspect and maintain the cached case file", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config.toml (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show stage, counts and the evidence board
    Show,
    /// Check the stored case file for invariant violations
    Validate,
    /// Export the case as JSON or plain text
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,

        /// Section to export (json only): all, board, analysis, timeline, damages, suggestions
        #[arg(long, default_value_t = ExportSection::All)]
        section: ExportSection,

        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Erase the local and remote case file
    Clear {
        #[arg(long)]
        confirm: bool,

        #[arg(long)]
        confirm_again: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ExportFormat {
    Json,
    Text,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("casefile=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let context = commands::Context::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Show => commands::show::run(&context)?,
        Commands::Validate => commands::validate::run(&context)?,
        Commands::Export {
            format,
            section,
            output,
        } => commands::export::run(&context, format, section, output.as_deref())?,
        Commands::Clear {
            confirm,
            confirm_again,
        } => commands::clear::run(&context, confirm, confirm_again).await?,
    }

    Ok(())
}

//! yoke-recalc: re-run quality scoring for every session of a project.
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use yoke_cli::{recalculate_project, validate_project_name, RecalcOptions};
use yoke_core::YokeConfig;
use yoke_metrics::SqliteStore;
use yoke_quality::ScoringProfile;

/// Recalculate quality metrics for existing sessions
#[derive(Parser, Debug)]
#[command(name = "yoke-recalc")]
#[command(about = "Recalculate stored quality metrics from session logs")]
struct Args {
    /// Project name to recalculate
    #[arg(long, default_value = "claude_ai")]
    project: String,

    /// Directory holding `<project>/logs/` (defaults to the configured generations dir)
    #[arg(long)]
    generations_dir: Option<PathBuf>,

    /// SQLite database path (defaults to the configured database)
    #[arg(long)]
    database: Option<PathBuf>,

    /// Configuration file (defaults to .yokeflow.yaml in cwd, then home)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    validate_project_name(&args.project)?;

    let config = match &args.config {
        Some(path) => YokeConfig::load_from_file(path)?,
        None => YokeConfig::load_default()?,
    };

    let generations_dir = args
        .generations_dir
        .unwrap_or_else(|| PathBuf::from(&config.project.default_generations_dir));
    let database = args
        .database
        .unwrap_or_else(|| PathBuf::from(&config.database.database_url));

    let mut options = RecalcOptions::new(&args.project, generations_dir);
    options.profile = ScoringProfile::from_value(config.quality.as_ref())?;

    let store = SqliteStore::open(&database)
        .with_context(|| format!("cannot open database {}", database.display()))?;

    match recalculate_project(Arc::new(store), &options).await {
        Ok(report) => {
            tracing::info!(
                recorded = report.recorded.len(),
                skipped = report.skipped.len(),
                "done"
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!(project = %args.project, error = %e, "recalculation failed");
            Err(e)
        }
    }
}

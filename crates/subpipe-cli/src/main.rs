//! `subpipe` — incremental cleanse-and-merge batch job.
//!
//! Reads the raw student, career-path and job tables, appends any students
//! not yet processed to the aggregated table (quarantining incomplete rows),
//! then refreshes the CSV snapshot and the changelog.
//!
//! # Usage
//!
//! ```
//! subpipe --config subpipe.toml
//! subpipe --as-of 2024-06-15
//! ```

mod changelog;
mod export;
mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use chrono::{NaiveDate, Utc};
use clap::Parser;
use subpipe_core::pipeline::{self, RunOptions};
use subpipe_store_sqlite::{SqliteOutput, SqliteSource};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::PipelineConfig;

#[derive(Parser)]
#[command(author, version, about = "Incremental student data pipeline")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "subpipe.toml")]
  config: PathBuf,

  /// Compute ages as of this date instead of today (YYYY-MM-DD).
  #[arg(long, value_name = "DATE")]
  as_of: Option<NaiveDate>,

  /// Print the run report as JSON on stdout.
  #[arg(long)]
  json: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = PipelineConfig::load(&cli.config)?;
  let opts = RunOptions { as_of: cli.as_of.unwrap_or_else(|| Utc::now().date_naive()) };

  tracing::info!(as_of = %opts.as_of, source = ?cfg.source_path, "starting run");

  let source = SqliteSource::open(&cfg.source_path)
    .await
    .with_context(|| format!("failed to open source at {:?}", cfg.source_path))?;

  if let Some(parent) = cfg.output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }
  let output = SqliteOutput::open(&cfg.output_path)
    .await
    .with_context(|| format!("failed to open output at {:?}", cfg.output_path))?;

  let report = match pipeline::run(&source, &output, opts).await {
    Ok(report) => report,
    Err(e) => {
      tracing::error!(integrity = e.is_integrity(), "run aborted: {e}");
      return Err(e).context("pipeline run failed");
    }
  };

  if let Some(snapshot) = &report.snapshot {
    export::write_snapshot(&cfg.export_path, snapshot)?;
  }

  if report.has_changes() {
    let revision =
      changelog::prepend_entry(&cfg.changelog_path, report.aggregated_added, report.quarantined_added)
        .with_context(|| format!("failed to update {}", cfg.changelog_path.display()))?;
    tracing::info!(
      revision,
      aggregated = report.aggregated_added,
      quarantined = report.quarantined_added,
      "run complete"
    );
  } else {
    tracing::info!("no new data");
  }

  if cli.json {
    println!("{}", serde_json::to_string_pretty(&report)?);
  }

  Ok(())
}

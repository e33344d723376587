//! Chart-export ingestion command.

use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::Args;
use songtrend_collector::ChartEntry;
use songtrend_core::AppConfig;
use sqlx::SqlitePool;

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Path to the chart export JSON (an array of chart entries)
    #[arg(long)]
    pub file: PathBuf,

    /// Chart source, e.g. tiktok or youtube
    #[arg(long)]
    pub source: String,

    /// Chart category within the source
    #[arg(long, default_value = "popular")]
    pub category: String,

    /// Chart date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

/// Read a chart export file and ingest it for one `(source, category, date)`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if any entry's
/// database writes fail.
pub(crate) async fn run(
    pool: &SqlitePool,
    config: &AppConfig,
    args: IngestArgs,
) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let entries: Vec<ChartEntry> =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", args.file.display()))?;
    let date = args.date.unwrap_or_else(|| Utc::now().date_naive());

    let stats = songtrend_collector::ingest_chart_entries(
        pool,
        &args.source,
        &args.category,
        date,
        &entries,
        config.chart_tag_policy(),
    )
    .await?;

    println!(
        "ingested {} snapshots for {}/{} on {date} ({} trending, {} new hits)",
        stats.snapshots, args.source, args.category, stats.trending, stats.new_hits
    );
    Ok(())
}

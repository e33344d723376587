//! Chart-movement report against the previous day's snapshots.

use chrono::{NaiveDate, Utc};
use clap::Args;
use songtrend_db::RankDeltaRow;
use sqlx::SqlitePool;

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Report date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

/// Print each chart's entries with their rank and view movement.
///
/// # Errors
///
/// Returns an error if the delta query fails.
pub(crate) async fn run(pool: &SqlitePool, args: ReportArgs) -> anyhow::Result<()> {
    let date = args.date.unwrap_or_else(|| Utc::now().date_naive());
    let rows = songtrend_db::rank_delta(pool, date).await?;

    if rows.is_empty() {
        println!("no chart snapshots for {date}");
        return Ok(());
    }

    println!("chart movement for {date}");
    let mut section: Option<(String, String)> = None;
    for row in rows {
        let key = (row.source.clone(), row.category.clone());
        if section.as_ref() != Some(&key) {
            println!("\n{}/{}", key.0, key.1);
            section = Some(key);
        }
        println!(
            "{:>4}. [{:>4}] {} - {}{}",
            row.rank,
            movement(&row),
            row.artist,
            row.title,
            views(&row)
        );
    }

    Ok(())
}

fn movement(row: &RankDeltaRow) -> String {
    match row.previous_rank {
        None => "NEW".to_owned(),
        Some(prev) if prev > row.rank => format!("+{}", prev - row.rank),
        Some(prev) if prev < row.rank => format!("-{}", row.rank - prev),
        Some(_) => "=".to_owned(),
    }
}

fn views(row: &RankDeltaRow) -> String {
    match (row.daily_view_count, row.previous_daily_view_count) {
        (Some(now), Some(prev)) => format!("  ({now} daily views, {:+})", now - prev),
        (Some(now), None) => format!("  ({now} daily views)"),
        _ => String::new(),
    }
}

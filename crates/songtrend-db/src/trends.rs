//! Database operations for the `daily_trends` fact table.

use chrono::{Days, NaiveDate, Utc};
use sqlx::SqlitePool;

use crate::DbError;

/// Input to [`upsert_snapshot`]: one song's rank and metrics within one
/// `(source, category)` on one calendar date.
///
/// `metrics` is the legacy free-form blob; the structured view-count fields
/// duplicate values derivable from it during the schema-transition window.
/// Readers should prefer the structured columns.
#[derive(Debug, Clone)]
pub struct NewTrendSnapshot {
    pub song_id: i64,
    pub source: String,
    pub category: String,
    pub rank: i64,
    pub metrics: Option<serde_json::Value>,
    pub daily_view_count: Option<i64>,
    pub weekly_view_count: Option<i64>,
    pub engagement_rate: Option<f64>,
    pub date: NaiveDate,
}

impl NewTrendSnapshot {
    #[must_use]
    pub fn new(
        song_id: i64,
        source: impl Into<String>,
        category: impl Into<String>,
        rank: i64,
        date: NaiveDate,
    ) -> Self {
        Self {
            song_id,
            source: source.into(),
            category: category.into(),
            rank,
            metrics: None,
            daily_view_count: None,
            weekly_view_count: None,
            engagement_rate: None,
            date,
        }
    }

    #[must_use]
    pub fn for_today(
        song_id: i64,
        source: impl Into<String>,
        category: impl Into<String>,
        rank: i64,
    ) -> Self {
        Self::new(song_id, source, category, rank, Utc::now().date_naive())
    }
}

/// A row from the `daily_trends` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrendRow {
    pub id: i64,
    pub song_id: i64,
    pub source: String,
    pub category: String,
    pub rank: i64,
    pub metrics: Option<String>,
    pub daily_view_count: Option<i64>,
    pub weekly_view_count: Option<i64>,
    pub engagement_rate: Option<f64>,
    pub date: NaiveDate,
}

impl TrendRow {
    /// Parses the legacy metrics blob, if present and valid JSON.
    #[must_use]
    pub fn metrics_value(&self) -> Option<serde_json::Value> {
        self.metrics
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
    }
}

/// One song's rank/view movement between a date and the preceding day.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RankDeltaRow {
    pub song_id: i64,
    pub title: String,
    pub artist: String,
    pub source: String,
    pub category: String,
    pub rank: i64,
    /// `None` when the song was not ranked the previous day (a new entry).
    pub previous_rank: Option<i64>,
    pub daily_view_count: Option<i64>,
    pub previous_daily_view_count: Option<i64>,
}

/// Writes or overwrites the snapshot row for
/// `(song_id, source, category, date)`.
///
/// Re-ingesting the same day's data replaces the row in place; rows for
/// other dates are never touched, so history accumulates one row per day.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails (including a foreign-key
/// violation for an unknown `song_id`).
pub async fn upsert_snapshot(pool: &SqlitePool, snapshot: &NewTrendSnapshot) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO daily_trends \
             (song_id, source, category, rank, metrics, \
              daily_view_count, weekly_view_count, engagement_rate, date) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT (song_id, source, category, date) DO UPDATE SET \
             rank              = excluded.rank, \
             metrics           = excluded.metrics, \
             daily_view_count  = excluded.daily_view_count, \
             weekly_view_count = excluded.weekly_view_count, \
             engagement_rate   = excluded.engagement_rate",
    )
    .bind(snapshot.song_id)
    .bind(&snapshot.source)
    .bind(&snapshot.category)
    .bind(snapshot.rank)
    .bind(snapshot.metrics.as_ref().map(ToString::to_string))
    .bind(snapshot.daily_view_count)
    .bind(snapshot.weekly_view_count)
    .bind(snapshot.engagement_rate)
    .bind(snapshot.date)
    .execute(pool)
    .await?;

    Ok(())
}

/// Fetches the snapshot row for `(song_id, source, category, date)`, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_snapshot(
    pool: &SqlitePool,
    song_id: i64,
    source: &str,
    category: &str,
    date: NaiveDate,
) -> Result<Option<TrendRow>, DbError> {
    let row = sqlx::query_as::<_, TrendRow>(
        "SELECT id, song_id, source, category, rank, metrics, \
                daily_view_count, weekly_view_count, engagement_rate, date \
         FROM daily_trends \
         WHERE song_id = ? AND source = ? AND category = ? AND date = ?",
    )
    .bind(song_id)
    .bind(source)
    .bind(category)
    .bind(date)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns all snapshot rows for a date, ordered by source, category, rank.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn snapshots_for_date(
    pool: &SqlitePool,
    date: NaiveDate,
) -> Result<Vec<TrendRow>, DbError> {
    let rows = sqlx::query_as::<_, TrendRow>(
        "SELECT id, song_id, source, category, rank, metrics, \
                daily_view_count, weekly_view_count, engagement_rate, date \
         FROM daily_trends \
         WHERE date = ? \
         ORDER BY source, category, rank",
    )
    .bind(date)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Joins a date's snapshots against the preceding day's, yielding per-song
/// rank and view-count movement for trend-delta reporting.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn rank_delta(pool: &SqlitePool, date: NaiveDate) -> Result<Vec<RankDeltaRow>, DbError> {
    let previous_date = date
        .checked_sub_days(Days::new(1))
        .unwrap_or(NaiveDate::MIN);

    let rows = sqlx::query_as::<_, RankDeltaRow>(
        "SELECT t.song_id, s.title, s.artist, t.source, t.category, t.rank, \
                y.rank AS previous_rank, \
                t.daily_view_count, \
                y.daily_view_count AS previous_daily_view_count \
         FROM daily_trends t \
         JOIN songs s ON s.id = t.song_id \
         LEFT JOIN daily_trends y \
             ON y.song_id = t.song_id \
            AND y.source = t.source \
            AND y.category = t.category \
            AND y.date = ? \
         WHERE t.date = ? \
         ORDER BY t.source, t.category, t.rank",
    )
    .bind(previous_date)
    .bind(date)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

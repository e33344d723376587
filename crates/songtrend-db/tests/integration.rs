//! Store-layer property tests against an in-memory SQLite database.
//!
//! SQLite gives each pooled connection its own `:memory:` database, so these
//! pools are pinned to a single connection.

use chrono::{Days, NaiveDate, Utc};
use serde_json::json;
use songtrend_core::{NewSong, Platform};
use songtrend_db::NewTrendSnapshot;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

async fn memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("memory URL is valid")
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("connect to in-memory sqlite");
    songtrend_db::run_migrations(&pool)
        .await
        .expect("migrations apply cleanly");
    pool
}

async fn seed_song(pool: &SqlitePool, title: &str, artist: &str) -> i64 {
    songtrend_db::resolve_or_create(pool, &NewSong::new(title, artist))
        .await
        .expect("seed song")
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[tokio::test]
async fn migrations_apply_once() {
    let pool = memory_pool().await;
    // Second run is a no-op.
    let applied = songtrend_db::run_migrations(&pool).await.unwrap();
    assert_eq!(applied, 0);
    songtrend_db::health_check(&pool).await.unwrap();
}

#[tokio::test]
async fn resolve_or_create_is_idempotent() {
    let pool = memory_pool().await;

    let first = seed_song(&pool, "Song A", "Artist X").await;
    let second = seed_song(&pool, "Song A", "Artist X").await;
    assert_eq!(first, second);

    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM songs WHERE title = ? AND artist = ?")
            .bind("Song A")
            .bind("Artist X")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn title_artist_match_is_case_sensitive() {
    let pool = memory_pool().await;

    let lower = seed_song(&pool, "song a", "artist x").await;
    let upper = seed_song(&pool, "Song A", "Artist X").await;
    assert_ne!(lower, upper);
}

#[tokio::test]
async fn unspecified_approval_is_stored_as_false_not_null() {
    let pool = memory_pool().await;

    let mut song = NewSong::new("Song A", "Artist X");
    song.is_approved = None;
    let id = songtrend_db::resolve_or_create(&pool, &song).await.unwrap();

    // Plain boolean comparison must see the row — no three-valued logic.
    let not_approved: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM songs WHERE id = ? AND is_approved = 0")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(not_approved, 1);

    let row = songtrend_db::get_song(&pool, id).await.unwrap().unwrap();
    assert!(!row.is_approved);
}

#[tokio::test]
async fn resolve_keeps_first_observation_on_conflict() {
    let pool = memory_pool().await;

    let mut first = NewSong::new("Song A", "Artist X");
    first.tiktok_id = Some("7001".to_owned());
    let id = songtrend_db::resolve_or_create(&pool, &first).await.unwrap();

    let mut second = NewSong::new("Song A", "Artist X");
    second.tiktok_id = Some("9999".to_owned());
    let same_id = songtrend_db::resolve_or_create(&pool, &second)
        .await
        .unwrap();

    assert_eq!(id, same_id);
    let row = songtrend_db::get_song(&pool, id).await.unwrap().unwrap();
    assert_eq!(row.tiktok_id.as_deref(), Some("7001"));
}

#[tokio::test]
async fn update_ugc_counts_updates_provided_counters() {
    let pool = memory_pool().await;
    let id = seed_song(&pool, "Song A", "Artist X").await;

    let updated = songtrend_db::update_ugc_counts(&pool, id, Some(1_000), Some(2_000))
        .await
        .unwrap();
    assert!(updated);

    let row = songtrend_db::get_song(&pool, id).await.unwrap().unwrap();
    assert_eq!(row.youtube_ugc_count, Some(1_000));
    assert_eq!(row.tiktok_ugc_count, Some(2_000));
    assert!(row.ugc_last_updated.is_some());
}

#[tokio::test]
async fn zero_count_never_downgrades_a_known_good_value() {
    let pool = memory_pool().await;
    let id = seed_song(&pool, "Song A", "Artist X").await;

    songtrend_db::update_ugc_counts(&pool, id, None, Some(5_000))
        .await
        .unwrap();

    // A failed scrape reports zero; the stored value must survive.
    let updated = songtrend_db::update_ugc_counts(&pool, id, None, Some(0))
        .await
        .unwrap();
    assert!(!updated);

    let row = songtrend_db::get_song(&pool, id).await.unwrap().unwrap();
    assert_eq!(row.tiktok_ugc_count, Some(5_000));
}

#[tokio::test]
async fn update_ugc_counts_reports_missing_song() {
    let pool = memory_pool().await;

    let updated = songtrend_db::update_ugc_counts(&pool, 404, Some(10), None)
        .await
        .unwrap();
    assert!(!updated);
}

#[tokio::test]
async fn update_tags_requires_at_least_one_flag() {
    let pool = memory_pool().await;
    seed_song(&pool, "Song A", "Artist X").await;

    let updated = songtrend_db::update_tags(&pool, "Song A", "Artist X", None, None)
        .await
        .unwrap();
    assert!(!updated);

    let updated = songtrend_db::update_tags(&pool, "Song A", "Artist X", Some(true), None)
        .await
        .unwrap();
    assert!(updated);

    let songs = songtrend_db::list_by_platform(&pool, Platform::Both)
        .await
        .unwrap();
    assert!(songs.is_empty(), "song has no platform ids");
}

#[tokio::test]
async fn list_by_platform_filters_on_platform_ids() {
    let pool = memory_pool().await;

    let mut yt = NewSong::new("YT Song", "Artist");
    yt.youtube_id = Some("y1".to_owned());
    let yt_id = songtrend_db::resolve_or_create(&pool, &yt).await.unwrap();

    let mut tt = NewSong::new("TT Song", "Artist");
    tt.tiktok_id = Some("t1".to_owned());
    let tt_id = songtrend_db::resolve_or_create(&pool, &tt).await.unwrap();

    // Empty-string ids do not count as present.
    let mut blank = NewSong::new("Blank Song", "Artist");
    blank.youtube_id = Some(String::new());
    songtrend_db::resolve_or_create(&pool, &blank).await.unwrap();

    let youtube = songtrend_db::list_by_platform(&pool, Platform::Youtube)
        .await
        .unwrap();
    assert_eq!(
        youtube.iter().map(|s| s.id).collect::<Vec<_>>(),
        vec![yt_id]
    );

    let tiktok = songtrend_db::list_by_platform(&pool, Platform::Tiktok)
        .await
        .unwrap();
    assert_eq!(tiktok.iter().map(|s| s.id).collect::<Vec<_>>(), vec![tt_id]);

    let both = songtrend_db::list_by_platform(&pool, Platform::Both)
        .await
        .unwrap();
    assert_eq!(
        both.iter().map(|s| s.id).collect::<Vec<_>>(),
        vec![yt_id, tt_id]
    );
}

#[tokio::test]
async fn upsert_snapshot_overwrites_same_day_row() {
    let pool = memory_pool().await;
    let id = seed_song(&pool, "Song A", "Artist X").await;

    let mut snapshot = NewTrendSnapshot::new(id, "tiktok", "popular", 3, today());
    snapshot.daily_view_count = Some(1_000);
    songtrend_db::upsert_snapshot(&pool, &snapshot).await.unwrap();

    snapshot.rank = 1;
    snapshot.daily_view_count = Some(2_000);
    songtrend_db::upsert_snapshot(&pool, &snapshot).await.unwrap();

    let rows = songtrend_db::snapshots_for_date(&pool, today()).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].rank, 1);
    assert_eq!(rows[0].daily_view_count, Some(2_000));
}

#[tokio::test]
async fn snapshots_for_prior_dates_are_retained() {
    let pool = memory_pool().await;
    let id = seed_song(&pool, "Song A", "Artist X").await;

    let yesterday = today().checked_sub_days(Days::new(1)).unwrap();
    let old = NewTrendSnapshot::new(id, "tiktok", "popular", 9, yesterday);
    songtrend_db::upsert_snapshot(&pool, &old).await.unwrap();

    let new = NewTrendSnapshot::new(id, "tiktok", "popular", 2, today());
    songtrend_db::upsert_snapshot(&pool, &new).await.unwrap();

    let old_row = songtrend_db::get_snapshot(&pool, id, "tiktok", "popular", yesterday)
        .await
        .unwrap()
        .expect("yesterday's row survives");
    assert_eq!(old_row.rank, 9);
}

#[tokio::test]
async fn structured_columns_match_legacy_metrics_blob() {
    let pool = memory_pool().await;
    let id = seed_song(&pool, "Song A", "Artist X").await;

    // Transition-window dual write: blob and structured columns carry the
    // same values.
    let mut snapshot = NewTrendSnapshot::new(id, "youtube", "shorts", 1, today());
    snapshot.daily_view_count = songtrend_core::parse_metric("1.2M");
    snapshot.weekly_view_count = songtrend_core::parse_metric("8.4M");
    snapshot.metrics = Some(json!({
        "daily_views": "1.2M",
        "weekly_views": "8.4M",
    }));
    songtrend_db::upsert_snapshot(&pool, &snapshot).await.unwrap();

    let row = songtrend_db::get_snapshot(&pool, id, "youtube", "shorts", today())
        .await
        .unwrap()
        .unwrap();
    let blob = row.metrics_value().expect("blob is valid JSON");

    assert_eq!(
        row.daily_view_count,
        songtrend_core::parse_metric(blob["daily_views"].as_str().unwrap())
    );
    assert_eq!(
        row.weekly_view_count,
        songtrend_core::parse_metric(blob["weekly_views"].as_str().unwrap())
    );
}

#[tokio::test]
async fn rank_delta_reports_movement_and_new_entries() {
    let pool = memory_pool().await;
    let riser = seed_song(&pool, "Riser", "Artist").await;
    let debut = seed_song(&pool, "Debut", "Artist").await;

    let yesterday = today().checked_sub_days(Days::new(1)).unwrap();
    songtrend_db::upsert_snapshot(&pool, &NewTrendSnapshot::new(riser, "tiktok", "popular", 8, yesterday))
        .await
        .unwrap();
    songtrend_db::upsert_snapshot(&pool, &NewTrendSnapshot::new(riser, "tiktok", "popular", 2, today()))
        .await
        .unwrap();
    songtrend_db::upsert_snapshot(&pool, &NewTrendSnapshot::new(debut, "tiktok", "popular", 5, today()))
        .await
        .unwrap();

    let deltas = songtrend_db::rank_delta(&pool, today()).await.unwrap();
    assert_eq!(deltas.len(), 2);

    let riser_row = deltas.iter().find(|d| d.song_id == riser).unwrap();
    assert_eq!(riser_row.rank, 2);
    assert_eq!(riser_row.previous_rank, Some(8));

    let debut_row = deltas.iter().find(|d| d.song_id == debut).unwrap();
    assert_eq!(debut_row.previous_rank, None);
}

#[tokio::test]
async fn replace_top_hashtags_is_a_full_daily_replace() {
    let pool = memory_pool().await;
    let id = seed_song(&pool, "Song A", "Artist X").await;

    let first = vec![("dance".to_owned(), 30), ("music".to_owned(), 20)];
    songtrend_db::replace_top_hashtags(&pool, id, today(), &first)
        .await
        .unwrap();

    let second = vec![
        ("viral".to_owned(), 50),
        ("dance".to_owned(), 10),
        ("trend".to_owned(), 5),
    ];
    songtrend_db::replace_top_hashtags(&pool, id, today(), &second)
        .await
        .unwrap();

    let rows = songtrend_db::hashtags_for_song_on(&pool, id, today())
        .await
        .unwrap();
    let tags: Vec<(&str, i64, i64)> = rows
        .iter()
        .map(|r| (r.hashtag.as_str(), r.count, r.rank))
        .collect();
    assert_eq!(
        tags,
        vec![("viral", 50, 1), ("dance", 10, 2), ("trend", 5, 3)]
    );
}

#[tokio::test]
async fn replacing_today_leaves_other_days_untouched() {
    let pool = memory_pool().await;
    let id = seed_song(&pool, "Song A", "Artist X").await;

    let yesterday = today().checked_sub_days(Days::new(1)).unwrap();
    songtrend_db::replace_top_hashtags(&pool, id, yesterday, &[("old".to_owned(), 7)])
        .await
        .unwrap();
    songtrend_db::replace_top_hashtags(&pool, id, today(), &[("new".to_owned(), 9)])
        .await
        .unwrap();

    let old_rows = songtrend_db::hashtags_for_song_on(&pool, id, yesterday)
        .await
        .unwrap();
    assert_eq!(old_rows.len(), 1);
    assert_eq!(old_rows[0].hashtag, "old");
}

#[tokio::test]
async fn hashtags_for_unknown_song_fail_on_foreign_key() {
    let pool = memory_pool().await;

    let result =
        songtrend_db::replace_top_hashtags(&pool, 404, today(), &[("tag".to_owned(), 1)]).await;
    assert!(result.is_err());
}

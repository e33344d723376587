use std::path::PathBuf;

use crate::chart::ChartTagPolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Progress artifact written between batches; enables resume.
    pub checkpoint_path: PathBuf,
    /// External scraper command invoked per song with the platform URL
    /// appended. The command must print a JSON fetch result on stdout.
    pub fetch_command: Option<String>,
    pub collector_batch_size: usize,
    pub collector_max_retries: u32,
    pub collector_per_song_timeout_secs: u64,
    pub collector_inter_song_delay_secs: u64,
    pub collector_inter_batch_rest_secs: u64,
    pub collector_retry_backoff_base_secs: u64,
    pub trending_rank_jump: i64,
}

impl AppConfig {
    #[must_use]
    pub fn chart_tag_policy(&self) -> ChartTagPolicy {
        ChartTagPolicy {
            trending_rank_jump: self.trending_rank_jump,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &"[redacted]")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("checkpoint_path", &self.checkpoint_path)
            .field("fetch_command", &self.fetch_command)
            .field("collector_batch_size", &self.collector_batch_size)
            .field("collector_max_retries", &self.collector_max_retries)
            .field(
                "collector_per_song_timeout_secs",
                &self.collector_per_song_timeout_secs,
            )
            .field(
                "collector_inter_song_delay_secs",
                &self.collector_inter_song_delay_secs,
            )
            .field(
                "collector_inter_batch_rest_secs",
                &self.collector_inter_batch_rest_secs,
            )
            .field(
                "collector_retry_backoff_base_secs",
                &self.collector_retry_backoff_base_secs,
            )
            .field("trending_rank_jump", &self.trending_rank_jump)
            .finish()
    }
}

use thiserror::Error;

use crate::app_config::{AppConfig, Environment};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual
/// environment so it can be tested with a pure `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_owned()))
    };

    let or_default =
        |var: &str, default: &str| -> String { lookup(var).unwrap_or_else(|_| default.to_owned()) };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_owned(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_i64 = |var: &str, default: &str| -> Result<i64, ConfigError> {
        or_default(var, default)
            .parse::<i64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("SONGTREND_ENV", "development"));
    let log_level = or_default("SONGTREND_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("SONGTREND_DB_MAX_CONNECTIONS", "5")?;
    let db_acquire_timeout_secs = parse_u64("SONGTREND_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let checkpoint_path = PathBuf::from(or_default(
        "SONGTREND_CHECKPOINT_PATH",
        "./data/collect_progress.json",
    ));
    let fetch_command = lookup("SONGTREND_FETCH_COMMAND").ok();

    let collector_batch_size = parse_usize("SONGTREND_BATCH_SIZE", "12")?;
    let collector_max_retries = parse_u32("SONGTREND_MAX_RETRIES", "3")?;
    let collector_per_song_timeout_secs = parse_u64("SONGTREND_PER_SONG_TIMEOUT_SECS", "180")?;
    let collector_inter_song_delay_secs = parse_u64("SONGTREND_INTER_SONG_DELAY_SECS", "2")?;
    let collector_inter_batch_rest_secs = parse_u64("SONGTREND_INTER_BATCH_REST_SECS", "5")?;
    let collector_retry_backoff_base_secs = parse_u64("SONGTREND_RETRY_BACKOFF_BASE_SECS", "2")?;

    let trending_rank_jump = parse_i64("SONGTREND_TRENDING_RANK_JUMP", "5")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        db_max_connections,
        db_acquire_timeout_secs,
        checkpoint_path,
        fetch_command,
        collector_batch_size,
        collector_max_retries,
        collector_per_song_timeout_secs,
        collector_inter_song_delay_secs,
        collector_inter_batch_rest_secs,
        collector_retry_backoff_base_secs,
        trending_rank_jump,
    })
}

fn parse_environment(raw: &str) -> Environment {
    match raw.to_ascii_lowercase().as_str() {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

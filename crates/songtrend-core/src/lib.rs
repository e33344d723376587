pub mod app_config;
pub mod chart;
mod config;
pub mod hashtags;
pub mod metrics;
mod types;

pub use app_config::{AppConfig, Environment};
pub use chart::{analyze_chart_position, ChartTagPolicy, ChartTags};
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
pub use hashtags::{rank_hashtags, DEFAULT_NOISE_TAGS, TOP_HASHTAG_LIMIT};
pub use metrics::parse_metric;
pub use types::{NewSong, Platform, PlatformParseError};

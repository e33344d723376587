mod collect;
mod ingest;
mod report;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "songtrend")]
#[command(about = "Music trend and UGC engagement pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations and exit
    Migrate,
    /// Collect per-song UGC metrics from the platforms
    Collect {
        #[command(subcommand)]
        command: collect::CollectCommands,
    },
    /// Ingest a scraped chart export into the trend tables
    Ingest(ingest::IngestArgs),
    /// Show chart movement against the previous day
    Report(report::ReportArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = songtrend_core::load_app_config_from_env()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    tracing::debug!(?config, "configuration loaded");

    let pool = songtrend_db::connect_pool(
        &config.database_url,
        songtrend_db::PoolConfig::from_app_config(&config),
    )
    .await?;
    let applied = songtrend_db::run_migrations(&pool).await?;
    if applied > 0 {
        tracing::info!(applied, "applied pending migrations");
    }

    match cli.command {
        Commands::Migrate => println!("database is up to date ({applied} migrations applied)"),
        Commands::Collect { command } => collect::run(&pool, &config, command).await?,
        Commands::Ingest(args) => ingest::run(&pool, &config, args).await?,
        Commands::Report(args) => report::run(&pool, args).await?,
    }

    Ok(())
}

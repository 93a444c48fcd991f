/// Soundboard - manage boards and sounds from the command line
use clap::Parser;
use soundboard_cli::{execute, AppConfig, Command};
use soundboard_core::types::BoardId;
use soundboard_files::{HttpSoundFetcher, SoundFileStore};
use soundboard_state::{BoardEvent, BoardManager};
use soundboard_storage::SqliteStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "soundboard")]
#[command(about = "Organize sound clips into boards", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "SOUNDBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Select this board before running the command
    #[arg(short, long)]
    board: Option<i64>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "soundboard=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?;
    config.validate()?;

    // Initialize database
    let pool = soundboard_storage::create_pool(&config.storage.database_url).await?;
    soundboard_storage::run_migrations(&pool).await?;
    let store = Arc::new(SqliteStore::new(pool));
    tracing::debug!(database_url = %config.storage.database_url, "Database connected");

    let files = Arc::new(SoundFileStore::new(
        config.storage.sounds_directory.clone(),
        store.clone(),
    ));
    let fetcher = Arc::new(HttpSoundFetcher::new()?);

    let manager = BoardManager::new(config.manager_config(), store, files, fetcher);
    let mut events = manager.subscribe();

    let report = manager.load().await?;
    if report.changed() {
        tracing::info!(
            recovered = report.recovered.len(),
            dropped = report.dropped.len(),
            "Repaired sound references"
        );
    }

    if let Some(board) = cli.board {
        if !manager.switch_board(BoardId::new(board)).await? {
            anyhow::bail!("No board with id {board}");
        }
    }

    let mut stdout = std::io::stdout().lock();
    execute(&manager, cli.command, &mut stdout).await?;

    while let Ok(event) = events.try_recv() {
        if let BoardEvent::PersistenceFailed { key, reason } = event {
            tracing::error!(key = %key, reason = %reason, "Changes may not have been saved");
        }
    }

    Ok(())
}

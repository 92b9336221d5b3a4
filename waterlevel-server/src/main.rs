use std::env;
use std::error::Error;

use tracing::info;
use tracing_subscriber::EnvFilter;

use waterlevel_server::board::StationBoard;
use waterlevel_server::cache::{CacheManager, FileStore};
use waterlevel_server::config::AppConfig;
use waterlevel_server::coordinator::RefreshCoordinator;
use waterlevel_server::feed::{FeedClient, Fetcher};
use waterlevel_server::scheduler::run_refresh_loop;
use waterlevel_server::web::{AppState, create_router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    // Fail fast on bad configuration
    let config = AppConfig::from_env()?;
    config.log_config();

    let client = FeedClient::new(config.feed.clone())?;
    let fetcher = Fetcher::new(client, config.retry.clone());
    let cache = CacheManager::new(FileStore::new(&config.cache_path), config.cache.clone());

    let mut coordinator = RefreshCoordinator::new(fetcher, cache);
    if !coordinator.load_cache() {
        info!("No usable cached data, starting empty");
    }

    let board = StationBoard::new(coordinator.url());

    // First tick is immediate
    tokio::spawn(run_refresh_loop(
        coordinator,
        config.update_interval(),
        board.clone(),
    ));

    let app = create_router(AppState::new(board));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Water level server listening on http://{}", config.bind_addr);
    info!("API Endpoints:");
    info!("  GET  /health                               - Health check");
    info!("  GET  /api/status                           - Feed status");
    info!("  GET  /api/stations                         - All stations");
    info!("  GET  /api/stations/:id                     - One station");
    info!("  GET  /api/stations/:id/sensors/:sensor     - One sensor reading");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Install the global tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise `WATERLEVEL_LOG_LEVEL` (default `info`).
fn init_tracing() {
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("WATERLEVEL_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "info",
        };
        EnvFilter::new(level)
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_env_filter(env_filter)
        .init();
}

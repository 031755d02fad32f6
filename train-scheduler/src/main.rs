use tracing::info;
use tracing_subscriber::EnvFilter;

use train_scheduler::config::Config;
use train_scheduler::store::MemoryStore;
use train_scheduler::web::{AppState, create_router};

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "train_scheduler=info,tower_http=info";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = Config::from_env()?;
    let addr = config.bind_addr;
    info!(
        policy = ?config.status_policy,
        default_page_limit = config.default_page_limit,
        max_page_limit = config.max_page_limit,
        "configuration loaded"
    );

    let state = AppState::new(MemoryStore::new(), config);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("train scheduler listening on http://{addr}");
    info!("  GET  /health");
    info!("  *    /api/v1/stations, /api/v1/trains, /api/v1/segments");
    info!("  *    /api/v1/trips");
    info!("  POST /api/v1/trips/conflicts/check");

    axum::serve(listener, app).await?;
    Ok(())
}

//! Tally Server binary.

use std::sync::Arc;

use tally_server::config::Config;
use tally_server::coordinator::Coordinator;
use tally_server::store::{FileLocalStore, LocalStore, PgRemoteStore, RemoteStore};
use tally_server::{app, db, websocket, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tally_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!("Starting Tally Server on {}:{}", config.host, config.port);

    let local: Arc<dyn LocalStore> = Arc::new(FileLocalStore::new(&config.local_store_path));
    let remote = match &config.database_url {
        Some(url) => connect_remote(url).await,
        None => {
            tracing::info!("DATABASE_URL not set, running local-only");
            None
        }
    };

    // The change feed runs while a session is open, see handlers::auth
    let coordinator = Coordinator::open(local, remote).await;

    let state = AppState::new(coordinator.clone(), config.clone());
    let fanout = websocket::spawn_fanout(coordinator.clone(), state.conn_manager.clone());

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Waiting for pending store writes");
    coordinator.stop_listening();
    coordinator.flush().await;
    fanout.abort();

    Ok(())
}

/// Connect to PostgreSQL and run migrations. Falls back to local-only on
/// failure.
async fn connect_remote(url: &str) -> Option<Arc<dyn RemoteStore>> {
    let pool = match db::create_pool(url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "Database unreachable, running local-only");
            return None;
        }
    };

    tracing::info!("Running database migrations...");
    if let Err(e) = db::run_migrations(&pool).await {
        tracing::error!(error = %e, "Migrations failed, running local-only");
        return None;
    }

    Some(Arc::new(PgRemoteStore::new(pool)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

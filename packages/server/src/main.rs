use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{Level, info, warn};

use matahari_server::config::{AppConfig, DEV_JWT_SECRET};
use matahari_server::state::AppState;
use matahari_server::{build_file_store, build_router, database, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load()?;
    if config.auth.jwt_secret == DEV_JWT_SECRET {
        warn!("Using the development JWT secret; set MATAHARI__AUTH__JWT_SECRET in production");
    }

    let db = database::init_db(&config.database).await?;
    info!("Database ready");

    seed::ensure_super_admin(&db, &config.auth).await?;

    let files = build_file_store(&config).await?;
    let addr = config.bind_addr();
    let state = AppState {
        db: db.clone(),
        config: Arc::new(config),
        files,
    };

    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped, closing database pool");
    db.close().await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

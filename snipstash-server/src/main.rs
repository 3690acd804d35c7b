mod auth;
mod config;
mod error;
mod routes;

use config::ServerConfig;
use routes::AppState;
use snipstash_core::{SnippetStore, StoreConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "snipstash_server=info,snipstash_core=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    let addr = config.socket_addr()?;

    let store = SnippetStore::with_config(StoreConfig::default());

    if config.admin_key.is_none() {
        tracing::warn!("ADMIN_KEY is not set; /api/admin will reject every request");
    }

    let app = routes::router(
        AppState::new(store.clone(), config.admin_key.clone()),
        config.cors_origin.clone(),
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Snipstash server listening on {}", addr);
    tracing::info!("   CORS origin: {:?}", config.cors_origin);
    tracing::info!("   Sweep interval: {:?}", store.config().cleanup_interval);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.shutdown();
    tracing::info!("Server stopped");

    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

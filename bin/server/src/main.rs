use megaphone_server::config::ServerConfig;
use megaphone_server::routes::{self, AppState};
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    let state = Arc::new(AppState::from_config(&config).expect("failed to wire application state"));

    // Reconstruct conversations persisted by a prior run.
    let loaded = state
        .store
        .load()
        .await
        .expect("failed to load conversation snapshots");
    if loaded > 0 {
        tracing::info!(conversations = loaded, "Restored conversations from disk");
    }

    // Lazy read-side expiry is authoritative; the sweep just keeps idle
    // conversations from sitting on disk until someone reads them.
    let sweep_store = Arc::clone(&state.store);
    let sweep_interval_secs = config.sweep_interval_seconds;
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(sweep_interval_secs));
        loop {
            interval.tick().await;
            match sweep_store.sweep_expired().await {
                Ok(count) if count > 0 => {
                    tracing::debug!(expired_conversations = count, "Periodic conversation sweep");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to sweep expired conversations");
                }
            }
        }
    });

    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install ctrl-c handler");
    tracing::info!("shutdown signal received");
}

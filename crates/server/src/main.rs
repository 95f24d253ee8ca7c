use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use responder_common::retry::RetryPolicy;
use responder_engine::config::EngineConfig;
use responder_engine::engine::Engine;
use responder_engine::executor::config_store::InMemoryConfigStore;
use responder_engine::executor::control_plane::HttpControlPlane;
use responder_engine::executor::token::SignedTokenProvider;
use responder_engine::notifier::{LogNotifier, Notifier, RetryNotifier, WebhookNotifier};

use responder_server::config::ServerConfig;
use responder_server::rest::{self, AppState};
use responder_server::shutdown;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    let cfg = ServerConfig::from_env();

    let engine_cfg = match &cfg.engine_config_path {
        Some(path) => responder_engine::config::load_from_file(Path::new(path))?,
        None => EngineConfig::default(),
    };

    let control_plane = Arc::new(HttpControlPlane::new(cfg.control_plane_url.clone()));
    let tokens = Arc::new(SignedTokenProvider::new(
        cfg.token_secret.clone(),
        cfg.token_ttl_ms,
    ));
    let config_store = Arc::new(InMemoryConfigStore::new());

    let channel: Arc<dyn Notifier> = match &cfg.webhook_url {
        Some(url) => {
            tracing::info!(%url, "webhook notification channel configured");
            Arc::new(WebhookNotifier::new(url.clone(), cfg.webhook_secret.clone()))
        }
        None => Arc::new(LogNotifier),
    };
    let notifier = Arc::new(RetryNotifier::new(
        channel,
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(2),
            jitter_fraction: 0.1,
        },
    ));

    let engine = Arc::new(Engine::new(
        engine_cfg,
        control_plane,
        tokens,
        config_store,
        notifier,
    ));

    let maintenance_engine = engine.clone();
    let maintenance_interval = Duration::from_secs(cfg.maintenance_interval_secs.max(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(maintenance_interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let archived = maintenance_engine.run_maintenance();
            if archived > 0 {
                tracing::info!(archived, "archived expired incidents");
            }
        }
    });

    let app = rest::router(AppState { engine });
    let listener = tokio::net::TcpListener::bind(cfg.listen_addr).await?;
    tracing::info!(addr = %cfg.listen_addr, "responder server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::wait_for_shutdown())
        .await?;

    tracing::info!("shutdown complete");
    Ok(())
}

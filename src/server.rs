use anyhow::{bail, Context};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::app::{router, AppState};
use crate::config::{AppConfig, Environment};
use crate::database::{DatabaseManager, Migrator, PgSettingsStore};
use crate::settings::{MemorySettingsStore, SettingsStore};

/// Install the global subscriber. `RUST_LOG` wins; otherwise `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A second call (tests, CLI after serve) keeps the first subscriber
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Pick the settings store: PostgreSQL when `DATABASE_URL` is set, memory otherwise.
pub async fn connect_store(config: &AppConfig) -> anyhow::Result<(Arc<dyn SettingsStore>, Option<DatabaseManager>)> {
    if config.database.url.is_none() {
        if config.environment == Environment::Production {
            bail!("DATABASE_URL must be set in production");
        }
        tracing::warn!("DATABASE_URL not set; settings are kept in memory and lost on restart");
        return Ok((Arc::new(MemorySettingsStore::new()), None));
    }

    let manager = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to the database")?;
    tracing::info!(
        "Connected to {}",
        config.redacted_database_url().unwrap_or_default()
    );

    if config.database.run_migrations {
        let applied = Migrator::new(manager.pool())
            .run()
            .await
            .context("failed to apply migrations")?;
        if !applied.is_empty() {
            tracing::info!("Applied {} migration(s)", applied.len());
        }
    }

    let store = PgSettingsStore::new(manager.pool().clone());
    Ok((Arc::new(store), Some(manager)))
}

/// Run the HTTP server until Ctrl-C or SIGTERM.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    config.validate().context("invalid configuration")?;
    tracing::info!("Starting FishLedger API in {:?} mode", config.environment);

    if !config.smtp_configured() {
        tracing::debug!("SMTP not configured");
    }
    if !config.cloudinary_configured() {
        tracing::debug!("Cloudinary not configured");
    }

    let (store, manager) = connect_store(&config).await?;
    let port = config.server.port;
    let state = AppState::new(config, store).context("invalid rate limit configuration")?;
    let app = router(state);

    let bind_addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(manager) = manager {
        manager.close().await;
    }
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
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
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_without_database_url() {
        let config = AppConfig::development();
        let (store, manager) = connect_store(&config).await.unwrap();
        assert!(manager.is_none());
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn production_requires_database_url() {
        let mut config = AppConfig::production();
        config.database.url = None;
        assert!(connect_store(&config).await.is_err());
    }
}

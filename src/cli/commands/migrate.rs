use anyhow::Context;
use serde_json::json;

use crate::cli::utils::{output_success, output_table};
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::{DatabaseManager, Migrator};

async fn connect(config: &AppConfig) -> anyhow::Result<DatabaseManager> {
    DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to the database (is DATABASE_URL set?)")
}

/// `fishledger migrate`
pub async fn apply(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let manager = connect(config).await?;
    let applied = Migrator::new(manager.pool()).run().await;
    manager.close().await;
    let applied = applied?;

    let message = if applied.is_empty() {
        "Database schema is up to date".to_string()
    } else {
        format!("Applied {} migration(s)", applied.len())
    };
    output_success(output_format, &message, Some(json!({ "applied": applied })))
}

/// `fishledger migrations`
pub async fn status(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let manager = connect(config).await?;
    let statuses = Migrator::new(manager.pool()).status().await;
    manager.close().await;
    let statuses = statuses?;

    let rows: Vec<Vec<String>> = statuses
        .iter()
        .map(|s| {
            vec![
                s.version.to_string(),
                s.name.to_string(),
                s.applied_at
                    .map(|at| at.to_rfc3339())
                    .unwrap_or_else(|| "pending".to_string()),
            ]
        })
        .collect();

    output_table(output_format, &["VERSION", "NAME", "APPLIED"], &rows, json!(statuses))
}

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Executor, PgPool};
use thiserror::Error;
use tracing::info;

/// A schema change compiled into the binary
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    pub sql: &'static str,
}

/// Every migration, in the order it must be applied
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_users",
        sql: include_str!("../../migrations/0001_create_users.sql"),
    },
    Migration {
        version: 2,
        name: "create_user_settings",
        sql: include_str!("../../migrations/0002_create_user_settings.sql"),
    },
    Migration {
        version: 3,
        name: "backfill_user_settings",
        sql: include_str!("../../migrations/0003_backfill_user_settings.sql"),
    },
];

const CREATE_TRACKING_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS schema_migrations (
        version    BIGINT PRIMARY KEY,
        name       TEXT NOT NULL,
        applied_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
"#;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Migration {version} ({name}) failed: {source}")]
    Failed {
        version: i64,
        name: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Database has migration {0} which this build does not know about")]
    UnknownVersion(i64),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Applied/pending state of one migration, for `fishledger migrations`
#[derive(Debug, Clone, Serialize)]
pub struct MigrationStatus {
    pub version: i64,
    pub name: &'static str,
    pub applied_at: Option<DateTime<Utc>>,
}

pub struct Migrator<'a> {
    pool: &'a PgPool,
    migrations: &'a [Migration],
}

impl<'a> Migrator<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            migrations: MIGRATIONS,
        }
    }

    /// Apply every pending migration, each in its own transaction.
    /// Returns the versions that were applied by this call.
    pub async fn run(&self) -> Result<Vec<i64>, MigrationError> {
        self.pool.execute(CREATE_TRACKING_TABLE).await?;

        let applied = self.applied_versions().await?;
        if let Some(unknown) = unknown_version(&applied, self.migrations) {
            return Err(MigrationError::UnknownVersion(unknown));
        }

        let mut newly_applied = Vec::new();
        for migration in pending(self.migrations, &applied) {
            let mut tx = self.pool.begin().await?;

            (&mut *tx)
                .execute(migration.sql)
                .await
                .map_err(|source| MigrationError::Failed {
                    version: migration.version,
                    name: migration.name,
                    source,
                })?;

            sqlx::query("INSERT INTO schema_migrations (version, name) VALUES ($1, $2)")
                .bind(migration.version)
                .bind(migration.name)
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;
            info!("Applied migration {} ({})", migration.version, migration.name);
            newly_applied.push(migration.version);
        }

        if newly_applied.is_empty() {
            info!("Database schema is up to date");
        }
        Ok(newly_applied)
    }

    pub async fn status(&self) -> Result<Vec<MigrationStatus>, MigrationError> {
        self.pool.execute(CREATE_TRACKING_TABLE).await?;

        let rows: Vec<(i64, DateTime<Utc>)> =
            sqlx::query_as("SELECT version, applied_at FROM schema_migrations ORDER BY version")
                .fetch_all(self.pool)
                .await?;

        Ok(self
            .migrations
            .iter()
            .map(|m| MigrationStatus {
                version: m.version,
                name: m.name,
                applied_at: rows.iter().find(|(v, _)| *v == m.version).map(|(_, at)| *at),
            })
            .collect())
    }

    async fn applied_versions(&self) -> Result<Vec<i64>, MigrationError> {
        let rows: Vec<(i64,)> = sqlx::query_as("SELECT version FROM schema_migrations ORDER BY version")
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(|(v,)| v).collect())
    }
}

fn pending<'m>(migrations: &'m [Migration], applied: &[i64]) -> Vec<&'m Migration> {
    let mut out: Vec<&Migration> = migrations
        .iter()
        .filter(|m| !applied.contains(&m.version))
        .collect();
    out.sort_by_key(|m| m.version);
    out
}

fn unknown_version(applied: &[i64], migrations: &[Migration]) -> Option<i64> {
    applied
        .iter()
        .copied()
        .find(|v| !migrations.iter().any(|m| m.version == *v))
}

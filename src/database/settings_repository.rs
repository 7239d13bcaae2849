use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::settings::{ApplyError, SettingsPatch, SettingsStore, StoreError, UserSettings};

const SETTINGS_COLUMNS: &str = "user_id, currency, language, timezone, date_format, theme, \
    email_notifications, sms_notifications, push_notifications, low_stock_alerts, \
    daily_reports, weekly_reports, business_hours_start, business_hours_end, \
    working_days, created_at, updated_at";

/// `user_settings` row as PostgreSQL returns it
#[derive(Debug, Clone, FromRow)]
pub struct SettingsRow {
    pub user_id: Uuid,
    pub currency: String,
    pub language: String,
    pub timezone: String,
    pub date_format: String,
    pub theme: String,
    pub email_notifications: bool,
    pub sms_notifications: bool,
    pub push_notifications: bool,
    pub low_stock_alerts: bool,
    pub daily_reports: bool,
    pub weekly_reports: bool,
    pub business_hours_start: NaiveTime,
    pub business_hours_end: NaiveTime,
    pub working_days: Vec<i16>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<SettingsRow> for UserSettings {
    type Error = StoreError;

    fn try_from(row: SettingsRow) -> Result<Self, Self::Error> {
        let corrupt = |detail: String| StoreError::Corrupt {
            user_id: row.user_id,
            detail,
        };

        let working_days = row
            .working_days
            .iter()
            .map(|d| u8::try_from(*d).ok().filter(|d| (1..=7).contains(d)))
            .collect::<Option<Vec<u8>>>()
            .ok_or_else(|| corrupt(format!("working_days {:?}", row.working_days)))?;

        Ok(UserSettings {
            user_id: row.user_id,
            currency: row.currency.parse().map_err(|e| corrupt(format!("currency {}", e)))?,
            language: row.language.parse().map_err(|e| corrupt(format!("language {}", e)))?,
            timezone: row.timezone,
            date_format: row.date_format,
            theme: row.theme.parse().map_err(|e| corrupt(format!("theme {}", e)))?,
            email_notifications: row.email_notifications,
            sms_notifications: row.sms_notifications,
            push_notifications: row.push_notifications,
            low_stock_alerts: row.low_stock_alerts,
            daily_reports: row.daily_reports,
            weekly_reports: row.weekly_reports,
            business_hours_start: row.business_hours_start,
            business_hours_end: row.business_hours_end,
            working_days,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// PostgreSQL-backed settings store
#[derive(Clone)]
pub struct PgSettingsStore {
    pool: PgPool,
}

impl PgSettingsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert the default row if the user has none. Column defaults live in the migration.
    async fn ensure_row(tx: &mut Transaction<'_, Postgres>, user_id: Uuid) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO user_settings (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&mut **tx)
            .await
            .map_err(|e| classify(e, user_id))?;
        Ok(())
    }
}

/// Map driver errors onto the store taxonomy
fn classify(err: sqlx::Error, user_id: Uuid) -> StoreError {
    match err {
        sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => StoreError::UnknownUser(user_id),
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(err.to_string())
        }
        other => StoreError::Sqlx(other),
    }
}

#[async_trait]
impl SettingsStore for PgSettingsStore {
    async fn get_or_create(&self, user_id: Uuid) -> Result<UserSettings, StoreError> {
        let select = format!("SELECT {} FROM user_settings WHERE user_id = $1", SETTINGS_COLUMNS);

        // Fast path: the row normally exists already
        let existing: Option<SettingsRow> = sqlx::query_as(&select)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| classify(e, user_id))?;
        if let Some(row) = existing {
            return row.try_into();
        }

        let mut tx = self.pool.begin().await.map_err(|e| classify(e, user_id))?;
        Self::ensure_row(&mut tx, user_id).await?;
        let row: SettingsRow = sqlx::query_as(&select)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| classify(e, user_id))?;
        tx.commit().await.map_err(|e| classify(e, user_id))?;

        tracing::debug!("Materialized default settings for user {}", user_id);
        row.try_into()
    }

    async fn apply(&self, user_id: Uuid, patch: &SettingsPatch) -> Result<UserSettings, ApplyError> {
        let mut tx = self.pool.begin().await.map_err(|e| classify(e, user_id))?;
        Self::ensure_row(&mut tx, user_id).await?;

        // Row lock serializes concurrent writers for the same user; last write wins
        let locked: SettingsRow = sqlx::query_as(&format!(
            "SELECT {} FROM user_settings WHERE user_id = $1 FOR UPDATE",
            SETTINGS_COLUMNS
        ))
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| classify(e, user_id))?;

        let current = UserSettings::try_from(locked)?;
        let next = current.merged(patch).map_err(ApplyError::Rejected)?;
        let working_days: Vec<i16> = next.working_days.iter().map(|d| i16::from(*d)).collect();

        let row: SettingsRow = sqlx::query_as(&format!(
            r#"
            UPDATE user_settings SET
                currency = $2,
                language = $3,
                timezone = $4,
                date_format = $5,
                theme = $6,
                email_notifications = $7,
                sms_notifications = $8,
                push_notifications = $9,
                low_stock_alerts = $10,
                daily_reports = $11,
                weekly_reports = $12,
                business_hours_start = $13,
                business_hours_end = $14,
                working_days = $15,
                updated_at = GREATEST(now(), updated_at + INTERVAL '1 microsecond')
            WHERE user_id = $1
            RETURNING {}
            "#,
            SETTINGS_COLUMNS
        ))
        .bind(user_id)
        .bind(next.currency.as_str())
        .bind(next.language.as_str())
        .bind(&next.timezone)
        .bind(&next.date_format)
        .bind(next.theme.as_str())
        .bind(next.email_notifications)
        .bind(next.sms_notifications)
        .bind(next.push_notifications)
        .bind(next.low_stock_alerts)
        .bind(next.daily_reports)
        .bind(next.weekly_reports)
        .bind(next.business_hours_start)
        .bind(next.business_hours_end)
        .bind(&working_days)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| classify(e, user_id))?;

        tx.commit().await.map_err(|e| classify(e, user_id))?;
        Ok(UserSettings::try_from(row)?)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }
}

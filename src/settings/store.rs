use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::model::{SettingsPatch, UserSettings};
use crate::error::FieldErrors;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Settings store unavailable: {0}")]
    Unavailable(String),

    #[error("User {0} does not exist")]
    UnknownUser(Uuid),

    #[error("Stored settings for user {user_id} are invalid: {detail}")]
    Corrupt { user_id: Uuid, detail: String },

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Outcome of applying a patch: either the stored row or the fields that made it invalid
#[derive(Debug)]
pub enum ApplyError {
    Rejected(FieldErrors),
    Store(StoreError),
}

impl From<StoreError> for ApplyError {
    fn from(err: StoreError) -> Self {
        ApplyError::Store(err)
    }
}

impl From<sqlx::Error> for ApplyError {
    fn from(err: sqlx::Error) -> Self {
        ApplyError::Store(StoreError::Sqlx(err))
    }
}

/// Persistence for the one-row-per-user settings table.
///
/// Every method is keyed by the owner's user id; implementations must never
/// read or write a row belonging to another user.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Return the user's row, materializing the default row on first access.
    async fn get_or_create(&self, user_id: Uuid) -> Result<UserSettings, StoreError>;

    /// Merge `patch` into the user's row (creating it first if absent),
    /// refresh `updated_at` and return what was stored. A rejected patch
    /// leaves the row untouched.
    async fn apply(&self, user_id: Uuid, patch: &SettingsPatch) -> Result<UserSettings, ApplyError>;

    /// Connectivity probe for `/health`
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Process-local store used by tests and database-less development runs
#[derive(Default)]
pub struct MemorySettingsStore {
    rows: RwLock<HashMap<Uuid, UserSettings>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of materialized rows
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get_or_create(&self, user_id: Uuid) -> Result<UserSettings, StoreError> {
        {
            let rows = self.rows.read().await;
            if let Some(row) = rows.get(&user_id) {
                return Ok(row.clone());
            }
        }

        let mut rows = self.rows.write().await;
        let row = rows
            .entry(user_id)
            .or_insert_with(|| UserSettings::defaults(user_id, Utc::now()));
        Ok(row.clone())
    }

    async fn apply(&self, user_id: Uuid, patch: &SettingsPatch) -> Result<UserSettings, ApplyError> {
        let mut rows = self.rows.write().await;
        let current = rows
            .entry(user_id)
            .or_insert_with(|| UserSettings::defaults(user_id, Utc::now()));

        let mut next = current.merged(patch).map_err(ApplyError::Rejected)?;
        next.touch(Utc::now());
        *current = next.clone();
        Ok(next)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

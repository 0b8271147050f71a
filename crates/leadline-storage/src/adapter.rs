// SPDX-FileCopyrightText: 2026 Leadline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the storage traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use leadline_config::model::StorageConfig;
use leadline_core::{
    AdapterType, AutomationSettings, EligibilityCriteria, HealthStatus, Lead, LeadClaim, LeadId,
    LeadPatch, LeadStatus, LeadStore, LeadlineError, NewLead, PluginAdapter, SettingsPatch,
    SettingsStore, StorageAdapter,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed lead and settings store.
///
/// The database is opened by [`StorageAdapter::initialize`]; every other
/// call fails with a storage error until then.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// The open database, for callers that need raw SQL access.
    pub fn database(&self) -> Option<&Database> {
        self.db.get()
    }

    fn db(&self) -> Result<&Database, LeadlineError> {
        self.db.get().ok_or_else(|| LeadlineError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, LeadlineError> {
        let Ok(db) = self.db() else {
            return Ok(HealthStatus::Unhealthy("not initialized".to_string()));
        };
        let check = db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await;
        Ok(match check {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }

    async fn shutdown(&self) -> Result<(), LeadlineError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("sqlite storage shut down");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), LeadlineError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| LeadlineError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), LeadlineError> {
        self.db()?.checkpoint().await
    }
}

#[async_trait]
impl LeadStore for SqliteStorage {
    async fn query_eligible(
        &self,
        criteria: &EligibilityCriteria,
    ) -> Result<Vec<Lead>, LeadlineError> {
        queries::leads::query_eligible(self.db()?, criteria).await
    }

    async fn claim_lead(
        &self,
        id: &LeadId,
        expected: LeadStatus,
    ) -> Result<Option<LeadClaim>, LeadlineError> {
        queries::leads::claim_lead(self.db()?, id, expected, Self::now()).await
    }

    async fn release_claim(
        &self,
        id: &LeadId,
        claim: &LeadClaim,
        restore: LeadStatus,
    ) -> Result<(), LeadlineError> {
        queries::leads::release_claim(self.db()?, id, claim, restore, Self::now()).await
    }

    async fn record_attempt(
        &self,
        id: &LeadId,
        claim: &LeadClaim,
        call_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Lead, LeadlineError> {
        queries::leads::record_attempt(self.db()?, id, claim, call_id, at).await
    }

    async fn release_stale_claims(
        &self,
        claimed_before: DateTime<Utc>,
    ) -> Result<u64, LeadlineError> {
        queries::leads::release_stale_claims(self.db()?, claimed_before, Self::now()).await
    }

    async fn transition_status(
        &self,
        id: &LeadId,
        expected: LeadStatus,
        next: LeadStatus,
    ) -> Result<bool, LeadlineError> {
        queries::leads::transition_status(self.db()?, id, expected, next, Self::now()).await
    }

    async fn set_appointment(
        &self,
        id: &LeadId,
        appointment_at: Option<DateTime<Utc>>,
        status: LeadStatus,
    ) -> Result<Lead, LeadlineError> {
        queries::leads::set_appointment(self.db()?, id, appointment_at, status, Self::now()).await
    }

    async fn create_lead(&self, lead: &NewLead) -> Result<Lead, LeadlineError> {
        queries::leads::create_lead(self.db()?, lead, Self::now()).await
    }

    async fn get_lead(&self, id: &LeadId) -> Result<Option<Lead>, LeadlineError> {
        queries::leads::get_lead(self.db()?, id).await
    }

    async fn find_by_call_id(&self, call_id: &str) -> Result<Option<Lead>, LeadlineError> {
        queries::leads::find_by_call_id(self.db()?, call_id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Lead>, LeadlineError> {
        queries::leads::find_by_email(self.db()?, email).await
    }

    async fn list_leads(&self, status: Option<LeadStatus>) -> Result<Vec<Lead>, LeadlineError> {
        queries::leads::list_leads(self.db()?, status).await
    }

    async fn update_lead(&self, id: &LeadId, patch: &LeadPatch) -> Result<Lead, LeadlineError> {
        queries::leads::update_lead(self.db()?, id, patch, Self::now()).await
    }

    async fn delete_lead(&self, id: &LeadId) -> Result<bool, LeadlineError> {
        queries::leads::delete_lead(self.db()?, id).await
    }
}

#[async_trait]
impl SettingsStore for SqliteStorage {
    async fn read(&self) -> Result<AutomationSettings, LeadlineError> {
        queries::settings::read_settings(self.db()?).await
    }

    async fn write(&self, patch: &SettingsPatch) -> Result<AutomationSettings, LeadlineError> {
        queries::settings::write_settings(self.db()?, patch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn sqlite_storage_implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(storage.name(), "sqlite");
        assert_eq!(storage.version(), semver::Version::new(0, 1, 0));
        assert_eq!(storage.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn calls_before_initialize_fail() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("uninit.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert!(matches!(
            storage.list_leads(None).await,
            Err(LeadlineError::Storage { .. })
        ));
        assert!(matches!(
            storage.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
    }

    #[tokio::test]
    async fn initialize_twice_is_an_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("twice.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert!(db_path.exists());
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);
        assert!(storage.initialize().await.is_err());
        storage.close().await.unwrap();
    }
}

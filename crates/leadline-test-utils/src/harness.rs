// SPDX-FileCopyrightText: 2026 Leadline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end scheduler test environment.
//!
//! `TestHarness` wires a real SQLite store in a temp directory, wrapped in a
//! [`FaultyStore`], to a [`Scheduler`] and [`Reconciler`] that dispatch
//! through a [`MockDialer`]. Seeding helpers go straight to the SQLite store
//! so the fault wrapper's counters only see scheduler traffic.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use leadline_config::model::StorageConfig;
use leadline_core::{
    Lead, LeadId, LeadStatus, LeadStore, LeadlineError, NewLead, SettingsPatch, SettingsStore,
    StorageAdapter, TickSummary,
};
use leadline_scheduler::{Reconciler, Scheduler, SchedulerOptions, TickError, TriggerAuth};
use leadline_storage::SqliteStorage;
use leadline_storage::database::{Database, format_ts, map_tr_err};

use crate::faulty_store::FaultyStore;
use crate::mock_dialer::MockDialer;

const TRIGGER_SECRET: &str = "test-trigger-secret";

/// Builder for [`TestHarness`].
pub struct TestHarnessBuilder {
    settings: SettingsPatch,
    dispatch_timeout: Duration,
    max_concurrency: usize,
    claim_ttl: Duration,
    dialer_delay: Option<Duration>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            settings: SettingsPatch {
                automation_enabled: Some(true),
                ..SettingsPatch::default()
            },
            dispatch_timeout: Duration::from_secs(5),
            max_concurrency: 5,
            claim_ttl: Duration::from_secs(600),
            dialer_delay: None,
        }
    }

    /// Apply a settings patch on top of the harness defaults (automation on).
    pub fn with_settings(mut self, patch: SettingsPatch) -> Self {
        self.settings = SettingsPatch {
            automation_enabled: patch.automation_enabled.or(self.settings.automation_enabled),
            max_calls_batch: patch.max_calls_batch.or(self.settings.max_calls_batch),
            retry_interval: patch.retry_interval.or(self.settings.retry_interval),
            max_attempts: patch.max_attempts.or(self.settings.max_attempts),
        };
        self
    }

    pub fn with_automation(mut self, enabled: bool) -> Self {
        self.settings.automation_enabled = Some(enabled);
        self
    }

    pub fn with_dispatch_timeout(mut self, timeout: Duration) -> Self {
        self.dispatch_timeout = timeout;
        self
    }

    pub fn with_max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = n;
        self
    }

    pub fn with_claim_ttl(mut self, ttl: Duration) -> Self {
        self.claim_ttl = ttl;
        self
    }

    /// Make every mock dispatch take this long.
    pub fn with_dialer_delay(mut self, delay: Duration) -> Self {
        self.dialer_delay = Some(delay);
        self
    }

    pub async fn build(self) -> Result<TestHarness, LeadlineError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| LeadlineError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("leads.db");

        let storage = Arc::new(SqliteStorage::new(StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        }));
        storage.initialize().await?;
        storage.write(&self.settings).await?;

        let store = Arc::new(FaultyStore::new(storage.clone()));
        let dialer = Arc::new(match self.dialer_delay {
            Some(delay) => MockDialer::new().with_delay(delay),
            None => MockDialer::new(),
        });

        let options = SchedulerOptions {
            trigger: TriggerAuth::new(Some(TRIGGER_SECRET.to_string())),
            dispatch_timeout: self.dispatch_timeout,
            max_concurrency: self.max_concurrency,
            claim_ttl: self.claim_ttl,
        };
        let scheduler = Arc::new(Scheduler::new(
            store.clone(),
            store.clone(),
            dialer.clone(),
            options,
        ));
        let reconciler = Arc::new(Reconciler::new(store.clone(), store.clone()));

        Ok(TestHarness {
            storage,
            store,
            dialer,
            scheduler,
            reconciler,
            _temp_dir: temp_dir,
        })
    }
}

/// A scheduler over a temp SQLite store and a mock dialer.
pub struct TestHarness {
    /// The underlying store, for seeding and inspection.
    pub storage: Arc<SqliteStorage>,
    /// What the scheduler and reconciler actually talk to.
    pub store: Arc<FaultyStore<SqliteStorage>>,
    pub dialer: Arc<MockDialer>,
    pub scheduler: Arc<Scheduler>,
    pub reconciler: Arc<Reconciler>,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// The credential the harness scheduler accepts.
    pub fn trigger_secret(&self) -> &'static str {
        TRIGGER_SECRET
    }

    /// Run a tick with the valid trigger credential.
    pub async fn tick(&self) -> Result<TickSummary, TickError> {
        self.scheduler.run_tick(Some(TRIGGER_SECRET)).await
    }

    pub async fn seed_lead(&self, company: &str, phone: &str) -> Result<Lead, LeadlineError> {
        self.storage
            .create_lead(&NewLead {
                company_name: company.to_string(),
                phone: phone.to_string(),
                email: None,
            })
            .await
    }

    pub async fn seed_lead_with_email(
        &self,
        company: &str,
        phone: &str,
        email: &str,
    ) -> Result<Lead, LeadlineError> {
        self.storage
            .create_lead(&NewLead {
                company_name: company.to_string(),
                phone: phone.to_string(),
                email: Some(email.to_string()),
            })
            .await
    }

    pub async fn lead(&self, id: &LeadId) -> Result<Lead, LeadlineError> {
        self.storage
            .get_lead(id)
            .await?
            .ok_or_else(|| LeadlineError::lead_not_found(id.as_str()))
    }

    /// Overwrite a lead's scheduling state directly, bypassing every guard.
    pub async fn force_lead_state(
        &self,
        id: &LeadId,
        status: LeadStatus,
        call_attempts: u32,
        last_called_at: Option<DateTime<Utc>>,
    ) -> Result<(), LeadlineError> {
        let id = id.as_str().to_string();
        let status = status.to_string();
        let last_called_at = last_called_at.as_ref().map(format_ts);
        self.database()?
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "UPDATE leads SET status = ?2, call_attempts = ?3, last_called_at = ?4 \
                     WHERE id = ?1",
                    rusqlite::params![id, status, call_attempts, last_called_at],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Leave a lead claimed since `claimed_at`, as a crashed tick would.
    pub async fn force_claim(
        &self,
        id: &LeadId,
        claimed_from: LeadStatus,
        claimed_at: DateTime<Utc>,
    ) -> Result<(), LeadlineError> {
        let id = id.as_str().to_string();
        let claimed_from = claimed_from.to_string();
        let claimed_at = format_ts(&claimed_at);
        self.database()?
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "UPDATE leads SET status = 'claiming', claimed_from = ?2, claimed_at = ?3 \
                     WHERE id = ?1",
                    rusqlite::params![id, claimed_from, claimed_at],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Store a retry interval without validation, as a hand-edited database would.
    pub async fn force_retry_interval(&self, hours: f64) -> Result<(), LeadlineError> {
        self.database()?
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "UPDATE automation_settings SET retry_interval = ?1 WHERE id = 1",
                    rusqlite::params![hours],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    fn database(&self) -> Result<&Database, LeadlineError> {
        self.storage.database().ok_or_else(|| LeadlineError::Storage {
            source: "harness storage not initialized".into(),
        })
    }
}

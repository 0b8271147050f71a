// SPDX-FileCopyrightText: 2026 Leadline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `leadline tick` command implementation.
//!
//! Runs exactly one tick with the configured trigger secret, for cron jobs
//! that prefer a process over an HTTP call.

use leadline_config::LeadlineConfig;
use leadline_core::{LeadlineError, TickSummary};
use leadline_scheduler::TickError;
use thiserror::Error;

use crate::serve::Stack;

#[derive(Debug, Error)]
pub enum TickCommandError {
    #[error("startup failed: {0}")]
    Startup(#[from] LeadlineError),

    #[error(transparent)]
    Tick(#[from] TickError),
}

/// Runs the `leadline tick` command.
pub async fn run_tick(config: &LeadlineConfig) -> Result<TickSummary, TickCommandError> {
    let stack = Stack::build(config).await?;
    let result = stack
        .scheduler
        .run_tick(config.trigger.secret.as_deref())
        .await;
    stack.close().await;
    Ok(result?)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use leadline_core::{SettingsPatch, SettingsStore, StorageAdapter};
    use leadline_scheduler::{DISABLED_MESSAGE, NO_LEADS_MESSAGE};
    use leadline_storage::SqliteStorage;

    use super::*;

    fn test_config(dir: &std::path::Path) -> LeadlineConfig {
        let mut config = LeadlineConfig::default();
        config.storage.database_path = dir.join("leads.db").to_string_lossy().into_owned();
        config.trigger.secret = Some("trigger-secret".into());
        config.dialer.api_key = Some("test-key".into());
        config.dialer.assistant_id = "asst-1".into();
        config.dialer.phone_number_id = "phone-1".into();
        config
    }

    async fn set_automation(config: &LeadlineConfig, enabled: bool) {
        let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
        storage.initialize().await.unwrap();
        storage
            .write(&SettingsPatch {
                automation_enabled: Some(enabled),
                ..Default::default()
            })
            .await
            .unwrap();
        storage.close().await.unwrap();
    }

    #[tokio::test]
    async fn fresh_database_runs_disabled_tick() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        let summary = run_tick(&config).await.unwrap();
        assert_eq!(summary.message, DISABLED_MESSAGE);
        assert_eq!(summary.totals.total, 0);
    }

    #[tokio::test]
    async fn enabled_tick_with_no_leads() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        set_automation(&config, true).await;

        let summary = run_tick(&config).await.unwrap();
        assert_eq!(summary.message, NO_LEADS_MESSAGE);
        assert!(summary.per_lead.is_empty());
    }

    #[tokio::test]
    async fn missing_trigger_secret_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.trigger.secret = None;

        let err = run_tick(&config).await.unwrap_err();
        assert!(matches!(err, TickCommandError::Tick(TickError::Unauthorized)));
    }
}

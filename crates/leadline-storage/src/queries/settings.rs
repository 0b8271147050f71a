// SPDX-FileCopyrightText: 2026 Leadline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Singleton automation settings row.

use leadline_core::{AutomationSettings, LeadlineError, SettingsPatch};
use rusqlite::{Connection, params};

use crate::database::{Database, map_tr_err};

fn ensure_row(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute("INSERT OR IGNORE INTO automation_settings (id) VALUES (1)", [])?;
    Ok(())
}

fn load(conn: &Connection) -> Result<AutomationSettings, rusqlite::Error> {
    conn.query_row(
        "SELECT automation_enabled, max_calls_batch, retry_interval, max_attempts
         FROM automation_settings WHERE id = 1",
        [],
        |row| {
            Ok(AutomationSettings {
                automation_enabled: row.get(0)?,
                max_calls_batch: row.get(1)?,
                retry_interval: row.get(2)?,
                max_attempts: row.get(3)?,
            })
        },
    )
}

/// Read the settings row, inserting defaults on first access.
///
/// The row is returned as stored; callers decide what to do with values
/// that fail [`AutomationSettings::validate`].
pub async fn read_settings(db: &Database) -> Result<AutomationSettings, LeadlineError> {
    db.connection()
        .call(|conn| -> Result<AutomationSettings, rusqlite::Error> {
            ensure_row(conn)?;
            load(conn)
        })
        .await
        .map_err(map_tr_err)
}

/// Apply a patch inside one transaction. Invalid results are rejected
/// without touching the stored row.
pub async fn write_settings(
    db: &Database,
    patch: &SettingsPatch,
) -> Result<AutomationSettings, LeadlineError> {
    let patch = patch.clone();
    db.connection()
        .call(
            move |conn| -> Result<Result<AutomationSettings, LeadlineError>, rusqlite::Error> {
                let tx = conn.transaction()?;
                ensure_row(&tx)?;
                let current = load(&tx)?;
                let next = match current.apply(&patch) {
                    Ok(next) => next,
                    Err(e) => return Ok(Err(e)),
                };
                tx.execute(
                    "UPDATE automation_settings
                     SET automation_enabled = ?1, max_calls_batch = ?2, retry_interval = ?3,
                         max_attempts = ?4,
                         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = 1",
                    params![
                        next.automation_enabled,
                        next.max_calls_batch,
                        next.retry_interval,
                        next.max_attempts,
                    ],
                )?;
                tx.commit()?;
                Ok(Ok(next))
            },
        )
        .await
        .map_err(map_tr_err)?
}

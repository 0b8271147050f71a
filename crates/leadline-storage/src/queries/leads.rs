// SPDX-FileCopyrightText: 2026 Leadline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lead queries. Every scheduler mutation is one conditional UPDATE.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use leadline_core::{
    EligibilityCriteria, Lead, LeadClaim, LeadId, LeadPatch, LeadStatus, LeadlineError, NewLead,
};
use rusqlite::{OptionalExtension, Row, params};

use crate::database::{Database, format_ts, map_tr_err, parse_ts};

const LEAD_COLUMNS: &str = "id, company_name, phone, email, status, call_attempts, \
     last_called_at, last_call_id, appointment_at, created_at, updated_at";

fn lead_from_row(row: &Row<'_>) -> Result<Lead, rusqlite::Error> {
    let status: String = row.get(4)?;
    let status = LeadStatus::from_str(&status).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let last_called_at: Option<String> = row.get(6)?;
    let appointment_at: Option<String> = row.get(8)?;
    let created_at: String = row.get(9)?;
    let updated_at: String = row.get(10)?;

    Ok(Lead {
        id: LeadId(row.get(0)?),
        company_name: row.get(1)?,
        phone: row.get(2)?,
        email: row.get(3)?,
        status,
        call_attempts: row.get(5)?,
        last_called_at: last_called_at.map(|s| parse_ts(6, &s)).transpose()?,
        last_call_id: row.get(7)?,
        appointment_at: appointment_at.map(|s| parse_ts(8, &s)).transpose()?,
        created_at: parse_ts(9, &created_at)?,
        updated_at: parse_ts(10, &updated_at)?,
    })
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn duplicate_phone(phone: &str) -> LeadlineError {
    LeadlineError::Validation(format!("a lead with phone `{phone}` already exists"))
}

fn lead_is_claimed(id: &LeadId) -> LeadlineError {
    LeadlineError::Conflict(format!(
        "lead {id} is being dialled; retry once the attempt finishes"
    ))
}

/// Result of a guarded single-row UPDATE.
enum RowWrite {
    Applied(Lead),
    /// No lead with that id.
    Missing,
    /// The lead exists but the guard did not hold.
    Refused,
    DuplicatePhone,
}

/// Classify an UPDATE ... RETURNING that may have matched no row.
fn settle(
    conn: &rusqlite::Connection,
    id: &str,
    updated: Option<Lead>,
) -> Result<RowWrite, rusqlite::Error> {
    if let Some(lead) = updated {
        return Ok(RowWrite::Applied(lead));
    }
    let exists = conn
        .query_row("SELECT 1 FROM leads WHERE id = ?1", params![id], |_| Ok(()))
        .optional()?
        .is_some();
    Ok(if exists {
        RowWrite::Refused
    } else {
        RowWrite::Missing
    })
}

/// Pending leads under the attempt ceiling and outside the retry window.
///
/// Never-called leads sort first, then oldest `last_called_at`; id breaks ties.
pub async fn query_eligible(
    db: &Database,
    criteria: &EligibilityCriteria,
) -> Result<Vec<Lead>, LeadlineError> {
    let cutoff = format_ts(&criteria.cutoff());
    let max_attempts = criteria.max_attempts;
    let limit = criteria.limit;
    db.connection()
        .call(move |conn| -> Result<Vec<Lead>, rusqlite::Error> {
            let sql = format!(
                "SELECT {LEAD_COLUMNS} FROM leads
                 WHERE status = 'pending'
                   AND call_attempts < ?1
                   AND (last_called_at IS NULL OR last_called_at < ?2)
                 ORDER BY last_called_at IS NOT NULL, last_called_at ASC, id ASC
                 LIMIT ?3"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![max_attempts, cutoff, limit], lead_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Reserve a lead for dispatch. `None` means its status was no longer `expected`.
///
/// The claim time doubles as the ownership token checked by
/// [`record_attempt`] and [`release_claim`].
pub async fn claim_lead(
    db: &Database,
    id: &LeadId,
    expected: LeadStatus,
    now: DateTime<Utc>,
) -> Result<Option<LeadClaim>, LeadlineError> {
    let id = id.0.clone();
    let expected = expected.to_string();
    let claimed_at = format_ts(&now);
    let changed = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE leads
                 SET status = 'claiming', claimed_at = ?1, claimed_from = status, updated_at = ?1
                 WHERE id = ?2 AND status = ?3",
                params![claimed_at, id, expected],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok((changed == 1).then_some(LeadClaim { claimed_at: now }))
}

/// Undo a claim after a failed dispatch. Counters are left alone, and a
/// lead no longer held under `claim` is not touched.
pub async fn release_claim(
    db: &Database,
    id: &LeadId,
    claim: &LeadClaim,
    restore: LeadStatus,
    now: DateTime<Utc>,
) -> Result<(), LeadlineError> {
    let id = id.0.clone();
    let claimed_at = format_ts(&claim.claimed_at);
    let restore = restore.to_string();
    let now = format_ts(&now);
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "UPDATE leads
                 SET status = ?1, claimed_at = NULL, claimed_from = NULL, updated_at = ?2
                 WHERE id = ?3 AND status = 'claiming' AND claimed_at = ?4",
                params![restore, now, id, claimed_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Book a placed call in a single statement and return the updated row.
///
/// Applies only while the lead is still held under `claim`. If stale-claim
/// recovery released it in the meantime the booking is refused with
/// `Conflict`, so a second holder's call is never overwritten.
pub async fn record_attempt(
    db: &Database,
    id: &LeadId,
    claim: &LeadClaim,
    call_id: &str,
    at: DateTime<Utc>,
) -> Result<Lead, LeadlineError> {
    let lead_id = id.0.clone();
    let claimed_at = format_ts(&claim.claimed_at);
    let call_id = call_id.to_string();
    let at = format_ts(&at);
    let outcome = db
        .connection()
        .call(move |conn| -> Result<RowWrite, rusqlite::Error> {
            let sql = format!(
                "UPDATE leads
                 SET call_attempts = call_attempts + 1,
                     last_called_at = ?1,
                     last_call_id = ?2,
                     status = 'calling',
                     claimed_at = NULL,
                     claimed_from = NULL,
                     updated_at = ?1
                 WHERE id = ?3 AND status = 'claiming' AND claimed_at = ?4
                 RETURNING {LEAD_COLUMNS}"
            );
            let updated = conn
                .query_row(&sql, params![at, call_id, lead_id, claimed_at], lead_from_row)
                .optional()?;
            settle(conn, &lead_id, updated)
        })
        .await
        .map_err(map_tr_err)?;

    match outcome {
        RowWrite::Applied(lead) => Ok(lead),
        RowWrite::Missing => Err(LeadlineError::lead_not_found(id.as_str())),
        RowWrite::Refused | RowWrite::DuplicatePhone => Err(LeadlineError::Conflict(format!(
            "claim on lead {id} was lost before the call was recorded"
        ))),
    }
}

/// Return claims older than `claimed_before` to the status they were taken from.
pub async fn release_stale_claims(
    db: &Database,
    claimed_before: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<u64, LeadlineError> {
    let before = format_ts(&claimed_before);
    let now = format_ts(&now);
    db.connection()
        .call(move |conn| -> Result<u64, rusqlite::Error> {
            let changed = conn.execute(
                "UPDATE leads
                 SET status = COALESCE(claimed_from, 'pending'),
                     claimed_at = NULL,
                     claimed_from = NULL,
                     updated_at = ?1
                 WHERE status = 'claiming' AND (claimed_at IS NULL OR claimed_at < ?2)",
                params![now, before],
            )?;
            Ok(changed as u64)
        })
        .await
        .map_err(map_tr_err)
}

/// Compare-and-swap on status.
pub async fn transition_status(
    db: &Database,
    id: &LeadId,
    expected: LeadStatus,
    next: LeadStatus,
    now: DateTime<Utc>,
) -> Result<bool, LeadlineError> {
    let id = id.0.clone();
    let expected = expected.to_string();
    let next = next.to_string();
    let now = format_ts(&now);
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(
                "UPDATE leads SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
                params![next, now, id, expected],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Set or clear the meeting. A claimed lead is refused with `Conflict`.
pub async fn set_appointment(
    db: &Database,
    id: &LeadId,
    appointment_at: Option<DateTime<Utc>>,
    status: LeadStatus,
    now: DateTime<Utc>,
) -> Result<Lead, LeadlineError> {
    let lead_id = id.0.clone();
    let appointment_at = appointment_at.as_ref().map(format_ts);
    let status = status.to_string();
    let now = format_ts(&now);
    let outcome = db
        .connection()
        .call(move |conn| -> Result<RowWrite, rusqlite::Error> {
            let sql = format!(
                "UPDATE leads SET appointment_at = ?1, status = ?2, updated_at = ?3
                 WHERE id = ?4 AND status <> 'claiming'
                 RETURNING {LEAD_COLUMNS}"
            );
            let updated = conn
                .query_row(&sql, params![appointment_at, status, now, lead_id], lead_from_row)
                .optional()?;
            settle(conn, &lead_id, updated)
        })
        .await
        .map_err(map_tr_err)?;

    match outcome {
        RowWrite::Applied(lead) => Ok(lead),
        RowWrite::Missing => Err(LeadlineError::lead_not_found(id.as_str())),
        RowWrite::Refused | RowWrite::DuplicatePhone => Err(lead_is_claimed(id)),
    }
}

/// Insert a new pending lead. A duplicate phone is a validation error.
pub async fn create_lead(
    db: &Database,
    new: &NewLead,
    now: DateTime<Utc>,
) -> Result<Lead, LeadlineError> {
    new.validate()?;
    let lead = Lead {
        id: LeadId::generate(),
        company_name: new.company_name.trim().to_string(),
        phone: new.phone.trim().to_string(),
        email: new.email.as_ref().map(|e| e.trim().to_string()).filter(|e| !e.is_empty()),
        status: LeadStatus::Pending,
        call_attempts: 0,
        last_called_at: None,
        last_call_id: None,
        appointment_at: None,
        created_at: now,
        updated_at: now,
    };

    let row = lead.clone();
    let inserted = db
        .connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let ts = format_ts(&row.created_at);
            let result = conn.execute(
                "INSERT INTO leads (id, company_name, phone, email, status, call_attempts,
                                    created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, 'pending', 0, ?5, ?5)",
                params![row.id.0, row.company_name, row.phone, row.email, ts],
            );
            match result {
                Ok(_) => Ok(true),
                Err(e) if is_unique_violation(&e) => Ok(false),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)?;

    if !inserted {
        return Err(duplicate_phone(&lead.phone));
    }
    // Timestamps are stored at millisecond precision.
    get_lead(db, &lead.id)
        .await?
        .ok_or_else(|| LeadlineError::lead_not_found(lead.id.as_str()))
}

pub async fn get_lead(db: &Database, id: &LeadId) -> Result<Option<Lead>, LeadlineError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| -> Result<Option<Lead>, rusqlite::Error> {
            let sql = format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = ?1");
            conn.query_row(&sql, params![id], lead_from_row).optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn find_by_call_id(db: &Database, call_id: &str) -> Result<Option<Lead>, LeadlineError> {
    let call_id = call_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<Lead>, rusqlite::Error> {
            let sql = format!("SELECT {LEAD_COLUMNS} FROM leads WHERE last_call_id = ?1 LIMIT 1");
            conn.query_row(&sql, params![call_id], lead_from_row).optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn find_by_email(db: &Database, email: &str) -> Result<Option<Lead>, LeadlineError> {
    let email = email.trim().to_string();
    db.connection()
        .call(move |conn| -> Result<Option<Lead>, rusqlite::Error> {
            let sql = format!(
                "SELECT {LEAD_COLUMNS} FROM leads
                 WHERE lower(email) = lower(?1)
                 ORDER BY created_at DESC, id DESC
                 LIMIT 1"
            );
            conn.query_row(&sql, params![email], lead_from_row).optional()
        })
        .await
        .map_err(map_tr_err)
}

/// All leads, newest first, optionally filtered by status.
pub async fn list_leads(
    db: &Database,
    status: Option<LeadStatus>,
) -> Result<Vec<Lead>, LeadlineError> {
    let status = status.map(|s| s.to_string());
    db.connection()
        .call(move |conn| -> Result<Vec<Lead>, rusqlite::Error> {
            let sql = format!(
                "SELECT {LEAD_COLUMNS} FROM leads
                 WHERE ?1 IS NULL OR status = ?1
                 ORDER BY created_at DESC, id ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![status], lead_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Apply a human edit. Absent fields keep their stored value.
///
/// A claimed lead is refused with `Conflict`: the in-flight dispatch owns
/// its status until the attempt is booked or released.
pub async fn update_lead(
    db: &Database,
    id: &LeadId,
    patch: &LeadPatch,
    now: DateTime<Utc>,
) -> Result<Lead, LeadlineError> {
    patch.validate()?;
    let lead_id = id.0.clone();
    let company_name = patch.company_name.as_ref().map(|s| s.trim().to_string());
    let phone = patch.phone.as_ref().map(|s| s.trim().to_string());
    let email = patch.email.as_ref().map(|s| s.trim().to_string());
    let status = patch.status.map(|s| s.to_string());
    let now = format_ts(&now);
    let attempted_phone = phone.clone();

    let outcome = db
        .connection()
        .call(move |conn| -> Result<RowWrite, rusqlite::Error> {
            let sql = format!(
                "UPDATE leads
                 SET company_name = COALESCE(?1, company_name),
                     phone = COALESCE(?2, phone),
                     email = CASE WHEN ?3 IS NULL THEN email
                                  WHEN ?3 = '' THEN NULL
                                  ELSE ?3 END,
                     status = COALESCE(?4, status),
                     updated_at = ?5
                 WHERE id = ?6 AND status <> 'claiming'
                 RETURNING {LEAD_COLUMNS}"
            );
            let result = conn
                .query_row(
                    &sql,
                    params![company_name, phone, email, status, now, lead_id],
                    lead_from_row,
                )
                .optional();
            match result {
                Ok(updated) => settle(conn, &lead_id, updated),
                Err(e) if is_unique_violation(&e) => Ok(RowWrite::DuplicatePhone),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)?;

    match outcome {
        RowWrite::Applied(lead) => Ok(lead),
        RowWrite::Missing => Err(LeadlineError::lead_not_found(id.as_str())),
        RowWrite::Refused => Err(lead_is_claimed(id)),
        RowWrite::DuplicatePhone => {
            Err(duplicate_phone(attempted_phone.as_deref().unwrap_or_default()))
        }
    }
}

pub async fn delete_lead(db: &Database, id: &LeadId) -> Result<bool, LeadlineError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute("DELETE FROM leads WHERE id = ?1", params![id])?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

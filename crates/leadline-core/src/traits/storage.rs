// SPDX-FileCopyrightText: 2026 Leadline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lead Store and Settings Store contracts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::LeadlineError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    AutomationSettings, EligibilityCriteria, Lead, LeadClaim, LeadId, LeadPatch, LeadStatus,
    NewLead, SettingsPatch,
};

/// Lifecycle of a persistence backend.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), LeadlineError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), LeadlineError>;
}

/// Persistent table of leads.
///
/// Every mutation the scheduler performs is a single conditional row update,
/// so concurrent ticks and webhooks never overwrite each other's transitions.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Leads satisfying the eligibility predicate, never-called first, then
    /// oldest `last_called_at` first, at most `criteria.limit` rows.
    async fn query_eligible(
        &self,
        criteria: &EligibilityCriteria,
    ) -> Result<Vec<Lead>, LeadlineError>;

    /// Move `id` from `expected` to `claiming`. Returns `None` when the lead
    /// is no longer in `expected` (another tick got there first).
    async fn claim_lead(
        &self,
        id: &LeadId,
        expected: LeadStatus,
    ) -> Result<Option<LeadClaim>, LeadlineError>;

    /// Return a lead still held under `claim` to `restore` without touching
    /// its counters. A claim that was already lost is left alone.
    async fn release_claim(
        &self,
        id: &LeadId,
        claim: &LeadClaim,
        restore: LeadStatus,
    ) -> Result<(), LeadlineError>;

    /// Book a placed call: `call_attempts += 1`, `last_called_at = at`,
    /// `last_call_id = call_id`, `status = calling`. One atomic update, applied
    /// only while the lead is still held under `claim`; otherwise `Conflict`.
    async fn record_attempt(
        &self,
        id: &LeadId,
        claim: &LeadClaim,
        call_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Lead, LeadlineError>;

    /// Return leads claimed before `claimed_before` to `pending`.
    async fn release_stale_claims(
        &self,
        claimed_before: DateTime<Utc>,
    ) -> Result<u64, LeadlineError>;

    /// Compare-and-swap on status alone. Returns `false` if the lead was not in `expected`.
    async fn transition_status(
        &self,
        id: &LeadId,
        expected: LeadStatus,
        next: LeadStatus,
    ) -> Result<bool, LeadlineError>;

    /// Set or clear the booked meeting together with the new status.
    /// `Conflict` while the lead is claimed.
    async fn set_appointment(
        &self,
        id: &LeadId,
        appointment_at: Option<DateTime<Utc>>,
        status: LeadStatus,
    ) -> Result<Lead, LeadlineError>;

    async fn create_lead(&self, lead: &NewLead) -> Result<Lead, LeadlineError>;

    async fn get_lead(&self, id: &LeadId) -> Result<Option<Lead>, LeadlineError>;

    async fn find_by_call_id(&self, call_id: &str) -> Result<Option<Lead>, LeadlineError>;

    /// Case-insensitive email lookup; the most recently created match wins.
    async fn find_by_email(&self, email: &str) -> Result<Option<Lead>, LeadlineError>;

    async fn list_leads(&self, status: Option<LeadStatus>) -> Result<Vec<Lead>, LeadlineError>;

    /// `Conflict` while the lead is claimed.
    async fn update_lead(&self, id: &LeadId, patch: &LeadPatch) -> Result<Lead, LeadlineError>;

    /// Returns `false` if no such lead existed.
    async fn delete_lead(&self, id: &LeadId) -> Result<bool, LeadlineError>;
}

/// Singleton automation settings row.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Read the settings, creating the default row on first access.
    async fn read(&self) -> Result<AutomationSettings, LeadlineError>;

    /// Apply a validated partial update and return the stored result.
    async fn write(&self, patch: &SettingsPatch) -> Result<AutomationSettings, LeadlineError>;
}

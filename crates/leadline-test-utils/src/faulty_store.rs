// SPDX-FileCopyrightText: 2026 Leadline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store wrapper that injects failures and counts accesses.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use leadline_core::{
    AutomationSettings, EligibilityCriteria, Lead, LeadClaim, LeadId, LeadPatch, LeadStatus,
    LeadStore, LeadlineError, NewLead, SettingsPatch, SettingsStore,
};

fn injected(what: &str) -> LeadlineError {
    LeadlineError::Storage {
        source: format!("injected failure: {what}").into(),
    }
}

/// Wraps a real store; every call is counted and selected calls fail.
pub struct FaultyStore<S> {
    inner: Arc<S>,
    fail_query: AtomicBool,
    fail_settings_read: AtomicBool,
    fail_record_for: Mutex<HashSet<LeadId>>,
    fail_claim_for: Mutex<HashSet<LeadId>>,
    steal_claim_for: Mutex<HashSet<LeadId>>,
    accesses: AtomicUsize,
    writes: AtomicUsize,
}

impl<S> FaultyStore<S> {
    pub fn new(inner: Arc<S>) -> Self {
        Self {
            inner,
            fail_query: AtomicBool::new(false),
            fail_settings_read: AtomicBool::new(false),
            fail_record_for: Mutex::new(HashSet::new()),
            fail_claim_for: Mutex::new(HashSet::new()),
            steal_claim_for: Mutex::new(HashSet::new()),
            accesses: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn fail_query(&self, on: bool) {
        self.fail_query.store(on, Ordering::SeqCst);
    }

    pub fn fail_settings_read(&self, on: bool) {
        self.fail_settings_read.store(on, Ordering::SeqCst);
    }

    /// `record_attempt` for this lead fails after the call is placed.
    pub async fn fail_record_for(&self, id: &LeadId) {
        self.fail_record_for.lock().await.insert(id.clone());
    }

    /// `claim_lead` for this lead returns a store error.
    pub async fn fail_claim_for(&self, id: &LeadId) {
        self.fail_claim_for.lock().await.insert(id.clone());
    }

    /// `claim_lead` for this lead reports the claim as already taken.
    pub async fn steal_claim_for(&self, id: &LeadId) {
        self.steal_claim_for.lock().await.insert(id.clone());
    }

    /// Calls of any kind, across both store traits.
    pub fn accesses(&self) -> usize {
        self.accesses.load(Ordering::SeqCst)
    }

    /// Mutating calls, across both store traits.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn read_access(&self) {
        self.accesses.fetch_add(1, Ordering::SeqCst);
    }

    fn write_access(&self) {
        self.accesses.fetch_add(1, Ordering::SeqCst);
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl<S: LeadStore + 'static> LeadStore for FaultyStore<S> {
    async fn query_eligible(
        &self,
        criteria: &EligibilityCriteria,
    ) -> Result<Vec<Lead>, LeadlineError> {
        self.read_access();
        if self.fail_query.load(Ordering::SeqCst) {
            return Err(injected("query_eligible"));
        }
        self.inner.query_eligible(criteria).await
    }

    async fn claim_lead(
        &self,
        id: &LeadId,
        expected: LeadStatus,
    ) -> Result<Option<LeadClaim>, LeadlineError> {
        self.write_access();
        if self.fail_claim_for.lock().await.contains(id) {
            return Err(injected("claim_lead"));
        }
        if self.steal_claim_for.lock().await.contains(id) {
            return Ok(None);
        }
        self.inner.claim_lead(id, expected).await
    }

    async fn release_claim(
        &self,
        id: &LeadId,
        claim: &LeadClaim,
        restore: LeadStatus,
    ) -> Result<(), LeadlineError> {
        self.write_access();
        self.inner.release_claim(id, claim, restore).await
    }

    async fn record_attempt(
        &self,
        id: &LeadId,
        claim: &LeadClaim,
        call_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Lead, LeadlineError> {
        self.write_access();
        if self.fail_record_for.lock().await.contains(id) {
            return Err(injected("record_attempt"));
        }
        self.inner.record_attempt(id, claim, call_id, at).await
    }

    async fn release_stale_claims(
        &self,
        claimed_before: DateTime<Utc>,
    ) -> Result<u64, LeadlineError> {
        self.write_access();
        self.inner.release_stale_claims(claimed_before).await
    }

    async fn transition_status(
        &self,
        id: &LeadId,
        expected: LeadStatus,
        next: LeadStatus,
    ) -> Result<bool, LeadlineError> {
        self.write_access();
        self.inner.transition_status(id, expected, next).await
    }

    async fn set_appointment(
        &self,
        id: &LeadId,
        appointment_at: Option<DateTime<Utc>>,
        status: LeadStatus,
    ) -> Result<Lead, LeadlineError> {
        self.write_access();
        self.inner.set_appointment(id, appointment_at, status).await
    }

    async fn create_lead(&self, lead: &NewLead) -> Result<Lead, LeadlineError> {
        self.write_access();
        self.inner.create_lead(lead).await
    }

    async fn get_lead(&self, id: &LeadId) -> Result<Option<Lead>, LeadlineError> {
        self.read_access();
        self.inner.get_lead(id).await
    }

    async fn find_by_call_id(&self, call_id: &str) -> Result<Option<Lead>, LeadlineError> {
        self.read_access();
        self.inner.find_by_call_id(call_id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Lead>, LeadlineError> {
        self.read_access();
        self.inner.find_by_email(email).await
    }

    async fn list_leads(&self, status: Option<LeadStatus>) -> Result<Vec<Lead>, LeadlineError> {
        self.read_access();
        self.inner.list_leads(status).await
    }

    async fn update_lead(&self, id: &LeadId, patch: &LeadPatch) -> Result<Lead, LeadlineError> {
        self.write_access();
        self.inner.update_lead(id, patch).await
    }

    async fn delete_lead(&self, id: &LeadId) -> Result<bool, LeadlineError> {
        self.write_access();
        self.inner.delete_lead(id).await
    }
}

#[async_trait]
impl<S: SettingsStore + 'static> SettingsStore for FaultyStore<S> {
    async fn read(&self) -> Result<AutomationSettings, LeadlineError> {
        self.read_access();
        if self.fail_settings_read.load(Ordering::SeqCst) {
            return Err(injected("settings read"));
        }
        self.inner.read().await
    }

    async fn write(&self, patch: &SettingsPatch) -> Result<AutomationSettings, LeadlineError> {
        self.write_access();
        self.inner.write(patch).await
    }
}

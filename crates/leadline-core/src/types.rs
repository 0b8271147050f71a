// SPDX-FileCopyrightText: 2026 Leadline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the scheduler, the stores, and the HTTP surface.

use std::cmp::Ordering;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use thiserror::Error;

use crate::error::LeadlineError;

/// Opaque unique identifier for a lead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeadId(pub String);

impl LeadId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LeadId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle state of a lead.
///
/// `Claiming` is the short-lived reservation a tick takes on a lead before
/// dispatching; every other state is either an eligibility input
/// (`Pending`) or an outcome written by the dispatcher or a webhook.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    AsRefStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    Pending,
    Claiming,
    Calling,
    NoAnswer,
    Scheduled,
    NotInterested,
    Error,
}

impl LeadStatus {
    /// Whether a human may start a call for a lead in this state.
    ///
    /// Leads that are already reserved, on a call, or booked are refused.
    pub fn is_manually_callable(self) -> bool {
        match self {
            LeadStatus::Pending
            | LeadStatus::NoAnswer
            | LeadStatus::NotInterested
            | LeadStatus::Error => true,
            LeadStatus::Claiming | LeadStatus::Calling | LeadStatus::Scheduled => false,
        }
    }
}

/// One prospect record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub company_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub status: LeadStatus,
    /// Successfully placed calls; never advanced by a failed dispatch.
    pub call_attempts: u32,
    pub last_called_at: Option<DateTime<Utc>>,
    /// Identifier returned by the voice API for the most recent call.
    pub last_call_id: Option<String>,
    /// Meeting time set by the booking webhook.
    pub appointment_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A held reservation on one lead, returned by a successful claim.
///
/// Only the holder may book or release the lead. Once stale-claim recovery
/// hands the lead to someone else, this value no longer matches the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeadClaim {
    pub claimed_at: DateTime<Utc>,
}

/// Fields required to create a lead.
#[derive(Debug, Clone, Deserialize)]
pub struct NewLead {
    pub company_name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl NewLead {
    pub fn validate(&self) -> Result<(), LeadlineError> {
        if self.company_name.trim().is_empty() {
            return Err(LeadlineError::Validation(
                "company_name must not be empty".to_string(),
            ));
        }
        validate_phone(&self.phone)
    }
}

/// Human edits to a lead. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadPatch {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub status: Option<LeadStatus>,
}

impl LeadPatch {
    pub fn validate(&self) -> Result<(), LeadlineError> {
        if let Some(name) = &self.company_name
            && name.trim().is_empty()
        {
            return Err(LeadlineError::Validation(
                "company_name must not be empty".to_string(),
            ));
        }
        if let Some(phone) = &self.phone {
            validate_phone(phone)?;
        }
        if self.status == Some(LeadStatus::Claiming) {
            return Err(LeadlineError::Validation(
                "status `claiming` is reserved for the scheduler".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.company_name.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.status.is_none()
    }
}

fn validate_phone(phone: &str) -> Result<(), LeadlineError> {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')' | '.'));
    if digits < 7 || !allowed {
        return Err(LeadlineError::Validation(format!(
            "phone `{phone}` is not a valid phone number"
        )));
    }
    Ok(())
}

/// Singleton automation configuration row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationSettings {
    /// Master switch for scheduled ticks.
    pub automation_enabled: bool,
    /// Upper bound on leads processed per tick.
    pub max_calls_batch: u32,
    /// Minimum spacing between attempts for the same lead, in hours.
    pub retry_interval: f64,
    /// Ceiling on `call_attempts` before a lead is permanently excluded.
    pub max_attempts: u32,
}

impl Default for AutomationSettings {
    fn default() -> Self {
        Self {
            automation_enabled: false,
            max_calls_batch: 10,
            retry_interval: 4.0,
            max_attempts: 3,
        }
    }
}

/// Upper bound on `retry_interval`: one hundred years.
pub const MAX_RETRY_INTERVAL_HOURS: f64 = 100.0 * 365.25 * 24.0;

impl AutomationSettings {
    /// The safe fallback used when settings cannot be read.
    pub fn disabled() -> Self {
        Self {
            automation_enabled: false,
            ..Self::default()
        }
    }

    /// Reject rows the scheduler cannot act on.
    pub fn validate(&self) -> Result<(), LeadlineError> {
        if self.max_calls_batch == 0 {
            return Err(LeadlineError::Config(
                "max_calls_batch must be at least 1".to_string(),
            ));
        }
        if !self.retry_interval.is_finite()
            || self.retry_interval <= 0.0
            || self.retry_interval > MAX_RETRY_INTERVAL_HOURS
        {
            return Err(LeadlineError::Config(format!(
                "retry_interval must be between 0 and {MAX_RETRY_INTERVAL_HOURS} hours, got {}",
                self.retry_interval
            )));
        }
        if self.max_attempts == 0 {
            return Err(LeadlineError::Config(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns a copy with the patch applied, or a validation error.
    pub fn apply(&self, patch: &SettingsPatch) -> Result<Self, LeadlineError> {
        let next = Self {
            automation_enabled: patch.automation_enabled.unwrap_or(self.automation_enabled),
            max_calls_batch: patch.max_calls_batch.unwrap_or(self.max_calls_batch),
            retry_interval: patch.retry_interval.unwrap_or(self.retry_interval),
            max_attempts: patch.max_attempts.unwrap_or(self.max_attempts),
        };
        next.validate()
            .map_err(|e| LeadlineError::Validation(e.to_string()))?;
        Ok(next)
    }
}

/// Partial settings update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsPatch {
    #[serde(default)]
    pub automation_enabled: Option<bool>,
    #[serde(default)]
    pub max_calls_batch: Option<u32>,
    #[serde(default)]
    pub retry_interval: Option<f64>,
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

/// Inputs to the eligibility query for one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct EligibilityCriteria {
    pub retry_interval_hours: f64,
    pub max_attempts: u32,
    pub limit: u32,
    pub now: DateTime<Utc>,
}

impl EligibilityCriteria {
    pub fn from_settings(settings: &AutomationSettings, now: DateTime<Utc>) -> Self {
        Self {
            retry_interval_hours: settings.retry_interval,
            max_attempts: settings.max_attempts,
            limit: settings.max_calls_batch,
            now,
        }
    }

    /// Leads last called strictly before this instant are due again.
    ///
    /// An interval too large to represent yields the earliest instant, so
    /// no previously called lead is due.
    pub fn cutoff(&self) -> DateTime<Utc> {
        let millis = (self.retry_interval_hours * 3_600_000.0).round();
        if !millis.is_finite() || millis >= i64::MAX as f64 || millis < 0.0 {
            return DateTime::<Utc>::MIN_UTC;
        }
        chrono::TimeDelta::try_milliseconds(millis as i64)
            .and_then(|delta| self.now.checked_sub_signed(delta))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// The selection predicate: pending, under the attempt ceiling, and
    /// either never called or last called before the cutoff.
    pub fn matches(&self, lead: &Lead) -> bool {
        lead.status == LeadStatus::Pending
            && lead.call_attempts < self.max_attempts
            && lead
                .last_called_at
                .is_none_or(|called| called < self.cutoff())
    }

    /// In-memory selection with the same semantics as the store query.
    pub fn select<I>(&self, leads: I) -> Vec<Lead>
    where
        I: IntoIterator<Item = Lead>,
    {
        let mut eligible: Vec<Lead> = leads.into_iter().filter(|l| self.matches(l)).collect();
        eligible.sort_by(eligibility_order);
        eligible.truncate(self.limit as usize);
        eligible
    }
}

/// Never-called leads first, then oldest `last_called_at` first.
///
/// Ties break on id so the order is total.
pub fn eligibility_order(a: &Lead, b: &Lead) -> Ordering {
    match (a.last_called_at, b.last_called_at) {
        (None, None) => a.id.cmp(&b.id),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.id.cmp(&b.id)),
    }
}

/// Tenant-level call configuration for the voice API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallConfig {
    pub assistant_id: String,
    pub phone_number_id: String,
}

/// One outbound call to place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub lead_id: LeadId,
    pub phone_number: String,
    pub customer_name: String,
    /// Stable per-attempt token: `<lead_id>:<attempt number>`.
    pub idempotency_key: String,
}

impl CallRequest {
    pub fn for_lead(lead: &Lead) -> Self {
        Self {
            lead_id: lead.id.clone(),
            phone_number: lead.phone.clone(),
            customer_name: lead.company_name.clone(),
            idempotency_key: format!("{}:{}", lead.id, lead.call_attempts + 1),
        }
    }
}

/// A call the voice API accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedCall {
    pub call_id: String,
}

/// Why one lead's attempt did not complete cleanly.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AttemptError {
    /// The lead could not be reserved; nothing was dispatched.
    #[error("claim failed: {0}")]
    Claim(String),

    /// The voice API refused or could not be reached; no attempt was consumed.
    #[error("dispatch failed: {0}")]
    Dispatch(String),

    /// The voice API did not answer in time; treated like a dispatch failure.
    #[error("dispatch timed out after {0:?}")]
    Timeout(Duration),

    /// The call was placed but the lead row could not be advanced.
    #[error("call {call_id} placed but lead update failed: {message}")]
    Bookkeeping { call_id: String, message: String },
}

impl AttemptError {
    pub fn kind(&self) -> AttemptErrorKind {
        match self {
            AttemptError::Claim(_) => AttemptErrorKind::Claim,
            AttemptError::Dispatch(_) => AttemptErrorKind::Dispatch,
            AttemptError::Timeout(_) => AttemptErrorKind::Timeout,
            AttemptError::Bookkeeping { .. } => AttemptErrorKind::Bookkeeping,
        }
    }
}

/// Serialized discriminant of [`AttemptError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AttemptErrorKind {
    Claim,
    Dispatch,
    Timeout,
    Bookkeeping,
}

/// Per-lead outcome of one tick. In-memory only.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptResult {
    pub lead_id: LeadId,
    /// Set whenever the voice API accepted the call, including bookkeeping failures.
    pub call_id: Option<String>,
    pub error: Option<AttemptError>,
}

impl AttemptResult {
    pub fn placed(lead_id: LeadId, call_id: String) -> Self {
        Self {
            lead_id,
            call_id: Some(call_id),
            error: None,
        }
    }

    pub fn failed(lead_id: LeadId, error: AttemptError) -> Self {
        let call_id = match &error {
            AttemptError::Bookkeeping { call_id, .. } => Some(call_id.clone()),
            _ => None,
        };
        Self {
            lead_id,
            call_id,
            error: Some(error),
        }
    }

    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate counts for a tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickTotals {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Selected leads another tick claimed first.
    pub skipped: usize,
}

/// JSON view of one [`AttemptResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadAttemptReport {
    pub lead_id: LeadId,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<AttemptErrorKind>,
}

impl From<&AttemptResult> for LeadAttemptReport {
    fn from(result: &AttemptResult) -> Self {
        Self {
            lead_id: result.lead_id.clone(),
            success: result.success(),
            call_id: result.call_id.clone(),
            error: result.error.as_ref().map(|e| e.to_string()),
            error_kind: result.error.as_ref().map(AttemptError::kind),
        }
    }
}

/// Result returned to the tick trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickSummary {
    pub message: String,
    pub totals: TickTotals,
    pub per_lead: Vec<LeadAttemptReport>,
}

impl TickSummary {
    /// A summary for a tick that touched nothing.
    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            totals: TickTotals::default(),
            per_lead: Vec::new(),
        }
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of collaborator behind an adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Dialer,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0).unwrap()
    }

    fn lead(id: &str, status: LeadStatus, attempts: u32, last: Option<DateTime<Utc>>) -> Lead {
        Lead {
            id: LeadId::from(id),
            company_name: format!("{id} Ltd"),
            phone: "+15550100".to_string(),
            email: None,
            status,
            call_attempts: attempts,
            last_called_at: last,
            last_call_id: None,
            appointment_at: None,
            created_at: at(0),
            updated_at: at(0),
        }
    }

    fn criteria(now: DateTime<Utc>) -> EligibilityCriteria {
        EligibilityCriteria {
            retry_interval_hours: 4.0,
            max_attempts: 3,
            limit: 10,
            now,
        }
    }

    #[test]
    fn lead_status_round_trips_snake_case() {
        use std::str::FromStr;

        assert_eq!(LeadStatus::NoAnswer.to_string(), "no_answer");
        assert_eq!(
            LeadStatus::from_str("not_interested").unwrap(),
            LeadStatus::NotInterested
        );
        assert!(LeadStatus::from_str("Pending").is_err());
        let json = serde_json::to_string(&LeadStatus::Claiming).unwrap();
        assert_eq!(json, "\"claiming\"");
    }

    #[test]
    fn never_called_pending_lead_matches() {
        let c = criteria(at(12));
        assert!(c.matches(&lead("a", LeadStatus::Pending, 0, None)));
    }

    #[test]
    fn recently_called_lead_does_not_match() {
        let c = criteria(at(12));
        assert!(!c.matches(&lead("a", LeadStatus::Pending, 1, Some(at(9)))));
        // Exactly at the cutoff is still too recent.
        assert!(!c.matches(&lead("a", LeadStatus::Pending, 1, Some(at(8)))));
        assert!(c.matches(&lead("a", LeadStatus::Pending, 1, Some(at(7)))));
    }

    #[test]
    fn attempt_ceiling_excludes_lead() {
        let c = criteria(at(12));
        assert!(!c.matches(&lead("a", LeadStatus::Pending, 3, None)));
    }

    #[test]
    fn fractional_retry_interval_is_honoured() {
        let mut c = criteria(at(12));
        c.retry_interval_hours = 0.5;
        let called = at(11) + chrono::Duration::minutes(29);
        assert!(c.matches(&lead("a", LeadStatus::Pending, 1, Some(called))));
        let called = at(11) + chrono::Duration::minutes(31);
        assert!(!c.matches(&lead("a", LeadStatus::Pending, 1, Some(called))));
    }

    #[test]
    fn unrepresentable_interval_makes_no_called_lead_due() {
        let mut c = criteria(at(12));
        c.retry_interval_hours = 1e10;
        assert_eq!(c.cutoff(), DateTime::<Utc>::MIN_UTC);
        assert!(!c.matches(&lead("a", LeadStatus::Pending, 1, Some(at(0)))));
        assert!(c.matches(&lead("b", LeadStatus::Pending, 0, None)));

        c.retry_interval_hours = f64::MAX;
        assert_eq!(c.cutoff(), DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn settings_reject_interval_beyond_a_century() {
        let patch = SettingsPatch {
            retry_interval: Some(1e10),
            ..Default::default()
        };
        let err = AutomationSettings::default().apply(&patch).unwrap_err();
        assert!(matches!(err, LeadlineError::Validation(msg) if msg.contains("retry_interval")));

        let patch = SettingsPatch {
            retry_interval: Some(MAX_RETRY_INTERVAL_HOURS),
            ..Default::default()
        };
        assert!(AutomationSettings::default().apply(&patch).is_ok());
    }

    #[test]
    fn select_orders_never_called_first_and_truncates() {
        let mut c = criteria(at(12));
        c.limit = 2;
        let selected = c.select(vec![
            lead("old", LeadStatus::Pending, 1, Some(at(1))),
            lead("new", LeadStatus::Pending, 0, None),
            lead("older", LeadStatus::Pending, 1, Some(at(0))),
        ]);
        let ids: Vec<&str> = selected.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "older"]);
    }

    #[test]
    fn default_settings_are_disabled_and_valid() {
        let settings = AutomationSettings::default();
        assert!(!settings.automation_enabled);
        assert!(settings.validate().is_ok());
        assert_eq!(AutomationSettings::disabled(), settings);
    }

    #[test]
    fn settings_patch_rejects_zero_batch() {
        let patch = SettingsPatch {
            max_calls_batch: Some(0),
            ..Default::default()
        };
        let err = AutomationSettings::default().apply(&patch).unwrap_err();
        assert!(matches!(err, LeadlineError::Validation(msg) if msg.contains("max_calls_batch")));
    }

    #[test]
    fn settings_patch_rejects_non_finite_interval() {
        let patch = SettingsPatch {
            retry_interval: Some(f64::NAN),
            ..Default::default()
        };
        assert!(AutomationSettings::default().apply(&patch).is_err());
    }

    #[test]
    fn settings_patch_keeps_untouched_fields() {
        let patch = SettingsPatch {
            automation_enabled: Some(true),
            ..Default::default()
        };
        let next = AutomationSettings::default().apply(&patch).unwrap();
        assert!(next.automation_enabled);
        assert_eq!(next.max_calls_batch, 10);
        assert_eq!(next.max_attempts, 3);
    }

    #[test]
    fn call_request_idempotency_key_uses_next_attempt() {
        let req = CallRequest::for_lead(&lead("lead-7", LeadStatus::Pending, 2, None));
        assert_eq!(req.idempotency_key, "lead-7:3");
        assert_eq!(req.phone_number, "+15550100");
    }

    #[test]
    fn bookkeeping_failure_keeps_call_id_in_report() {
        let result = AttemptResult::failed(
            LeadId::from("a"),
            AttemptError::Bookkeeping {
                call_id: "call-1".to_string(),
                message: "disk full".to_string(),
            },
        );
        let report = LeadAttemptReport::from(&result);
        assert!(!report.success);
        assert_eq!(report.call_id.as_deref(), Some("call-1"));
        assert_eq!(report.error_kind, Some(AttemptErrorKind::Bookkeeping));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["errorKind"], "bookkeeping");
        assert_eq!(json["leadId"], "a");
    }

    #[test]
    fn patch_cannot_set_claiming() {
        let patch = LeadPatch {
            status: Some(LeadStatus::Claiming),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn new_lead_rejects_garbage_phone() {
        let new = NewLead {
            company_name: "Acme".to_string(),
            phone: "call me".to_string(),
            email: None,
        };
        assert!(new.validate().is_err());
    }

    fn status_strategy() -> impl Strategy<Value = LeadStatus> {
        prop_oneof![
            Just(LeadStatus::Pending),
            Just(LeadStatus::Claiming),
            Just(LeadStatus::Calling),
            Just(LeadStatus::NoAnswer),
            Just(LeadStatus::Scheduled),
            Just(LeadStatus::NotInterested),
            Just(LeadStatus::Error),
        ]
    }

    fn lead_strategy() -> impl Strategy<Value = Lead> {
        (
            "[a-z]{6}",
            status_strategy(),
            0u32..6,
            proptest::option::of(0i64..48 * 60),
        )
            .prop_map(|(id, status, attempts, minutes_ago)| {
                let last = minutes_ago.map(|m| at(12) + chrono::Duration::hours(12) - chrono::Duration::minutes(m));
                lead(&id, status, attempts, last)
            })
    }

    proptest! {
        #[test]
        fn select_returns_exactly_matching_leads_in_order(
            leads in proptest::collection::vec(lead_strategy(), 0..40),
            limit in 1u32..15,
            interval in 0.25f64..24.0,
            max_attempts in 1u32..5,
        ) {
            let c = EligibilityCriteria {
                retry_interval_hours: interval,
                max_attempts,
                limit,
                now: at(12) + chrono::Duration::hours(12),
            };
            let selected = c.select(leads.clone());

            prop_assert!(selected.len() <= limit as usize);
            for l in &selected {
                prop_assert!(c.matches(l));
            }
            let matching = leads.iter().filter(|l| c.matches(l)).count();
            prop_assert_eq!(selected.len(), matching.min(limit as usize));

            for pair in selected.windows(2) {
                prop_assert_ne!(eligibility_order(&pair[0], &pair[1]), Ordering::Greater);
                if pair[0].last_called_at.is_some() {
                    prop_assert!(pair[1].last_called_at.is_some());
                }
            }
        }
    }
}

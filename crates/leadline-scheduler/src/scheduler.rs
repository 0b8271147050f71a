// SPDX-FileCopyrightText: 2026 Leadline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tick orchestration and per-lead dispatch.
//!
//! A tick runs: credential check, settings load (falling back to disabled),
//! stale-claim recovery, eligibility query, then claim, dispatch and
//! bookkeeping per lead with bounded concurrency, and finally the summary.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::stream::{self, StreamExt};
use leadline_config::LeadlineConfig;
use leadline_core::{
    AttemptError, AttemptResult, AutomationSettings, CallRequest, EligibilityCriteria, Lead,
    LeadClaim, LeadId, LeadStatus, LeadStore, LeadlineError, SettingsStore, TickSummary,
    VoiceDialer,
};
use tracing::{debug, error, info, warn};

use crate::auth::TriggerAuth;
use crate::error::TickError;
use crate::summary::{DISABLED_MESSAGE, LeadOutcome, NO_LEADS_MESSAGE, build_summary};

/// Runtime knobs for the scheduler.
#[derive(Debug)]
pub struct SchedulerOptions {
    pub trigger: TriggerAuth,
    /// Bound on a single dispatch; expiry counts as a dispatch failure.
    pub dispatch_timeout: Duration,
    pub max_concurrency: usize,
    /// Claims older than this are returned to their prior status.
    pub claim_ttl: Duration,
}

impl SchedulerOptions {
    pub fn from_config(config: &LeadlineConfig) -> Self {
        Self {
            trigger: TriggerAuth::new(config.trigger.secret.clone()),
            dispatch_timeout: Duration::from_secs(config.dialer.timeout_secs),
            max_concurrency: config.dialer.max_concurrency,
            claim_ttl: Duration::from_secs(config.scheduler.claim_ttl_secs),
        }
    }
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            trigger: TriggerAuth::default(),
            dispatch_timeout: Duration::from_secs(30),
            max_concurrency: 5,
            claim_ttl: Duration::from_secs(600),
        }
    }
}

/// The lead contact scheduler.
pub struct Scheduler {
    leads: Arc<dyn LeadStore>,
    settings: Arc<dyn SettingsStore>,
    dialer: Arc<dyn VoiceDialer>,
    options: SchedulerOptions,
}

impl Scheduler {
    pub fn new(
        leads: Arc<dyn LeadStore>,
        settings: Arc<dyn SettingsStore>,
        dialer: Arc<dyn VoiceDialer>,
        options: SchedulerOptions,
    ) -> Self {
        Self {
            leads,
            settings,
            dialer,
            options,
        }
    }

    /// Run one tick on behalf of the external trigger.
    ///
    /// The credential is checked before anything else; a rejected trigger
    /// causes no reads and no writes.
    pub async fn run_tick(&self, credential: Option<&str>) -> Result<TickSummary, TickError> {
        if !self.options.trigger.verify(credential) {
            warn!("tick rejected: invalid trigger credential");
            return Err(TickError::Unauthorized);
        }

        let started = Instant::now();
        let settings = self.load_settings().await;
        if !settings.automation_enabled {
            info!("automation disabled, tick skipped");
            return Ok(TickSummary::empty(DISABLED_MESSAGE));
        }

        self.recover_stale_claims().await;

        let criteria = EligibilityCriteria::from_settings(&settings, Utc::now());
        let eligible = self.leads.query_eligible(&criteria).await.map_err(|e| {
            error!(error = %e, "eligibility query failed, tick aborted");
            TickError::Query(e)
        })?;
        debug!(
            count = eligible.len(),
            limit = criteria.limit,
            cutoff = %criteria.cutoff(),
            "eligible leads selected"
        );

        if eligible.is_empty() {
            info!("no leads to process");
            return Ok(TickSummary::empty(NO_LEADS_MESSAGE));
        }

        let concurrency = self.options.max_concurrency.max(1);
        let outcomes: Vec<LeadOutcome> = stream::iter(eligible)
            .map(|lead| self.attempt(lead, LeadStatus::Pending))
            .buffered(concurrency)
            .collect()
            .await;

        let summary = build_summary(&outcomes);
        info!(
            total = summary.totals.total,
            successful = summary.totals.successful,
            failed = summary.totals.failed,
            skipped = summary.totals.skipped,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "tick complete"
        );
        Ok(summary)
    }

    /// Call one lead on a human's request.
    ///
    /// Ignores the automation switch and the attempt ceiling but still goes
    /// through the claim so it cannot race a tick.
    pub async fn call_lead(&self, id: &LeadId) -> Result<AttemptResult, LeadlineError> {
        let lead = self
            .leads
            .get_lead(id)
            .await?
            .ok_or_else(|| LeadlineError::lead_not_found(id.as_str()))?;

        if !lead.status.is_manually_callable() {
            return Err(LeadlineError::Conflict(format!(
                "lead {id} is {} and cannot be called now",
                lead.status
            )));
        }

        let from = lead.status;
        match self.attempt(lead, from).await {
            LeadOutcome::Attempted(result) => Ok(result),
            LeadOutcome::Skipped(_) => Err(LeadlineError::Conflict(format!(
                "lead {id} was claimed by another operation"
            ))),
        }
    }

    async fn load_settings(&self) -> AutomationSettings {
        match self.settings.read().await {
            Ok(settings) => match settings.validate() {
                Ok(()) => settings,
                Err(e) => {
                    warn!(error = %e, "automation settings invalid, treating automation as disabled");
                    AutomationSettings::disabled()
                }
            },
            Err(e) => {
                warn!(error = %e, "automation settings unreadable, treating automation as disabled");
                AutomationSettings::disabled()
            }
        }
    }

    async fn recover_stale_claims(&self) {
        let Ok(ttl) = chrono::Duration::from_std(self.options.claim_ttl) else {
            return;
        };
        match self.leads.release_stale_claims(Utc::now() - ttl).await {
            Ok(0) => {}
            Ok(released) => warn!(released, "released stale lead claims"),
            Err(e) => warn!(error = %e, "stale claim recovery failed"),
        }
    }

    /// Claim, dispatch and book one lead.
    async fn attempt(&self, lead: Lead, from: LeadStatus) -> LeadOutcome {
        let id = lead.id.clone();

        let claim = match self.leads.claim_lead(&id, from).await {
            Ok(Some(claim)) => claim,
            Ok(None) => {
                debug!(lead_id = %id, "lead already claimed, skipping");
                return LeadOutcome::Skipped(id);
            }
            Err(e) => {
                warn!(lead_id = %id, error = %e, "failed to claim lead");
                return LeadOutcome::Attempted(AttemptResult::failed(
                    id,
                    AttemptError::Claim(e.to_string()),
                ));
            }
        };

        let request = CallRequest::for_lead(&lead);
        let timeout = self.options.dispatch_timeout;
        let dispatched = tokio::time::timeout(timeout, self.dialer.place_call(&request)).await;
        let placed = match dispatched {
            Ok(Ok(placed)) => placed,
            Ok(Err(e)) => {
                warn!(lead_id = %id, error = %e, "call dispatch failed");
                self.release(&id, &claim, from).await;
                return LeadOutcome::Attempted(AttemptResult::failed(
                    id,
                    AttemptError::Dispatch(e.to_string()),
                ));
            }
            Err(_) => {
                warn!(lead_id = %id, timeout_secs = timeout.as_secs(), "call dispatch timed out");
                self.release(&id, &claim, from).await;
                return LeadOutcome::Attempted(AttemptResult::failed(
                    id,
                    AttemptError::Timeout(timeout),
                ));
            }
        };

        match self
            .leads
            .record_attempt(&id, &claim, &placed.call_id, Utc::now())
            .await
        {
            Ok(updated) => {
                info!(
                    lead_id = %id,
                    call_id = %placed.call_id,
                    attempts = updated.call_attempts,
                    "call placed"
                );
                LeadOutcome::Attempted(AttemptResult::placed(id, placed.call_id))
            }
            Err(e) => {
                error!(
                    lead_id = %id,
                    call_id = %placed.call_id,
                    error = %e,
                    "call placed but lead update failed; manual reconciliation required"
                );
                LeadOutcome::Attempted(AttemptResult::failed(
                    id,
                    AttemptError::Bookkeeping {
                        call_id: placed.call_id,
                        message: e.to_string(),
                    },
                ))
            }
        }
    }

    async fn release(&self, id: &LeadId, claim: &LeadClaim, restore: LeadStatus) {
        if let Err(e) = self.leads.release_claim(id, claim, restore).await {
            error!(lead_id = %id, error = %e, "failed to release claim; lead waits for stale-claim recovery");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_follow_config() {
        let mut config = LeadlineConfig::default();
        config.trigger.secret = Some("s3cret".into());
        config.dialer.timeout_secs = 7;
        config.dialer.max_concurrency = 3;
        config.scheduler.claim_ttl_secs = 90;

        let options = SchedulerOptions::from_config(&config);
        assert!(options.trigger.verify(Some("s3cret")));
        assert_eq!(options.dispatch_timeout, Duration::from_secs(7));
        assert_eq!(options.max_concurrency, 3);
        assert_eq!(options.claim_ttl, Duration::from_secs(90));
    }

    #[test]
    fn default_options_reject_every_trigger() {
        assert!(!SchedulerOptions::default().trigger.verify(Some("anything")));
    }
}

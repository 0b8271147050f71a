// SPDX-FileCopyrightText: 2026 Leadline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook reconciliation: call-ended reports and calendar bookings.
//!
//! Both paths use status compare-and-swap, so an event that arrives after
//! a human edit or a later transition leaves the lead alone.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use leadline_core::{
    AutomationSettings, Lead, LeadId, LeadStatus, LeadStore, LeadlineError, SettingsStore,
};
use tracing::{debug, info, warn};

/// Coarse result of a finished call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    /// Nobody picked up: no answer, busy, voicemail, silence.
    Unanswered,
    /// The call broke on the provider side.
    Failed,
    /// A conversation took place.
    Completed,
}

impl CallOutcome {
    /// Classify a voice API `endedReason`.
    pub fn classify(ended_reason: &str) -> Self {
        let reason = ended_reason.trim().to_ascii_lowercase();
        const UNANSWERED: [&str; 5] = [
            "did-not-answer",
            "no-answer",
            "busy",
            "voicemail",
            "silence-timed-out",
        ];
        if UNANSWERED.iter().any(|m| reason.contains(m)) {
            CallOutcome::Unanswered
        } else if reason.starts_with("pipeline-error")
            || reason.contains("error")
            || reason.contains("failed")
        {
            CallOutcome::Failed
        } else {
            CallOutcome::Completed
        }
    }
}

/// End-of-call report from the voice API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallEndedEvent {
    pub call_id: String,
    pub ended_reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingKind {
    Created,
    Cancelled,
}

/// Calendar booking change, normalised across calendar providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingEvent {
    pub kind: BookingKind,
    pub email: String,
    pub start_time: Option<DateTime<Utc>>,
}

/// What reconciliation did with an event.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    Updated { lead_id: LeadId, status: LeadStatus },
    /// The lead exists but its current status does not accept this event.
    Unchanged { lead_id: LeadId, status: LeadStatus },
    /// No lead matches the event.
    Ignored,
}

/// Applies webhook events to leads.
pub struct Reconciler {
    leads: Arc<dyn LeadStore>,
    settings: Arc<dyn SettingsStore>,
}

impl Reconciler {
    pub fn new(leads: Arc<dyn LeadStore>, settings: Arc<dyn SettingsStore>) -> Self {
        Self { leads, settings }
    }

    /// Move a `calling` lead to its post-call status.
    pub async fn call_ended(
        &self,
        event: &CallEndedEvent,
    ) -> Result<ReconcileOutcome, LeadlineError> {
        let Some(lead) = self.leads.find_by_call_id(&event.call_id).await? else {
            debug!(call_id = %event.call_id, "call-ended event for unknown call ignored");
            return Ok(ReconcileOutcome::Ignored);
        };

        if lead.status != LeadStatus::Calling {
            debug!(lead_id = %lead.id, status = %lead.status, "lead not calling, call-ended event ignored");
            return Ok(unchanged(&lead));
        }

        let outcome = CallOutcome::classify(&event.ended_reason);
        let next = match outcome {
            CallOutcome::Unanswered => {
                let max_attempts = self.max_attempts().await;
                if lead.call_attempts < max_attempts {
                    LeadStatus::Pending
                } else {
                    LeadStatus::NoAnswer
                }
            }
            CallOutcome::Failed => LeadStatus::Error,
            CallOutcome::Completed => LeadStatus::NotInterested,
        };

        if self
            .leads
            .transition_status(&lead.id, LeadStatus::Calling, next)
            .await?
        {
            info!(
                lead_id = %lead.id,
                call_id = %event.call_id,
                ended_reason = %event.ended_reason,
                status = %next,
                "call outcome recorded"
            );
            Ok(ReconcileOutcome::Updated {
                lead_id: lead.id,
                status: next,
            })
        } else {
            // Moved on between the lookup and the update (e.g. a booking landed).
            let current = self.leads.get_lead(&lead.id).await?;
            Ok(current.map_or(ReconcileOutcome::Ignored, |l| unchanged(&l)))
        }
    }

    /// Book or cancel the meeting for the lead with the event's email.
    pub async fn booking(&self, event: &BookingEvent) -> Result<ReconcileOutcome, LeadlineError> {
        let Some(lead) = self.leads.find_by_email(&event.email).await? else {
            debug!(kind = ?event.kind, "booking event for unknown email ignored");
            return Ok(ReconcileOutcome::Ignored);
        };

        match event.kind {
            BookingKind::Created => {
                let start = event.start_time.ok_or_else(|| {
                    LeadlineError::Validation("booking event is missing its start time".into())
                })?;
                let updated = self
                    .leads
                    .set_appointment(&lead.id, Some(start), LeadStatus::Scheduled)
                    .await?;
                info!(lead_id = %lead.id, appointment_at = %start, "meeting booked");
                Ok(ReconcileOutcome::Updated {
                    lead_id: updated.id,
                    status: updated.status,
                })
            }
            BookingKind::Cancelled => {
                if lead.status != LeadStatus::Scheduled {
                    debug!(lead_id = %lead.id, status = %lead.status, "cancellation for unscheduled lead ignored");
                    return Ok(unchanged(&lead));
                }
                let updated = self
                    .leads
                    .set_appointment(&lead.id, None, LeadStatus::Pending)
                    .await?;
                info!(lead_id = %lead.id, "meeting cancelled, lead back to pending");
                Ok(ReconcileOutcome::Updated {
                    lead_id: updated.id,
                    status: updated.status,
                })
            }
        }
    }

    async fn max_attempts(&self) -> u32 {
        match self.settings.read().await {
            Ok(settings) if settings.validate().is_ok() => settings.max_attempts,
            _ => {
                warn!("automation settings unavailable, using default max_attempts");
                AutomationSettings::default().max_attempts
            }
        }
    }
}

fn unchanged(lead: &Lead) -> ReconcileOutcome {
    ReconcileOutcome::Unchanged {
        lead_id: lead.id.clone(),
        status: lead.status,
    }
}

// SPDX-FileCopyrightText: 2026 Leadline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tick summary assembly.

use leadline_core::{AttemptResult, LeadAttemptReport, LeadId, TickSummary, TickTotals};

pub const DISABLED_MESSAGE: &str = "Automation is disabled";
pub const NO_LEADS_MESSAGE: &str = "No leads to process";

/// What happened to one selected lead.
#[derive(Debug, Clone, PartialEq)]
pub enum LeadOutcome {
    /// Another tick or a manual call claimed the lead first.
    Skipped(LeadId),
    Attempted(AttemptResult),
}

/// Count outcomes and package per-lead detail, preserving input order.
pub fn build_summary(outcomes: &[LeadOutcome]) -> TickSummary {
    let mut totals = TickTotals::default();
    let mut per_lead = Vec::new();

    for outcome in outcomes {
        match outcome {
            LeadOutcome::Skipped(_) => totals.skipped += 1,
            LeadOutcome::Attempted(result) => {
                totals.total += 1;
                if result.success() {
                    totals.successful += 1;
                } else {
                    totals.failed += 1;
                }
                per_lead.push(LeadAttemptReport::from(result));
            }
        }
    }

    TickSummary {
        message: format!("Processed {} leads", totals.total),
        totals,
        per_lead,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadline_core::AttemptError;

    #[test]
    fn totals_exclude_skipped_leads() {
        let outcomes = vec![
            LeadOutcome::Attempted(AttemptResult::placed("a".into(), "call-a".into())),
            LeadOutcome::Skipped("b".into()),
            LeadOutcome::Attempted(AttemptResult::failed(
                "c".into(),
                AttemptError::Dispatch("503".into()),
            )),
        ];
        let summary = build_summary(&outcomes);

        assert_eq!(summary.message, "Processed 2 leads");
        assert_eq!(
            summary.totals,
            TickTotals {
                total: 2,
                successful: 1,
                failed: 1,
                skipped: 1,
            }
        );
        let ids: Vec<&str> = summary.per_lead.iter().map(|r| r.lead_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(summary.per_lead[0].call_id.as_deref(), Some("call-a"));
        assert!(!summary.per_lead[1].success);
    }
}

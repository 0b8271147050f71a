// SPDX-FileCopyrightText: 2026 Leadline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tick-fatal errors.

use leadline_core::LeadlineError;
use thiserror::Error;

/// Why a tick produced no summary.
///
/// Everything scoped to a single lead is reported inside the summary
/// instead; only these two abort the tick.
#[derive(Debug, Error)]
pub enum TickError {
    /// The trigger credential was missing or wrong. Nothing was read or written.
    #[error("tick trigger credential rejected")]
    Unauthorized,

    /// The eligibility query failed. No lead was touched.
    #[error("eligibility query failed: {0}")]
    Query(#[source] LeadlineError),
}

// SPDX-FileCopyrightText: 2026 Leadline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Leadline contact scheduler.
//!
//! [`Scheduler::run_tick`] is the single entry point the external trigger
//! calls. It never dispatches a lead it has not first claimed, and only a
//! placed call consumes an attempt. [`Reconciler`] folds voice and calendar
//! webhooks back into lead status.

pub mod auth;
pub mod error;
pub mod reconcile;
pub mod scheduler;
pub mod summary;

pub use auth::{TriggerAuth, constant_time_eq};
pub use error::TickError;
pub use reconcile::{
    BookingEvent, BookingKind, CallEndedEvent, CallOutcome, ReconcileOutcome, Reconciler,
};
pub use scheduler::{Scheduler, SchedulerOptions};
pub use summary::{DISABLED_MESSAGE, LeadOutcome, NO_LEADS_MESSAGE, build_summary};

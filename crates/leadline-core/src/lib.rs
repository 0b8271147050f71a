// SPDX-FileCopyrightText: 2026 Leadline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Leadline lead contact scheduler.
//!
//! This crate provides the domain types, the error type, and the narrow
//! collaborator traits (Lead Store, Settings Store, Voice-Call Dispatcher)
//! the scheduler is written against. Concrete adapters live in their own
//! crates and implement the traits defined here.

pub mod error;
pub mod traits;
pub mod types;

pub use error::LeadlineError;
pub use types::{
    AdapterType, AttemptError, AttemptErrorKind, AttemptResult, AutomationSettings, CallConfig,
    CallRequest, EligibilityCriteria, HealthStatus, Lead, LeadAttemptReport, LeadClaim, LeadId,
    LeadPatch, LeadStatus, MAX_RETRY_INTERVAL_HOURS, NewLead, PlacedCall, SettingsPatch,
    TickSummary, TickTotals,
};

pub use traits::{LeadStore, PluginAdapter, SettingsStore, StorageAdapter, VoiceDialer};

// SPDX-FileCopyrightText: 2026 Leadline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use async_trait::async_trait;

use crate::error::LeadlineError;
use crate::types::{AdapterType, HealthStatus};

/// A backing service the scheduler talks to: the lead database or the
/// voice-agent API. `/health` reports one entry per adapter.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Stable identifier shown in health output, e.g. `sqlite`.
    fn name(&self) -> &str;

    fn version(&self) -> semver::Version;

    fn adapter_type(&self) -> AdapterType;

    /// Check the backing service. An `Err` means the check itself could not
    /// run; a reachable but broken service is `Ok(Unhealthy)`.
    async fn health_check(&self) -> Result<HealthStatus, LeadlineError>;

    /// Release connections before the process exits.
    async fn shutdown(&self) -> Result<(), LeadlineError>;
}

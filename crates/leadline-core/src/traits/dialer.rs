// SPDX-FileCopyrightText: 2026 Leadline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Voice-Call Dispatcher contract.

use async_trait::async_trait;

use crate::error::LeadlineError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CallRequest, PlacedCall};

/// Places outbound AI voice calls.
///
/// At-most-once from the caller's side: an `Err` does not prove the call was
/// not placed, which is why attempts are only booked after `Ok`.
#[async_trait]
pub trait VoiceDialer: PluginAdapter {
    /// Place one call using the adapter's tenant-level call configuration.
    async fn place_call(&self, request: &CallRequest) -> Result<PlacedCall, LeadlineError>;
}

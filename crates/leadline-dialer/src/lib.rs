// SPDX-FileCopyrightText: 2026 Leadline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Voice-agent dialer for the Leadline scheduler.
//!
//! Implements [`VoiceDialer`] against a Vapi-style call API: one
//! `POST /call` per attempt, keyed by the attempt's idempotency token.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use leadline_config::model::DialerConfig;
use leadline_core::{
    AdapterType, CallConfig, CallRequest, HealthStatus, LeadlineError, PlacedCall, PluginAdapter,
    VoiceDialer,
};
use secrecy::SecretString;
use tracing::{debug, info};

use crate::client::VoiceApiClient;
use crate::types::{CallMetadata, CreateCallRequest, Customer};

/// Environment fallback for the API key.
pub const API_KEY_ENV: &str = "VAPI_API_KEY";

/// Places outbound calls through the voice-agent API.
pub struct VoiceAgentDialer {
    client: VoiceApiClient,
    call_config: CallConfig,
}

impl VoiceAgentDialer {
    /// Build a dialer from configuration.
    ///
    /// API key resolution order: `dialer.api_key`, then `VAPI_API_KEY`.
    pub fn new(config: &DialerConfig) -> Result<Self, LeadlineError> {
        let api_key = resolve_api_key(&config.api_key)?;
        if config.assistant_id.trim().is_empty() || config.phone_number_id.trim().is_empty() {
            return Err(LeadlineError::Config(
                "dialer.assistant_id and dialer.phone_number_id must both be set".into(),
            ));
        }
        let client = VoiceApiClient::new(
            &config.base_url,
            &api_key,
            Duration::from_secs(config.timeout_secs),
        )?;

        info!(base_url = %config.base_url, "voice dialer initialized");
        Ok(Self::with_client(
            client,
            CallConfig {
                assistant_id: config.assistant_id.clone(),
                phone_number_id: config.phone_number_id.clone(),
            },
        ))
    }

    /// Wrap an already-built client.
    pub fn with_client(client: VoiceApiClient, call_config: CallConfig) -> Self {
        Self {
            client,
            call_config,
        }
    }

    fn build_request(&self, request: &CallRequest) -> CreateCallRequest {
        CreateCallRequest {
            assistant_id: self.call_config.assistant_id.clone(),
            phone_number_id: self.call_config.phone_number_id.clone(),
            customer: Customer {
                number: request.phone_number.clone(),
                name: request.customer_name.clone(),
            },
            metadata: Some(CallMetadata {
                lead_id: request.lead_id.to_string(),
                idempotency_key: request.idempotency_key.clone(),
            }),
        }
    }
}

#[async_trait]
impl PluginAdapter for VoiceAgentDialer {
    fn name(&self) -> &str {
        "voice-agent"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Dialer
    }

    async fn health_check(&self) -> Result<HealthStatus, LeadlineError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LeadlineError> {
        Ok(())
    }
}

#[async_trait]
impl VoiceDialer for VoiceAgentDialer {
    async fn place_call(&self, request: &CallRequest) -> Result<PlacedCall, LeadlineError> {
        let body = self.build_request(request);
        let created = self
            .client
            .create_call(&body, &request.idempotency_key)
            .await?;
        debug!(
            lead_id = %request.lead_id,
            call_id = %created.id,
            "call created"
        );
        Ok(PlacedCall {
            call_id: created.id,
        })
    }
}

fn resolve_api_key(config_key: &Option<String>) -> Result<SecretString, LeadlineError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(SecretString::from(key.clone()));
    }

    std::env::var(API_KEY_ENV)
        .ok()
        .filter(|k| !k.is_empty())
        .map(SecretString::from)
        .ok_or_else(|| {
            LeadlineError::Config(format!(
                "voice API key not found. Set dialer.api_key in config or the {API_KEY_ENV} environment variable."
            ))
        })
}

// SPDX-FileCopyrightText: 2026 Leadline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Leadline configuration.
///
/// Every section is optional and falls back to its defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LeadlineConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// SQLite storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Credential required from the external tick trigger.
    #[serde(default)]
    pub trigger: TriggerConfig,

    /// Voice-agent API settings.
    #[serde(default)]
    pub dialer: DialerConfig,

    /// Scheduler tuning.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Inbound webhook verification.
    #[serde(default)]
    pub webhooks: WebhookConfig,
}

impl LeadlineConfig {
    /// Copy with every secret replaced by a marker, for display.
    pub fn redacted(&self) -> Self {
        fn mask(value: &Option<String>) -> Option<String> {
            value.as_ref().map(|_| "[redacted]".to_string())
        }

        let mut copy = self.clone();
        copy.gateway.api_token = mask(&self.gateway.api_token);
        copy.trigger.secret = mask(&self.trigger.secret);
        copy.dialer.api_key = mask(&self.dialer.api_key);
        copy.webhooks.calendar_secret = mask(&self.webhooks.calendar_secret);
        copy.webhooks.call_secret = mask(&self.webhooks.call_secret);
        copy
    }
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name used in logs and the health endpoint.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "leadline".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("leadline").join("leadline.db"))
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "leadline.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token for dashboard routes. `None` rejects every dashboard request.
    #[serde(default)]
    pub api_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_token: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3210
}

/// Tick trigger credential.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TriggerConfig {
    /// Shared secret the trigger presents. `None` refuses every tick.
    #[serde(default)]
    pub secret: Option<String>,
}

/// Voice-agent API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DialerConfig {
    /// Base URL of the voice-agent API.
    #[serde(default = "default_dialer_base_url")]
    pub base_url: String,

    /// API key sent as a bearer token.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Assistant that conducts the call.
    #[serde(default)]
    pub assistant_id: String,

    /// Caller number the call is placed from.
    #[serde(default)]
    pub phone_number_id: String,

    /// Per-dispatch timeout; expiry counts as a dispatch failure.
    #[serde(default = "default_dialer_timeout_secs")]
    pub timeout_secs: u64,

    /// Dispatches in flight at once within one tick.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

impl Default for DialerConfig {
    fn default() -> Self {
        Self {
            base_url: default_dialer_base_url(),
            api_key: None,
            assistant_id: String::new(),
            phone_number_id: String::new(),
            timeout_secs: default_dialer_timeout_secs(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

fn default_dialer_base_url() -> String {
    "https://api.vapi.ai".to_string()
}

fn default_dialer_timeout_secs() -> u64 {
    30
}

fn default_max_concurrency() -> usize {
    5
}

/// Scheduler tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Age after which an abandoned `claiming` lead returns to `pending`.
    #[serde(default = "default_claim_ttl_secs")]
    pub claim_ttl_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            claim_ttl_secs: default_claim_ttl_secs(),
        }
    }
}

fn default_claim_ttl_secs() -> u64 {
    600
}

/// Which calendar product sends booking webhooks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarProvider {
    #[default]
    CalCom,
    Calendly,
}

/// Inbound webhook verification.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WebhookConfig {
    /// Signature format of booking webhooks.
    #[serde(default)]
    pub calendar_provider: CalendarProvider,

    /// HMAC key for booking webhooks. `None` rejects booking webhooks.
    #[serde(default)]
    pub calendar_secret: Option<String>,

    /// Shared secret expected in `x-vapi-secret`. `None` rejects call webhooks.
    #[serde(default)]
    pub call_secret: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacted_masks_every_secret() {
        let mut config = LeadlineConfig::default();
        config.gateway.api_token = Some("tok".into());
        config.trigger.secret = Some("cron".into());
        config.dialer.api_key = Some("key".into());
        config.webhooks.call_secret = Some("call".into());

        let shown = toml::to_string(&config.redacted()).unwrap();
        for secret in ["\"tok\"", "\"cron\"", "\"key\"", "\"call\""] {
            assert!(!shown.contains(secret), "{secret} leaked: {shown}");
        }
        assert!(shown.contains("[redacted]"));
        assert!(config.redacted().webhooks.calendar_secret.is_none());
    }

    #[test]
    fn calendar_provider_parses_snake_case() {
        let config: LeadlineConfig = toml::from_str(
            r#"
[webhooks]
calendar_provider = "calendly"
"#,
        )
        .unwrap();
        assert_eq!(config.webhooks.calendar_provider, CalendarProvider::Calendly);
    }
}

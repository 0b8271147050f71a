// SPDX-FileCopyrightText: 2026 Leadline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde attributes cannot express: bind host
//! shape, non-zero timeouts, URL scheme, and a claim TTL that outlives a
//! dispatch.

use crate::diagnostic::ConfigError;
use crate::model::LeadlineConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
///
/// Collects every failure instead of stopping at the first.
pub fn validate_config(config: &LeadlineConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.service.log_level.as_str()) {
        fail(format!(
            "service.log_level `{}` must be one of {}",
            config.service.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let host = config.gateway.host.trim();
    if host.is_empty() {
        fail("gateway.host must not be empty".to_string());
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            fail(format!(
                "gateway.host `{host}` is not a valid IP address or hostname"
            ));
        }
    }

    let base_url = config.dialer.base_url.trim();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        fail(format!(
            "dialer.base_url `{base_url}` must start with http:// or https://"
        ));
    }

    if config.dialer.timeout_secs == 0 {
        fail("dialer.timeout_secs must be at least 1".to_string());
    }

    if config.dialer.max_concurrency == 0 {
        fail("dialer.max_concurrency must be at least 1".to_string());
    }

    let ttl = config.scheduler.claim_ttl_secs;
    let timeout = config.dialer.timeout_secs;
    if ttl == 0 {
        fail("scheduler.claim_ttl_secs must be at least 1".to_string());
    } else if timeout > 0 && ttl <= timeout {
        // A shorter TTL lets the next tick recover a claim whose call is still being placed.
        fail(format!(
            "scheduler.claim_ttl_secs ({ttl}) must exceed dialer.timeout_secs ({timeout})"
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

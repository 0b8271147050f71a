// SPDX-FileCopyrightText: 2026 Leadline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tick trigger credential check and the shared secret comparison.

use secrecy::{ExposeSecret, SecretString};

/// Shared secret the external trigger must present.
///
/// With no secret configured every credential is rejected.
#[derive(Debug, Default)]
pub struct TriggerAuth {
    secret: Option<SecretString>,
}

impl TriggerAuth {
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()).map(SecretString::from),
        }
    }

    /// Constant-time comparison against the configured secret.
    pub fn verify(&self, credential: Option<&str>) -> bool {
        match (&self.secret, credential) {
            (Some(expected), Some(given)) => {
                constant_time_eq(expected.expose_secret().as_bytes(), given.as_bytes())
            }
            _ => false,
        }
    }
}

/// Byte comparison whose duration does not depend on where the inputs differ.
/// Only the length is leaked.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_secret_is_accepted() {
        let auth = TriggerAuth::new(Some("cron-secret".into()));
        assert!(auth.verify(Some("cron-secret")));
    }

    #[test]
    fn wrong_or_missing_credential_is_rejected() {
        let auth = TriggerAuth::new(Some("cron-secret".into()));
        assert!(!auth.verify(Some("cron-secreT")));
        assert!(!auth.verify(Some("cron")));
        assert!(!auth.verify(None));
    }

    #[test]
    fn constant_time_eq_compares_whole_inputs() {
        assert!(constant_time_eq(b"", b""));
        assert!(constant_time_eq(b"token", b"token"));
        assert!(!constant_time_eq(b"token", b"tokeN"));
        assert!(!constant_time_eq(b"token", b"token2"));
    }

    #[test]
    fn unconfigured_secret_fails_closed() {
        assert!(!TriggerAuth::new(None).verify(Some("")));
        assert!(!TriggerAuth::new(Some(String::new())).verify(Some("")));
    }
}

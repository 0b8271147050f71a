// SPDX-FileCopyrightText: 2026 Leadline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication for the dashboard API.
//!
//! Dashboard routes require `Authorization: Bearer <api token>`. When no
//! token is configured, all requests are rejected (fail-closed). The tick
//! route is not covered here: the scheduler checks its own trigger secret.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::Response,
};
use leadline_scheduler::constant_time_eq;
use secrecy::{ExposeSecret, SecretString};

/// Authentication configuration for the dashboard API.
#[derive(Debug, Default)]
pub struct AuthConfig {
    /// Expected bearer token. `None` rejects every request.
    pub api_token: Option<SecretString>,
}

impl AuthConfig {
    pub fn new(api_token: Option<String>) -> Self {
        Self {
            api_token: api_token.filter(|t| !t.is_empty()).map(SecretString::from),
        }
    }
}

/// The token from an `Authorization: Bearer` header, if present.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

pub(crate) fn secret_matches(expected: &SecretString, given: &str) -> bool {
    constant_time_eq(expected.expose_secret().as_bytes(), given.as_bytes())
}

/// Middleware that validates the dashboard bearer token.
pub async fn auth_middleware(
    State(auth): State<Arc<AuthConfig>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = auth.api_token.as_ref() else {
        tracing::error!("gateway has no api token configured -- rejecting request");
        return Err(StatusCode::UNAUTHORIZED);
    };

    match bearer_token(request.headers()) {
        Some(token) if secret_matches(expected, token) => Ok(next.run(request).await),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

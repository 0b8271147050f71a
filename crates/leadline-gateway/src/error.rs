// SPDX-FileCopyrightText: 2026 Leadline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping from domain errors to HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use leadline_core::LeadlineError;
use serde::Serialize;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// A [`LeadlineError`] on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub LeadlineError);

impl From<LeadlineError> for ApiError {
    fn from(e: LeadlineError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            LeadlineError::NotFound { .. } => StatusCode::NOT_FOUND,
            LeadlineError::Validation(_) => StatusCode::BAD_REQUEST,
            LeadlineError::Conflict(_) => StatusCode::CONFLICT,
            LeadlineError::Unauthorized => StatusCode::UNAUTHORIZED,
            LeadlineError::Dialer { .. } => StatusCode::BAD_GATEWAY,
            LeadlineError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            LeadlineError::Config(_)
            | LeadlineError::Storage { .. }
            | LeadlineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Storage and config details stay in the log.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "request failed");
            "internal error".to_string()
        } else {
            self.0.to_string()
        };
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        let cases = [
            (LeadlineError::lead_not_found("x"), StatusCode::NOT_FOUND),
            (
                LeadlineError::Validation("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
            (LeadlineError::Conflict("busy".into()), StatusCode::CONFLICT),
            (LeadlineError::Unauthorized, StatusCode::UNAUTHORIZED),
            (
                LeadlineError::Storage {
                    source: "disk".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError(err).status(), expected);
        }
    }

    #[test]
    fn error_response_serializes() {
        let json = serde_json::to_string(&ErrorResponse::new("something went wrong")).unwrap();
        assert_eq!(json, r#"{"error":"something went wrong"}"#);
    }
}

// SPDX-FileCopyrightText: 2026 Leadline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the voice-agent call API.

use serde::{Deserialize, Serialize};

/// Body of `POST /call`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCallRequest {
    pub assistant_id: String,
    pub phone_number_id: String,
    pub customer: Customer,
    /// Echoed back in webhooks so events can be tied to a lead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<CallMetadata>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Customer {
    pub number: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallMetadata {
    pub lead_id: String,
    pub idempotency_key: String,
}

/// The fields of the created call we use.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCallResponse {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Error body returned on non-success responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub message: serde_json::Value,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiErrorResponse {
    /// Flatten `message`, which the API sends as either a string or a list.
    pub fn describe(&self) -> String {
        let message = match &self.message {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Array(items) => items
                .iter()
                .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                .collect::<Vec<_>>()
                .join("; "),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        };
        match (&self.error, message.is_empty()) {
            (Some(kind), false) => format!("{kind}: {message}"),
            (Some(kind), true) => kind.clone(),
            (None, _) => message,
        }
    }
}

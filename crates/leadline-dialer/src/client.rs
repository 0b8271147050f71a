// SPDX-FileCopyrightText: 2026 Leadline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the voice-agent call API.
//!
//! [`VoiceApiClient`] builds the request, attaches the bearer key and the
//! per-attempt idempotency key, and retries once when rate limited.

use std::time::Duration;

use leadline_core::LeadlineError;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, CreateCallRequest, CreateCallResponse};

/// Header carrying the per-attempt token.
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// HTTP client for outbound call creation.
#[derive(Debug, Clone)]
pub struct VoiceApiClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl VoiceApiClient {
    /// Creates a client for `base_url` authenticated with `api_key`.
    pub fn new(
        base_url: &str,
        api_key: &SecretString,
        timeout: Duration,
    ) -> Result<Self, LeadlineError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
            .map_err(|e| LeadlineError::Config(format!("invalid API key header value: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| LeadlineError::Dialer {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: 1,
            retry_delay: Duration::from_secs(1),
        })
    }

    /// Overrides the delay between rate-limit retries.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    fn calls_url(&self) -> String {
        format!("{}/call", self.base_url)
    }

    /// Creates one outbound call and returns the API's call record.
    ///
    /// Only 429 is retried: any other failure may already have reached the
    /// carrier, so it is reported to the caller as-is.
    pub async fn create_call(
        &self,
        request: &CreateCallRequest,
        idempotency_key: &str,
    ) -> Result<CreateCallResponse, LeadlineError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying call creation after rate limit");
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = self
                .client
                .post(self.calls_url())
                .header(IDEMPOTENCY_HEADER, idempotency_key)
                .json(request)
                .send()
                .await
                .map_err(|e| LeadlineError::Dialer {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "call creation response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| LeadlineError::Dialer {
                    message: format!("failed to read response body: {e}"),
                    source: Some(Box::new(e)),
                })?;
                let created: CreateCallResponse =
                    serde_json::from_str(&body).map_err(|e| LeadlineError::Dialer {
                        message: format!("failed to parse call response: {e}"),
                        source: Some(Box::new(e)),
                    })?;
                if created.id.trim().is_empty() {
                    return Err(LeadlineError::Dialer {
                        message: "call response carried an empty id".into(),
                        source: None,
                    });
                }
                return Ok(created);
            }

            let body = response.text().await.unwrap_or_default();
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS && attempt < self.max_retries {
                warn!(status = %status, "rate limited, will retry");
                last_error = Some(LeadlineError::Dialer {
                    message: format!("API returned {status}: {body}"),
                    source: None,
                });
                continue;
            }

            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) if !api_err.describe().is_empty() => {
                    format!("voice API error ({status}): {}", api_err.describe())
                }
                _ => format!("API returned {status}: {body}"),
            };
            return Err(LeadlineError::Dialer {
                message,
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| LeadlineError::Dialer {
            message: "call creation failed after retries".into(),
            source: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Customer;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> VoiceApiClient {
        VoiceApiClient::new(
            base_url,
            &SecretString::from("test-api-key".to_string()),
            Duration::from_secs(5),
        )
        .unwrap()
        .with_retry_delay(Duration::from_millis(10))
    }

    fn test_request() -> CreateCallRequest {
        CreateCallRequest {
            assistant_id: "asst-1".into(),
            phone_number_id: "pn-1".into(),
            customer: Customer {
                number: "+15550100".into(),
                name: "Acme".into(),
            },
            metadata: None,
        }
    }

    #[tokio::test]
    async fn create_call_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/call"))
            .and(header("authorization", "Bearer test-api-key"))
            .and(header("idempotency-key", "lead-1:1"))
            .and(body_partial_json(serde_json::json!({
                "assistantId": "asst-1",
                "customer": {"number": "+15550100"}
            })))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(serde_json::json!({"id": "call-abc", "status": "queued"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let created = client.create_call(&test_request(), "lead-1:1").await.unwrap();
        assert_eq!(created.id, "call-abc");
        assert_eq!(created.status.as_deref(), Some("queued"));
    }

    #[tokio::test]
    async fn create_call_retries_once_on_429() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/call"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/call"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": "call-2"})))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let created = client.create_call(&test_request(), "lead-1:1").await.unwrap();
        assert_eq!(created.id, "call-2");
    }

    #[tokio::test]
    async fn server_error_is_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/call"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.create_call(&test_request(), "lead-1:1").await.unwrap_err();
        assert!(matches!(err, LeadlineError::Dialer { .. }));
        assert!(err.to_string().contains("500"), "got: {err}");
    }

    #[tokio::test]
    async fn structured_error_body_is_surfaced() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/call"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "message": ["customer.number must be a valid phone number"],
                "error": "Bad Request"
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.create_call(&test_request(), "lead-1:1").await.unwrap_err();
        assert!(err.to_string().contains("must be a valid phone number"), "got: {err}");
    }

    #[tokio::test]
    async fn missing_id_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/call"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"status": "queued"})))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        assert!(client.create_call(&test_request(), "lead-1:1").await.is_err());
    }

    #[tokio::test]
    async fn trailing_slash_in_base_url_is_tolerated() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/call"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "call-3"})))
            .mount(&server)
            .await;

        let client = test_client(&format!("{}/", server.uri()));
        assert_eq!(
            client.create_call(&test_request(), "k").await.unwrap().id,
            "call-3"
        );
    }
}

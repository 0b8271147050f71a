// SPDX-FileCopyrightText: 2026 Leadline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Voice and calendar webhooks.
//!
//! Each request is authenticated before its body is parsed: the voice API
//! sends a shared secret in `x-vapi-secret`, calendar providers sign the raw
//! body with HMAC-SHA256. Events that carry nothing to reconcile are
//! acknowledged with `200` so the sender does not retry them.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use leadline_core::{LeadId, LeadStatus, LeadlineError};
use leadline_scheduler::{BookingEvent, BookingKind, CallEndedEvent, ReconcileOutcome};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::auth::secret_matches;
use crate::error::{ApiError, ErrorResponse};
use crate::server::GatewayState;

type HmacSha256 = Hmac<Sha256>;

pub const CALL_SECRET_HEADER: &str = "x-vapi-secret";
pub const CALCOM_SIGNATURE_HEADER: &str = "x-cal-signature-256";
pub const CALENDLY_SIGNATURE_HEADER: &str = "calendly-webhook-signature";

/// Maximum age of a Calendly signature timestamp.
const CALENDLY_TOLERANCE_SECS: u64 = 180;

/// Which calendar product signs booking webhooks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BookingSource {
    #[default]
    CalCom,
    Calendly,
}

/// Secrets for inbound webhooks (mirrors `WebhookConfig` from leadline-config).
#[derive(Debug, Default)]
pub struct WebhookAuth {
    pub booking_source: BookingSource,
    /// `None` rejects booking webhooks.
    pub calendar_secret: Option<SecretString>,
    /// `None` rejects call webhooks.
    pub call_secret: Option<SecretString>,
}

impl WebhookAuth {
    pub fn new(
        booking_source: BookingSource,
        calendar_secret: Option<String>,
        call_secret: Option<String>,
    ) -> Self {
        Self {
            booking_source,
            calendar_secret: calendar_secret
                .filter(|s| !s.is_empty())
                .map(SecretString::from),
            call_secret: call_secret.filter(|s| !s.is_empty()).map(SecretString::from),
        }
    }

    fn verify_call(&self, headers: &HeaderMap) -> bool {
        let given = headers
            .get(CALL_SECRET_HEADER)
            .and_then(|v| v.to_str().ok());
        match (&self.call_secret, given) {
            (Some(expected), Some(given)) => secret_matches(expected, given),
            _ => false,
        }
    }

    fn verify_booking(&self, headers: &HeaderMap, body: &[u8]) -> bool {
        let Some(secret) = &self.calendar_secret else {
            return false;
        };
        let key = secret.expose_secret().as_bytes();
        match self.booking_source {
            BookingSource::CalCom => headers
                .get(CALCOM_SIGNATURE_HEADER)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|sig| verify_calcom(key, body, sig)),
            BookingSource::Calendly => headers
                .get(CALENDLY_SIGNATURE_HEADER)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|sig| verify_calendly(key, body, sig, Utc::now())),
        }
    }
}

fn hmac_matches(key: &[u8], parts: &[&[u8]], signature_hex: &str) -> bool {
    let Ok(expected) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        return false;
    };
    for part in parts {
        mac.update(part);
    }
    mac.verify_slice(&expected).is_ok()
}

/// Cal.com: hex HMAC-SHA256 of the raw body.
pub fn verify_calcom(key: &[u8], body: &[u8], signature: &str) -> bool {
    hmac_matches(key, &[body], signature)
}

/// Calendly: `t=<unix secs>,v1=<hex>` where the MAC covers `"<t>.<body>"`.
pub fn verify_calendly(key: &[u8], body: &[u8], header: &str, now: DateTime<Utc>) -> bool {
    let mut timestamp = None;
    let mut signature = None;
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", v)) => timestamp = Some(v),
            Some(("v1", v)) => signature = Some(v),
            _ => {}
        }
    }
    let (Some(t), Some(sig)) = (timestamp, signature) else {
        return false;
    };
    let Ok(secs) = t.parse::<i64>() else {
        return false;
    };
    let skew = now.timestamp().abs_diff(secs);
    if skew > CALENDLY_TOLERANCE_SECS {
        tracing::debug!(skew_secs = skew, "calendly signature outside tolerance");
        return false;
    }
    hmac_matches(key, &[t.as_bytes(), b".", body], sig)
}

// --- Voice API payloads ---

#[derive(Debug, Deserialize)]
struct VoiceWebhook {
    message: VoiceMessage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VoiceMessage {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    ended_reason: Option<String>,
    #[serde(default)]
    call: Option<VoiceCall>,
}

#[derive(Debug, Deserialize)]
struct VoiceCall {
    id: String,
}

/// Extract a call-ended event; `Ok(None)` for other message types.
pub fn parse_call_ended(body: &[u8]) -> Result<Option<CallEndedEvent>, LeadlineError> {
    let webhook: VoiceWebhook = serde_json::from_slice(body)
        .map_err(|e| LeadlineError::Validation(format!("malformed call webhook: {e}")))?;
    let message = webhook.message;
    if message.kind != "end-of-call-report" {
        return Ok(None);
    }
    let call_id = message
        .call
        .map(|c| c.id)
        .ok_or_else(|| LeadlineError::Validation("end-of-call-report without call id".into()))?;
    let ended_reason = message.ended_reason.ok_or_else(|| {
        LeadlineError::Validation("end-of-call-report without endedReason".into())
    })?;
    Ok(Some(CallEndedEvent {
        call_id,
        ended_reason,
    }))
}

// --- Calendar payloads ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalComWebhook {
    trigger_event: String,
    payload: CalComBooking,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalComBooking {
    #[serde(default)]
    start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    attendees: Vec<CalComAttendee>,
}

#[derive(Debug, Deserialize)]
struct CalComAttendee {
    email: String,
}

#[derive(Debug, Deserialize)]
struct CalendlyWebhook {
    event: String,
    payload: CalendlyInvitee,
}

#[derive(Debug, Deserialize)]
struct CalendlyInvitee {
    email: String,
    #[serde(default)]
    scheduled_event: Option<CalendlyEvent>,
}

#[derive(Debug, Deserialize)]
struct CalendlyEvent {
    #[serde(default)]
    start_time: Option<DateTime<Utc>>,
}

/// Normalise a booking webhook; `Ok(None)` for events that are not a
/// booking or cancellation.
pub fn parse_booking(
    source: BookingSource,
    body: &[u8],
) -> Result<Option<BookingEvent>, LeadlineError> {
    let malformed = |e: serde_json::Error| {
        LeadlineError::Validation(format!("malformed booking webhook: {e}"))
    };
    match source {
        BookingSource::CalCom => {
            let webhook: CalComWebhook = serde_json::from_slice(body).map_err(malformed)?;
            let kind = match webhook.trigger_event.as_str() {
                "BOOKING_CREATED" => BookingKind::Created,
                "BOOKING_CANCELLED" => BookingKind::Cancelled,
                _ => return Ok(None),
            };
            let email = webhook
                .payload
                .attendees
                .into_iter()
                .next()
                .map(|a| a.email)
                .ok_or_else(|| LeadlineError::Validation("booking has no attendees".into()))?;
            Ok(Some(BookingEvent {
                kind,
                email,
                start_time: webhook.payload.start_time,
            }))
        }
        BookingSource::Calendly => {
            let webhook: CalendlyWebhook = serde_json::from_slice(body).map_err(malformed)?;
            let kind = match webhook.event.as_str() {
                "invitee.created" => BookingKind::Created,
                "invitee.canceled" => BookingKind::Cancelled,
                _ => return Ok(None),
            };
            Ok(Some(BookingEvent {
                kind,
                email: webhook.payload.email,
                start_time: webhook.payload.scheduled_event.and_then(|e| e.start_time),
            }))
        }
    }
}

/// Response body for both webhook routes.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<LeadId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_status: Option<LeadStatus>,
}

impl WebhookResponse {
    fn ignored() -> Self {
        Self {
            status: "ignored".to_string(),
            lead_id: None,
            lead_status: None,
        }
    }
}

impl From<ReconcileOutcome> for WebhookResponse {
    fn from(outcome: ReconcileOutcome) -> Self {
        match outcome {
            ReconcileOutcome::Updated { lead_id, status } => Self {
                status: "updated".to_string(),
                lead_id: Some(lead_id),
                lead_status: Some(status),
            },
            ReconcileOutcome::Unchanged { lead_id, status } => Self {
                status: "unchanged".to_string(),
                lead_id: Some(lead_id),
                lead_status: Some(status),
            },
            ReconcileOutcome::Ignored => Self::ignored(),
        }
    }
}

fn unauthorized(what: &str) -> Response {
    tracing::warn!("{what} webhook rejected: bad or missing credential");
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new("invalid webhook credential")),
    )
        .into_response()
}

/// POST /v1/webhooks/call
pub async fn post_call_webhook(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !state.webhooks.verify_call(&headers) {
        return unauthorized("call");
    }
    let result = match parse_call_ended(&body) {
        Ok(Some(event)) => state.reconciler.call_ended(&event).await,
        Ok(None) => Ok(ReconcileOutcome::Ignored),
        Err(e) => Err(e),
    };
    match result {
        Ok(outcome) => Json(WebhookResponse::from(outcome)).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

/// POST /v1/webhooks/booking
pub async fn post_booking_webhook(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !state.webhooks.verify_booking(&headers, &body) {
        return unauthorized("booking");
    }
    let result = match parse_booking(state.webhooks.booking_source, &body) {
        Ok(Some(event)) => state.reconciler.booking(&event).await,
        Ok(None) => Ok(ReconcileOutcome::Ignored),
        Err(e) => Err(e),
    };
    match result {
        Ok(outcome) => Json(WebhookResponse::from(outcome)).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadline_test_utils::sign_webhook as sign;

    const KEY: &[u8] = b"whsec_test";

    #[test]
    fn calcom_signature_round_trip() {
        let body = br#"{"triggerEvent":"BOOKING_CREATED"}"#;
        let sig = sign(KEY, &[body]);
        assert!(verify_calcom(KEY, body, &sig));
        assert!(!verify_calcom(KEY, b"tampered", &sig));
        assert!(!verify_calcom(b"other-key", body, &sig));
        assert!(!verify_calcom(KEY, body, "not-hex"));
    }

    #[test]
    fn calendly_signature_checks_timestamp() {
        let body = br#"{"event":"invitee.created"}"#;
        let now = Utc::now();
        let t = now.timestamp().to_string();
        let header = format!("t={t},v1={}", sign(KEY, &[t.as_bytes(), b".", body]));

        assert!(verify_calendly(KEY, body, &header, now));
        let later = now + chrono::Duration::minutes(10);
        assert!(!verify_calendly(KEY, body, &header, later));
        assert!(!verify_calendly(KEY, body, "v1=abc", now));
    }

    #[test]
    fn calendly_extreme_timestamps_are_rejected() {
        let body = br#"{"event":"invitee.created"}"#;
        let now = Utc::now();
        for t in [i64::MIN, i64::MAX] {
            let t = t.to_string();
            let header = format!("t={t},v1={}", sign(KEY, &[t.as_bytes(), b".", body]));
            assert!(!verify_calendly(KEY, body, &header, now));
        }
        assert!(!verify_calendly(KEY, body, "t=-9223372036854775808,v1=00", now));
    }

    #[test]
    fn end_of_call_report_is_parsed() {
        let body = br#"{
            "message": {
                "type": "end-of-call-report",
                "endedReason": "customer-did-not-answer",
                "call": {"id": "call-1"}
            }
        }"#;
        let event = parse_call_ended(body).unwrap().unwrap();
        assert_eq!(event.call_id, "call-1");
        assert_eq!(event.ended_reason, "customer-did-not-answer");
    }

    #[test]
    fn other_voice_messages_are_skipped() {
        let body = br#"{"message": {"type": "status-update", "status": "ringing"}}"#;
        assert!(parse_call_ended(body).unwrap().is_none());
    }

    #[test]
    fn end_of_call_report_without_call_is_invalid() {
        let body = br#"{"message": {"type": "end-of-call-report", "endedReason": "busy"}}"#;
        assert!(matches!(
            parse_call_ended(body),
            Err(LeadlineError::Validation(_))
        ));
    }

    #[test]
    fn calcom_booking_is_normalised() {
        let body = br#"{
            "triggerEvent": "BOOKING_CREATED",
            "payload": {
                "startTime": "2026-11-03T15:00:00Z",
                "attendees": [{"email": "ops@acme.test", "name": "Ops"}]
            }
        }"#;
        let event = parse_booking(BookingSource::CalCom, body).unwrap().unwrap();
        assert_eq!(event.kind, BookingKind::Created);
        assert_eq!(event.email, "ops@acme.test");
        assert_eq!(
            event.start_time.unwrap().to_rfc3339(),
            "2026-11-03T15:00:00+00:00"
        );
    }

    #[test]
    fn calendly_cancellation_is_normalised() {
        let body = br#"{
            "event": "invitee.canceled",
            "payload": {"email": "ops@acme.test", "scheduled_event": {"start_time": "2026-11-03T15:00:00.000000Z"}}
        }"#;
        let event = parse_booking(BookingSource::Calendly, body)
            .unwrap()
            .unwrap();
        assert_eq!(event.kind, BookingKind::Cancelled);
        assert!(event.start_time.is_some());
    }

    #[test]
    fn unrelated_calendar_events_are_skipped() {
        let body = br#"{"triggerEvent": "MEETING_ENDED", "payload": {}}"#;
        assert!(parse_booking(BookingSource::CalCom, body).unwrap().is_none());
    }

    #[test]
    fn missing_call_secret_rejects_everything() {
        let auth = WebhookAuth::new(BookingSource::CalCom, None, None);
        let mut headers = HeaderMap::new();
        headers.insert(CALL_SECRET_HEADER, "anything".parse().unwrap());
        assert!(!auth.verify_call(&headers));
    }
}

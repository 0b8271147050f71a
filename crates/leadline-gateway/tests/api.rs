// SPDX-FileCopyrightText: 2026 Leadline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router-level tests: auth, status mapping, and webhook flows.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use leadline_core::{LeadStatus, PluginAdapter};
use leadline_gateway::webhooks::{CALCOM_SIGNATURE_HEADER, CALL_SECRET_HEADER};
use leadline_gateway::{
    AuthConfig, BookingSource, GatewayState, HealthState, WebhookAuth, router,
};
use leadline_test_utils::{MockCall, TestHarness, sign_webhook as sign};
use serde_json::{Value, json};
use tower::ServiceExt;

const API_TOKEN: &str = "dash-token";
const CALL_SECRET: &str = "vapi-secret";
const CALENDAR_SECRET: &str = "cal-secret";

fn app(harness: &TestHarness) -> Router {
    let storage: Arc<dyn PluginAdapter> = harness.storage.clone();
    router(GatewayState {
        leads: harness.store.clone(),
        settings: harness.store.clone(),
        scheduler: harness.scheduler.clone(),
        reconciler: harness.reconciler.clone(),
        auth: Arc::new(AuthConfig::new(Some(API_TOKEN.to_string()))),
        webhooks: Arc::new(WebhookAuth::new(
            BookingSource::CalCom,
            Some(CALENDAR_SECRET.to_string()),
            Some(CALL_SECRET.to_string()),
        )),
        health: HealthState::new(vec![storage]),
    })
}

fn api(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {API_TOKEN}"));
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn health_is_public() {
    let harness = TestHarness::builder().build().await.unwrap();
    let app = app(&harness);

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["adapters"][0]["name"], "sqlite");
}

#[tokio::test]
async fn dashboard_requires_api_token() {
    let harness = TestHarness::builder().build().await.unwrap();
    let app = app(&harness);

    let missing = Request::builder().uri("/v1/leads").body(Body::empty()).unwrap();
    assert_eq!(send(&app, missing).await.0, StatusCode::UNAUTHORIZED);

    let wrong = Request::builder()
        .uri("/v1/leads")
        .header(header::AUTHORIZATION, "Bearer nope")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, wrong).await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(harness.store.accesses(), 0);
}

#[tokio::test]
async fn tick_route_checks_trigger_secret() {
    let harness = TestHarness::builder().build().await.unwrap();
    let app = app(&harness);

    // The dashboard token is not the trigger secret.
    let (status, _) = send(&app, api("POST", "/v1/automation/tick", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(harness.store.accesses(), 0);

    let request = Request::builder()
        .method("POST")
        .uri("/v1/automation/tick")
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", harness.trigger_secret()),
        )
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "No leads to process");
}

#[tokio::test]
async fn tick_query_failure_is_500() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.store.fail_query(true);
    let app = app(&harness);

    let request = Request::builder()
        .method("POST")
        .uri("/v1/automation/tick")
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", harness.trigger_secret()),
        )
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn lead_crud_round_trip() {
    let harness = TestHarness::builder().build().await.unwrap();
    let app = app(&harness);

    let (status, created) = send(
        &app,
        api(
            "POST",
            "/v1/leads",
            Some(json!({"company_name": "Acme", "phone": "+15550100", "email": "ops@acme.test"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["status"], "pending");

    let (status, duplicate) = send(
        &app,
        api(
            "POST",
            "/v1/leads",
            Some(json!({"company_name": "Other", "phone": "+15550100"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(duplicate["error"].as_str().unwrap().contains("already exists"));

    let (status, patched) = send(
        &app,
        api(
            "PATCH",
            &format!("/v1/leads/{id}"),
            Some(json!({"company_name": "Acme Corp"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["company_name"], "Acme Corp");

    let (status, listed) = send(&app, api("GET", "/v1/leads?status=pending", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["leads"].as_array().unwrap().len(), 1);

    let (status, _) = send(&app, api("DELETE", &format!("/v1/leads/{id}"), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, api("GET", &format!("/v1/leads/{id}"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn claimed_lead_cannot_be_edited_or_booked() {
    let harness = TestHarness::builder().build().await.unwrap();
    let app = app(&harness);
    let lead = harness
        .seed_lead_with_email("Acme", "+15550100", "ops@acme.test")
        .await
        .unwrap();
    harness
        .force_claim(&lead.id, LeadStatus::Pending, chrono::Utc::now())
        .await
        .unwrap();

    let (status, body) = send(
        &app,
        api(
            "PATCH",
            &format!("/v1/leads/{}", lead.id),
            Some(json!({"status": "pending"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("being dialled"));

    let payload = json!({
        "triggerEvent": "BOOKING_CREATED",
        "payload": {
            "startTime": "2026-11-03T15:00:00Z",
            "attendees": [{"email": "ops@acme.test"}]
        }
    })
    .to_string();
    let signed = Request::builder()
        .method("POST")
        .uri("/v1/webhooks/booking")
        .header(
            CALCOM_SIGNATURE_HEADER,
            sign(CALENDAR_SECRET.as_bytes(), &[payload.as_bytes()]),
        )
        .body(Body::from(payload))
        .unwrap();
    let (status, _) = send(&app, signed).await;
    assert_eq!(status, StatusCode::CONFLICT);

    assert_eq!(
        harness.lead(&lead.id).await.unwrap().status,
        LeadStatus::Claiming
    );
}

#[tokio::test]
async fn settings_update_is_validated() {
    let harness = TestHarness::builder().build().await.unwrap();
    let app = app(&harness);

    let (status, body) = send(
        &app,
        api(
            "PUT",
            "/v1/automation/settings",
            Some(json!({"max_calls_batch": 25})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["max_calls_batch"], 25);
    assert_eq!(body["automation_enabled"], true);

    let (status, _) = send(
        &app,
        api(
            "PUT",
            "/v1/automation/settings",
            Some(json!({"max_attempts": 0})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&app, api("GET", "/v1/automation/settings", None)).await;
    assert_eq!(body["max_calls_batch"], 25);
    assert_eq!(body["max_attempts"], 3);
}

#[tokio::test]
async fn manual_call_maps_outcomes_to_statuses() {
    let harness = TestHarness::builder().build().await.unwrap();
    let app = app(&harness);
    let lead = harness.seed_lead("Acme", "+15550100").await.unwrap();

    let uri = format!("/v1/leads/{}/call", lead.id);
    harness
        .dialer
        .script(&lead.id, MockCall::Fail("no route".into()))
        .await;
    let (status, body) = send(&app, api("POST", &uri, None)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["errorKind"], "dispatch");

    let (status, body) = send(&app, api("POST", &uri, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    // Now calling, so a second manual call conflicts.
    let (status, _) = send(&app, api("POST", &uri, None)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, api("POST", "/v1/leads/missing/call", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn call_webhook_reconciles_outcome() {
    let harness = TestHarness::builder().build().await.unwrap();
    let app = app(&harness);
    let lead = harness.seed_lead("Acme", "+15550100").await.unwrap();
    harness
        .dialer
        .script(&lead.id, MockCall::Place("call-77".into()))
        .await;
    harness.tick().await.unwrap();

    let payload = json!({
        "message": {
            "type": "end-of-call-report",
            "endedReason": "customer-busy",
            "call": {"id": "call-77"}
        }
    });
    let unsigned = Request::builder()
        .method("POST")
        .uri("/v1/webhooks/call")
        .body(Body::from(payload.to_string()))
        .unwrap();
    assert_eq!(send(&app, unsigned).await.0, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method("POST")
        .uri("/v1/webhooks/call")
        .header(CALL_SECRET_HEADER, CALL_SECRET)
        .body(Body::from(payload.to_string()))
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "updated");
    assert_eq!(body["leadStatus"], "pending");
    assert_eq!(
        harness.lead(&lead.id).await.unwrap().status,
        LeadStatus::Pending
    );
}

#[tokio::test]
async fn booking_webhook_requires_valid_signature() {
    let harness = TestHarness::builder().build().await.unwrap();
    let app = app(&harness);
    let lead = harness
        .seed_lead_with_email("Acme", "+15550100", "ops@acme.test")
        .await
        .unwrap();

    let payload = json!({
        "triggerEvent": "BOOKING_CREATED",
        "payload": {
            "startTime": "2026-11-03T15:00:00Z",
            "attendees": [{"email": "ops@acme.test"}]
        }
    })
    .to_string();

    let forged = Request::builder()
        .method("POST")
        .uri("/v1/webhooks/booking")
        .header(CALCOM_SIGNATURE_HEADER, sign(b"wrong", &[payload.as_bytes()]))
        .body(Body::from(payload.clone()))
        .unwrap();
    assert_eq!(send(&app, forged).await.0, StatusCode::UNAUTHORIZED);

    let signed = Request::builder()
        .method("POST")
        .uri("/v1/webhooks/booking")
        .header(
            CALCOM_SIGNATURE_HEADER,
            sign(CALENDAR_SECRET.as_bytes(), &[payload.as_bytes()]),
        )
        .body(Body::from(payload))
        .unwrap();
    let (status, body) = send(&app, signed).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "updated");
    let stored = harness.lead(&lead.id).await.unwrap();
    assert_eq!(stored.status, LeadStatus::Scheduled);
    assert!(stored.appointment_at.is_some());
}

#[tokio::test]
async fn unrelated_webhook_events_are_acknowledged() {
    let harness = TestHarness::builder().build().await.unwrap();
    let app = app(&harness);

    let request = Request::builder()
        .method("POST")
        .uri("/v1/webhooks/call")
        .header(CALL_SECRET_HEADER, CALL_SECRET)
        .body(Body::from(
            json!({"message": {"type": "status-update"}}).to_string(),
        ))
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ignored");
}

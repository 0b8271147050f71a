// SPDX-FileCopyrightText: 2026 Leadline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the tick trigger and the dashboard API.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use leadline_core::{
    AdapterType, AutomationSettings, HealthStatus, Lead, LeadAttemptReport, LeadId, LeadPatch,
    LeadStatus, LeadlineError, NewLead, SettingsPatch,
};
use leadline_scheduler::TickError;
use serde::{Deserialize, Serialize};

use crate::auth::bearer_token;
use crate::error::{ApiError, ErrorResponse};
use crate::server::GatewayState;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub adapters: Vec<AdapterHealth>,
}

#[derive(Debug, Serialize)]
pub struct AdapterHealth {
    pub name: String,
    pub kind: AdapterType,
    pub version: String,
    pub health: HealthStatus,
}

/// Query string for GET /v1/leads.
#[derive(Debug, Deserialize)]
pub struct ListLeadsQuery {
    #[serde(default)]
    pub status: Option<LeadStatus>,
}

/// Response body for GET /v1/leads.
#[derive(Debug, Serialize)]
pub struct LeadListResponse {
    pub leads: Vec<Lead>,
}

/// GET /health
///
/// Unauthenticated. `503` when any adapter reports unhealthy.
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    let mut adapters = Vec::with_capacity(state.health.adapters.len());
    for adapter in &state.health.adapters {
        let health = adapter
            .health_check()
            .await
            .unwrap_or_else(|e| HealthStatus::Unhealthy(e.to_string()));
        adapters.push(AdapterHealth {
            name: adapter.name().to_string(),
            kind: adapter.adapter_type(),
            version: adapter.version().to_string(),
            health,
        });
    }

    let healthy = adapters
        .iter()
        .all(|a| !matches!(a.health, HealthStatus::Unhealthy(_)));
    let body = HealthResponse {
        status: if healthy { "ok" } else { "unhealthy" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
        adapters,
    };
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body)).into_response()
}

/// POST /v1/automation/tick
///
/// The external trigger presents its secret as a bearer token; the scheduler
/// verifies it before touching anything.
pub async fn post_tick(State(state): State<GatewayState>, headers: HeaderMap) -> Response {
    match state.scheduler.run_tick(bearer_token(&headers)).await {
        Ok(summary) => Json(summary).into_response(),
        Err(TickError::Unauthorized) => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("invalid trigger credential")),
        )
            .into_response(),
        Err(e @ TickError::Query(_)) => {
            tracing::error!(error = %e, "tick failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("eligibility query failed")),
            )
                .into_response()
        }
    }
}

/// GET /v1/automation/settings
pub async fn get_settings(
    State(state): State<GatewayState>,
) -> Result<Json<AutomationSettings>, ApiError> {
    Ok(Json(state.settings.read().await?))
}

/// PUT /v1/automation/settings
pub async fn put_settings(
    State(state): State<GatewayState>,
    Json(patch): Json<SettingsPatch>,
) -> Result<Json<AutomationSettings>, ApiError> {
    let updated = state.settings.write(&patch).await?;
    tracing::info!(
        automation_enabled = updated.automation_enabled,
        max_calls_batch = updated.max_calls_batch,
        retry_interval = updated.retry_interval,
        max_attempts = updated.max_attempts,
        "automation settings updated"
    );
    Ok(Json(updated))
}

/// GET /v1/leads
pub async fn list_leads(
    State(state): State<GatewayState>,
    Query(query): Query<ListLeadsQuery>,
) -> Result<Json<LeadListResponse>, ApiError> {
    let leads = state.leads.list_leads(query.status).await?;
    Ok(Json(LeadListResponse { leads }))
}

/// POST /v1/leads
pub async fn create_lead(
    State(state): State<GatewayState>,
    Json(body): Json<NewLead>,
) -> Result<(StatusCode, Json<Lead>), ApiError> {
    let lead = state.leads.create_lead(&body).await?;
    Ok((StatusCode::CREATED, Json(lead)))
}

/// GET /v1/leads/{id}
pub async fn get_lead(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<Json<Lead>, ApiError> {
    let lead = state
        .leads
        .get_lead(&LeadId(id.clone()))
        .await?
        .ok_or_else(|| LeadlineError::lead_not_found(id))?;
    Ok(Json(lead))
}

/// PATCH /v1/leads/{id}
pub async fn update_lead(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Json(patch): Json<LeadPatch>,
) -> Result<Json<Lead>, ApiError> {
    Ok(Json(state.leads.update_lead(&LeadId(id), &patch).await?))
}

/// DELETE /v1/leads/{id}
pub async fn delete_lead(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.leads.delete_lead(&LeadId(id.clone())).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(LeadlineError::lead_not_found(id).into())
    }
}

/// POST /v1/leads/{id}/call
///
/// `200` when the call was placed, `502` with the same report body when it
/// was not.
pub async fn call_lead(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let result = state.scheduler.call_lead(&LeadId(id)).await?;
    let status = if result.success() {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    };
    Ok((status, Json(LeadAttemptReport::from(&result))).into_response())
}

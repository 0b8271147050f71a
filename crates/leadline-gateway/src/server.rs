// SPDX-FileCopyrightText: 2026 Leadline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::future::Future;
use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use leadline_core::{LeadStore, LeadlineError, PluginAdapter, SettingsStore};
use leadline_scheduler::{Reconciler, Scheduler};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers;
use crate::webhooks::{self, WebhookAuth};

/// Health state for the unauthenticated health endpoint.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
    /// Adapters whose health is reported.
    pub adapters: Vec<Arc<dyn PluginAdapter>>,
}

impl HealthState {
    pub fn new(adapters: Vec<Arc<dyn PluginAdapter>>) -> Self {
        Self {
            start_time: std::time::Instant::now(),
            adapters,
        }
    }
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub leads: Arc<dyn LeadStore>,
    pub settings: Arc<dyn SettingsStore>,
    pub scheduler: Arc<Scheduler>,
    pub reconciler: Arc<Reconciler>,
    /// Dashboard API authentication.
    pub auth: Arc<AuthConfig>,
    /// Webhook secrets.
    pub webhooks: Arc<WebhookAuth>,
    pub health: HealthState,
}

/// Gateway server configuration (mirrors GatewayConfig from leadline-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Build the gateway router.
///
/// - GET /health (public)
/// - POST /v1/automation/tick (trigger secret, checked by the scheduler)
/// - POST /v1/webhooks/call, POST /v1/webhooks/booking (webhook credentials)
/// - everything else under /v1 (api token)
pub fn router(state: GatewayState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .route("/v1/automation/tick", post(handlers::post_tick))
        .route("/v1/webhooks/call", post(webhooks::post_call_webhook))
        .route("/v1/webhooks/booking", post(webhooks::post_booking_webhook))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route(
            "/v1/automation/settings",
            get(handlers::get_settings).put(handlers::put_settings),
        )
        .route(
            "/v1/leads",
            get(handlers::list_leads).post(handlers::create_lead),
        )
        .route(
            "/v1/leads/{id}",
            get(handlers::get_lead)
                .patch(handlers::update_lead)
                .delete(handlers::delete_lead),
        )
        .route("/v1/leads/{id}/call", post(handlers::call_lead))
        .route_layer(axum_middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind and serve until `shutdown` resolves.
pub async fn start_server<F>(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: F,
) -> Result<(), LeadlineError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| LeadlineError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| LeadlineError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_debug() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("127.0.0.1"));
        assert!(debug.contains("8080"));
    }
}

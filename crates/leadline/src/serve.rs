// SPDX-FileCopyrightText: 2026 Leadline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `leadline serve` command implementation.
//!
//! Opens storage, builds the dialer and scheduler, and serves the gateway
//! until SIGINT or SIGTERM.

use std::sync::Arc;

use leadline_config::LeadlineConfig;
use leadline_config::model::CalendarProvider;
use leadline_core::{LeadlineError, PluginAdapter, StorageAdapter, VoiceDialer};
use leadline_dialer::VoiceAgentDialer;
use leadline_gateway::{
    AuthConfig, BookingSource, GatewayState, HealthState, ServerConfig, WebhookAuth, start_server,
};
use leadline_scheduler::{Reconciler, Scheduler, SchedulerOptions};
use leadline_storage::SqliteStorage;
use tracing::{info, warn};

/// Everything a command needs to run ticks or serve requests.
pub(crate) struct Stack {
    pub storage: Arc<SqliteStorage>,
    pub dialer: Arc<VoiceAgentDialer>,
    pub scheduler: Arc<Scheduler>,
    pub reconciler: Arc<Reconciler>,
}

impl Stack {
    /// Open storage and wire the scheduler over it.
    pub async fn build(config: &LeadlineConfig) -> Result<Self, LeadlineError> {
        let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
        storage.initialize().await?;
        info!(path = %config.storage.database_path, "storage initialized");

        let dialer = Arc::new(VoiceAgentDialer::new(&config.dialer)?);
        let voice: Arc<dyn VoiceDialer> = dialer.clone();

        let scheduler = Arc::new(Scheduler::new(
            storage.clone(),
            storage.clone(),
            voice,
            SchedulerOptions::from_config(config),
        ));
        let reconciler = Arc::new(Reconciler::new(storage.clone(), storage.clone()));

        Ok(Self {
            storage,
            dialer,
            scheduler,
            reconciler,
        })
    }

    /// Release the dialer and close the database.
    pub async fn close(&self) {
        if let Err(e) = self.dialer.shutdown().await {
            warn!(error = %e, "dialer shutdown failed");
        }
        if let Err(e) = self.storage.close().await {
            warn!(error = %e, "storage close failed");
        }
    }
}

fn booking_source(provider: CalendarProvider) -> BookingSource {
    match provider {
        CalendarProvider::CalCom => BookingSource::CalCom,
        CalendarProvider::Calendly => BookingSource::Calendly,
    }
}

fn gateway_state(config: &LeadlineConfig, stack: &Stack) -> GatewayState {
    let storage: Arc<dyn PluginAdapter> = stack.storage.clone();
    let dialer: Arc<dyn PluginAdapter> = stack.dialer.clone();

    GatewayState {
        leads: stack.storage.clone(),
        settings: stack.storage.clone(),
        scheduler: stack.scheduler.clone(),
        reconciler: stack.reconciler.clone(),
        auth: Arc::new(AuthConfig::new(config.gateway.api_token.clone())),
        webhooks: Arc::new(WebhookAuth::new(
            booking_source(config.webhooks.calendar_provider),
            config.webhooks.calendar_secret.clone(),
            config.webhooks.call_secret.clone(),
        )),
        health: HealthState::new(vec![storage, dialer]),
    }
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
        _ = terminate => info!("received SIGTERM, initiating shutdown"),
    }
}

/// Runs the `leadline serve` command.
pub async fn run_serve(config: LeadlineConfig) -> Result<(), LeadlineError> {
    info!(service = %config.service.name, "starting leadline serve");

    if config.trigger.secret.is_none() {
        warn!("trigger.secret is not set; every tick will be rejected");
    }
    if config.gateway.api_token.is_none() {
        warn!("gateway.api_token is not set; the dashboard API will reject all requests");
    }

    let stack = Stack::build(&config).await?;
    let server_config = ServerConfig {
        host: config.gateway.host.clone(),
        port: config.gateway.port,
    };

    let served = start_server(
        &server_config,
        gateway_state(&config, &stack),
        shutdown_signal(),
    )
    .await;

    stack.close().await;
    info!("leadline serve shutdown complete");
    served
}

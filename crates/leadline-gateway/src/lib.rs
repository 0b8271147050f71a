// SPDX-FileCopyrightText: 2026 Leadline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Leadline scheduler.
//!
//! Exposes the tick trigger, the dashboard API for leads and automation
//! settings, manual calls, and the voice and calendar webhooks that feed
//! call outcomes and bookings back into lead status.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;
pub mod webhooks;

pub use auth::AuthConfig;
pub use error::{ApiError, ErrorResponse};
pub use server::{GatewayState, HealthState, ServerConfig, router, start_server};
pub use webhooks::{BookingSource, WebhookAuth};

// SPDX-FileCopyrightText: 2026 Leadline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scriptable voice dialer for deterministic tests.
//!
//! `MockDialer` implements `VoiceDialer` without any network. Each lead can be
//! scripted with a queue of behaviours; unscripted calls succeed with a
//! generated call id.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use leadline_core::{
    AdapterType, CallRequest, HealthStatus, LeadId, LeadlineError, PlacedCall, PluginAdapter,
    VoiceDialer,
};

/// What the mock does for one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    /// Accept with this call id.
    Place(String),
    /// Refuse with this message.
    Fail(String),
    /// Never answer; only a timeout ends the dispatch.
    Hang,
}

/// A dialer that records requests and replays scripted behaviour.
pub struct MockDialer {
    scripts: Mutex<HashMap<LeadId, VecDeque<MockCall>>>,
    requests: Mutex<Vec<CallRequest>>,
    delay: Option<Duration>,
    next_id: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockDialer {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            delay: None,
            next_id: AtomicUsize::new(1),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Every dispatch sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a behaviour for the next dispatch to `lead`.
    pub async fn script(&self, lead: &LeadId, call: MockCall) {
        self.scripts
            .lock()
            .await
            .entry(lead.clone())
            .or_default()
            .push_back(call);
    }

    /// Every request received so far, in arrival order.
    pub async fn requests(&self) -> Vec<CallRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    /// Highest number of dispatches observed running at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    async fn next_behaviour(&self, lead: &LeadId) -> MockCall {
        let scripted = self
            .scripts
            .lock()
            .await
            .get_mut(lead)
            .and_then(VecDeque::pop_front);
        scripted.unwrap_or_else(|| {
            let n = self.next_id.fetch_add(1, Ordering::SeqCst);
            MockCall::Place(format!("mock-call-{n}"))
        })
    }
}

impl Default for MockDialer {
    fn default() -> Self {
        Self::new()
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl PluginAdapter for MockDialer {
    fn name(&self) -> &str {
        "mock-dialer"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Dialer
    }

    async fn health_check(&self) -> Result<HealthStatus, LeadlineError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LeadlineError> {
        Ok(())
    }
}

#[async_trait]
impl VoiceDialer for MockDialer {
    async fn place_call(&self, request: &CallRequest) -> Result<PlacedCall, LeadlineError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        self.requests.lock().await.push(request.clone());
        let behaviour = self.next_behaviour(&request.lead_id).await;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match behaviour {
            MockCall::Place(call_id) => Ok(PlacedCall { call_id }),
            MockCall::Fail(message) => Err(LeadlineError::Dialer {
                message,
                source: None,
            }),
            MockCall::Hang => std::future::pending().await,
        }
    }
}

// SPDX-FileCopyrightText: 2026 Leadline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Leadline integration tests.
//!
//! Provides a scriptable dialer, a fault-injecting store wrapper, and a
//! harness that wires both to a real scheduler over a temp SQLite database.
//!
//! # Components
//!
//! - [`MockDialer`] - Voice dialer with per-lead scripted behaviour
//! - [`FaultyStore`] - Store wrapper with failure injection and access counts
//! - [`TestHarness`] - Scheduler, reconciler, and stores in one place
//! - [`sign_webhook`] - Booking webhook signatures

pub mod faulty_store;
pub mod harness;
pub mod mock_dialer;
pub mod webhook;

pub use faulty_store::FaultyStore;
pub use harness::TestHarness;
pub use mock_dialer::{MockCall, MockDialer};
pub use webhook::sign_webhook;

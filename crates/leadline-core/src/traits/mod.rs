// SPDX-FileCopyrightText: 2026 Leadline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits consumed by the scheduler.
//!
//! All traits use `#[async_trait]` so they can be held as `Arc<dyn ...>`.

pub mod adapter;
pub mod dialer;
pub mod storage;

pub use adapter::PluginAdapter;
pub use dialer::VoiceDialer;
pub use storage::{LeadStore, SettingsStore, StorageAdapter};

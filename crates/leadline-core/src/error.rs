// SPDX-FileCopyrightText: 2026 Leadline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Leadline scheduler.

use thiserror::Error;

/// The primary error type used across all Leadline collaborator traits and core operations.
#[derive(Debug, Error)]
pub enum LeadlineError {
    /// Configuration errors (invalid TOML, missing required fields, malformed settings rows).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, row decoding).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Voice-call dispatcher errors (network failure, non-success response, bad body).
    #[error("dialer error: {message}")]
    Dialer {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A requested record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Input rejected before it reached the store (bad patch, duplicate phone).
    #[error("validation error: {0}")]
    Validation(String),

    /// The record is in a state that does not allow the operation.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Missing or invalid credential.
    #[error("unauthorized")]
    Unauthorized,

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LeadlineError {
    /// Shorthand for a [`LeadlineError::NotFound`] on a lead.
    pub fn lead_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "lead".to_string(),
            id: id.into(),
        }
    }
}

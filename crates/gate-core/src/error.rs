// SPDX-License-Identifier: Apache-2.0

//! Normalized error types for assumption verification
//!
//! Every stage of the request pipeline reports failures through [`GateError`].
//! The variant decides the HTTP status and how much of the failure the caller
//! is allowed to see.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why an authentication attempt was refused.
///
/// Only the audit sink ever sees this; callers receive a generic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthFailure {
    /// The endpoint is switched off in configuration.
    Disabled,
    /// No allow-list entry covers the caller's address.
    AddressNotAllowed,
    /// The credential was missing, malformed, or wrong.
    InvalidCredential,
}

impl AuthFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "endpoint disabled",
            Self::AddressNotAllowed => "address not allowed",
            Self::InvalidCredential => "invalid credential",
        }
    }
}

/// Unified error type for all verification operations
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum GateError {
    #[error("Unauthorized")]
    Unauthorized { reason: AuthFailure },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Invalid credential format")]
    InvalidCredentialFormat,

    #[error("Operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl GateError {
    pub fn unauthorized(reason: AuthFailure) -> Self {
        Self::Unauthorized { reason }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError {
            message: msg.into(),
        }
    }

    pub fn timeout(timeout_ms: u64) -> Self {
        Self::Timeout { timeout_ms }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
        }
    }

    /// HTTP status this error surfaces as.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized { .. } | Self::InvalidCredentialFormat => 401,
            Self::ValidationError { .. } => 400,
            Self::Timeout { .. } | Self::Internal { .. } => 500,
        }
    }

    /// Message that is safe to return to the caller.
    ///
    /// Validation messages only ever contain rule descriptions, identifiers and
    /// operator names, so they are passed through. Everything else is generic.
    pub fn public_message(&self) -> String {
        match self {
            Self::Unauthorized { .. } | Self::InvalidCredentialFormat => "Unauthorized".to_string(),
            Self::ValidationError { message } => message.clone(),
            Self::Timeout { .. } | Self::Internal { .. } => "Internal server error".to_string(),
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Internal { .. })
    }
}

/// Result type alias for verification operations
pub type GateResult<T> = Result<T, GateError>;

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for ingress normalization and Uptime Kuma API operations.
//!
//! This module provides specialized error types for:
//! - Ingress rules that cannot be turned into a host record
//! - Uptime Kuma HTTP API failures (transport, status, decoding, session)
//!
//! Configuration errors live next to the loader in [`crate::config`].

use thiserror::Error;

/// Errors raised while turning a single `Ingress` rule into a host record.
///
/// These are isolated per rule: the normalizer logs them and keeps going
/// with the remaining rules and ingresses.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// The rule carries no `host` field (a catch-all rule).
    #[error("Ingress {namespace}/{name} rule #{rule_index} has no host")]
    MissingHost {
        /// Namespace of the ingress
        namespace: String,
        /// Name of the ingress
        name: String,
        /// Position of the rule in `spec.rules`
        rule_index: usize,
    },

    /// The rule's `host` is present but empty or whitespace.
    #[error("Ingress {namespace}/{name} rule #{rule_index} has an empty host")]
    EmptyHost {
        /// Namespace of the ingress
        namespace: String,
        /// Name of the ingress
        name: String,
        /// Position of the rule in `spec.rules`
        rule_index: usize,
    },
}

/// Errors that can occur when talking to the Uptime Kuma API.
#[derive(Error, Debug, Clone)]
pub enum KumaError {
    /// The request never produced an HTTP response.
    #[error("HTTP connection to {url} failed: {reason}")]
    Connection {
        /// Full request URL
        url: String,
        /// Transport error description
        reason: String,
    },

    /// The API answered with a non-success status.
    #[error("Uptime Kuma API {method} {url} returned HTTP {status}: {body}")]
    Http {
        /// HTTP method of the failed request
        method: String,
        /// Full request URL
        url: String,
        /// Response status code
        status: u16,
        /// Response body, as returned by the server
        body: String,
    },

    /// The response body did not match the expected shape.
    #[error("Failed to decode Uptime Kuma response from {url}: {reason}")]
    Decode {
        /// Full request URL
        url: String,
        /// Decoder error description
        reason: String,
    },

    /// Login was rejected.
    #[error("Authentication with Uptime Kuma as '{username}' failed: {reason}")]
    AuthenticationFailed {
        /// Username used for login
        username: String,
        /// Reason reported by the API
        reason: String,
    },

    /// A call requiring a session was made before `login` or after `disconnect`.
    #[error("No active Uptime Kuma session; login first")]
    NotLoggedIn,

    /// Retries were exhausted on a transient failure.
    #[error("Giving up on {method} {url} after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// HTTP method of the request
        method: String,
        /// Full request URL
        url: String,
        /// Number of attempts made
        attempts: u32,
        /// Last error observed
        last_error: String,
    },
}

impl KumaError {
    /// Whether a retry has a chance of succeeding.
    ///
    /// Transport failures and HTTP 429/500/502/503/504 are transient;
    /// everything else is permanent.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection { .. } => true,
            Self::Http { status, .. } => {
                reqwest::StatusCode::from_u16(*status).is_ok_and(crate::retry::is_retryable_http_status)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the Uptime Kuma controller.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Ingress Annotation Constants
// ============================================================================

/// Annotation that excludes every host of an `Ingress` from monitoring when set to `"true"`
pub const ANNOTATION_IGNORE: &str = "uptime-kuma-controller.ignore";

/// Annotation selecting `https` (`"true"`) or `http` (any other value) for created monitors.
///
/// When absent the monitor uses `https`.
pub const ANNOTATION_SECURE: &str = "uptime-kuma-controller.secure";

/// The only annotation value treated as boolean true
pub const ANNOTATION_TRUE: &str = "true";

// ============================================================================
// Uptime Kuma Constants
// ============================================================================

/// Color given to the controller tag when it has to be created
pub const DEFAULT_TAG_COLOR: &str = "green";

/// Monitor type used for every monitor this controller creates
pub const MONITOR_TYPE_HTTP: &str = "http";

/// Scheme for monitors of hosts marked secure
pub const SCHEME_HTTPS: &str = "https";

/// Scheme for monitors of hosts not marked secure
pub const SCHEME_HTTP: &str = "http";

/// Timeout applied to every HTTP request against the Uptime Kuma API
pub const KUMA_REQUEST_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Configuration Constants
// ============================================================================

/// Environment variable holding the Uptime Kuma API base URL
pub const ENV_UPTIME_KUMA_API_URL: &str = "UPTIME_KUMA_API_URL";

/// Environment variable holding the tag name that marks monitors owned by this controller
pub const ENV_CONTROLLER_TAG: &str = "CONTROLLER_TAG";

/// Environment variable holding the Uptime Kuma username
pub const ENV_KUMA_USERNAME: &str = "KUMA_USERNAME";

/// Environment variable holding the Uptime Kuma password
pub const ENV_KUMA_PASSWORD: &str = "KUMA_PASSWORD";

/// Environment variable whose presence selects strict (production) configuration
pub const ENV_PROD: &str = "PROD";

/// Development fallback for the Uptime Kuma API URL
pub const DEV_UPTIME_KUMA_API_URL: &str = "http://localhost:3001";

/// Development fallback for the controller tag
pub const DEV_CONTROLLER_TAG: &str = "k8s-ingress";

/// Development fallback for the Uptime Kuma username
pub const DEV_KUMA_USERNAME: &str = "admin";

/// Development fallback for the Uptime Kuma password
pub const DEV_KUMA_PASSWORD: &str = "admin";

/// Process exit code for configuration errors in strict mode
pub const EXIT_CODE_CONFIG_ERROR: i32 = 1;

/// Process exit code when the single cycle of a `--once` run fails
pub const EXIT_CODE_CYCLE_FAILED: i32 = 2;

// ============================================================================
// Scheduler Constants
// ============================================================================

/// Delay before the first reconciliation cycle (10 seconds)
pub const DEFAULT_INITIAL_DELAY_SECS: u64 = 10;

/// Delay between the end of one reconciliation cycle and the start of the next (30 seconds)
pub const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 30;

// ============================================================================
// Kubernetes API Constants
// ============================================================================

/// Number of items requested per page when listing Kubernetes resources
pub const KUBE_LIST_PAGE_SIZE: u32 = 100;

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 2;

// ============================================================================
// Metrics Server Constants
// ============================================================================

/// Default bind address for the Prometheus metrics HTTP server
pub const METRICS_SERVER_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Path for Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

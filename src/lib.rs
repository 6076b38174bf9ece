// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # Uptime Kuma Controller
//!
//! Keeps Uptime Kuma HTTP monitors in sync with the hostnames declared by
//! Kubernetes `Ingress` rules.
//!
//! ## Overview
//!
//! Each reconciliation cycle lists every ingress in the cluster and every
//! monitor in Uptime Kuma, then:
//!
//! - deletes monitors carrying the controller tag whose host is no longer
//!   declared, or is declared with `uptime-kuma-controller.ignore: "true"`
//! - creates and tags a monitor for every declared host that has none
//!
//! Monitors without the controller tag are never touched.
//!
//! ## Modules
//!
//! - [`ingress`] - Ingress listing and normalization into host records
//! - [`kuma`] - Uptime Kuma records, service trait and HTTP client
//! - [`reconciler`] - Inventory filter, diff engine and sync executor
//! - [`scheduler`] - Periodic cycle execution with cancellation
//! - [`config`] - Environment configuration with development defaults
//! - [`metrics`] - Prometheus metrics and the `/metrics` endpoint
//! - [`retry`] - Exponential backoff for Kubernetes and HTTP calls
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use uptime_kuma_controller::ingress::{connect_kube_client, KubeIngressSource};
//! use uptime_kuma_controller::kuma::KumaClient;
//! use uptime_kuma_controller::reconciler::Reconciler;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = connect_kube_client().await?;
//! let kuma = KumaClient::new("http://uptime-kuma:3001", "admin", "secret")?;
//! let reconciler = Reconciler::new(
//!     Arc::new(KubeIngressSource::new(client)),
//!     Arc::new(kuma),
//!     "k8s-ingress",
//! );
//!
//! let report = reconciler.run_cycle().await?;
//! println!("created {} monitors", report.sync.created.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod errors;
pub mod ingress;
pub mod kuma;
pub mod metrics;
pub mod reconciler;
pub mod retry;
pub mod scheduler;

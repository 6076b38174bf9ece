// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The reconciliation cycle.
//!
//! One cycle brings the set of controller-owned Uptime Kuma monitors in line
//! with the hostnames declared by Kubernetes `Ingress` rules:
//!
//! 1. Open a monitoring session
//! 2. Ensure the controller tag exists ([`sync::ensure_tag`])
//! 3. List monitors and keep those carrying the tag ([`inventory::filter_by_tag`])
//! 4. List ingresses and normalize them into host records
//! 5. Compute the diff ([`diff::compute_diff`])
//! 6. Delete prunable monitors, then create and tag missing ones ([`sync::apply`])
//! 7. Close the session, whatever happened above
//!
//! Only monitors carrying the controller tag are ever deleted. Each cycle
//! starts from a fresh read of both systems; nothing is cached between cycles.

pub mod diff;
pub mod inventory;
pub mod sync;

#[cfg(test)]
pub(crate) mod fakes;

use crate::ingress::{normalize_ingresses, IngressSource};
use crate::kuma::MonitoringService;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub use sync::{CreatedMonitor, DeleteFailure, SyncReport};

/// Summary of one completed cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    /// Distinct host records derived from ingresses
    pub hosts_discovered: usize,
    /// Ingress rules skipped because they had no usable host
    pub normalization_errors: usize,
    /// Monitors carrying the controller tag at the start of the cycle
    pub owned_monitors: usize,
    /// Changes applied
    pub sync: SyncReport,
}

/// Runs reconciliation cycles against one ingress source and one monitoring service.
pub struct Reconciler {
    ingresses: Arc<dyn IngressSource>,
    monitoring: Arc<dyn MonitoringService>,
    controller_tag: String,
}

impl Reconciler {
    #[must_use]
    pub fn new(
        ingresses: Arc<dyn IngressSource>,
        monitoring: Arc<dyn MonitoringService>,
        controller_tag: impl Into<String>,
    ) -> Self {
        Self {
            ingresses,
            monitoring,
            controller_tag: controller_tag.into(),
        }
    }

    #[must_use]
    pub fn controller_tag(&self) -> &str {
        &self.controller_tag
    }

    /// Run one full cycle.
    ///
    /// The session is always closed before returning once login succeeded.
    /// A failure to close it is logged and does not replace the cycle result.
    ///
    /// # Errors
    ///
    /// Returns an error if login fails, if either system cannot be listed,
    /// or if creating or tagging a monitor fails.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        self.monitoring
            .login()
            .await
            .context("Failed to log in to Uptime Kuma")?;

        let result = self.reconcile().await;

        if let Err(e) = self.monitoring.disconnect().await {
            warn!(error = %e, "Failed to disconnect from Uptime Kuma");
        }

        result
    }

    async fn reconcile(&self) -> Result<CycleReport> {
        let tag = sync::ensure_tag(self.monitoring.as_ref(), &self.controller_tag).await?;

        let monitors = self
            .monitoring
            .list_monitors()
            .await
            .context("Failed to list Uptime Kuma monitors")?;
        let total_monitors = monitors.len();
        let owned = inventory::filter_by_tag(monitors, &self.controller_tag);
        debug!(
            total = total_monitors,
            owned = owned.len(),
            tag = %self.controller_tag,
            "Listed monitors"
        );

        let ingresses = self
            .ingresses
            .list_ingresses()
            .await
            .context("Failed to list ingresses")?;
        let normalized = normalize_ingresses(&ingresses);
        debug!(
            ingresses = ingresses.len(),
            hosts = normalized.records.len(),
            "Listed ingresses"
        );

        let diff = diff::compute_diff(&owned, &normalized.records);
        if diff.is_empty() {
            debug!("Monitors are in sync with ingresses");
        } else {
            info!(
                prune = diff.prunable.len(),
                create = diff.missing.len(),
                "Applying monitor changes"
            );
        }

        let sync = sync::apply(self.monitoring.as_ref(), &tag, &diff.prunable, &diff.missing).await?;

        Ok(CycleReport {
            hosts_discovered: normalized.records.len(),
            normalization_errors: normalized.errors.len(),
            owned_monitors: owned.len(),
            sync,
        })
    }
}

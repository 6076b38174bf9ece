// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Applying a diff to the monitoring service.
//!
//! Deletions run first and are isolated per monitor: a failed delete is
//! logged, counted and reported, and the remaining work continues. Creations
//! are not isolated: the first failed create or tag attach aborts the cycle,
//! and the next cycle picks up where this one stopped.

use crate::constants::{DEFAULT_TAG_COLOR, SCHEME_HTTP, SCHEME_HTTPS};
use crate::errors::KumaError;
use crate::ingress::HostRecord;
use crate::kuma::{Monitor, MonitorId, MonitoringService, NewMonitor, Tag};
use crate::metrics;
use anyhow::{Context, Result};
use tracing::{debug, error, info};

/// A monitor that could not be deleted this cycle.
#[derive(Debug, Clone)]
pub struct DeleteFailure {
    pub monitor_id: MonitorId,
    pub url: String,
    pub error: KumaError,
}

/// A monitor created and tagged this cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedMonitor {
    pub id: MonitorId,
    pub host: String,
    pub url: String,
}

/// Outcome of [`apply`].
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub deleted: Vec<MonitorId>,
    pub delete_failures: Vec<DeleteFailure>,
    pub created: Vec<CreatedMonitor>,
}

/// URL of the monitor created for `record`.
#[must_use]
pub fn monitor_url(record: &HostRecord) -> String {
    let scheme = if record.secure {
        SCHEME_HTTPS
    } else {
        SCHEME_HTTP
    };
    format!("{scheme}://{}", record.host)
}

/// Return the tag definition named `name`, creating it if absent.
///
/// The first existing definition with that exact name wins. A new one is
/// created with the default color.
///
/// # Errors
///
/// Returns an error if the tags cannot be listed or the tag cannot be created.
pub async fn ensure_tag<S>(service: &S, name: &str) -> Result<Tag>
where
    S: MonitoringService + ?Sized,
{
    let tags = service
        .list_tags()
        .await
        .context("Failed to list Uptime Kuma tags")?;

    if let Some(tag) = tags.into_iter().find(|tag| tag.name == name) {
        debug!(tag = %name, tag_id = tag.id, "Controller tag exists");
        return Ok(tag);
    }

    let tag = service
        .create_tag(name, DEFAULT_TAG_COLOR)
        .await
        .with_context(|| format!("Failed to create Uptime Kuma tag '{name}'"))?;
    info!(tag = %name, tag_id = tag.id, "Created controller tag");

    Ok(tag)
}

/// Delete every prunable monitor, then create and tag every missing one.
///
/// # Errors
///
/// Returns an error on the first failed create or tag attach. Deletion
/// failures never make this fail; they are collected in the report.
pub async fn apply<S>(
    service: &S,
    tag: &Tag,
    prunable: &[&Monitor],
    missing: &[HostRecord],
) -> Result<SyncReport>
where
    S: MonitoringService + ?Sized,
{
    let mut report = SyncReport::default();

    for monitor in prunable {
        match service.delete_monitor(monitor.id).await {
            Ok(()) => {
                info!(monitor_id = monitor.id, url = %monitor.url, "Deleted monitor");
                metrics::record_monitor_deleted();
                report.deleted.push(monitor.id);
            }
            Err(e) => {
                error!(
                    monitor_id = monitor.id,
                    url = %monitor.url,
                    error = %e,
                    "Failed to delete monitor, continuing"
                );
                metrics::record_monitor_delete_failure();
                report.delete_failures.push(DeleteFailure {
                    monitor_id: monitor.id,
                    url: monitor.url.clone(),
                    error: e,
                });
            }
        }
    }

    for record in missing {
        let url = monitor_url(record);
        let id = service
            .create_monitor(&NewMonitor::http(record.host.as_str(), url.as_str()))
            .await
            .with_context(|| format!("Failed to create monitor for {url}"))?;

        service.add_monitor_tag(tag.id, id).await.with_context(|| {
            format!(
                "Created monitor {id} for {url} but failed to attach tag '{}'; \
                 the monitor is untagged and will not be managed",
                tag.name
            )
        })?;

        info!(monitor_id = id, url = %url, "Created monitor");
        metrics::record_monitor_created();
        report.created.push(CreatedMonitor {
            id,
            host: record.host.clone(),
            url,
        });
    }

    Ok(report)
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod sync_tests;

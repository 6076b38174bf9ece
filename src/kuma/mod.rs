// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Uptime Kuma monitoring service access.
//!
//! This module defines the typed records the reconciler reads ([`Monitor`],
//! [`MonitorTag`], [`Tag`]), the [`MonitoringService`] capability set it
//! needs, and [`KumaClient`], the HTTP implementation used in production.
//!
//! # Example
//!
//! ```rust,no_run
//! use uptime_kuma_controller::kuma::{KumaClient, MonitoringService};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = KumaClient::new("http://uptime-kuma:3001", "admin", "secret")?;
//! client.login().await?;
//! for monitor in client.list_monitors().await? {
//!     println!("{} -> {}", monitor.name, monitor.url);
//! }
//! client.disconnect().await?;
//! # Ok(())
//! # }
//! ```

pub mod client;

pub use client::KumaClient;

use crate::constants::MONITOR_TYPE_HTTP;
use crate::errors::KumaError;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of a monitor in Uptime Kuma
pub type MonitorId = u64;

/// Identifier of a tag in Uptime Kuma
pub type TagId = u64;

/// A tag definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub color: String,
}

/// A tag as attached to a monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorTag {
    #[serde(default)]
    pub tag_id: Option<TagId>,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

impl MonitorTag {
    /// Tag reference carrying only a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            tag_id: None,
            name: name.into(),
            color: None,
            value: None,
        }
    }
}

/// A monitor, reduced to the fields the reconciler reads.
///
/// Uptime Kuma returns `null` URLs for non-HTTP monitors; those decode as
/// the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monitor {
    pub id: MonitorId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<MonitorTag>,
}

impl Monitor {
    /// Whether any attached tag has exactly this name.
    #[must_use]
    pub fn has_tag(&self, tag_name: &str) -> bool {
        self.tags.iter().any(|tag| tag.name == tag_name)
    }
}

/// Request body for creating a monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewMonitor {
    #[serde(rename = "type")]
    pub monitor_type: String,
    pub name: String,
    pub url: String,
}

impl NewMonitor {
    /// HTTP(S) monitor for `url`, displayed as `name`.
    #[must_use]
    pub fn http(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            monitor_type: MONITOR_TYPE_HTTP.to_string(),
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Operations the reconciler needs from the monitoring service.
///
/// Implemented by [`KumaClient`] for production and by in-memory doubles in tests.
#[async_trait]
pub trait MonitoringService: Send + Sync {
    /// Open a session. Called once at the start of every cycle.
    async fn login(&self) -> Result<(), KumaError>;

    /// List every tag definition.
    async fn list_tags(&self) -> Result<Vec<Tag>, KumaError>;

    /// Create a tag definition.
    async fn create_tag(&self, name: &str, color: &str) -> Result<Tag, KumaError>;

    /// List every monitor with its tags.
    async fn list_monitors(&self) -> Result<Vec<Monitor>, KumaError>;

    /// Create a monitor and return its id.
    async fn create_monitor(&self, monitor: &NewMonitor) -> Result<MonitorId, KumaError>;

    /// Attach a tag to a monitor.
    async fn add_monitor_tag(&self, tag_id: TagId, monitor_id: MonitorId) -> Result<(), KumaError>;

    /// Delete a monitor.
    async fn delete_monitor(&self, monitor_id: MonitorId) -> Result<(), KumaError>;

    /// Close the session. Called once at the end of every cycle.
    async fn disconnect(&self) -> Result<(), KumaError>;
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Diff between declared ingress hosts and owned monitors.
//!
//! Monitors are compared to host records through [`canonical_host`] only.
//!
//! - A monitor is **prunable** when its host is no longer declared by any
//!   ingress, or is declared with the ignore annotation.
//! - A host is **missing** when no owned monitor covers it and it is not ignored.
//!
//! # Duplicate hosts
//!
//! Host records are distinct per `(host, ignore, secure)`, so two ingresses can
//! declare the same host with different annotations. The missing list holds at
//! most one record per host:
//!
//! - if any record for the host is ignored, the host is not missing (the prune
//!   rule already treats it as ignored, so creating it would only churn);
//! - otherwise `secure` wins over insecure.
//!
//! This departs from the per-record rule, which would still emit the
//! non-ignored record of a host that another ingress ignores. That record would
//! be created and then pruned on the next cycle.

use crate::ingress::HostRecord;
use crate::kuma::Monitor;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::warn;

/// Hostname a monitor represents, derived from its URL.
///
/// Strips a literal `https://` or `http://` prefix and returns the text after
/// the last `/`. This is a textual rule, not URL parsing:
/// `https://a.example.com/health` yields `health`.
///
/// # Example
///
/// ```rust
/// use uptime_kuma_controller::reconciler::diff::canonical_host;
///
/// assert_eq!(canonical_host("https://a.example.com"), "a.example.com");
/// assert_eq!(canonical_host("http://a.example.com"), "a.example.com");
/// assert_eq!(canonical_host("https://a.example.com/health"), "health");
/// ```
#[must_use]
pub fn canonical_host(url: &str) -> &str {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);

    rest.rsplit('/').next().unwrap_or(rest)
}

/// Owned monitors whose host is undeclared or ignored, in input order.
#[must_use]
pub fn prunable_monitors<'a>(
    monitors: &'a [Monitor],
    records: &BTreeSet<HostRecord>,
) -> Vec<&'a Monitor> {
    let known_hosts: HashSet<&str> = records.iter().map(|r| r.host.as_str()).collect();
    let ignored_hosts: HashSet<&str> = records
        .iter()
        .filter(|r| r.ignore)
        .map(|r| r.host.as_str())
        .collect();

    monitors
        .iter()
        .filter(|monitor| {
            let host = canonical_host(&monitor.url);
            !known_hosts.contains(host) || ignored_hosts.contains(host)
        })
        .collect()
}

/// Host records that need a new monitor, at most one per host, ordered by host.
#[must_use]
pub fn missing_monitors(monitors: &[Monitor], records: &BTreeSet<HostRecord>) -> Vec<HostRecord> {
    let monitored_hosts: HashSet<&str> = monitors.iter().map(|m| canonical_host(&m.url)).collect();
    let ignored_hosts: HashSet<&str> = records
        .iter()
        .filter(|r| r.ignore)
        .map(|r| r.host.as_str())
        .collect();

    let mut missing: BTreeMap<&str, HostRecord> = BTreeMap::new();

    for record in records {
        let host = record.host.as_str();
        if record.ignore || monitored_hosts.contains(host) {
            continue;
        }
        if ignored_hosts.contains(host) {
            warn!(
                host = %host,
                "Host is declared both ignored and monitored by different ingresses; ignoring it"
            );
            continue;
        }

        match missing.entry(host) {
            Entry::Vacant(entry) => {
                entry.insert(record.clone());
            }
            Entry::Occupied(mut entry) => {
                warn!(
                    host = %host,
                    "Host is declared both secure and insecure by different ingresses; using https"
                );
                entry.get_mut().secure |= record.secure;
            }
        }
    }

    missing.into_values().collect()
}

/// What one cycle has to change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff<'a> {
    /// Owned monitors to delete
    pub prunable: Vec<&'a Monitor>,
    /// Hosts to create monitors for
    pub missing: Vec<HostRecord>,
}

impl Diff<'_> {
    /// Whether the monitor inventory already matches the declared hosts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prunable.is_empty() && self.missing.is_empty()
    }
}

/// Compute both halves of the diff.
///
/// `monitors` must already be filtered to the controller tag.
#[must_use]
pub fn compute_diff<'a>(monitors: &'a [Monitor], records: &BTreeSet<HostRecord>) -> Diff<'a> {
    Diff {
        prunable: prunable_monitors(monitors, records),
        missing: missing_monitors(monitors, records),
    }
}

#[cfg(test)]
#[path = "diff_tests.rs"]
mod diff_tests;

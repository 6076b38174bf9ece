// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Ingress normalization into host records.
//!
//! Every rule of every `Ingress` becomes one [`HostRecord`] carrying the
//! ingress-level monitoring policy read from two annotations:
//!
//! | Annotation | Absent | `"true"` | Anything else |
//! |------------|--------|----------|---------------|
//! | `uptime-kuma-controller.ignore` | `ignore = false` | `ignore = true` | `ignore = false` |
//! | `uptime-kuma-controller.secure` | `secure = true` | `secure = true` | `secure = false` |
//!
//! Values are compared exactly; `"TRUE"` and `"yes"` are not true.
//!
//! # Example
//!
//! ```rust
//! use k8s_openapi::api::networking::v1::{Ingress, IngressRule, IngressSpec};
//! use uptime_kuma_controller::ingress::{normalize_ingresses, HostRecord};
//!
//! let ingress = Ingress {
//!     spec: Some(IngressSpec {
//!         rules: Some(vec![IngressRule {
//!             host: Some("a.example.com".to_string()),
//!             ..Default::default()
//!         }]),
//!         ..Default::default()
//!     }),
//!     ..Default::default()
//! };
//!
//! let normalized = normalize_ingresses(&[ingress]);
//! assert!(normalized.records.contains(&HostRecord::new("a.example.com", false, true)));
//! ```

pub mod source;

pub use source::{connect_kube_client, IngressSource, KubeIngressSource};

use crate::constants::{ANNOTATION_IGNORE, ANNOTATION_SECURE, ANNOTATION_TRUE};
use crate::errors::NormalizeError;
use k8s_openapi::api::networking::v1::{Ingress, IngressRule};
use kube::ResourceExt;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// One declared ingress hostname plus its monitoring policy.
///
/// Equality, ordering and hashing cover all three fields, so the same host
/// declared with different flags yields distinct set members.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HostRecord {
    /// Hostname without scheme or path
    pub host: String,
    /// The controller must not keep a monitor for this host
    pub ignore: bool,
    /// Created monitors use `https` when set, `http` otherwise
    pub secure: bool,
}

impl HostRecord {
    #[must_use]
    pub fn new(host: impl Into<String>, ignore: bool, secure: bool) -> Self {
        Self {
            host: host.into(),
            ignore,
            secure,
        }
    }
}

/// Ingress-level monitoring policy shared by all rules of one `Ingress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorPolicy {
    pub ignore: bool,
    pub secure: bool,
}

impl MonitorPolicy {
    /// Read the policy from an ingress's annotations.
    #[must_use]
    pub fn from_annotations(annotations: &BTreeMap<String, String>) -> Self {
        let ignore = annotations
            .get(ANNOTATION_IGNORE)
            .is_some_and(|v| v == ANNOTATION_TRUE);
        let secure = annotations
            .get(ANNOTATION_SECURE)
            .map_or(true, |v| v == ANNOTATION_TRUE);

        Self { ignore, secure }
    }
}

/// Result of normalizing one cycle's ingress list.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    /// Deduplicated host records
    pub records: BTreeSet<HostRecord>,
    /// Rules that could not be turned into a record
    pub errors: Vec<NormalizeError>,
}

/// Build the host record for a single rule.
///
/// # Errors
///
/// Returns [`NormalizeError`] when the rule has no host or an empty one.
pub fn host_record_from_rule(
    ingress: &Ingress,
    rule_index: usize,
    rule: &IngressRule,
    policy: MonitorPolicy,
) -> Result<HostRecord, NormalizeError> {
    let namespace = || ingress.namespace().unwrap_or_default();

    match rule.host.as_deref() {
        None => Err(NormalizeError::MissingHost {
            namespace: namespace(),
            name: ingress.name_any(),
            rule_index,
        }),
        Some(host) if host.trim().is_empty() => Err(NormalizeError::EmptyHost {
            namespace: namespace(),
            name: ingress.name_any(),
            rule_index,
        }),
        Some(host) => Ok(HostRecord::new(host, policy.ignore, policy.secure)),
    }
}

/// Turn the cluster's ingress list into this cycle's set of host records.
///
/// Rules that cannot be converted are logged and collected in
/// [`Normalized::errors`]; they never stop the remaining rules.
#[must_use]
pub fn normalize_ingresses(ingresses: &[Ingress]) -> Normalized {
    let mut normalized = Normalized::default();

    for ingress in ingresses {
        let policy = MonitorPolicy::from_annotations(ingress.annotations());
        let rules = ingress
            .spec
            .as_ref()
            .and_then(|spec| spec.rules.as_deref())
            .unwrap_or_default();

        for (rule_index, rule) in rules.iter().enumerate() {
            match host_record_from_rule(ingress, rule_index, rule, policy) {
                Ok(record) => {
                    debug!(
                        host = %record.host,
                        ignore = record.ignore,
                        secure = record.secure,
                        ingress = %ingress.name_any(),
                        "Discovered ingress host"
                    );
                    normalized.records.insert(record);
                }
                Err(e) => {
                    warn!(error = %e, "Skipping ingress rule");
                    normalized.errors.push(e);
                }
            }
        }
    }

    normalized
}

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Scoping the monitor inventory to the controller tag.

use crate::kuma::Monitor;

/// Keep only monitors carrying a tag named exactly `tag_name`, in input order.
///
/// Everything else is invisible to the reconciler and is never modified.
#[must_use]
pub fn filter_by_tag(monitors: Vec<Monitor>, tag_name: &str) -> Vec<Monitor> {
    monitors
        .into_iter()
        .filter(|monitor| !monitor.tags.is_empty() && monitor.has_tag(tag_name))
        .collect()
}

#[cfg(test)]
#[path = "inventory_tests.rs"]
mod inventory_tests;

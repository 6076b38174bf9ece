// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Cluster-side ingress listing.
//!
//! The reconciler only needs "list every `Ingress` in every namespace"; the
//! [`IngressSource`] trait captures that so tests can substitute a fixed list.

use crate::constants::KUBE_LIST_PAGE_SIZE;
use crate::retry::{is_retryable_kube_error, kube_backoff, retry_with_backoff, RetryError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::networking::v1::Ingress;
use kube::config::KubeConfigOptions;
use kube::{api::ListParams, Api, Client, Config};
use tracing::{debug, info, warn};

/// Source of the cluster's `Ingress` resources.
#[async_trait]
pub trait IngressSource: Send + Sync {
    /// List every `Ingress` across all namespaces.
    ///
    /// # Errors
    ///
    /// Returns an error if the cluster cannot be queried.
    async fn list_ingresses(&self) -> Result<Vec<Ingress>>;
}

/// [`IngressSource`] backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeIngressSource {
    api: Api<Ingress>,
}

impl KubeIngressSource {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            api: Api::all(client),
        }
    }
}

#[async_trait]
impl IngressSource for KubeIngressSource {
    async fn list_ingresses(&self) -> Result<Vec<Ingress>> {
        let mut list_params = ListParams {
            limit: Some(KUBE_LIST_PAGE_SIZE),
            ..Default::default()
        };
        let mut all_items = Vec::new();
        let mut page_count = 0;

        loop {
            page_count += 1;
            let page = retry_with_backoff(
                kube_backoff(),
                "list ingresses",
                is_retryable_kube_error,
                || self.api.list(&list_params),
            )
            .await
            .map_err(RetryError::into_inner)
            .context("Failed to list Ingress resources across all namespaces")?;

            let item_count = page.items.len();
            all_items.extend(page.items);

            debug!(
                page = page_count,
                items_in_page = item_count,
                total_items = all_items.len(),
                "Fetched Ingress page from Kubernetes API"
            );

            match page.metadata.continue_ {
                Some(token) if !token.is_empty() => list_params.continue_token = Some(token),
                _ => break,
            }
        }

        Ok(all_items)
    }
}

/// Build a Kubernetes client, preferring the local kubeconfig.
///
/// Falls back to the in-cluster service account configuration when no
/// kubeconfig can be loaded.
///
/// # Errors
///
/// Returns an error if neither configuration source is usable.
pub async fn connect_kube_client() -> Result<Client> {
    let config = match Config::from_kubeconfig(&KubeConfigOptions::default()).await {
        Ok(config) => {
            debug!("Loaded Kubernetes configuration from kubeconfig");
            config
        }
        Err(e) => {
            warn!(error = %e, "Failed to load kubeconfig, using in-cluster configuration");
            Config::incluster().context("Failed to load in-cluster Kubernetes configuration")?
        }
    };

    info!(cluster_url = %config.cluster_url, "Connecting to Kubernetes API");
    Client::try_from(config).context("Failed to build Kubernetes client")
}

#[cfg(test)]
#[path = "source_tests.rs"]
mod source_tests;

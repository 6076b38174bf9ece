// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP client for the Uptime Kuma REST API.
//!
//! Requests carry the bearer token and map failures to [`KumaError`].
//!
//! Reads and login are retried on transient failures with exponential backoff.
//! Creating, tagging and deleting monitors are sent exactly once: the API
//! offers no idempotency key, so a repeated create after a lost response would
//! leave an untagged duplicate behind.

use super::{Monitor, MonitorId, MonitoringService, NewMonitor, Tag, TagId};
use crate::constants::KUMA_REQUEST_TIMEOUT_SECS;
use crate::errors::KumaError;
use crate::retry::{http_backoff, retry_with_backoff, ExponentialBackoff, RetryError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client as HttpClient, Method};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct TagList {
    tags: Vec<Tag>,
}

#[derive(Debug, Deserialize)]
struct MonitorList {
    monitors: Vec<Monitor>,
}

#[derive(Debug, Deserialize)]
struct MonitorCreated {
    #[serde(rename = "monitorID")]
    monitor_id: MonitorId,
}

/// Body of a single API request.
#[derive(Debug, Clone, Copy)]
enum Body<'a> {
    Empty,
    Json(&'a serde_json::Value),
    Form(&'a [(&'a str, &'a str)]),
}

/// Client for the Uptime Kuma REST API.
pub struct KumaClient {
    http: HttpClient,
    base_url: String,
    username: String,
    password: String,
    token: RwLock<Option<String>>,
    backoff: fn() -> ExponentialBackoff,
}

impl KumaClient {
    /// Create a client for the API at `base_url`.
    ///
    /// No request is made until [`MonitoringService::login`].
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, username: &str, password: &str) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(KUMA_REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client for Uptime Kuma")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
            token: RwLock::new(None),
            backoff: http_backoff,
        })
    }

    /// Replace the retry profile used for reads and login.
    #[must_use]
    pub fn with_backoff(mut self, backoff: fn() -> ExponentialBackoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Base URL requests are sent to, without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether a session token is currently held.
    pub async fn is_logged_in(&self) -> bool {
        self.token.read().await.is_some()
    }

    async fn session_token(&self) -> Result<String, KumaError> {
        self.token.read().await.clone().ok_or(KumaError::NotLoggedIn)
    }

    /// Send a request that is safe to repeat, retrying transient failures.
    async fn send_with_retry(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Body<'_>,
    ) -> Result<String, KumaError> {
        let url = format!("{}{path}", self.base_url);
        let operation = format!("{method} {path}");

        retry_with_backoff(
            (self.backoff)(),
            &operation,
            KumaError::is_retryable,
            || self.send_once(&method, &url, token, body),
        )
        .await
        .map_err(|e| match e {
            RetryError::Permanent(e) => e,
            RetryError::Exhausted {
                attempts,
                last_error,
            } => KumaError::RetriesExhausted {
                method: method.to_string(),
                url: url.clone(),
                attempts,
                last_error: last_error.to_string(),
            },
        })
    }

    /// Send a request exactly once.
    async fn send(
        &self,
        method: &Method,
        path: &str,
        token: Option<&str>,
        body: Body<'_>,
    ) -> Result<String, KumaError> {
        let url = format!("{}{path}", self.base_url);
        self.send_once(method, &url, token, body).await
    }

    async fn send_once(
        &self,
        method: &Method,
        url: &str,
        token: Option<&str>,
        body: Body<'_>,
    ) -> Result<String, KumaError> {
        debug!(method = %method, url = %url, "HTTP API request to Uptime Kuma");

        let mut request = self.http.request(method.clone(), url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request = match body {
            Body::Empty => request,
            Body::Json(value) => request.json(value),
            Body::Form(fields) => request.form(fields),
        };

        let response = request.send().await.map_err(|e| KumaError::Connection {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| KumaError::Connection {
            url: url.to_string(),
            reason: format!("failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            error!(
                method = %method,
                url = %url,
                status = %status,
                error = %text,
                "HTTP API request failed"
            );
            return Err(KumaError::Http {
                method: method.to_string(),
                url: url.to_string(),
                status: status.as_u16(),
                body: text,
            });
        }

        debug!(
            method = %method,
            url = %url,
            status = %status,
            response_len = text.len(),
            "HTTP API request successful"
        );

        Ok(text)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, KumaError> {
        let token = self.session_token().await?;
        let text = self
            .send_with_retry(Method::GET, path, Some(&token), Body::Empty)
            .await?;
        self.decode(path, &text)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, KumaError> {
        let token = self.session_token().await?;
        let text = self
            .send(&Method::POST, path, Some(&token), Body::Json(body))
            .await?;
        self.decode(path, &text)
    }

    fn decode<T: DeserializeOwned>(&self, path: &str, text: &str) -> Result<T, KumaError> {
        serde_json::from_str(text).map_err(|e| KumaError::Decode {
            url: format!("{}{path}", self.base_url),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl MonitoringService for KumaClient {
    async fn login(&self) -> Result<(), KumaError> {
        let fields = [
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
        ];

        let text = match self
            .send_with_retry(Method::POST, "/login/access-token", None, Body::Form(&fields))
            .await
        {
            Ok(text) => text,
            Err(KumaError::Http { status, body, .. }) if (400..500).contains(&status) => {
                return Err(KumaError::AuthenticationFailed {
                    username: self.username.clone(),
                    reason: format!("HTTP {status}: {body}"),
                });
            }
            Err(e) => return Err(e),
        };

        let login: LoginResponse = self.decode("/login/access-token", &text)?;
        *self.token.write().await = Some(login.access_token);

        info!(url = %self.base_url, username = %self.username, "Logged in to Uptime Kuma");
        Ok(())
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, KumaError> {
        let list: TagList = self.get_json("/tags").await?;
        Ok(list.tags)
    }

    async fn create_tag(&self, name: &str, color: &str) -> Result<Tag, KumaError> {
        self.post_json("/tags", &json!({ "name": name, "color": color }))
            .await
    }

    async fn list_monitors(&self) -> Result<Vec<Monitor>, KumaError> {
        let list: MonitorList = self.get_json("/monitors").await?;
        Ok(list.monitors)
    }

    async fn create_monitor(&self, monitor: &NewMonitor) -> Result<MonitorId, KumaError> {
        let body = serde_json::to_value(monitor).map_err(|e| KumaError::Decode {
            url: format!("{}/monitors", self.base_url),
            reason: e.to_string(),
        })?;
        let created: MonitorCreated = self.post_json("/monitors", &body).await?;
        Ok(created.monitor_id)
    }

    async fn add_monitor_tag(&self, tag_id: TagId, monitor_id: MonitorId) -> Result<(), KumaError> {
        let token = self.session_token().await?;
        let body = json!({ "tag_id": tag_id, "value": "" });
        self.send(
            &Method::POST,
            &format!("/monitors/{monitor_id}/tag"),
            Some(&token),
            Body::Json(&body),
        )
        .await?;
        Ok(())
    }

    async fn delete_monitor(&self, monitor_id: MonitorId) -> Result<(), KumaError> {
        let token = self.session_token().await?;
        self.send(
            &Method::DELETE,
            &format!("/monitors/{monitor_id}"),
            Some(&token),
            Body::Empty,
        )
        .await?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), KumaError> {
        if self.token.write().await.take().is_some() {
            debug!(url = %self.base_url, "Closed Uptime Kuma session");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod client_tests;

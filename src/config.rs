// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Controller configuration from environment variables.
//!
//! | Variable | Meaning | Development default |
//! |----------|---------|---------------------|
//! | `UPTIME_KUMA_API_URL` | Base URL of the Uptime Kuma API | `http://localhost:3001` |
//! | `CONTROLLER_TAG` | Tag marking monitors owned by this controller | `k8s-ingress` |
//! | `KUMA_USERNAME` | Uptime Kuma user | `admin` |
//! | `KUMA_PASSWORD` | Uptime Kuma password | `admin` |
//! | `PROD` | Strict mode when set | |
//!
//! Unset and empty variables both count as missing. When any required variable
//! is missing, strict mode fails with [`ConfigError::MissingVariables`];
//! otherwise all four fall back to the development defaults.
//!
//! An API URL that is not an absolute http(s) URL fails with
//! [`ConfigError::InvalidUrl`] in strict mode. Outside strict mode it is
//! logged and treated as missing.

use crate::constants::{
    DEV_CONTROLLER_TAG, DEV_KUMA_PASSWORD, DEV_KUMA_USERNAME, DEV_UPTIME_KUMA_API_URL,
    ENV_CONTROLLER_TAG, ENV_KUMA_PASSWORD, ENV_KUMA_USERNAME, ENV_PROD, ENV_UPTIME_KUMA_API_URL,
};
use std::fmt;
use thiserror::Error;
use tracing::warn;
use url::Url;

/// Configuration failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Required variables are missing in strict mode
    #[error("Required environment variables are not set: {}", .0.join(", "))]
    MissingVariables(Vec<&'static str>),

    /// The API URL is not an absolute http(s) URL in strict mode
    #[error("{variable} '{value}' is not a valid http(s) URL: {reason}")]
    InvalidUrl {
        variable: &'static str,
        value: String,
        reason: String,
    },
}

/// Resolved controller settings.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub controller_tag: String,
    pub username: String,
    pub password: String,
    /// `PROD` was set
    pub strict: bool,
    /// Development defaults were substituted
    pub using_defaults: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_url", &self.api_url)
            .field("controller_tag", &self.controller_tag)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("strict", &self.strict)
            .field("using_defaults", &self.using_defaults)
            .finish()
    }
}

impl Config {
    /// Load from the process environment.
    ///
    /// # Errors
    ///
    /// See [`Config::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` to read each variable.
    ///
    /// # Errors
    ///
    /// Only in strict mode: [`ConfigError::MissingVariables`] when a required
    /// variable is missing, and [`ConfigError::InvalidUrl`] when the API URL
    /// is not an absolute http(s) URL.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let strict = read(ENV_PROD).is_some();
        let mut api_url = read(ENV_UPTIME_KUMA_API_URL);
        let controller_tag = read(ENV_CONTROLLER_TAG);
        let username = read(ENV_KUMA_USERNAME);
        let password = read(ENV_KUMA_PASSWORD);

        if let Some(Err(e)) = api_url.as_deref().map(validate_api_url) {
            if strict {
                return Err(e);
            }
            warn!(error = %e, "Ignoring invalid API URL");
            api_url = None;
        }

        let config = match (api_url, controller_tag, username, password) {
            (Some(api_url), Some(controller_tag), Some(username), Some(password)) => Self {
                api_url,
                controller_tag,
                username,
                password,
                strict,
                using_defaults: false,
            },
            (api_url, controller_tag, username, password) => {
                let missing: Vec<&'static str> = [
                    (ENV_UPTIME_KUMA_API_URL, api_url.is_none()),
                    (ENV_CONTROLLER_TAG, controller_tag.is_none()),
                    (ENV_KUMA_USERNAME, username.is_none()),
                    (ENV_KUMA_PASSWORD, password.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, is_missing)| is_missing.then_some(name))
                .collect();

                if strict {
                    return Err(ConfigError::MissingVariables(missing));
                }

                warn!(
                    missing = %missing.join(", "),
                    "Required environment variables are not set, running with development defaults"
                );
                Self::development(strict)
            }
        };

        Ok(config)
    }

    fn development(strict: bool) -> Self {
        Self {
            api_url: DEV_UPTIME_KUMA_API_URL.to_string(),
            controller_tag: DEV_CONTROLLER_TAG.to_string(),
            username: DEV_KUMA_USERNAME.to_string(),
            password: DEV_KUMA_PASSWORD.to_string(),
            strict,
            using_defaults: true,
        }
    }

}

fn validate_api_url(value: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        variable: ENV_UPTIME_KUMA_API_URL,
        value: value.to_string(),
        reason,
    };

    let url = Url::parse(value).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;

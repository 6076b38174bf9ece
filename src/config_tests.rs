// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `config.rs`

#[cfg(test)]
mod tests {
    use crate::config::{Config, ConfigError};
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    const FULL: &[(&str, &str)] = &[
        ("UPTIME_KUMA_API_URL", "https://kuma.internal:3001"),
        ("CONTROLLER_TAG", "ingress"),
        ("KUMA_USERNAME", "ops"),
        ("KUMA_PASSWORD", "hunter2"),
    ];

    #[test]
    fn test_all_variables_set() {
        let config = Config::from_lookup(lookup(FULL)).unwrap();

        assert_eq!(config.api_url, "https://kuma.internal:3001");
        assert_eq!(config.controller_tag, "ingress");
        assert_eq!(config.username, "ops");
        assert_eq!(config.password, "hunter2");
        assert!(!config.strict);
        assert!(!config.using_defaults);
    }

    #[test]
    fn test_missing_variable_in_strict_mode_fails() {
        let mut vars = FULL[..3].to_vec();
        vars.push(("PROD", "1"));

        let err = Config::from_lookup(lookup(&vars)).unwrap_err();

        assert_eq!(err, ConfigError::MissingVariables(vec!["KUMA_PASSWORD"]));
        assert!(err.to_string().contains("KUMA_PASSWORD"));
    }

    #[test]
    fn test_empty_variable_counts_as_missing() {
        let vars = [
            ("UPTIME_KUMA_API_URL", "https://kuma.internal:3001"),
            ("CONTROLLER_TAG", ""),
            ("KUMA_USERNAME", "ops"),
            ("KUMA_PASSWORD", "hunter2"),
            ("PROD", "true"),
        ];

        let err = Config::from_lookup(lookup(&vars)).unwrap_err();

        assert_eq!(err, ConfigError::MissingVariables(vec!["CONTROLLER_TAG"]));
    }

    #[test]
    fn test_missing_variables_outside_strict_mode_use_all_defaults() {
        let config = Config::from_lookup(lookup(&FULL[..1])).unwrap();

        assert!(config.using_defaults);
        assert_eq!(config.api_url, "http://localhost:3001");
        assert_eq!(config.controller_tag, "k8s-ingress");
        assert_eq!(config.username, "admin");
        assert_eq!(config.password, "admin");
    }

    #[test]
    fn test_empty_prod_is_not_strict() {
        let config = Config::from_lookup(lookup(&[("PROD", "")])).unwrap();

        assert!(!config.strict);
        assert!(config.using_defaults);
    }

    #[test]
    fn test_strict_mode_with_everything_set() {
        let mut vars = FULL.to_vec();
        vars.push(("PROD", "yes"));

        let config = Config::from_lookup(lookup(&vars)).unwrap();

        assert!(config.strict);
        assert!(!config.using_defaults);
    }

    #[test]
    fn test_invalid_url_in_strict_mode_is_rejected() {
        let mut vars = FULL.to_vec();
        vars[0] = ("UPTIME_KUMA_API_URL", "kuma.internal");
        vars.push(("PROD", "1"));

        let err = Config::from_lookup(lookup(&vars)).unwrap_err();

        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    #[test]
    fn test_non_http_scheme_in_strict_mode_is_rejected() {
        let mut vars = FULL.to_vec();
        vars[0] = ("UPTIME_KUMA_API_URL", "ftp://kuma.internal");
        vars.push(("PROD", "1"));

        let err = Config::from_lookup(lookup(&vars)).unwrap_err();

        assert!(err.to_string().contains("unsupported scheme 'ftp'"));
    }

    #[test]
    fn test_invalid_url_outside_strict_mode_uses_defaults() {
        let mut vars = FULL.to_vec();
        vars[0] = ("UPTIME_KUMA_API_URL", "kuma.internal");

        let config = Config::from_lookup(lookup(&vars)).unwrap();

        assert!(!config.strict);
        assert!(config.using_defaults);
        assert_eq!(config.api_url, "http://localhost:3001");
        assert_eq!(config.username, "admin");
    }

    #[test]
    fn test_non_http_scheme_outside_strict_mode_uses_defaults() {
        let mut vars = FULL.to_vec();
        vars[0] = ("UPTIME_KUMA_API_URL", "ftp://kuma.internal");

        let config = Config::from_lookup(lookup(&vars)).unwrap();

        assert!(config.using_defaults);
        assert_eq!(config.api_url, "http://localhost:3001");
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = Config::from_lookup(lookup(FULL)).unwrap();

        let rendered = format!("{config:?}");

        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}

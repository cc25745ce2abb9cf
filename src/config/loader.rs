//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::security::ApiKey;

/// Environment variables naming the default upstream, highest priority first.
pub const UPSTREAM_URL_VARS: [&str; 2] = ["LANGGRAPH_API_URL", "BACKEND_API_URL"];

/// Environment variables carrying the server-held credential, highest priority first.
pub const API_KEY_VARS: [&str; 2] = ["LANGSMITH_API_KEY", "BACKEND_API_KEY"];

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: optional TOML file, then environment overlay, then validation.
pub fn load_config(path: Option<&Path>) -> Result<ProxyConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ProxyConfig::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment-provided values onto `config`.
///
/// Empty variables count as unset, so `BACKEND_API_URL` still applies when
/// `LANGGRAPH_API_URL=""`.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let first_set = |names: &[&str]| {
        names
            .iter()
            .filter_map(|name| lookup(name))
            .find(|value| !value.trim().is_empty())
    };

    if let Some(url) = first_set(&UPSTREAM_URL_VARS) {
        config.upstream.default_url = url;
    }
    if let Some(key) = first_set(&API_KEY_VARS) {
        config.upstream.api_key = Some(ApiKey::new(key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn langgraph_url_wins_over_backend_url() {
        let mut config = ProxyConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("LANGGRAPH_API_URL", "http://graph:2024"),
                ("BACKEND_API_URL", "http://other:9000"),
            ]),
        );
        assert_eq!(config.upstream.default_url, "http://graph:2024");
    }

    #[test]
    fn empty_variable_falls_through() {
        let mut config = ProxyConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[("LANGGRAPH_API_URL", ""), ("BACKEND_API_URL", "http://other:9000")]),
        );
        assert_eq!(config.upstream.default_url, "http://other:9000");
    }

    #[test]
    fn no_environment_keeps_literal_default() {
        let mut config = ProxyConfig::default();
        apply_env_overrides(&mut config, env(&[]));
        assert_eq!(config.upstream.default_url, "http://localhost:2024");
        assert!(config.upstream.api_key.is_none());
    }

    #[test]
    fn langsmith_key_wins_over_backend_key() {
        let mut config = ProxyConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[("LANGSMITH_API_KEY", "ls-key"), ("BACKEND_API_KEY", "be-key")]),
        );
        assert_eq!(config.upstream.api_key.unwrap().expose(), "ls-key");
    }

    #[test]
    fn invalid_file_reports_validation_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[upstream]\nmount_path = \"api/\"").unwrap();

        let err = load_config(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if !errors.is_empty()));
    }
}

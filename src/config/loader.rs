//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `forwarded_headers.enabled`.
pub const ENABLED_ENV: &str = "FORWARDED_HEADERS_ENABLED";

/// Error type for configuration loading.
#[derive(Debug, Error)]
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

/// Interpret a raw switch value. Only `true` (any case) enables.
pub fn parse_switch(raw: Option<&str>) -> bool {
    raw.map(|value| value.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Load configuration from an optional TOML file, then apply the switch override.
///
/// Without a file the defaults are used.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let content = match path {
        Some(path) => fs::read_to_string(path)?,
        None => String::new(),
    };
    parse_config(&content, std::env::var(ENABLED_ENV).ok().as_deref())
}

fn parse_config(content: &str, switch: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut config: AppConfig = toml::from_str(content)?;
    apply_switch_override(&mut config, switch);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn apply_switch_override(config: &mut AppConfig, raw: Option<&str>) {
    if raw.is_some() {
        config.forwarded_headers.enabled = parse_switch(raw);
        tracing::debug!(
            env = ENABLED_ENV,
            enabled = config.forwarded_headers.enabled,
            "Forwarded header switch overridden from environment"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switch_accepts_only_true() {
        assert!(parse_switch(Some("true")));
        assert!(parse_switch(Some("TRUE")));
        assert!(parse_switch(Some(" True ")));

        assert!(!parse_switch(None));
        assert!(!parse_switch(Some("")));
        assert!(!parse_switch(Some("1")));
        assert!(!parse_switch(Some("yes")));
        assert!(!parse_switch(Some("false")));
    }

    #[test]
    fn env_override_wins_over_file() {
        let mut config = parse_config("[forwarded_headers]\nenabled = true\n", None).unwrap();

        apply_switch_override(&mut config, Some("nope"));
        assert!(!config.forwarded_headers.enabled);

        apply_switch_override(&mut config, Some("true"));
        assert!(config.forwarded_headers.enabled);

        apply_switch_override(&mut config, None);
        assert!(config.forwarded_headers.enabled);
    }

    #[test]
    fn invalid_values_are_reported() {
        let err = parse_config("[timeouts]\nrequest_secs = 0\n", None).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("request_secs"));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = parse_config("[forwarded_headers\nenabled = true", None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn empty_file_uses_defaults_and_switch() {
        let config = parse_config("", Some("TRUE")).unwrap();
        assert!(config.forwarded_headers.enabled);
        assert!(config.forwarded_headers.sync_request_headers);
        assert_eq!(config.timeouts.request_secs, 30);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_config(Some(Path::new("/nonexistent/forwarded-normalizer.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}

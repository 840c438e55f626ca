//! Anonymizer configuration.
//!
//! Defaults reproduce the plain behavior: replace-all substitution, no
//! size caps, `ip` labels. Overrides come from JSON or `IP_SCRUB_*`
//! environment variables.

use crate::safety::anonymize::ReplaceMode;
use serde::{Deserialize, Serialize};

pub const ENV_REPLACE_MODE: &str = "IP_SCRUB_REPLACE_MODE";
pub const ENV_MAX_BATCH: &str = "IP_SCRUB_MAX_BATCH";
pub const ENV_MAX_TEXT: &str = "IP_SCRUB_MAX_TEXT";
pub const ENV_LABEL_PREFIX: &str = "IP_SCRUB_LABEL_PREFIX";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnonymizerConfig {
    /// How a matched literal is substituted.
    pub replace_mode: ReplaceMode,

    /// Maximum number of strings accepted in one batch.
    pub max_batch_len: Option<usize>,

    /// Maximum total bytes across one batch.
    pub max_text_len: Option<usize>,

    /// Label text placed before the counter.
    pub label_prefix: String,
}

impl Default for AnonymizerConfig {
    fn default() -> Self {
        Self {
            replace_mode: ReplaceMode::AllOccurrences,
            max_batch_len: None,
            max_text_len: None,
            label_prefix: "ip".to_string(),
        }
    }
}

impl AnonymizerConfig {
    /// Parse from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        if !is_valid_prefix(&config.label_prefix) {
            return Err(invalid("label_prefix", &config.label_prefix));
        }
        Ok(config)
    }

    /// Load overrides from the process environment, reading `.env` first
    /// if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            log::debug!("[CONFIG] Loaded {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_REPLACE_MODE) {
            config.replace_mode = raw.parse().map_err(|_| invalid(ENV_REPLACE_MODE, &raw))?;
        }
        if let Some(raw) = lookup(ENV_MAX_BATCH) {
            config.max_batch_len = Some(parse_limit(ENV_MAX_BATCH, &raw)?);
        }
        if let Some(raw) = lookup(ENV_MAX_TEXT) {
            config.max_text_len = Some(parse_limit(ENV_MAX_TEXT, &raw)?);
        }
        if let Some(raw) = lookup(ENV_LABEL_PREFIX) {
            if !is_valid_prefix(&raw) {
                return Err(invalid(ENV_LABEL_PREFIX, &raw));
            }
            config.label_prefix = raw;
        }

        Ok(config)
    }
}

/// Labels must never look like part of an address, or a later
/// replace-all pass would rewrite them. Only `[A-Za-z_-]+` is accepted.
fn is_valid_prefix(prefix: &str) -> bool {
    !prefix.is_empty()
        && prefix
            .bytes()
            .all(|b| b.is_ascii_alphabetic() || b == b'_' || b == b'-')
}

fn parse_limit(key: &'static str, raw: &str) -> Result<usize, ConfigError> {
    raw.trim().parse().map_err(|_| invalid(key, raw))
}

fn invalid(key: &'static str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_is_replace_all_without_caps() {
        let config = AnonymizerConfig::default();
        assert_eq!(config.replace_mode, ReplaceMode::AllOccurrences);
        assert_eq!(config.max_batch_len, None);
        assert_eq!(config.max_text_len, None);
        assert_eq!(config.label_prefix, "ip");
    }

    #[test]
    fn json_fills_missing_fields() {
        let config = AnonymizerConfig::from_json(r#"{"replace_mode":"matched_span"}"#).unwrap();
        assert_eq!(config.replace_mode, ReplaceMode::MatchedSpan);
        assert_eq!(config.label_prefix, "ip");
    }

    #[test]
    fn json_with_caps() {
        let config =
            AnonymizerConfig::from_json(r#"{"max_batch_len":10,"max_text_len":4096}"#).unwrap();
        assert_eq!(config.max_batch_len, Some(10));
        assert_eq!(config.max_text_len, Some(4096));
    }

    #[test]
    fn bad_json_is_error() {
        let result = AnonymizerConfig::from_json(r#"{"replace_mode":"sometimes"}"#);
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn address_like_prefix_rejected() {
        for prefix in ["10.0.0.", "ip2", ".", "host name"] {
            let json = format!(r#"{{"label_prefix":"{}"}}"#, prefix);
            let result = AnonymizerConfig::from_json(&json);
            assert!(
                matches!(result, Err(ConfigError::InvalidValue { key: "label_prefix", .. })),
                "prefix should be rejected: '{}'",
                prefix
            );

            let result = AnonymizerConfig::from_lookup(lookup_from(&[(ENV_LABEL_PREFIX, prefix)]));
            assert!(
                matches!(result, Err(ConfigError::InvalidValue { key: ENV_LABEL_PREFIX, .. })),
                "prefix should be rejected: '{}'",
                prefix
            );
        }
    }

    #[test]
    fn word_prefixes_accepted() {
        for prefix in ["ip", "host_", "addr-", "IP"] {
            let config =
                AnonymizerConfig::from_lookup(lookup_from(&[(ENV_LABEL_PREFIX, prefix)])).unwrap();
            assert_eq!(config.label_prefix, prefix);
        }
    }

    #[test]
    fn lookup_overrides() {
        let config = AnonymizerConfig::from_lookup(lookup_from(&[
            (ENV_REPLACE_MODE, "matched_span"),
            (ENV_MAX_BATCH, "100"),
            (ENV_MAX_TEXT, " 65536 "),
            (ENV_LABEL_PREFIX, "host"),
        ]))
        .unwrap();
        assert_eq!(config.replace_mode, ReplaceMode::MatchedSpan);
        assert_eq!(config.max_batch_len, Some(100));
        assert_eq!(config.max_text_len, Some(65536));
        assert_eq!(config.label_prefix, "host");
    }

    #[test]
    fn empty_lookup_is_default() {
        let config = AnonymizerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, AnonymizerConfig::default());
    }

    #[test]
    fn lookup_rejects_garbage() {
        let result = AnonymizerConfig::from_lookup(lookup_from(&[(ENV_MAX_BATCH, "lots")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { key: ENV_MAX_BATCH, .. })
        ));

        let result = AnonymizerConfig::from_lookup(lookup_from(&[(ENV_REPLACE_MODE, "some")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        let result = AnonymizerConfig::from_lookup(lookup_from(&[(ENV_LABEL_PREFIX, "")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}

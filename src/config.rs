//! Configuration types.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Settings for the chat-completion oracle.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    /// Chat-completions base URL (without the `/chat/completions` suffix).
    pub base_url: String,
    /// Model identifier sent with every request.
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    /// Transport timeout. The interview core itself never times out a call.
    pub request_timeout: Duration,
    /// Maximum oracle requests per rolling minute window.
    pub requests_per_minute: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            temperature: 0.7,
            max_tokens: 500,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            request_timeout: Duration::from_secs(60),
            requests_per_minute: 60,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct GuideConfig {
    pub llm: LlmSettings,
    /// Credential supplied at startup, if any. Can also be entered later.
    pub api_key: Option<SecretString>,
    /// Directory conversation exports are written to.
    pub export_dir: PathBuf,
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            llm: LlmSettings::default(),
            api_key: None,
            export_dir: PathBuf::from("."),
        }
    }
}

impl GuideConfig {
    /// Build configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        config.api_key = lookup("OPENAI_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .map(SecretString::from);

        if let Some(model) = lookup("MI_GUIDE_MODEL") {
            config.llm.model = model;
        }
        if let Some(url) = lookup("MI_GUIDE_BASE_URL") {
            config.llm.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(dir) = lookup("MI_GUIDE_EXPORT_DIR") {
            config.export_dir = PathBuf::from(dir);
        }

        if let Some(t) = parse_var::<f32>(&lookup, "MI_GUIDE_TEMPERATURE")? {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::InvalidValue {
                    key: "MI_GUIDE_TEMPERATURE".to_string(),
                    message: format!("{t} is outside 0.0..=2.0"),
                });
            }
            config.llm.temperature = t;
        }
        if let Some(n) = parse_var::<u32>(&lookup, "MI_GUIDE_MAX_TOKENS")? {
            config.llm.max_tokens = n;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "MI_GUIDE_TIMEOUT_SECS")? {
            config.llm.request_timeout = Duration::from_secs(secs);
        }
        if let Some(n) = parse_var::<u32>(&lookup, "MI_GUIDE_RATE_LIMIT_PER_MIN")? {
            if n == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "MI_GUIDE_RATE_LIMIT_PER_MIN".to_string(),
                    message: "must be at least 1".to_string(),
                });
            }
            config.llm.requests_per_minute = n;
        }

        Ok(config)
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{raw:?}: {e}"),
            }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let config = GuideConfig::from_lookup(lookup_from(&[])).unwrap();
        assert!(config.api_key.is_none());
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.max_tokens, 500);
        assert_eq!(config.llm.requests_per_minute, 60);
    }

    #[test]
    fn reads_overrides() {
        let config = GuideConfig::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", " sk-test "),
            ("MI_GUIDE_MODEL", "gpt-4o-mini"),
            ("MI_GUIDE_BASE_URL", "http://localhost:9000/v1/"),
            ("MI_GUIDE_TEMPERATURE", "0.2"),
            ("MI_GUIDE_MAX_TOKENS", "256"),
            ("MI_GUIDE_EXPORT_DIR", "/tmp/exports"),
        ]))
        .unwrap();
        assert_eq!(config.api_key.unwrap().expose_secret(), "sk-test");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.base_url, "http://localhost:9000/v1");
        assert!((config.llm.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.llm.max_tokens, 256);
        assert_eq!(config.export_dir, PathBuf::from("/tmp/exports"));
    }

    #[test]
    fn blank_api_key_is_absent() {
        let config = GuideConfig::from_lookup(lookup_from(&[("OPENAI_API_KEY", "   ")])).unwrap();
        assert!(config.api_key.is_none());
    }

    #[test]
    fn rejects_unparseable_numbers() {
        let err = GuideConfig::from_lookup(lookup_from(&[("MI_GUIDE_MAX_TOKENS", "lots")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "MI_GUIDE_MAX_TOKENS"));
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(GuideConfig::from_lookup(lookup_from(&[("MI_GUIDE_TEMPERATURE", "3.5")])).is_err());
        assert!(
            GuideConfig::from_lookup(lookup_from(&[("MI_GUIDE_RATE_LIMIT_PER_MIN", "0")])).is_err()
        );
    }
}

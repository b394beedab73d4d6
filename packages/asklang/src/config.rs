//! Agent configuration.
//!
//! [`AgentConfig`] is passed explicitly to the orchestrator; nothing reads
//! process state behind its back. [`Settings::from_env`] is a convenience
//! for applications that keep keys in the environment or a `.env` file.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::grounding::{GroundingConfig, DEFAULT_FALLBACK_SOURCES};
use crate::security::SecretString;

/// Knobs for one orchestrator instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum search rounds per turn before giving up.
    pub max_rounds: usize,

    /// Sources shown when the model's citations don't verify.
    pub fallback_sources: usize,

    /// Results requested per search call.
    pub search_results: usize,

    /// Model used when the caller does not pick one.
    pub default_model: String,

    /// Sampling temperature passed to model backends that support it.
    pub temperature: Option<f32>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_rounds: 8,
            fallback_sources: DEFAULT_FALLBACK_SOURCES,
            search_results: 5,
            default_model: "gpt-4o-mini".to_string(),
            temperature: Some(0.0),
        }
    }
}

impl AgentConfig {
    /// Set the search round cap.
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Set the fallback source count.
    pub fn with_fallback_sources(mut self, n: usize) -> Self {
        self.fallback_sources = n;
        self
    }

    /// Set results per search call.
    pub fn with_search_results(mut self, n: usize) -> Self {
        self.search_results = n;
        self
    }

    /// Set the default model.
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn grounding(&self) -> GroundingConfig {
        GroundingConfig {
            fallback_sources: self.fallback_sources,
        }
    }
}

/// Credentials plus agent config, loaded from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub openai_api_key: SecretString,
    pub openai_base_url: Option<String>,
    pub tavily_api_key: SecretString,
    pub agent: AgentConfig,
}

impl Settings {
    /// Load from process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    ///
    /// Required: `OPENAI_API_KEY`, `TAVILY_API_KEY`. Optional: `OPENAI_MODEL`,
    /// `OPENAI_BASE_URL`, `ASKLANG_MAX_ROUNDS`, `ASKLANG_FALLBACK_SOURCES`,
    /// `ASKLANG_SEARCH_RESULTS`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &str| get(key).ok_or_else(|| ConfigError::Missing(key.to_string()));
        let parse_usize = |key: &str, default: usize| -> Result<usize, ConfigError> {
            match get(key) {
                Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                    var: key.to_string(),
                    value: raw,
                }),
                None => Ok(default),
            }
        };

        let defaults = AgentConfig::default();
        let agent = AgentConfig {
            max_rounds: parse_usize("ASKLANG_MAX_ROUNDS", defaults.max_rounds)?,
            fallback_sources: parse_usize("ASKLANG_FALLBACK_SOURCES", defaults.fallback_sources)?,
            search_results: parse_usize("ASKLANG_SEARCH_RESULTS", defaults.search_results)?,
            default_model: get("OPENAI_MODEL").unwrap_or(defaults.default_model),
            temperature: defaults.temperature,
        };

        Ok(Self {
            openai_api_key: SecretString::new(require("OPENAI_API_KEY")?),
            openai_base_url: get("OPENAI_BASE_URL"),
            tavily_api_key: SecretString::new(require("TAVILY_API_KEY")?),
            agent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_apply() {
        let settings =
            Settings::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-1"), ("TAVILY_API_KEY", "tv-1")]))
                .unwrap();

        assert_eq!(settings.agent, AgentConfig::default());
        assert_eq!(settings.openai_api_key.expose(), "sk-1");
        assert!(settings.openai_base_url.is_none());
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-1"),
            ("TAVILY_API_KEY", "tv-1"),
            ("OPENAI_MODEL", "gpt-4o"),
            ("ASKLANG_MAX_ROUNDS", "3"),
            ("ASKLANG_FALLBACK_SOURCES", " 5 "),
        ]))
        .unwrap();

        assert_eq!(settings.agent.default_model, "gpt-4o");
        assert_eq!(settings.agent.max_rounds, 3);
        assert_eq!(settings.agent.grounding().fallback_sources, 5);
    }

    #[test]
    fn test_blank_key_is_missing() {
        let err = Settings::from_lookup(lookup(&[("OPENAI_API_KEY", "  "), ("TAVILY_API_KEY", "tv")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::Missing("OPENAI_API_KEY".to_string()));
    }

    #[test]
    fn test_invalid_number() {
        let err = Settings::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk"),
            ("TAVILY_API_KEY", "tv"),
            ("ASKLANG_MAX_ROUNDS", "many"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "ASKLANG_MAX_ROUNDS"));
    }
}

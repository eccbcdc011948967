use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use ycs_index::{vector_name_for_model, IndexSettings};
use ycs_storage::HttpClientConfig;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {var}")]
    Missing { var: &'static str },
}

/// Process configuration, read once at startup and handed to each component by value.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub qdrant_url: String,
    pub qdrant_api_key: Option<String>,
    pub collection_name: String,
    pub vector_size: usize,
    pub distance_metric: String,
    pub vector_name: String,
    pub embedding_url: String,
    pub embedding_model: String,
    pub embedding_api_key: Option<String>,
    pub mistral_api_key: Option<String>,
    pub mistral_model: String,
    pub mistral_url: String,
    pub report_temperature: f32,
    pub google_api_key: Option<String>,
    pub google_search_engine_id: Option<String>,
    pub output_dir: PathBuf,
    pub snapshot_dir: Option<PathBuf>,
    pub user_agent: String,
    pub http_timeout_secs: u64,
    pub webdriver_url: Option<String>,
    pub company_delay: Duration,
    pub search_pacing: Duration,
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let embedding_model = or("EMBEDDING_MODEL", "mistral-embed");
        let mistral_api_key = get("MISTRAL_API_KEY");

        Self {
            qdrant_url: or("QDRANT_URL", "http://localhost:6333"),
            qdrant_api_key: get("QDRANT_API_KEY"),
            collection_name: or("COLLECTION_NAME", "yc_companies"),
            vector_size: get("VECTOR_SIZE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(1024),
            distance_metric: or("DISTANCE_METRIC", "Cosine"),
            vector_name: get("VECTOR_NAME")
                .unwrap_or_else(|| vector_name_for_model(&embedding_model)),
            embedding_url: or("EMBEDDING_URL", "https://api.mistral.ai/v1"),
            embedding_api_key: get("EMBEDDING_API_KEY").or_else(|| mistral_api_key.clone()),
            embedding_model,
            mistral_api_key,
            mistral_model: or("MISTRAL_MODEL", "mistral-large-latest"),
            mistral_url: or("MISTRAL_URL", ycs_report::completion::DEFAULT_MISTRAL_URL),
            report_temperature: get("REPORT_TEMPERATURE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(ycs_report::synth::DEFAULT_TEMPERATURE),
            google_api_key: get("GOOGLE_API_KEY"),
            google_search_engine_id: get("GOOGLE_SEARCH_ENGINE_ID"),
            output_dir: PathBuf::from(or("YCS_OUTPUT_DIR", "data/outputs")),
            snapshot_dir: get("YCS_SNAPSHOT_DIR").map(PathBuf::from),
            user_agent: or("YCS_USER_AGENT", "ycs-scout/0.1"),
            http_timeout_secs: get("YCS_HTTP_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            webdriver_url: get("YCS_WEBDRIVER_URL"),
            company_delay: Duration::from_secs(
                get("YCS_COMPANY_DELAY_SECS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(2),
            ),
            search_pacing: Duration::from_millis(
                get("YCS_SEARCH_PACING_MS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1000),
            ),
        }
    }

    pub fn require_mistral(&self) -> Result<&str, ConfigError> {
        self.mistral_api_key
            .as_deref()
            .ok_or(ConfigError::Missing {
                var: "MISTRAL_API_KEY",
            })
    }

    /// API key and search engine id.
    pub fn require_google(&self) -> Result<(&str, &str), ConfigError> {
        let key = self.google_api_key.as_deref().ok_or(ConfigError::Missing {
            var: "GOOGLE_API_KEY",
        })?;
        let cx = self
            .google_search_engine_id
            .as_deref()
            .ok_or(ConfigError::Missing {
                var: "GOOGLE_SEARCH_ENGINE_ID",
            })?;
        Ok((key, cx))
    }

    pub fn require_embedding(&self) -> Result<&str, ConfigError> {
        self.embedding_api_key
            .as_deref()
            .ok_or(ConfigError::Missing {
                var: "EMBEDDING_API_KEY",
            })
    }

    pub fn index_settings(&self) -> IndexSettings {
        IndexSettings {
            collection: self.collection_name.clone(),
            vector_name: self.vector_name.clone(),
            vector_size: self.vector_size,
            distance: self.distance_metric.clone(),
        }
    }

    pub fn http_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            timeout: Duration::from_secs(self.http_timeout_secs),
            user_agent: Some(self.user_agent.clone()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> PipelineConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PipelineConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config(&[]);
        assert_eq!(config.qdrant_url, "http://localhost:6333");
        assert_eq!(config.collection_name, "yc_companies");
        assert_eq!(config.vector_size, 1024);
        assert_eq!(config.vector_name, "fast-mistral-embed");
        assert_eq!(config.output_dir, PathBuf::from("data/outputs"));
        assert_eq!(config.company_delay, Duration::from_secs(2));
        assert_eq!(config.search_pacing, Duration::from_millis(1000));
        assert!(config.snapshot_dir.is_none());
    }

    #[test]
    fn missing_credentials_are_reported_by_name() {
        let config = config(&[("GOOGLE_API_KEY", "k"), ("MISTRAL_API_KEY", "   ")]);
        assert_eq!(
            config.require_mistral(),
            Err(ConfigError::Missing {
                var: "MISTRAL_API_KEY"
            })
        );
        assert_eq!(
            config.require_google(),
            Err(ConfigError::Missing {
                var: "GOOGLE_SEARCH_ENGINE_ID"
            })
        );
        assert!(config.require_embedding().is_err());
    }

    #[test]
    fn embedding_key_falls_back_to_mistral_key() {
        let config = config(&[("MISTRAL_API_KEY", "m-key")]);
        assert_eq!(config.require_embedding(), Ok("m-key"));

        let config = config_with_both();
        assert_eq!(config.require_embedding(), Ok("e-key"));
    }

    fn config_with_both() -> PipelineConfig {
        config(&[("MISTRAL_API_KEY", "m-key"), ("EMBEDDING_API_KEY", "e-key")])
    }

    #[test]
    fn vector_name_follows_model_unless_overridden() {
        let derived = config(&[("EMBEDDING_MODEL", "BAAI/bge-M3")]);
        assert_eq!(derived.vector_name, "fast-bge-m3");

        let explicit = config(&[("EMBEDDING_MODEL", "BAAI/bge-M3"), ("VECTOR_NAME", "dense")]);
        assert_eq!(explicit.vector_name, "dense");
        assert_eq!(explicit.index_settings().vector_name, "dense");
    }

    #[test]
    fn unparseable_numbers_fall_back_to_defaults() {
        let config = config(&[("VECTOR_SIZE", "big"), ("YCS_HTTP_TIMEOUT_SECS", "12")]);
        assert_eq!(config.vector_size, 1024);
        assert_eq!(config.http_config().timeout, Duration::from_secs(12));
    }
}

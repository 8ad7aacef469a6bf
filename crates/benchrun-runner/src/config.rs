//! Runner configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use benchrun_core::{CoreError, ModelFilter, ModelRegistry};
use benchrun_gateway::{GatewayError, OpenRouterClient, DEFAULT_BASE_URL};
use thiserror::Error;
use tracing::info;

use crate::pacing::Pacing;
use crate::submission::{DisabledSubmitter, SbCliSubmitter, Submitter};

/// Start-up failures. These abort before any model is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read model catalog '{path}': {source}")]
    Catalog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Registry(#[from] CoreError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("No models selected")]
    NoModels,
}

/// Runner configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// OpenRouter API key.
    pub openrouter_api_key: Option<String>,

    /// Completion endpoint base URL.
    pub base_url: String,

    /// HTTP request timeout (seconds).
    pub request_timeout_secs: u64,

    /// Local export of the benchmark dataset (JSONL or JSON array).
    pub dataset: PathBuf,

    /// Directory receiving batch artifacts and the master log.
    pub output_dir: PathBuf,

    /// Problems per model.
    pub problems_per_model: usize,

    /// Optional JSON model catalog replacing the built-in one.
    pub models_file: Option<PathBuf>,

    /// Registry selection.
    pub filter: ModelFilter,

    /// Submission program.
    pub sb_cli: String,

    /// Evaluation dataset and split.
    pub sb_dataset: String,
    pub sb_split: String,

    /// SWE-bench API key, passed to the submission program.
    pub swebench_api_key: Option<String>,

    /// Skip submission entirely.
    pub no_submit: bool,

    /// Zero all pacing delays.
    pub fast: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openrouter_api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 600,
            dataset: PathBuf::from("swe-bench-lite.jsonl"),
            output_dir: PathBuf::from("results"),
            problems_per_model: 50,
            models_file: None,
            filter: ModelFilter::default(),
            sb_cli: "sb-cli".to_string(),
            sb_dataset: "swe-bench_lite".to_string(),
            sb_split: "test".to_string(),
            swebench_api_key: None,
            no_submit: false,
            fast: false,
        }
    }
}

impl Config {
    pub fn pacing(&self) -> Pacing {
        if self.fast {
            Pacing::none()
        } else {
            Pacing::default()
        }
    }

    /// The full catalog, from `models_file` or the built-in list.
    pub fn catalog(&self) -> Result<ModelRegistry, ConfigError> {
        match &self.models_file {
            Some(path) => {
                let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Catalog {
                    path: path.clone(),
                    source,
                })?;
                let registry = ModelRegistry::from_json(&json)?;
                info!(path = %path.display(), models = registry.len(), "Loaded model catalog");
                Ok(registry)
            }
            None => Ok(ModelRegistry::builtin()),
        }
    }

    /// The catalog narrowed by `filter`. Fails if nothing is left.
    pub fn registry(&self) -> Result<ModelRegistry, ConfigError> {
        let registry = self.catalog()?.filter(&self.filter)?;
        if registry.is_empty() {
            return Err(ConfigError::NoModels);
        }
        Ok(registry)
    }

    /// OpenRouter client. Fails without an API key.
    pub fn gateway(&self) -> Result<OpenRouterClient, ConfigError> {
        let key = self
            .openrouter_api_key
            .as_deref()
            .ok_or(GatewayError::MissingApiKey)?;
        let client =
            OpenRouterClient::with_timeout(key, Duration::from_secs(self.request_timeout_secs))?
                .with_base_url(&self.base_url);
        Ok(client)
    }

    pub fn submitter(&self) -> Arc<dyn Submitter> {
        if self.no_submit {
            return Arc::new(DisabledSubmitter);
        }
        Arc::new(
            SbCliSubmitter::new()
                .with_program(self.sb_cli.as_str())
                .with_dataset(self.sb_dataset.as_str(), self.sb_split.as_str())
                .with_api_key(self.swebench_api_key.clone()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use benchrun_core::Tier;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.problems_per_model, 50);
        assert_eq!(config.request_timeout_secs, 600);
        assert_eq!(config.pacing(), Pacing::default());
        assert_eq!(config.registry().unwrap().len(), 8);
    }

    #[test]
    fn test_fast_disables_pacing() {
        let config = Config {
            fast: true,
            ..Config::default()
        };
        assert_eq!(config.pacing(), Pacing::none());
    }

    #[test]
    fn test_missing_api_key() {
        let err = Config::default().gateway().unwrap_err();
        assert!(matches!(err, ConfigError::Gateway(GatewayError::MissingApiKey)));
    }

    #[test]
    fn test_catalog_file_and_filter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models.json");
        std::fs::write(
            &path,
            r#"[
                {"key": "a", "id": "x/a", "name": "A", "provider": "X", "tier": "best"},
                {"key": "b", "id": "x/b", "name": "B", "provider": "X", "tier": "budget"}
            ]"#,
        )
        .unwrap();
        let config = Config {
            models_file: Some(path),
            filter: ModelFilter {
                tier: Some(Tier::Budget),
                ..ModelFilter::default()
            },
            ..Config::default()
        };

        let registry = config.registry().unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.get("b").is_some());
    }

    #[test]
    fn test_empty_selection_rejected() {
        let config = Config {
            filter: ModelFilter {
                provider: Some("Nobody".to_string()),
                ..ModelFilter::default()
            },
            ..Config::default()
        };
        assert!(matches!(config.registry(), Err(ConfigError::NoModels)));
    }
}

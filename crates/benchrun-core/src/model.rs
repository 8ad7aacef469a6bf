//! Model descriptors and the registry of benchmarked models.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{CoreError, ModelKey};

/// Pricing/capability tier of a model within its provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Provider's strongest model.
    Best,
    /// Cheaper or faster model.
    Budget,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Best => "best",
            Self::Budget => "budget",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "best" => Ok(Self::Best),
            "budget" => Ok(Self::Budget),
            other => Err(CoreError::InvalidInput(format!(
                "unknown tier '{}', expected 'best' or 'budget'",
                other
            ))),
        }
    }
}

fn default_available() -> bool {
    true
}

/// A model reachable through the completion gateway.
///
/// Descriptors are immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Unique short key (e.g. "claude_best").
    pub key: ModelKey,

    /// Identifier sent to the remote completion service (e.g. "openai/gpt-5").
    #[serde(rename = "id")]
    pub remote_id: String,

    /// Human-readable name, also used as `model_name_or_path` in predictions.
    pub name: String,

    /// Provider name (e.g. "Anthropic").
    pub provider: String,

    pub tier: Tier,

    /// Whether the model is expected to answer requests.
    #[serde(default = "default_available")]
    pub available: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_window: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ModelDescriptor {
    /// Create a new available descriptor with minimal required fields.
    pub fn new(
        key: impl Into<ModelKey>,
        remote_id: impl Into<String>,
        name: impl Into<String>,
        provider: impl Into<String>,
        tier: Tier,
    ) -> Self {
        Self {
            key: key.into(),
            remote_id: remote_id.into(),
            name: name.into(),
            provider: provider.into(),
            tier,
            available: true,
            context_window: None,
            notes: None,
        }
    }

    /// Builder method to set the context window description.
    pub fn with_context_window(mut self, window: impl Into<String>) -> Self {
        self.context_window = Some(window.into());
        self
    }

    /// Builder method to attach free-form notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Builder method to mark availability.
    pub fn with_available(mut self, available: bool) -> Self {
        self.available = available;
        self
    }
}

/// Selection criteria applied to a registry.
#[derive(Debug, Clone, Default)]
pub struct ModelFilter {
    /// Explicit keys to keep. Empty keeps every key.
    pub keys: Vec<ModelKey>,
    pub tier: Option<Tier>,
    /// Case-insensitive provider name.
    pub provider: Option<String>,
    /// Keep models marked unavailable.
    pub include_unavailable: bool,
}

/// Ordered, immutable collection of model descriptors.
///
/// Iteration order is catalog order, which is also the order in which a run
/// visits the models.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRegistry {
    models: Vec<ModelDescriptor>,
}

impl ModelRegistry {
    /// Build a registry, rejecting duplicate keys.
    pub fn new(models: Vec<ModelDescriptor>) -> Result<Self, CoreError> {
        for (i, model) in models.iter().enumerate() {
            if models[..i].iter().any(|m| m.key == model.key) {
                return Err(CoreError::DuplicateModel(model.key.to_string()));
            }
        }
        Ok(Self { models })
    }

    /// Parse a JSON catalog: an array of descriptor objects.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let models: Vec<ModelDescriptor> =
            serde_json::from_str(json).map_err(|e| CoreError::Serialization(e.to_string()))?;
        Self::new(models)
    }

    /// The built-in catalog: best and budget model for four providers.
    pub fn builtin() -> Self {
        let models = vec![
            ModelDescriptor::new("grok_best", "x-ai/grok-4", "Grok 4", "xAI", Tier::Best)
                .with_context_window("256K tokens")
                .with_notes("Reasoning model with tool calling and structured outputs"),
            ModelDescriptor::new(
                "grok_budget",
                "x-ai/grok-3-mini",
                "Grok 3 Mini",
                "xAI",
                Tier::Budget,
            )
            .with_context_window("128K tokens")
            .with_notes("Lightweight thinking model"),
            ModelDescriptor::new("openai_best", "openai/gpt-5", "GPT-5", "OpenAI", Tier::Best)
                .with_context_window("400K tokens"),
            ModelDescriptor::new(
                "openai_budget",
                "openai/gpt-5-mini",
                "GPT-5 Mini",
                "OpenAI",
                Tier::Budget,
            )
            .with_context_window("400K tokens"),
            ModelDescriptor::new(
                "claude_best",
                "anthropic/claude-sonnet-4.5",
                "Claude Sonnet 4.5",
                "Anthropic",
                Tier::Best,
            )
            .with_context_window("1M tokens"),
            ModelDescriptor::new(
                "claude_budget",
                "anthropic/claude-opus-4.1",
                "Claude Opus 4.1",
                "Anthropic",
                Tier::Budget,
            )
            .with_context_window("200K tokens"),
            ModelDescriptor::new(
                "google_best",
                "google/gemini-2.5-pro",
                "Gemini 2.5 Pro",
                "Google",
                Tier::Best,
            )
            .with_context_window("1M tokens"),
            ModelDescriptor::new(
                "google_budget",
                "google/gemini-2.5-flash",
                "Gemini 2.5 Flash",
                "Google",
                Tier::Budget,
            )
            .with_context_window("1M tokens"),
        ];
        Self { models }
    }

    /// Look up a model by key.
    pub fn get(&self, key: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|m| m.key.as_str() == key)
    }

    /// Look up a model by key, failing with `ModelNotFound`.
    pub fn require(&self, key: &str) -> Result<&ModelDescriptor, CoreError> {
        self.get(key)
            .ok_or_else(|| CoreError::ModelNotFound(key.to_string()))
    }

    /// Models marked available, in catalog order.
    pub fn available(&self) -> impl Iterator<Item = &ModelDescriptor> {
        self.models.iter().filter(|m| m.available)
    }

    pub fn by_tier(&self, tier: Tier) -> impl Iterator<Item = &ModelDescriptor> {
        self.models.iter().filter(move |m| m.tier == tier)
    }

    pub fn by_provider<'a>(
        &'a self,
        provider: &'a str,
    ) -> impl Iterator<Item = &'a ModelDescriptor> + 'a {
        self.models
            .iter()
            .filter(move |m| m.provider.eq_ignore_ascii_case(provider))
    }

    /// Distinct provider names in first-seen order.
    pub fn providers(&self) -> Vec<&str> {
        let mut providers: Vec<&str> = Vec::new();
        for model in &self.models {
            if !providers.contains(&model.provider.as_str()) {
                providers.push(&model.provider);
            }
        }
        providers
    }

    /// Derive a new registry containing only the models matching `filter`.
    ///
    /// Catalog order is preserved regardless of the order of `filter.keys`.
    pub fn filter(&self, filter: &ModelFilter) -> Result<Self, CoreError> {
        for key in &filter.keys {
            self.require(key.as_str())?;
        }

        let models = self
            .models
            .iter()
            .filter(|m| filter.keys.is_empty() || filter.keys.contains(&m.key))
            .filter(|m| filter.tier.map_or(true, |t| m.tier == t))
            .filter(|m| {
                filter
                    .provider
                    .as_deref()
                    .map_or(true, |p| m.provider.eq_ignore_ascii_case(p))
            })
            .filter(|m| filter.include_unavailable || m.available)
            .cloned()
            .collect();

        Ok(Self { models })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelDescriptor> {
        self.models.iter()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl<'a> IntoIterator for &'a ModelRegistry {
    type Item = &'a ModelDescriptor;
    type IntoIter = std::slice::Iter<'a, ModelDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.models.iter()
    }
}

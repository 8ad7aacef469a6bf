//! Connectivity probe: one short request per model.

use std::sync::Arc;
use std::time::Duration;

use benchrun_core::{ModelDescriptor, ModelKey, ModelRegistry, Tier};
use benchrun_gateway::{CompletionGateway, CompletionRequest, GenerationParams};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::json_output;
use crate::prompt::{PROBE_PROMPT, QUICK_PROBE_PROMPT};

/// Delay between two probe calls.
pub const PROBE_DELAY: Duration = Duration::from_millis(500);

/// Which models get probed, and with what prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeMode {
    /// Every selected model, arithmetic word problem.
    #[default]
    Full,
    /// Budget tier only, one-word answer.
    Quick,
}

impl ProbeMode {
    pub fn prompt(&self) -> &'static str {
        match self {
            ProbeMode::Full => PROBE_PROMPT,
            ProbeMode::Quick => QUICK_PROBE_PROMPT,
        }
    }

    /// Models from `registry` this mode probes, in catalog order.
    pub fn select<'a>(&self, registry: &'a ModelRegistry) -> Vec<&'a ModelDescriptor> {
        match self {
            ProbeMode::Full => registry.iter().collect(),
            ProbeMode::Quick => registry.by_tier(Tier::Budget).collect(),
        }
    }
}

/// Result of probing one model.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub model_key: ModelKey,
    pub success: bool,
    pub elapsed: Duration,
    pub tokens: Option<u64>,
    /// First line of the reply on success.
    pub preview: Option<String>,
    pub error: Option<String>,
}

/// Sends the probe prompt to a list of models, one at a time.
pub struct Prober {
    gateway: Arc<dyn CompletionGateway>,
    delay: Duration,
}

impl Prober {
    pub fn new(gateway: Arc<dyn CompletionGateway>) -> Self {
        Self {
            gateway,
            delay: PROBE_DELAY,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Probe `models` in order. Failures are reported, never returned.
    pub async fn probe(&self, models: &[&ModelDescriptor], mode: ProbeMode) -> Vec<ProbeOutcome> {
        let mut outcomes = Vec::with_capacity(models.len());

        for (i, model) in models.iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            outcomes.push(self.probe_one(model, mode).await);
        }

        outcomes
    }

    async fn probe_one(&self, model: &ModelDescriptor, mode: ProbeMode) -> ProbeOutcome {
        let request = CompletionRequest::new(
            model.remote_id.as_str(),
            mode.prompt(),
            GenerationParams::PROBE,
        );

        let start = Instant::now();
        let result = self.gateway.complete(&request).await;
        let elapsed = start.elapsed();

        let outcome = match result {
            Ok(completion) => {
                info!(
                    model = %model.key,
                    elapsed_ms = elapsed.as_millis() as u64,
                    tokens = completion.token_count,
                    "Probe succeeded"
                );
                ProbeOutcome {
                    model_key: model.key.clone(),
                    success: true,
                    elapsed,
                    tokens: Some(completion.token_count),
                    preview: completion.text.lines().next().map(|l| l.trim().to_string()),
                    error: None,
                }
            }
            Err(e) => {
                warn!(model = %model.key, kind = %e.kind(), error = %e, "Probe failed");
                ProbeOutcome {
                    model_key: model.key.clone(),
                    success: false,
                    elapsed,
                    tokens: None,
                    preview: None,
                    error: Some(e.to_string()),
                }
            }
        };

        json_output::emit_probe_result(
            outcome.model_key.as_str(),
            outcome.success,
            outcome.elapsed.as_millis() as u64,
            outcome.tokens,
            outcome.error.as_deref(),
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::tests::{model, ScriptedGateway};

    #[tokio::test]
    async fn test_probe_reports_each_model() {
        let gateway = Arc::new(ScriptedGateway::new("x = 4\nbecause 2x = 8", &[2]));
        let prober = Prober::new(gateway.clone()).with_delay(Duration::ZERO);
        let a = model("a");
        let b = model("b");
        let c = model("c");

        let outcomes = prober.probe(&[&a, &b, &c], ProbeMode::Full).await;

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].success);
        assert_eq!(outcomes[0].tokens, Some(42));
        assert_eq!(outcomes[0].preview.as_deref(), Some("x = 4"));
        assert!(!outcomes[1].success);
        assert_eq!(outcomes[1].error.as_deref(), Some("Request timed out"));
        assert!(outcomes[2].success);

        let calls = gateway.calls.lock().unwrap();
        assert_eq!(calls[0].params, GenerationParams::PROBE);
        assert_eq!(calls[0].prompt, PROBE_PROMPT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_between_calls() {
        let gateway = Arc::new(ScriptedGateway::new("8", &[]));
        let prober = Prober::new(gateway);
        let a = model("a");
        let b = model("b");
        let c = model("c");

        let start = Instant::now();
        prober.probe(&[&a, &b, &c], ProbeMode::Quick).await;

        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[test]
    fn test_quick_mode_selects_budget_tier() {
        let registry = ModelRegistry::builtin();

        let quick = ProbeMode::Quick.select(&registry);

        assert_eq!(quick.len(), 4);
        assert!(quick.iter().all(|m| m.tier == Tier::Budget));
        assert_eq!(ProbeMode::Full.select(&registry).len(), registry.len());
        assert_eq!(ProbeMode::Quick.prompt(), QUICK_PROBE_PROMPT);
    }
}

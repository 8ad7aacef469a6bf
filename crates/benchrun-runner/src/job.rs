//! Job runner: one model against a prefix of the problem sequence.
//!
//! Every problem gets exactly one gateway call. A failed call becomes an
//! `ErrorRecord` and the runner moves on; nothing escapes `run`.

use std::sync::Arc;

use benchrun_core::{ErrorRecord, ModelDescriptor, PredictionRecord, ProblemRecord};
use benchrun_gateway::{CompletionGateway, CompletionRequest, GatewayError, GenerationParams};
use tracing::{info, warn};

use crate::extractor::extract_patch;
use crate::json_output;
use crate::pacing::{Pacing, Pause};
use crate::prompt::render_repair_prompt;

/// Predictions and errors produced by one job runner invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    /// Successful predictions, in problem order.
    pub predictions: Vec<PredictionRecord>,
    /// Failed attempts, in problem order.
    pub errors: Vec<ErrorRecord>,
}

impl BatchOutcome {
    pub fn prediction_count(&self) -> usize {
        self.predictions.len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Number of problems attempted.
    pub fn attempted(&self) -> usize {
        self.predictions.len() + self.errors.len()
    }
}

/// Runs one model over a batch of problems, strictly sequentially.
#[derive(Clone)]
pub struct JobRunner {
    gateway: Arc<dyn CompletionGateway>,
    pacing: Pacing,
    params: GenerationParams,
}

impl JobRunner {
    /// Create a runner with the benchmark generation budget.
    pub fn new(gateway: Arc<dyn CompletionGateway>, pacing: Pacing) -> Self {
        Self {
            gateway,
            pacing,
            params: GenerationParams::BENCHMARK,
        }
    }

    /// Builder method to override the generation budget.
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Run `model` over the first `max_problems` of `problems`.
    ///
    /// Post-condition: `outcome.attempted() == min(max_problems, problems.len())`.
    pub async fn run(
        &self,
        model: &ModelDescriptor,
        problems: &[ProblemRecord],
        max_problems: usize,
    ) -> BatchOutcome {
        let batch = &problems[..max_problems.min(problems.len())];
        let total = batch.len();
        let mut outcome = BatchOutcome::default();

        info!(
            model = %model.key,
            remote_id = %model.remote_id,
            problems = total,
            "Generating predictions"
        );

        for (i, problem) in batch.iter().enumerate() {
            let progress = format!("{}/{}", i + 1, total);

            match self.attempt(model, problem).await {
                Ok((prediction, tokens)) => {
                    info!(
                        progress = %progress,
                        instance_id = %problem.instance_id,
                        tokens,
                        patch_len = prediction.patch.len(),
                        "Prediction generated"
                    );
                    json_output::emit_prediction(
                        model.key.as_str(),
                        problem.instance_id.as_str(),
                        tokens,
                        prediction.patch.len(),
                    );
                    outcome.predictions.push(prediction);
                    self.pacing.wait(Pause::AfterSuccess).await;
                }
                Err(e) => {
                    let message = e.to_string();
                    warn!(
                        progress = %progress,
                        instance_id = %problem.instance_id,
                        kind = %e.kind(),
                        error = %message,
                        "Completion failed"
                    );
                    json_output::emit_problem_failed(
                        model.key.as_str(),
                        problem.instance_id.as_str(),
                        e.kind().as_str(),
                        &message,
                    );
                    outcome
                        .errors
                        .push(ErrorRecord::new(problem.instance_id.clone(), message));
                    self.pacing.wait(Pause::AfterFailure).await;
                }
            }
        }

        info!(
            model = %model.key,
            predictions = outcome.prediction_count(),
            errors = outcome.error_count(),
            "Batch complete"
        );

        outcome
    }

    /// One gateway call for one problem, returning the prediction and token usage.
    async fn attempt(
        &self,
        model: &ModelDescriptor,
        problem: &ProblemRecord,
    ) -> Result<(PredictionRecord, u64), GatewayError> {
        let request = CompletionRequest::new(
            model.remote_id.as_str(),
            render_repair_prompt(problem),
            self.params,
        );
        let completion = self.gateway.complete(&request).await?;
        let patch = extract_patch(&completion.text);

        Ok((
            PredictionRecord::new(problem.instance_id.clone(), model.name.as_str(), patch),
            completion.token_count,
        ))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use benchrun_core::Tier;
    use benchrun_gateway::CompletionResult;

    /// Gateway that fails on selected 1-based call positions and records prompts.
    pub(crate) struct ScriptedGateway {
        fail_on: HashSet<usize>,
        reply: String,
        pub(crate) calls: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedGateway {
        pub(crate) fn new(reply: &str, fail_on: &[usize]) -> Self {
            Self {
                fail_on: fail_on.iter().copied().collect(),
                reply: reply.to_string(),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CompletionGateway for ScriptedGateway {
        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<CompletionResult, GatewayError> {
            let position = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(request.clone());
                calls.len()
            };
            if self.fail_on.contains(&position) {
                return Err(GatewayError::Timeout);
            }
            Ok(CompletionResult {
                text: self.reply.clone(),
                token_count: 42,
            })
        }
    }

    pub(crate) fn problems(n: usize) -> Vec<ProblemRecord> {
        (1..=n)
            .map(|i| ProblemRecord::new(format!("repo__p-{}", i), "owner/repo", format!("bug {}", i)))
            .collect()
    }

    pub(crate) fn model(key: &str) -> ModelDescriptor {
        ModelDescriptor::new(key, format!("vendor/{}", key), format!("Model {}", key), "Vendor", Tier::Best)
    }

    const REPLY: &str = "Fix:\n```diff\n--- a/f\n+++ b/f\n@@ -1 +1 @@\n-a\n+b\n```\nDone.";

    #[tokio::test]
    async fn test_all_calls_succeed() {
        let gateway = Arc::new(ScriptedGateway::new(REPLY, &[]));
        let runner = JobRunner::new(gateway.clone(), Pacing::none());

        let outcome = runner.run(&model("m"), &problems(6), 6).await;

        assert_eq!(outcome.prediction_count(), 6);
        assert_eq!(outcome.error_count(), 0);
        assert_eq!(gateway.call_count(), 6);
        for prediction in &outcome.predictions {
            assert_eq!(prediction.model_name, "Model m");
            assert_eq!(prediction.patch, "--- a/f\n+++ b/f\n@@ -1 +1 @@\n-a\n+b\n");
        }
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let gateway = Arc::new(ScriptedGateway::new(REPLY, &[2, 5]));
        let runner = JobRunner::new(gateway.clone(), Pacing::none());

        let outcome = runner.run(&model("m"), &problems(8), 8).await;

        assert_eq!(outcome.prediction_count(), 6);
        assert_eq!(outcome.error_count(), 2);
        assert_eq!(gateway.call_count(), 8);

        let failed: Vec<&str> = outcome.errors.iter().map(|e| e.instance_id.as_str()).collect();
        assert_eq!(failed, vec!["repo__p-2", "repo__p-5"]);
        assert_eq!(outcome.errors[0].error_message, "Request timed out");

        let succeeded: Vec<&str> = outcome
            .predictions
            .iter()
            .map(|p| p.instance_id.as_str())
            .collect();
        assert_eq!(
            succeeded,
            vec!["repo__p-1", "repo__p-3", "repo__p-4", "repo__p-6", "repo__p-7", "repo__p-8"]
        );
    }

    #[tokio::test]
    async fn test_batch_bounded_by_max_problems_and_len() {
        let gateway = Arc::new(ScriptedGateway::new(REPLY, &[]));
        let runner = JobRunner::new(gateway.clone(), Pacing::none());

        assert_eq!(runner.run(&model("m"), &problems(10), 3).await.attempted(), 3);
        assert_eq!(runner.run(&model("m"), &problems(2), 50).await.attempted(), 2);
        assert_eq!(runner.run(&model("m"), &[], 5).await.attempted(), 0);
    }

    #[tokio::test]
    async fn test_request_carries_model_and_budget() {
        let gateway = Arc::new(ScriptedGateway::new(REPLY, &[]));
        let runner = JobRunner::new(gateway.clone(), Pacing::none());

        runner.run(&model("claude_best"), &problems(1), 1).await;

        let calls = gateway.calls.lock().unwrap();
        assert_eq!(calls[0].model_id, "vendor/claude_best");
        assert_eq!(calls[0].params, GenerationParams::BENCHMARK);
        assert!(calls[0].prompt.contains("Repository: owner/repo"));
        assert!(calls[0].prompt.contains("Problem: bug 1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacing_after_success_and_failure() {
        let gateway = Arc::new(ScriptedGateway::new(REPLY, &[2]));
        let runner = JobRunner::new(gateway, Pacing::default());

        let start = tokio::time::Instant::now();
        runner.run(&model("m"), &problems(3), 3).await;

        // two successes at 500ms plus one failure at 2s
        assert!(start.elapsed() >= Duration::from_secs(3));
    }
}

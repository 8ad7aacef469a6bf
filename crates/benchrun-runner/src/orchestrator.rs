//! Run orchestrator: every registry model against the same problem prefix.
//!
//! Each model moves through `PENDING -> GENERATING -> SUBMITTING ->
//! SUBMITTED | SUBMIT_FAILED`. Any error or panic along the way lands the
//! model in `CRITICAL_ERROR` and the run continues with the next model.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;

use benchrun_core::{
    CoreError, MasterRunLog, ModelDescriptor, ModelRegistry, ProblemRecord, RunId, RunReport,
};
use chrono::Utc;
use futures_util::FutureExt;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::job::{BatchOutcome, JobRunner};
use crate::json_output;
use crate::pacing::{Pacing, Pause};
use crate::store::{BatchArtifacts, ResultStore, StoreError};
use crate::submission::{SubmissionError, Submitter};

/// Failures that abort a single model.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Result store error: {0}")]
    Store(#[from] StoreError),

    #[error("Submission error: {0}")]
    Submission(#[from] SubmissionError),

    #[error("State error: {0}")]
    State(#[from] CoreError),

    #[error("Panicked: {0}")]
    Panic(String),
}

/// Result of a full orchestration pass.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub log: MasterRunLog,
    pub master_log_path: PathBuf,
}

impl RunSummary {
    /// Models whose batch was accepted.
    pub fn submitted(&self) -> usize {
        self.log.submitted_count()
    }

    /// Models that were not accepted, for any reason.
    pub fn failed(&self) -> usize {
        self.log.failed_count()
    }
}

/// Drives job runner, result store and submitter across a model registry.
pub struct Orchestrator {
    registry: ModelRegistry,
    runner: JobRunner,
    store: ResultStore,
    submitter: Arc<dyn Submitter>,
    pacing: Pacing,
    problems_per_model: usize,
}

impl Orchestrator {
    pub fn new(
        registry: ModelRegistry,
        runner: JobRunner,
        store: ResultStore,
        submitter: Arc<dyn Submitter>,
        pacing: Pacing,
        problems_per_model: usize,
    ) -> Self {
        Self {
            registry,
            runner,
            store,
            submitter,
            pacing,
            problems_per_model,
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Run every model in registry order and persist the master log once.
    ///
    /// Per-model failures are recorded in the log, never returned. Only a
    /// failure to write the master log itself is an error.
    pub async fn run(&self, problems: &[ProblemRecord]) -> Result<RunSummary, StoreError> {
        let total = self.registry.len();
        let mut log = MasterRunLog::new(Utc::now(), total, self.problems_per_model);

        info!(
            models = total,
            problems_per_model = self.problems_per_model,
            total_predictions = total * self.problems_per_model,
            "Starting benchmark run"
        );
        json_output::emit_run_started(total, self.problems_per_model);

        for (i, model) in self.registry.iter().enumerate() {
            let position = i + 1;
            info!(
                position = %format!("{}/{}", position, total),
                model = %model.key,
                name = %model.name,
                "Processing model"
            );
            json_output::emit_model_started(model.key.as_str(), &model.remote_id, position, total);

            let report = self.run_model(model, problems).await;
            let critical = report.error.is_some();
            log.push(report);

            if position < total {
                let pause = if critical {
                    Pause::AfterCritical
                } else {
                    Pause::AfterModel
                };
                info!(
                    delay_secs = self.pacing.delay(pause).as_secs(),
                    "Cooling down before next model"
                );
                self.pacing.wait(pause).await;
            }
        }

        let master_log_path = self.store.write_master_log(&log)?;
        let summary = RunSummary {
            log,
            master_log_path,
        };

        info!(
            submitted = summary.submitted(),
            failed = summary.failed(),
            total,
            master_log = %summary.master_log_path.display(),
            "Benchmark run complete"
        );
        json_output::emit_run_completed(
            summary.submitted(),
            summary.failed(),
            &summary.master_log_path,
        );

        Ok(summary)
    }

    /// Process one model, converting any failure into a `CRITICAL_ERROR` report.
    pub async fn run_model(&self, model: &ModelDescriptor, problems: &[ProblemRecord]) -> RunReport {
        let mut report = RunReport::new(model);

        let result = AssertUnwindSafe(self.process_model(model, problems, &mut report))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(OrchestratorError::Panic(panic_message(payload))));

        match result {
            Ok(()) => {
                info!(
                    model = %model.key,
                    state = %report.state,
                    predictions = report.num_predictions,
                    errors = report.num_errors,
                    "Model complete"
                );
            }
            Err(e) => {
                let detail = e.to_string();
                error!(model = %model.key, state = %report.state, error = %detail, "Critical error");
                json_output::emit_model_failed(model.key.as_str(), &detail);
                report.fail(detail);
            }
        }

        report
    }

    async fn process_model(
        &self,
        model: &ModelDescriptor,
        problems: &[ProblemRecord],
        report: &mut RunReport,
    ) -> Result<(), OrchestratorError> {
        report.start()?;
        let outcome = self
            .runner
            .run(model, problems, self.problems_per_model)
            .await;

        let artifacts = self
            .store
            .write_batch(&model.key, self.problems_per_model, &outcome)?;
        json_output::emit_batch_saved(
            model.key.as_str(),
            &artifacts.predictions_file,
            artifacts.errors_file.as_deref(),
            outcome.prediction_count(),
            outcome.error_count(),
        );
        report.batch_saved(
            artifacts.predictions_file.clone(),
            outcome.prediction_count(),
            outcome.error_count(),
        )?;

        let run_id = RunId::baseline(&model.key, self.problems_per_model);
        let accepted = self
            .submitter
            .submit(&artifacts.predictions_file, &model.key, &run_id)
            .await?;
        if !accepted {
            warn!(model = %model.key, run_id = %run_id, "Batch not accepted for evaluation");
        }
        json_output::emit_submitted(model.key.as_str(), run_id.as_str(), accepted);
        report.submission_finished(run_id, accepted)?;

        Ok(())
    }
}

/// Single-model baseline: generate and save one batch, no submission.
pub async fn generate_baseline(
    runner: &JobRunner,
    store: &ResultStore,
    model: &ModelDescriptor,
    problems: &[ProblemRecord],
    problems_per_model: usize,
) -> Result<(BatchOutcome, BatchArtifacts), StoreError> {
    let outcome = runner.run(model, problems, problems_per_model).await;
    let artifacts = store.write_batch(&model.key, problems_per_model, &outcome)?;
    json_output::emit_batch_saved(
        model.key.as_str(),
        &artifacts.predictions_file,
        artifacts.errors_file.as_deref(),
        outcome.prediction_count(),
        outcome.error_count(),
    );
    Ok((outcome, artifacts))
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use benchrun_core::{ModelKey, ModelRunState};
    use benchrun_gateway::{CompletionGateway, CompletionRequest, CompletionResult, GatewayError};

    use crate::job::tests::{model, problems, ScriptedGateway};
    use crate::store::read_predictions;
    use crate::submission::DisabledSubmitter;

    const REPLY: &str = "```diff\n--- a/f\n+++ b/f\n```";

    /// Submitter that rejects or errors for chosen models and records every call.
    #[derive(Default)]
    struct RecordingSubmitter {
        reject: Vec<&'static str>,
        error: Vec<&'static str>,
        calls: Mutex<Vec<(ModelKey, RunId)>>,
    }

    #[async_trait]
    impl Submitter for RecordingSubmitter {
        async fn submit(
            &self,
            _predictions_file: &Path,
            model_key: &ModelKey,
            run_id: &RunId,
        ) -> Result<bool, SubmissionError> {
            self.calls
                .lock()
                .unwrap()
                .push((model_key.clone(), run_id.clone()));
            if self.error.iter().any(|k| *k == model_key.as_str()) {
                return Err(SubmissionError::Spawn {
                    program: "sb-cli".to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
                });
            }
            Ok(!self.reject.iter().any(|k| *k == model_key.as_str()))
        }
    }

    /// Gateway that panics for one remote model id.
    struct PanickingGateway {
        poison: &'static str,
    }

    #[async_trait]
    impl CompletionGateway for PanickingGateway {
        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<CompletionResult, GatewayError> {
            if request.model_id == self.poison {
                panic!("gateway exploded");
            }
            Ok(CompletionResult {
                text: REPLY.to_string(),
                token_count: 1,
            })
        }
    }

    fn registry(keys: &[&str]) -> ModelRegistry {
        ModelRegistry::new(keys.iter().map(|k| model(k)).collect()).unwrap()
    }

    fn orchestrator(
        keys: &[&str],
        gateway: Arc<dyn CompletionGateway>,
        submitter: Arc<dyn Submitter>,
        out: &Path,
        problems_per_model: usize,
    ) -> Orchestrator {
        Orchestrator::new(
            registry(keys),
            JobRunner::new(gateway, Pacing::none()),
            ResultStore::new(out),
            submitter,
            Pacing::none(),
            problems_per_model,
        )
    }

    #[tokio::test]
    async fn test_all_models_submitted() {
        let dir = tempfile::tempdir().unwrap();
        let submitter = Arc::new(RecordingSubmitter::default());
        let orch = orchestrator(
            &["a", "b"],
            Arc::new(ScriptedGateway::new(REPLY, &[])),
            submitter.clone(),
            dir.path(),
            3,
        );

        let summary = orch.run(&problems(5)).await.unwrap();

        assert_eq!(summary.submitted(), 2);
        assert_eq!(summary.failed(), 0);
        let keys: Vec<&str> = summary.log.results.iter().map(|r| r.model_key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        for report in &summary.log.results {
            assert_eq!(report.state, ModelRunState::Submitted);
            assert_eq!(report.num_predictions, 3);
            let file = report.predictions_file.as_ref().unwrap();
            assert_eq!(read_predictions(file).unwrap().len(), 3);
        }
        let calls = submitter.calls.lock().unwrap();
        assert_eq!(calls[0].1.as_str(), "baseline_a_3problems");
        assert!(summary.master_log_path.exists());
    }

    #[tokio::test]
    async fn test_submission_failure_does_not_block_next_model() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(ScriptedGateway::new(REPLY, &[]));
        let submitter = Arc::new(RecordingSubmitter {
            reject: vec!["a"],
            ..Default::default()
        });
        let orch = orchestrator(&["a", "b"], gateway.clone(), submitter, dir.path(), 2);

        let summary = orch.run(&problems(2)).await.unwrap();

        // model b still generated its whole batch
        assert_eq!(gateway.call_count(), 4);
        let a = &summary.log.results[0];
        let b = &summary.log.results[1];
        assert_eq!(a.state, ModelRunState::SubmitFailed);
        assert!(a.run_id.is_none());
        assert_eq!(b.state, ModelRunState::Submitted);
        assert_eq!(summary.submitted(), 1);
        assert_eq!(summary.failed(), 1);
    }

    #[tokio::test]
    async fn test_submission_error_is_critical_but_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let submitter = Arc::new(RecordingSubmitter {
            error: vec!["a"],
            ..Default::default()
        });
        let orch = orchestrator(
            &["a", "b"],
            Arc::new(ScriptedGateway::new(REPLY, &[])),
            submitter,
            dir.path(),
            1,
        );

        let summary = orch.run(&problems(1)).await.unwrap();

        let a = &summary.log.results[0];
        assert_eq!(a.state, ModelRunState::CriticalError);
        assert!(a.error.as_deref().unwrap().contains("Failed to run 'sb-cli'"));
        assert_eq!(summary.log.results[1].state, ModelRunState::Submitted);
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(
            &["a", "b"],
            Arc::new(PanickingGateway { poison: "vendor/a" }),
            Arc::new(RecordingSubmitter::default()),
            dir.path(),
            2,
        );

        let summary = orch.run(&problems(2)).await.unwrap();

        let a = &summary.log.results[0];
        assert_eq!(a.state, ModelRunState::CriticalError);
        assert_eq!(a.error.as_deref(), Some("Panicked: gateway exploded"));
        assert_eq!(summary.log.results[1].state, ModelRunState::Submitted);
    }

    #[tokio::test]
    async fn test_store_failure_is_critical() {
        let dir = tempfile::tempdir().unwrap();
        // a regular file where the output directory should be
        let blocked = dir.path().join("out");
        std::fs::write(&blocked, "").unwrap();
        let orch = orchestrator(
            &["a"],
            Arc::new(ScriptedGateway::new(REPLY, &[])),
            Arc::new(DisabledSubmitter),
            &blocked,
            1,
        );

        let report = orch.run_model(&model("a"), &problems(1)).await;

        assert_eq!(report.state, ModelRunState::CriticalError);
        assert!(report.error.as_deref().unwrap().starts_with("Result store error"));
    }

    #[tokio::test]
    async fn test_master_log_contents() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(
            &["a", "b", "c"],
            Arc::new(ScriptedGateway::new(REPLY, &[])),
            Arc::new(DisabledSubmitter),
            dir.path(),
            4,
        );

        let summary = orch.run(&problems(4)).await.unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&summary.master_log_path).unwrap())
                .unwrap();
        assert_eq!(value["total_models"], 3);
        assert_eq!(value["problems_per_model"], 4);
        assert_eq!(value["results"].as_array().unwrap().len(), 3);
        assert_eq!(value["results"][0]["state"], "SUBMIT_FAILED");
        assert_eq!(summary.failed(), 3);
    }

    #[tokio::test]
    async fn test_generate_baseline_writes_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(ScriptedGateway::new(REPLY, &[1]));
        let runner = JobRunner::new(gateway, Pacing::none());
        let store = ResultStore::new(dir.path());

        let (outcome, artifacts) = generate_baseline(&runner, &store, &model("m"), &problems(3), 3)
            .await
            .unwrap();

        assert_eq!(outcome.prediction_count(), 2);
        assert_eq!(read_predictions(&artifacts.predictions_file).unwrap().len(), 2);
        assert_eq!(
            artifacts.errors_file,
            Some(dir.path().join("errors_m_3problems.json"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_longer_cool_down_after_critical_error() {
        let dir = tempfile::tempdir().unwrap();
        let pacing = Pacing {
            after_success: std::time::Duration::ZERO,
            after_failure: std::time::Duration::ZERO,
            ..Pacing::default()
        };
        let submitter = Arc::new(RecordingSubmitter {
            error: vec!["a"],
            ..Default::default()
        });
        let orch = Orchestrator::new(
            registry(&["a", "b"]),
            JobRunner::new(Arc::new(ScriptedGateway::new(REPLY, &[])), pacing),
            ResultStore::new(dir.path()),
            submitter,
            pacing,
            1,
        );

        let start = tokio::time::Instant::now();
        let summary = orch.run(&problems(1)).await.unwrap();

        let elapsed = start.elapsed();
        assert_eq!(summary.log.results[0].state, ModelRunState::CriticalError);
        assert!(elapsed >= pacing.after_critical);
        assert!(elapsed < pacing.after_critical + pacing.after_model);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cool_down_between_models_only() {
        let dir = tempfile::tempdir().unwrap();
        let pacing = Pacing {
            after_success: std::time::Duration::ZERO,
            after_failure: std::time::Duration::ZERO,
            ..Pacing::default()
        };
        let orch = Orchestrator::new(
            registry(&["a", "b", "c"]),
            JobRunner::new(Arc::new(ScriptedGateway::new(REPLY, &[])), pacing),
            ResultStore::new(dir.path()),
            Arc::new(DisabledSubmitter),
            pacing,
            1,
        );

        let start = tokio::time::Instant::now();
        orch.run(&problems(1)).await.unwrap();

        let elapsed = start.elapsed();
        assert!(elapsed >= std::time::Duration::from_secs(60));
        assert!(elapsed < std::time::Duration::from_secs(90));
    }
}

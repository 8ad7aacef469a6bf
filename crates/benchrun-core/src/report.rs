//! Per-model run reports and the master log of a full run.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CoreError, ModelDescriptor, ModelKey, ModelRunState, RunId};

/// Outcome of one model within an orchestration pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub model_key: ModelKey,

    pub model_name: String,

    pub state: ModelRunState,

    /// Predictions artifact, once the batch has been saved.
    pub predictions_file: Option<PathBuf>,

    pub num_predictions: usize,

    pub num_errors: usize,

    /// Whether the evaluation service accepted the batch.
    pub submitted: bool,

    /// Evaluation run identifier; set only when `submitted` is true.
    pub run_id: Option<RunId>,

    /// Failure detail for `CRITICAL_ERROR` reports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// When the report reached its current state.
    pub timestamp: DateTime<Utc>,
}

impl RunReport {
    /// Create a pending report for `model`.
    pub fn new(model: &ModelDescriptor) -> Self {
        Self {
            model_key: model.key.clone(),
            model_name: model.name.clone(),
            state: ModelRunState::Pending,
            predictions_file: None,
            num_predictions: 0,
            num_errors: 0,
            submitted: false,
            run_id: None,
            error: None,
            timestamp: Utc::now(),
        }
    }

    fn advance(&mut self, next: ModelRunState) -> Result<(), CoreError> {
        self.state.transition(next)?;
        self.timestamp = Utc::now();
        Ok(())
    }

    /// Mark the model as generating predictions.
    pub fn start(&mut self) -> Result<(), CoreError> {
        self.advance(ModelRunState::Generating)
    }

    /// Record the saved batch and move on to submission.
    pub fn batch_saved(
        &mut self,
        predictions_file: PathBuf,
        num_predictions: usize,
        num_errors: usize,
    ) -> Result<(), CoreError> {
        self.advance(ModelRunState::Submitting)?;
        self.predictions_file = Some(predictions_file);
        self.num_predictions = num_predictions;
        self.num_errors = num_errors;
        Ok(())
    }

    /// Record the evaluation service's verdict.
    pub fn submission_finished(&mut self, run_id: RunId, accepted: bool) -> Result<(), CoreError> {
        if accepted {
            self.advance(ModelRunState::Submitted)?;
            self.submitted = true;
            self.run_id = Some(run_id);
        } else {
            self.advance(ModelRunState::SubmitFailed)?;
        }
        Ok(())
    }

    /// Mark the model as aborted by an unexpected failure.
    ///
    /// Progress recorded so far (saved file and counts) is kept. Terminal
    /// reports are left untouched.
    pub fn fail(&mut self, error: impl Into<String>) {
        if self.state.transition(ModelRunState::CriticalError).is_ok() {
            self.error = Some(error.into());
            self.timestamp = Utc::now();
        }
    }
}

/// Log of a full orchestration pass, persisted once at the end of the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterRunLog {
    pub start_time: DateTime<Utc>,

    pub total_models: usize,

    pub problems_per_model: usize,

    /// One report per model, in the order the models were processed.
    pub results: Vec<RunReport>,
}

impl MasterRunLog {
    pub fn new(start_time: DateTime<Utc>, total_models: usize, problems_per_model: usize) -> Self {
        Self {
            start_time,
            total_models,
            problems_per_model,
            results: Vec::with_capacity(total_models),
        }
    }

    pub fn push(&mut self, report: RunReport) {
        self.results.push(report);
    }

    /// Number of models whose batch was accepted for evaluation.
    pub fn submitted_count(&self) -> usize {
        self.results.iter().filter(|r| r.submitted).count()
    }

    /// Number of models that did not get a batch accepted.
    pub fn failed_count(&self) -> usize {
        self.results.len() - self.submitted_count()
    }
}

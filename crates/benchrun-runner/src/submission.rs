//! Submission of prediction batches to the external evaluation service.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use benchrun_core::{ModelKey, RunId};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Errors that prevent a submission attempt from happening at all.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// The submission command could not be started.
    #[error("Failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Hands a predictions artifact to an evaluation service.
///
/// `Ok(true)` means the service accepted the batch, `Ok(false)` that it
/// rejected it. No validation of the artifact happens here.
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(
        &self,
        predictions_file: &Path,
        model_key: &ModelKey,
        run_id: &RunId,
    ) -> Result<bool, SubmissionError>;
}

/// Submits through the `sb-cli` command line tool.
///
/// Runs `sb-cli submit <dataset> <split> --predictions_path <file> --run_id <id>`
/// and treats a zero exit status as acceptance.
#[derive(Debug, Clone)]
pub struct SbCliSubmitter {
    program: String,
    dataset: String,
    split: String,
    api_key: Option<String>,
}

impl SbCliSubmitter {
    /// Submitter for SWE-bench Lite's test split.
    pub fn new() -> Self {
        Self {
            program: "sb-cli".to_string(),
            dataset: "swe-bench_lite".to_string(),
            split: "test".to_string(),
            api_key: None,
        }
    }

    /// Set the executable to run.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Set the evaluation dataset and split.
    pub fn with_dataset(mut self, dataset: impl Into<String>, split: impl Into<String>) -> Self {
        self.dataset = dataset.into();
        self.split = split.into();
        self
    }

    /// Pass `SWEBENCH_API_KEY` to the child process.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    fn command(&self, predictions_file: &Path, run_id: &RunId) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("submit")
            .arg(&self.dataset)
            .arg(&self.split)
            .arg("--predictions_path")
            .arg(predictions_file)
            .arg("--run_id")
            .arg(run_id.as_str());

        if let Some(key) = &self.api_key {
            cmd.env("SWEBENCH_API_KEY", key);
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

impl Default for SbCliSubmitter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Submitter for SbCliSubmitter {
    async fn submit(
        &self,
        predictions_file: &Path,
        model_key: &ModelKey,
        run_id: &RunId,
    ) -> Result<bool, SubmissionError> {
        info!(
            model = %model_key,
            run_id = %run_id,
            program = %self.program,
            dataset = %self.dataset,
            split = %self.split,
            predictions = %predictions_file.display(),
            "Submitting predictions"
        );

        let output = self
            .command(predictions_file, run_id)
            .output()
            .await
            .map_err(|source| SubmissionError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                debug!(stdout = %trimmed, "sb-cli");
            }
        }
        for line in String::from_utf8_lossy(&output.stderr).lines() {
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                warn!(stderr = %trimmed, "sb-cli");
            }
        }

        let accepted = output.status.success();
        if accepted {
            info!(run_id = %run_id, "Submitted successfully");
        } else {
            warn!(
                run_id = %run_id,
                exit_code = output.status.code().unwrap_or(-1),
                "Submission failed"
            );
        }
        Ok(accepted)
    }
}

/// Submitter used when submission is turned off; reports every batch as not submitted.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSubmitter;

#[async_trait]
impl Submitter for DisabledSubmitter {
    async fn submit(
        &self,
        predictions_file: &Path,
        model_key: &ModelKey,
        _run_id: &RunId,
    ) -> Result<bool, SubmissionError> {
        info!(
            model = %model_key,
            predictions = %predictions_file.display(),
            "Submission disabled, skipping"
        );
        Ok(false)
    }
}

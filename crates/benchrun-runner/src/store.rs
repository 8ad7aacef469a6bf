//! Result store: batch artifacts and the master run log on local disk.
//!
//! Writes happen once per batch, after the job runner returns. A crash in
//! the middle of a batch loses that batch.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use benchrun_core::{ErrorRecord, MasterRunLog, ModelKey, PredictionRecord};
use thiserror::Error;
use tracing::{info, warn};

use crate::job::BatchOutcome;

/// Errors raised while reading or writing artifacts.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize records for '{path}': {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid record at {path}:{line}: {source}")]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Files written for one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchArtifacts {
    pub predictions_file: PathBuf,
    /// Present only when the batch had at least one error.
    pub errors_file: Option<PathBuf>,
}

/// Artifact storage rooted at an output directory.
#[derive(Debug, Clone)]
pub struct ResultStore {
    output_dir: PathBuf,
}

impl ResultStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path of the predictions artifact for a model and batch size.
    pub fn predictions_path(&self, model_key: &ModelKey, problems: usize) -> PathBuf {
        self.output_dir
            .join(format!("baseline_{}_{}problems.jsonl", model_key, problems))
    }

    /// Path of the error artifact for a model and batch size.
    pub fn errors_path(&self, model_key: &ModelKey, problems: usize) -> PathBuf {
        self.output_dir
            .join(format!("errors_{}_{}problems.json", model_key, problems))
    }

    /// Persist a finished batch.
    ///
    /// The predictions file is always written, one JSON object per line in
    /// emission order. The error file is written only if errors occurred;
    /// otherwise any error file left under the same name is removed.
    pub fn write_batch(
        &self,
        model_key: &ModelKey,
        problems: usize,
        outcome: &BatchOutcome,
    ) -> Result<BatchArtifacts, StoreError> {
        self.ensure_output_dir()?;

        let predictions_file = self.predictions_path(model_key, problems);
        write_jsonl(&predictions_file, &outcome.predictions)?;

        let errors_file = if outcome.errors.is_empty() {
            remove_if_exists(&self.errors_path(model_key, problems))?;
            None
        } else {
            let path = self.errors_path(model_key, problems);
            write_json(&path, &outcome.errors)?;
            warn!(
                model = %model_key,
                errors = outcome.error_count(),
                path = %path.display(),
                "Errors logged"
            );
            Some(path)
        };

        info!(
            model = %model_key,
            predictions = outcome.prediction_count(),
            path = %predictions_file.display(),
            "Predictions saved"
        );

        Ok(BatchArtifacts {
            predictions_file,
            errors_file,
        })
    }

    /// Persist the master log of a run, named after its start time.
    pub fn write_master_log(&self, log: &MasterRunLog) -> Result<PathBuf, StoreError> {
        self.ensure_output_dir()?;
        let path = self.output_dir.join(format!(
            "overnight_run_{}.json",
            log.start_time.format("%Y%m%d_%H%M%S")
        ));
        write_json(&path, log)?;
        info!(path = %path.display(), models = log.results.len(), "Master log saved");
        Ok(path)
    }

    fn ensure_output_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| StoreError::Io {
            path: self.output_dir.clone(),
            source,
        })
    }
}

/// Read a predictions artifact back. Blank lines are skipped.
pub fn read_predictions(path: &Path) -> Result<Vec<PredictionRecord>, StoreError> {
    let file = File::open(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut records = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            line: i + 1,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Read an error artifact back.
pub fn read_errors(path: &Path) -> Result<Vec<ErrorRecord>, StoreError> {
    let file = File::open(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        line: 0,
        source,
    })
}

fn remove_if_exists(path: &Path) -> Result<(), StoreError> {
    match fs::remove_file(path) {
        Ok(()) => {
            info!(path = %path.display(), "Removed error log from previous run");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn write_jsonl<T: serde::Serialize>(path: &Path, records: &[T]) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
    for record in records {
        serde_json::to_writer(&mut writer, record).map_err(|source| StoreError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;
        writer.write_all(b"\n").map_err(io_err)?;
    }
    writer.flush().map_err(io_err)
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|source| StoreError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    writer.write_all(b"\n").map_err(io_err)?;
    writer.flush().map_err(io_err)
}

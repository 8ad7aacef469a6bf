//! Problem source: a local export of the benchmark dataset.
//!
//! Accepts either JSON-Lines (one instance per line) or a single JSON array.

use std::fs;
use std::path::{Path, PathBuf};

use benchrun_core::ProblemRecord;
use thiserror::Error;
use tracing::info;

/// Errors raised while loading the dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to read dataset '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid instance at {path}:{line}: {source}")]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Dataset '{0}' contains no instances")]
    Empty(PathBuf),
}

/// Load all problems from `path`, preserving file order.
pub fn load_problems(path: &Path) -> Result<Vec<ProblemRecord>, DatasetError> {
    let contents = fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let problems = parse_problems(&contents).map_err(|(line, source)| DatasetError::Parse {
        path: path.to_path_buf(),
        line,
        source,
    })?;

    if problems.is_empty() {
        return Err(DatasetError::Empty(path.to_path_buf()));
    }

    info!(path = %path.display(), problems = problems.len(), "Loaded dataset");
    Ok(problems)
}

/// Parse dataset text; on failure returns the 1-based line of the bad record.
fn parse_problems(contents: &str) -> Result<Vec<ProblemRecord>, (usize, serde_json::Error)> {
    if contents.trim_start().starts_with('[') {
        return serde_json::from_str(contents).map_err(|e| (e.line(), e));
    }

    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| serde_json::from_str(line).map_err(|e| (i + 1, e)))
        .collect()
}

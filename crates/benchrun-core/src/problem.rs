//! Benchmark problem records.

use serde::{Deserialize, Serialize};

use crate::InstanceId;

/// One software-repair problem from the benchmark dataset.
///
/// Only the fields the pipeline reads are kept; any other dataset columns
/// (base commit, test lists, hints) are ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemRecord {
    /// Stable, unique instance identifier.
    pub instance_id: InstanceId,

    /// Repository in `owner/name` form.
    pub repo: String,

    /// Natural-language description of the issue to fix.
    pub problem_statement: String,
}

impl ProblemRecord {
    pub fn new(
        instance_id: impl Into<InstanceId>,
        repo: impl Into<String>,
        problem_statement: impl Into<String>,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            repo: repo.into(),
            problem_statement: problem_statement.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extra_dataset_fields_ignored() {
        let line = r#"{"instance_id": "psf__requests-2317", "repo": "psf/requests",
            "problem_statement": "method = builtin_str(method) problem",
            "base_commit": "091991be", "FAIL_TO_PASS": "[]"}"#;
        let problem: ProblemRecord = serde_json::from_str(line).unwrap();
        assert_eq!(problem.instance_id.as_str(), "psf__requests-2317");
        assert_eq!(problem.repo, "psf/requests");
    }
}

//! Per-problem records produced by a batch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::InstanceId;

/// A model's proposed patch for one instance.
///
/// Serialized in the evaluation harness's prediction format:
/// `{"instance_id", "model_name_or_path", "model_patch"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub instance_id: InstanceId,

    #[serde(rename = "model_name_or_path")]
    pub model_name: String,

    /// Unified diff text. Never empty, always newline-terminated.
    #[serde(rename = "model_patch")]
    pub patch: String,
}

impl PredictionRecord {
    /// Create a prediction, appending a trailing newline to `patch` if missing.
    pub fn new(
        instance_id: impl Into<InstanceId>,
        model_name: impl Into<String>,
        patch: impl Into<String>,
    ) -> Self {
        let mut patch = patch.into();
        if !patch.ends_with('\n') {
            patch.push('\n');
        }
        Self {
            instance_id: instance_id.into(),
            model_name: model_name.into(),
            patch,
        }
    }
}

/// A failed attempt at one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub instance_id: InstanceId,

    #[serde(rename = "error")]
    pub error_message: String,

    pub timestamp: DateTime<Utc>,
}

impl ErrorRecord {
    /// Create an error record stamped with the current time.
    pub fn new(instance_id: impl Into<InstanceId>, error_message: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            error_message: error_message.into(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_appends_newline_once() {
        let record = PredictionRecord::new("x1", "m", "--- a/f\n+++ b/f");
        assert_eq!(record.patch, "--- a/f\n+++ b/f\n");

        let record = PredictionRecord::new("x1", "m", "--- a/f\n");
        assert_eq!(record.patch, "--- a/f\n");
    }

    #[test]
    fn test_empty_patch_becomes_newline() {
        let record = PredictionRecord::new("x1", "m", "");
        assert_eq!(record.patch, "\n");
    }

    #[test]
    fn test_prediction_wire_format() {
        let record = PredictionRecord::new("x1", "GPT-5", "diff\n");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["instance_id"], "x1");
        assert_eq!(value["model_name_or_path"], "GPT-5");
        assert_eq!(value["model_patch"], "diff\n");
    }

    #[test]
    fn test_error_wire_format() {
        let record = ErrorRecord::new("x2", "request timed out");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["instance_id"], "x2");
        assert_eq!(value["error"], "request timed out");
        let ts = value["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(ts).is_ok());
    }
}

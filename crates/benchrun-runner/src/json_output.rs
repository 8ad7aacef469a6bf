//! JSON output for streaming run progress to stdout.

use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

/// Global flag to enable JSON output mode.
static JSON_MODE_ENABLED: AtomicBool = AtomicBool::new(false);

/// Enable JSON output mode.
pub fn enable_json_mode() {
    JSON_MODE_ENABLED.store(true, Ordering::SeqCst);
}

/// Check if JSON mode is enabled.
pub fn is_json_mode() -> bool {
    JSON_MODE_ENABLED.load(Ordering::SeqCst)
}

/// JSON event types that can be emitted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JsonEventType {
    RunStarted,
    ModelStarted,
    Prediction,
    ProblemFailed,
    BatchSaved,
    Submitted,
    ModelFailed,
    RunCompleted,
    ProbeResult,
}

/// A JSON event to be output to stdout.
#[derive(Debug, Clone, Serialize)]
pub struct JsonEvent {
    pub event: JsonEventType,
    pub timestamp: String,
    pub data: serde_json::Value,
}

impl JsonEvent {
    /// Create a new JSON event with the current timestamp.
    pub fn new(event: JsonEventType, data: serde_json::Value) -> Self {
        Self {
            event,
            timestamp: chrono::Utc::now().to_rfc3339(),
            data,
        }
    }

    /// Output this event as a JSON line to stdout.
    pub fn emit(&self) {
        if !is_json_mode() {
            return;
        }
        if let Ok(json) = serde_json::to_string(self) {
            let mut stdout = io::stdout().lock();
            let _ = writeln!(stdout, "{}", json);
            let _ = stdout.flush();
        }
    }
}

pub fn emit_run_started(total_models: usize, problems_per_model: usize) {
    JsonEvent::new(
        JsonEventType::RunStarted,
        serde_json::json!({
            "total_models": total_models,
            "problems_per_model": problems_per_model,
        }),
    )
    .emit();
}

pub fn emit_model_started(model_key: &str, remote_id: &str, position: usize, total: usize) {
    JsonEvent::new(
        JsonEventType::ModelStarted,
        serde_json::json!({
            "model_key": model_key,
            "remote_id": remote_id,
            "position": position,
            "total": total,
        }),
    )
    .emit();
}

pub fn emit_prediction(model_key: &str, instance_id: &str, tokens: u64, patch_len: usize) {
    JsonEvent::new(
        JsonEventType::Prediction,
        serde_json::json!({
            "model_key": model_key,
            "instance_id": instance_id,
            "tokens": tokens,
            "patch_len": patch_len,
        }),
    )
    .emit();
}

pub fn emit_problem_failed(model_key: &str, instance_id: &str, kind: &str, error: &str) {
    JsonEvent::new(
        JsonEventType::ProblemFailed,
        serde_json::json!({
            "model_key": model_key,
            "instance_id": instance_id,
            "kind": kind,
            "error": error,
        }),
    )
    .emit();
}

pub fn emit_batch_saved(
    model_key: &str,
    predictions_file: &Path,
    errors_file: Option<&Path>,
    predictions: usize,
    errors: usize,
) {
    JsonEvent::new(
        JsonEventType::BatchSaved,
        serde_json::json!({
            "model_key": model_key,
            "predictions_file": predictions_file.display().to_string(),
            "errors_file": errors_file.map(|p| p.display().to_string()),
            "predictions": predictions,
            "errors": errors,
        }),
    )
    .emit();
}

pub fn emit_submitted(model_key: &str, run_id: &str, accepted: bool) {
    JsonEvent::new(
        JsonEventType::Submitted,
        serde_json::json!({
            "model_key": model_key,
            "run_id": run_id,
            "accepted": accepted,
        }),
    )
    .emit();
}

pub fn emit_model_failed(model_key: &str, error: &str) {
    JsonEvent::new(
        JsonEventType::ModelFailed,
        serde_json::json!({
            "model_key": model_key,
            "error": error,
        }),
    )
    .emit();
}

pub fn emit_run_completed(submitted: usize, failed: usize, master_log: &Path) {
    JsonEvent::new(
        JsonEventType::RunCompleted,
        serde_json::json!({
            "submitted": submitted,
            "failed": failed,
            "master_log": master_log.display().to_string(),
        }),
    )
    .emit();
}

pub fn emit_probe_result(
    model_key: &str,
    success: bool,
    elapsed_ms: u64,
    tokens: Option<u64>,
    error: Option<&str>,
) {
    JsonEvent::new(
        JsonEventType::ProbeResult,
        serde_json::json!({
            "model_key": model_key,
            "success": success,
            "elapsed_ms": elapsed_ms,
            "tokens": tokens,
            "error": error,
        }),
    )
    .emit();
}

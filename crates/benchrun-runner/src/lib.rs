//! BenchRun runner
//!
//! Runs a list of language models against a fixed prefix of SWE-bench
//! problems, one model and one request at a time. Each model's predictions
//! are saved as a JSON-Lines artifact, handed to the evaluation service, and
//! summarized in a master run log.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use benchrun_core::ModelRegistry;
//! use benchrun_gateway::OpenRouterClient;
//! use benchrun_runner::{
//!     load_problems, JobRunner, Orchestrator, Pacing, ResultStore, SbCliSubmitter,
//! };
//!
//! async fn overnight() -> Result<(), Box<dyn std::error::Error>> {
//!     let problems = load_problems(Path::new("swe-bench-lite.jsonl"))?;
//!     let gateway = Arc::new(OpenRouterClient::new("sk-or-...")?);
//!
//!     let orchestrator = Orchestrator::new(
//!         ModelRegistry::builtin(),
//!         JobRunner::new(gateway, Pacing::default()),
//!         ResultStore::new("results"),
//!         Arc::new(SbCliSubmitter::new()),
//!         Pacing::default(),
//!         50,
//!     );
//!
//!     let summary = orchestrator.run(&problems).await?;
//!     println!("{} submitted, {} failed", summary.submitted(), summary.failed());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dataset;
pub mod extractor;
pub mod job;
pub mod json_output;
pub mod orchestrator;
pub mod pacing;
pub mod probe;
pub mod prompt;
pub mod store;
pub mod submission;

// Re-export main types
pub use config::{Config, ConfigError};
pub use dataset::{load_problems, DatasetError};
pub use extractor::extract_patch;
pub use job::{BatchOutcome, JobRunner};
pub use orchestrator::{generate_baseline, Orchestrator, OrchestratorError, RunSummary};
pub use pacing::{Pacing, Pause};
pub use probe::{ProbeMode, ProbeOutcome, Prober};
pub use prompt::render_repair_prompt;
pub use store::{read_errors, read_predictions, BatchArtifacts, ResultStore, StoreError};
pub use submission::{DisabledSubmitter, SbCliSubmitter, SubmissionError, Submitter};

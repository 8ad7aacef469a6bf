//! BenchRun Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/HTTP
//! - Filesystem
//! - Runtime specifics
//!
//! All types here describe one benchmark run: the problems, the models,
//! the records produced per (model, problem) pair and the reports
//! aggregated per model.

pub mod error;
pub mod ids;
pub mod model;
pub mod problem;
pub mod record;
pub mod report;
pub mod status;

// Re-export commonly used types
pub use error::CoreError;
pub use ids::{InstanceId, ModelKey, RunId};
pub use model::{ModelDescriptor, ModelFilter, ModelRegistry, Tier};
pub use problem::ProblemRecord;
pub use record::{ErrorRecord, PredictionRecord};
pub use report::{MasterRunLog, RunReport};
pub use status::ModelRunState;

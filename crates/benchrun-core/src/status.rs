//! Per-model lifecycle within a run.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::CoreError;

/// State of one model during an orchestration pass.
///
/// ```text
/// PENDING -> GENERATING -> SUBMITTING -> SUBMITTED | SUBMIT_FAILED
///     \___________\____________\______-> CRITICAL_ERROR
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModelRunState {
    /// Not yet started.
    #[default]
    Pending,
    /// Job runner is calling the completion gateway.
    Generating,
    /// Predictions saved, handing off to the evaluation service.
    Submitting,
    /// Evaluation service accepted the batch.
    Submitted,
    /// Evaluation service rejected the batch, or submission was skipped.
    SubmitFailed,
    /// An unexpected failure aborted this model.
    CriticalError,
}

impl ModelRunState {
    /// Returns true if the model is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Submitted | Self::SubmitFailed | Self::CriticalError
        )
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: ModelRunState) -> bool {
        use ModelRunState::*;
        match (self, next) {
            (Pending, Generating) => true,
            (Generating, Submitting) => true,
            (Submitting, Submitted | SubmitFailed) => true,
            (from, CriticalError) => !from.is_terminal(),
            _ => false,
        }
    }

    /// Move to `next`, rejecting illegal transitions.
    pub fn transition(&mut self, next: ModelRunState) -> Result<(), CoreError> {
        if !self.can_transition_to(next) {
            return Err(CoreError::InvalidStateTransition {
                from: self.to_string(),
                to: next.to_string(),
            });
        }
        *self = next;
        Ok(())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Generating => "GENERATING",
            Self::Submitting => "SUBMITTING",
            Self::Submitted => "SUBMITTED",
            Self::SubmitFailed => "SUBMIT_FAILED",
            Self::CriticalError => "CRITICAL_ERROR",
        }
    }
}

impl fmt::Display for ModelRunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut state = ModelRunState::default();
        state.transition(ModelRunState::Generating).unwrap();
        state.transition(ModelRunState::Submitting).unwrap();
        state.transition(ModelRunState::Submitted).unwrap();
        assert!(state.is_terminal());
    }

    #[test]
    fn test_critical_from_any_active_state() {
        for from in [
            ModelRunState::Pending,
            ModelRunState::Generating,
            ModelRunState::Submitting,
        ] {
            assert!(from.can_transition_to(ModelRunState::CriticalError));
        }
        assert!(!ModelRunState::Submitted.can_transition_to(ModelRunState::CriticalError));
    }

    #[test]
    fn test_skipping_generation_rejected() {
        let mut state = ModelRunState::Pending;
        let err = state.transition(ModelRunState::Submitting).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid state transition: PENDING -> SUBMITTING"
        );
        assert_eq!(state, ModelRunState::Pending);
    }

    #[test]
    fn test_serde_representation() {
        let json = serde_json::to_string(&ModelRunState::SubmitFailed).unwrap();
        assert_eq!(json, "\"SUBMIT_FAILED\"");
    }
}

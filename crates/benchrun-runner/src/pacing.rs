//! Fixed sleep-based pacing between gateway calls and between models.

use std::time::Duration;

use tracing::debug;

/// Point in a run at which a pause is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    /// After a successful gateway call.
    AfterSuccess,
    /// After a failed gateway call.
    AfterFailure,
    /// Between two models, after a completed model.
    AfterModel,
    /// Between two models, after a critical error.
    AfterCritical,
}

/// Delays applied at each pause point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub after_success: Duration,
    pub after_failure: Duration,
    pub after_model: Duration,
    pub after_critical: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            after_success: Duration::from_millis(500),
            after_failure: Duration::from_secs(2),
            after_model: Duration::from_secs(30),
            after_critical: Duration::from_secs(60),
        }
    }
}

impl Pacing {
    /// No delays at all.
    pub fn none() -> Self {
        Self {
            after_success: Duration::ZERO,
            after_failure: Duration::ZERO,
            after_model: Duration::ZERO,
            after_critical: Duration::ZERO,
        }
    }

    pub fn delay(&self, pause: Pause) -> Duration {
        match pause {
            Pause::AfterSuccess => self.after_success,
            Pause::AfterFailure => self.after_failure,
            Pause::AfterModel => self.after_model,
            Pause::AfterCritical => self.after_critical,
        }
    }

    /// Sleep for the delay configured at `pause`.
    pub async fn wait(&self, pause: Pause) {
        let delay = self.delay(pause);
        if delay.is_zero() {
            return;
        }
        debug!(pause = ?pause, delay_ms = delay.as_millis() as u64, "Pacing");
        tokio::time::sleep(delay).await;
    }
}

use crate::constants::{orchestrator::DEFAULT_WORKERS, progress::DEFAULT_STEP_PERCENT};
use crate::errors::TallyError;

/// Top-level run configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TallyConfig {
    /// Number of parallel workers; input units are split into at most this many batches.
    pub workers: usize,
    /// Rounding step (in percent) for leg-based progress notifications.
    pub progress_step: u32,
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            progress_step: DEFAULT_STEP_PERCENT,
        }
    }
}

impl TallyConfig {
    /// Reject worker counts and progress steps the pipeline cannot honor.
    pub fn validate(&self) -> Result<(), TallyError> {
        if self.workers == 0 {
            return Err(TallyError::Configuration("workers must be >= 1".to_string()));
        }
        if self.progress_step == 0 || self.progress_step > 100 {
            return Err(TallyError::Configuration(format!(
                "progress_step must be within 1..=100, got {}",
                self.progress_step
            )));
        }
        Ok(())
    }
}

use serde::Serialize;

use crate::types::BatchIndex;

/// Work done by one batch worker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    /// Position of the batch among all batches of the run.
    pub index: BatchIndex,
    /// Number of input units assigned to the batch.
    pub units: usize,
    /// Legs folded by the batch.
    pub legs: u64,
    /// Distinct participants seen by the batch.
    pub participants: usize,
    /// Wall time spent by the worker, in milliseconds.
    pub elapsed_ms: u128,
}

/// Load balance across batches, measured in legs.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BatchBalance {
    /// Legs across all batches.
    pub total: u64,
    /// Number of batches.
    pub batches: usize,
    /// Fewest legs in any batch.
    pub min: u64,
    /// Most legs in any batch.
    pub max: u64,
    /// Mean legs per batch.
    pub mean: f64,
    /// Share of all legs held by the largest batch.
    pub max_share: f64,
    /// `max / min`; infinite when some batch had no legs.
    pub ratio: f64,
}

/// Compute leg balance across batches; `None` when there are no batches.
pub fn batch_balance(stats: &[BatchStats]) -> Option<BatchBalance> {
    let min = stats.iter().map(|batch| batch.legs).min()?;
    let max = stats.iter().map(|batch| batch.legs).max()?;
    let total: u64 = stats.iter().map(|batch| batch.legs).sum();
    let batches = stats.len();
    let mean = total as f64 / batches as f64;
    let max_share = if total == 0 {
        0.0
    } else {
        max as f64 / total as f64
    };
    let ratio = if min == 0 {
        f64::INFINITY
    } else {
        max as f64 / min as f64
    };
    Some(BatchBalance {
        total,
        batches,
        min,
        max,
        mean,
        max_share,
        ratio,
    })
}

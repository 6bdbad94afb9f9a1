use std::io;

use thiserror::Error;

use crate::types::{BatchIndex, UnitId};

/// Error type for aggregation, progress, ingestion, and configuration failures.
#[derive(Debug, Error)]
pub enum TallyError {
    /// Progress totals were below 1.
    #[error("progress totals must both be >= 1 (total_legs={total_legs}, total_distance={total_distance})")]
    InvalidTotals {
        /// Requested total leg count.
        total_legs: u64,
        /// Requested total distance, in km.
        total_distance: f64,
    },
    /// A progress advance carried a negative or NaN distance.
    #[error("progress advance received a negative delta (legs={legs}, distance={distance})")]
    NegativeDelta {
        /// Legs in the rejected advance.
        legs: u64,
        /// Distance in the rejected advance.
        distance: f64,
    },
    /// A leg record could not be decoded.
    #[error("malformed record in unit '{unit}' at leg {leg}: {reason}")]
    MalformedRecord {
        /// Unit containing the record.
        unit: UnitId,
        /// Zero-based position of the record in its unit.
        leg: usize,
        /// What was wrong with the record.
        reason: String,
    },
    /// A leg speed was zero, negative, or not finite.
    #[error("leg speed must be a positive finite number, got {speed}")]
    ZeroOrNegativeSpeed {
        /// Offending speed.
        speed: f64,
    },
    /// A leg distance was negative or not finite.
    #[error("leg distance must be a non-negative finite number, got {distance}")]
    InvalidDistance {
        /// Offending distance.
        distance: f64,
    },
    /// A decoded leg was rejected by its participant summary.
    #[error("record in unit '{unit}' at leg {leg} rejected: {source}")]
    RecordRejected {
        /// Unit containing the record.
        unit: UnitId,
        /// Zero-based position of the record in its unit.
        leg: usize,
        /// Why the summary rejected the leg.
        #[source]
        source: Box<TallyError>,
    },
    /// The lowest-indexed failing batch of a run.
    #[error("batch {batch} failed: {source}")]
    BatchFailed {
        /// Index of the failing batch.
        batch: BatchIndex,
        /// Failure reported by the batch.
        #[source]
        source: Box<TallyError>,
    },
    /// A batch worker panicked.
    #[error("worker for batch {batch} panicked")]
    WorkerPanicked {
        /// Index of the batch whose worker panicked.
        batch: BatchIndex,
    },
    /// An input unit could not be read or is not a list of legs.
    #[error("input unit '{unit}' is unavailable: {reason}")]
    UnitUnavailable {
        /// Requested unit.
        unit: UnitId,
        /// Underlying read or format failure.
        reason: String,
    },
    /// Invalid run configuration or race index.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Filesystem failure.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// JSON encoding or decoding failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl TallyError {
    /// Strip batch and record location wrappers, returning the underlying failure.
    pub fn root_cause(&self) -> &TallyError {
        match self {
            TallyError::RecordRejected { source, .. } | TallyError::BatchFailed { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }

    /// Batch index carried by a `BatchFailed` or `WorkerPanicked` error.
    pub fn batch(&self) -> Option<BatchIndex> {
        match self {
            TallyError::BatchFailed { batch, .. } | TallyError::WorkerPanicked { batch } => {
                Some(*batch)
            }
            _ => None,
        }
    }
}

use std::time::Instant;

use indexmap::IndexMap;
use tracing::debug;

use crate::errors::TallyError;
use crate::metrics::BatchStats;
use crate::progress::ProgressTracker;
use crate::source::LegSource;
use crate::summary::ParticipantSummary;
use crate::types::{BatchIndex, ParticipantId, UnitId};

/// Participant summaries keyed by name, in first-seen order.
pub type PartialMapping = IndexMap<ParticipantId, ParticipantSummary>;

/// Result of one batch: its position among all batches and its partial mapping.
#[derive(Clone, Debug)]
pub struct BatchOutput {
    /// Position of the batch among all batches of the run.
    pub index: BatchIndex,
    /// Participant summaries accumulated by this batch.
    pub summaries: PartialMapping,
    /// Work done by this batch.
    pub stats: BatchStats,
}

/// Folds the legs of a contiguous slice of units into one partial mapping.
pub struct BatchAggregator<'a> {
    index: BatchIndex,
    tracker: &'a ProgressTracker,
}

impl<'a> BatchAggregator<'a> {
    /// Create the aggregator for batch `index`, reporting into `tracker`.
    pub fn new(index: BatchIndex, tracker: &'a ProgressTracker) -> Self {
        Self { index, tracker }
    }

    /// Batch position this aggregator was created for.
    pub fn index(&self) -> BatchIndex {
        self.index
    }

    /// Process `units` in order.
    ///
    /// Every accepted leg advances the shared tracker by one leg and its distance.
    /// The first unreadable unit or rejected record fails the whole batch; progress
    /// already advanced is kept.
    pub fn run<S>(&self, source: &S, units: &[UnitId]) -> Result<BatchOutput, TallyError>
    where
        S: LegSource + ?Sized,
    {
        let start = Instant::now();
        let mut summaries = PartialMapping::new();
        let mut legs_seen = 0u64;
        for unit in units {
            for (position, leg) in source.legs(unit)?.enumerate() {
                let leg = leg?;
                summaries
                    .entry(leg.participant.clone())
                    .or_default()
                    .add_record(&leg)
                    .map_err(|err| TallyError::RecordRejected {
                        unit: unit.clone(),
                        leg: position,
                        source: Box::new(err),
                    })?;
                self.tracker.advance(1, leg.distance)?;
                legs_seen += 1;
            }
        }
        let stats = BatchStats {
            index: self.index,
            units: units.len(),
            legs: legs_seen,
            participants: summaries.len(),
            elapsed_ms: start.elapsed().as_millis(),
        };
        debug!(
            batch = self.index,
            units = stats.units,
            legs = stats.legs,
            participants = stats.participants,
            elapsed_ms = stats.elapsed_ms,
            "batch aggregated"
        );
        Ok(BatchOutput {
            index: self.index,
            summaries,
            stats,
        })
    }
}

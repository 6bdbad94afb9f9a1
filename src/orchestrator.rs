//! Partitions input units across workers and assembles the final result.
//!
//! Execution model: one scoped thread per batch, nothing shared between
//! workers except the `LegSource` (read-only) and the `ProgressTracker`.
//! Results are slotted by batch index as workers are joined, so the final
//! merge order never depends on which worker finished first.

use std::ops::Range;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::aggregate::{BatchAggregator, BatchOutput, PartialMapping};
use crate::config::TallyConfig;
use crate::errors::TallyError;
use crate::merge::combine_all;
use crate::metrics::{BatchStats, batch_balance};
use crate::progress::{ProgressEvent, ProgressSink, ProgressTracker};
use crate::source::{FileLegSource, LegSource, RaceIndex};
use crate::types::UnitId;

/// Final output of a successful run.
#[derive(Clone, Debug)]
pub struct RunReport {
    /// Per-participant summaries in first-seen order (by batch, then leg order).
    pub summaries: PartialMapping,
    /// Per-batch work statistics, in batch-index order.
    pub batches: Vec<BatchStats>,
    /// The forced progress notification issued after all workers finished.
    pub final_progress: ProgressEvent,
}

/// A run over a race directory together with the index it was driven by.
#[derive(Clone, Debug)]
pub struct RaceSummary {
    /// Index the run was driven by.
    pub index: RaceIndex,
    /// Result of the run.
    pub report: RunReport,
}

/// Dispatches batch workers and merges their outputs.
#[derive(Clone, Debug)]
pub struct Orchestrator {
    workers: usize,
}

impl Orchestrator {
    /// Create an orchestrator using up to `workers` parallel workers.
    pub fn new(workers: usize) -> Result<Self, TallyError> {
        if workers == 0 {
            return Err(TallyError::Configuration("workers must be >= 1".to_string()));
        }
        Ok(Self { workers })
    }

    /// Create an orchestrator from a validated run configuration.
    pub fn from_config(config: &TallyConfig) -> Result<Self, TallyError> {
        config.validate()?;
        Self::new(config.workers)
    }

    /// Configured worker count.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Aggregate `units` from `source`, reporting progress into `tracker`.
    ///
    /// On success the tracker is flushed exactly once after every worker has
    /// finished. On failure the error of the lowest failing batch is returned,
    /// wrapped in `BatchFailed`, and nothing is flushed.
    pub fn run<S>(
        &self,
        source: &S,
        units: &[UnitId],
        tracker: &ProgressTracker,
    ) -> Result<RunReport, TallyError>
    where
        S: LegSource + ?Sized,
    {
        let start = Instant::now();
        let ranges = partition_units(units.len(), self.workers);
        info!(
            units = units.len(),
            batches = ranges.len(),
            workers = self.workers,
            "dispatching race batches"
        );

        let mut results: Vec<Option<Result<BatchOutput, TallyError>>> =
            Vec::with_capacity(ranges.len());
        results.resize_with(ranges.len(), || None);
        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(ranges.len());
            for (index, range) in ranges.iter().enumerate() {
                let batch = &units[range.clone()];
                debug!(batch = index, first_unit = range.start, units = batch.len(), "spawning batch worker");
                handles.push((
                    index,
                    scope.spawn(move || BatchAggregator::new(index, tracker).run(source, batch)),
                ));
            }
            for (index, handle) in handles {
                let result = handle
                    .join()
                    .unwrap_or_else(|_| Err(TallyError::WorkerPanicked { batch: index }));
                results[index] = Some(result);
            }
        });

        let mut outputs = Vec::with_capacity(results.len());
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Some(Ok(output)) => outputs.push(output),
                Some(Err(err)) => {
                    warn!(batch = index, error = %err, "batch failed; aborting run");
                    return Err(match err {
                        TallyError::WorkerPanicked { .. } => err,
                        other => TallyError::BatchFailed {
                            batch: index,
                            source: Box::new(other),
                        },
                    });
                }
                None => return Err(TallyError::WorkerPanicked { batch: index }),
            }
        }

        let final_progress = tracker.flush();
        let batches: Vec<BatchStats> = outputs.iter().map(|output| output.stats.clone()).collect();
        if let Some(balance) = batch_balance(&batches) {
            debug!(
                min_legs = balance.min,
                max_legs = balance.max,
                mean_legs = balance.mean,
                ratio = balance.ratio,
                "batch balance"
            );
        }
        let summaries = combine_all(outputs)?;
        info!(
            participants = summaries.len(),
            legs = final_progress.processed_legs,
            elapsed_ms = start.elapsed().as_millis(),
            "race aggregation finished"
        );
        Ok(RunReport {
            summaries,
            batches,
            final_progress,
        })
    }
}

/// Split `total` units into contiguous batches of `ceil(total / workers)` units.
///
/// The last batch may be smaller, and fewer than `workers` batches are returned
/// when the units do not fill every worker. `workers` of zero is treated as one.
pub fn partition_units(total: usize, workers: usize) -> Vec<Range<usize>> {
    if total == 0 {
        return Vec::new();
    }
    let size = total.div_ceil(workers.max(1));
    (0..total)
        .step_by(size)
        .map(|start| start..(start + size).min(total))
        .collect()
}

/// Aggregate a race directory described by `index`.
///
/// Builds the shared tracker from the index totals (failing with
/// `InvalidTotals` before any worker starts) and runs the orchestrator over
/// the index units.
pub fn summarize_race(
    root: impl AsRef<Path>,
    index: RaceIndex,
    config: &TallyConfig,
    sink: Arc<dyn ProgressSink>,
) -> Result<RaceSummary, TallyError> {
    let orchestrator = Orchestrator::from_config(config)?;
    let tracker = ProgressTracker::with_sink(index.total_legs(), index.total_distance(), sink)?
        .with_step(config.progress_step);
    let source = FileLegSource::new(root.as_ref());
    let report = orchestrator.run(&source, &index.unit_ids(), &tracker)?;
    Ok(RaceSummary { index, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::LegRecord;
    use crate::progress::CollectingSink;
    use crate::source::InMemoryLegSource;

    #[test]
    fn partition_uses_ceiling_batch_size() {
        assert_eq!(partition_units(10, 4), vec![0..3, 3..6, 6..9, 9..10]);
        assert_eq!(partition_units(4, 4), vec![0..1, 1..2, 2..3, 3..4]);
        assert_eq!(partition_units(4, 3), vec![0..2, 2..4]);
        assert_eq!(partition_units(3, 16), vec![0..1, 1..2, 2..3]);
        assert_eq!(partition_units(5, 1), vec![0..5]);
        assert!(partition_units(0, 4).is_empty());
        assert_eq!(partition_units(2, 0), vec![0..2]);
    }

    #[test]
    fn partition_covers_every_unit_once() {
        for total in 1..40 {
            for workers in 1..12 {
                let ranges = partition_units(total, workers);
                assert!(ranges.len() <= workers);
                let covered: Vec<usize> = ranges.into_iter().flatten().collect();
                assert_eq!(covered, (0..total).collect::<Vec<_>>());
            }
        }
    }

    #[test]
    fn zero_workers_is_rejected() {
        assert!(matches!(
            Orchestrator::new(0),
            Err(TallyError::Configuration(_))
        ));
    }

    #[test]
    fn run_flushes_once_and_reports_batches_in_order() {
        let source = InMemoryLegSource::new((0..6).map(|day| {
            (
                format!("day_{day}"),
                vec![
                    LegRecord::new("Alice", 1.0 + day as f64, 10.0, "car"),
                    LegRecord::new("Bob", 2.0, 4.0 + day as f64, "bike"),
                ],
            )
        }));
        let sink = Arc::new(CollectingSink::new());
        let tracker =
            ProgressTracker::with_sink(source.total_legs(), source.total_distance(), sink.clone())
                .unwrap();
        let report = Orchestrator::new(4)
            .unwrap()
            .run(&source, source.unit_ids(), &tracker)
            .unwrap();

        assert_eq!(report.batches.iter().map(|b| b.index).collect::<Vec<_>>(), [0, 1, 2]);
        assert_eq!(report.batches.iter().map(|b| b.legs).sum::<u64>(), 12);
        assert_eq!(report.final_progress.percent_by_legs, 100);
        assert!(report.final_progress.forced);
        let forced: Vec<_> = sink.events().into_iter().filter(|e| e.forced).collect();
        assert_eq!(forced.len(), 1);
        assert_eq!(report.summaries.keys().collect::<Vec<_>>(), ["Alice", "Bob"]);
    }

    #[test]
    fn failing_batch_aborts_run_with_its_index() {
        let source = InMemoryLegSource::new([
            ("day_0", vec![LegRecord::new("Alice", 1.0, 10.0, "car")]),
            ("day_1", vec![LegRecord::new("Alice", 1.0, 10.0, "car")]),
            ("day_2", vec![LegRecord::new("Alice", 1.0, -1.0, "car")]),
        ]);
        let sink = Arc::new(CollectingSink::new());
        let tracker = ProgressTracker::with_sink(3, 3.0, sink.clone()).unwrap();
        let err = Orchestrator::new(3)
            .unwrap()
            .run(&source, source.unit_ids(), &tracker)
            .unwrap_err();
        assert_eq!(err.batch(), Some(2));
        assert!(matches!(
            err.root_cause(),
            TallyError::ZeroOrNegativeSpeed { .. }
        ));
        assert!(sink.events().iter().all(|e| !e.forced));
    }

    #[test]
    fn unknown_unit_fails_its_batch() {
        let source = InMemoryLegSource::new([("day_0", vec![LegRecord::new("A", 1.0, 1.0, "car")])]);
        let tracker = ProgressTracker::new(1, 1.0).unwrap();
        let units = vec!["day_0".to_string(), "day_9".to_string()];
        let err = Orchestrator::new(2)
            .unwrap()
            .run(&source, &units, &tracker)
            .unwrap_err();
        assert_eq!(err.batch(), Some(1));
        assert!(matches!(err.root_cause(), TallyError::UnitUnavailable { .. }));
    }
}

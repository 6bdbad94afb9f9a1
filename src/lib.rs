#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Batch workers that fold legs into partial mappings.
pub mod aggregate;
/// Command-line runner used by the `race_tally` binary.
pub mod cli;
/// Run configuration types.
pub mod config;
/// Centralized constants used across summaries, progress, and sources.
pub mod constants;
/// Leg record and transport types.
pub mod data;
/// Deterministic merging of batch outputs.
pub mod merge;
/// Per-batch statistics and load balance helpers.
pub mod metrics;
/// Worker dispatch and end-to-end runs.
pub mod orchestrator;
/// Shared progress counters and notification sinks.
pub mod progress;
/// Leg source traits and built-in sources.
pub mod source;
/// Per-participant running summaries.
pub mod summary;
/// Input transports used by sources (filesystem today).
pub mod transport;
/// Shared type aliases.
pub mod types;
/// Numeric helpers.
pub mod utils;

mod errors;

pub use aggregate::{BatchAggregator, BatchOutput, PartialMapping};
pub use config::TallyConfig;
pub use data::{LegRecord, Transport};
pub use errors::TallyError;
pub use merge::{combine, combine_all};
pub use metrics::{BatchBalance, BatchStats, batch_balance};
pub use orchestrator::{Orchestrator, RaceSummary, RunReport, partition_units, summarize_race};
pub use progress::{CollectingSink, ProgressEvent, ProgressSink, ProgressTracker, TracingSink};
pub use source::{FileLegSource, InMemoryLegSource, LegIter, LegSource, RaceIndex, UnitEntry};
pub use summary::ParticipantSummary;
pub use types::{BatchIndex, FriendList, ParticipantId, TransportTag, UnitId};
